//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! It is the single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;
use std::str::FromStr;

use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [fetch] section
    if let Some(section) = ini.section(Some("fetch")) {
        if let Some(v) = section.get("timeout") {
            config.fetch.timeout = parse_positive(v, "fetch", "timeout")?;
        }
        if let Some(v) = section.get("max_concurrent") {
            let v = v.trim();
            config.fetch.max_concurrent = if v.is_empty() || v.eq_ignore_ascii_case("auto") {
                None
            } else {
                Some(parse_positive(v, "fetch", "max_concurrent")?)
            };
        }
        if let Some(v) = section.get("user_agent") {
            let v = v.trim();
            if !v.is_empty() {
                config.fetch.user_agent = v.to_string();
            }
        }
    }

    // [grid] section
    if let Some(section) = ini.section(Some("grid")) {
        if let Some(v) = section.get("source_url") {
            let v = v.trim();
            if !(v.starts_with("http://") || v.starts_with("https://")) {
                return Err(invalid("grid", "source_url", v, "must be an http(s) URL"));
            }
            config.grid.source_url = v.to_string();
        }
        if let Some(v) = section.get("reload_count") {
            config.grid.reload_count = v
                .trim()
                .parse()
                .map_err(|_| invalid("grid", "reload_count", v, "expected a whole number"))?;
        }
        if let Some(v) = section.get("columns") {
            config.grid.columns = parse_positive(v, "grid", "columns")?;
        }
        if let Some(v) = section.get("rows") {
            config.grid.rows = parse_positive(v, "grid", "rows")?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

fn parse_positive<T>(value: &str, section: &str, key: &str) -> Result<T, ConfigFileError>
where
    T: FromStr + PartialOrd + Default,
{
    match value.trim().parse::<T>() {
        Ok(n) if n > T::default() => Ok(n),
        _ => Err(invalid(section, key, value, "expected a positive number")),
    }
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<ConfigFile, ConfigFileError> {
        let ini = Ini::load_from_str(content).unwrap();
        parse_ini(&ini)
    }

    #[test]
    fn test_empty_ini_is_default() {
        assert_eq!(parse("").unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_fetch_section() {
        let config = parse("[fetch]\ntimeout = 20\nmax_concurrent = 8\nuser_agent = grid-test\n")
            .unwrap();
        assert_eq!(config.fetch.timeout, 20);
        assert_eq!(config.fetch.max_concurrent, Some(8));
        assert_eq!(config.fetch.user_agent, "grid-test");
    }

    #[test]
    fn test_max_concurrent_auto() {
        let config = parse("[fetch]\nmax_concurrent = auto\n").unwrap();
        assert!(config.fetch.max_concurrent.is_none());
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let err = parse("[fetch]\ntimeout = 0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigFileError::InvalidValue { ref section, ref key, .. }
                if section == "fetch" && key == "timeout"
        ));
    }

    #[test]
    fn test_non_http_source_is_rejected() {
        let err = parse("[grid]\nsource_url = ftp://example.com/a.jpg\n").unwrap_err();
        assert!(err.to_string().contains("grid.source_url"));
    }

    #[test]
    fn test_grid_section() {
        let config = parse("[grid]\nreload_count = 0\ncolumns = 3\nrows = 4\n").unwrap();
        assert_eq!(config.grid.reload_count, 0);
        assert_eq!(config.grid.columns, 3);
        assert_eq!(config.grid.rows, 4);
    }

    #[test]
    fn test_logging_file_expands_tilde() {
        let config = parse("[logging]\nfile = /tmp/photogrid-test.log\n").unwrap();
        assert_eq!(config.logging.file, PathBuf::from("/tmp/photogrid-test.log"));
    }
}
