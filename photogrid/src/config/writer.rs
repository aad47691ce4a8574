//! INI serialization logic for converting `ConfigFile` → INI string.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let max_concurrent = config
        .fetch
        .max_concurrent
        .map(|n| n.to_string())
        .unwrap_or_else(|| "auto".to_string());

    format!(
        r#"[fetch]
; Seconds before a single image request fails with a timeout
timeout = {}
; Maximum simultaneously running fetches ("auto" = one per CPU)
max_concurrent = {}
user_agent = {}

[grid]
; Every new photo record is fetched from this URL
source_url = {}
; Number of records created by a full reload
reload_count = {}
; Page shape in cells
columns = {}
rows = {}

[logging]
file = {}
"#,
        config.fetch.timeout,
        max_concurrent,
        config.fetch.user_agent,
        config.grid.source_url,
        config.grid.reload_count,
        config.grid.columns,
        config.grid.rows,
        path_to_string(&config.logging.file),
    )
}

fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_writes_auto_concurrency() {
        let content = to_config_string(&ConfigFile::default());
        assert!(content.contains("max_concurrent = auto"));
        assert!(content.contains("timeout = 15"));
        assert!(content.contains("[grid]"));
    }

    #[test]
    fn test_explicit_concurrency_is_written() {
        let mut config = ConfigFile::default();
        config.fetch.max_concurrent = Some(12);
        assert!(to_config_string(&config).contains("max_concurrent = 12"));
    }
}
