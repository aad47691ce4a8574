//! Fetch command - reload the grid and download every photo.

use std::time::Instant;

use photogrid::config::{ConfigFile, FetchConfig, GridConfig};
use photogrid::fetch::AsyncHttpClient;
use photogrid::grid::{GridSummary, GridUpdate, PhotoGrid, PhotoState};
use photogrid::queue::KeyedFetchQueue;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the fetch command.
pub struct FetchArgs {
    pub count: Option<usize>,
    pub url: Option<String>,
    pub concurrency: Option<usize>,
    pub timeout: Option<u64>,
    pub retries: u32,
    pub debug: bool,
}

/// Run the fetch command.
pub fn run(args: FetchArgs) -> Result<(), CliError> {
    let runner = CliRunner::with_debug(args.debug)?;
    runner.log_startup("fetch");

    let (fetch_config, grid_config) = resolve_configs(&args, runner.config())?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    runtime.block_on(fetch_grid(&runner, fetch_config, grid_config, args.retries))
}

/// Merge command-line overrides onto the config file values.
fn resolve_configs(
    args: &FetchArgs,
    config: &ConfigFile,
) -> Result<(FetchConfig, GridConfig), CliError> {
    let mut fetch_config = config.fetch_config();
    let mut grid_config = config.grid_config();

    if let Some(concurrency) = args.concurrency {
        if concurrency == 0 {
            return Err(CliError::Config("--concurrency must be at least 1".to_string()));
        }
        fetch_config = fetch_config.with_max_concurrent(concurrency);
    }
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err(CliError::Config("--timeout must be at least 1 second".to_string()));
        }
        fetch_config = fetch_config.with_timeout_secs(timeout);
    }
    if let Some(count) = args.count {
        grid_config = grid_config.with_reload_count(count);
    }
    if let Some(url) = &args.url {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(CliError::Config(format!(
                "--url must be an http(s) URL, got '{}'",
                url
            )));
        }
        grid_config = grid_config.with_source_url(url.clone());
    }

    Ok((fetch_config, grid_config))
}

async fn fetch_grid(
    runner: &CliRunner,
    fetch_config: FetchConfig,
    grid_config: GridConfig,
    retries: u32,
) -> Result<(), CliError> {
    let client = runner.create_client(&fetch_config)?;
    let queue = KeyedFetchQueue::new(client, &fetch_config);
    let (mut grid, mut updates) = PhotoGrid::new(queue, grid_config.clone());

    println!("Fetching photos:");
    println!("  Source: {}", grid_config.source_url());
    println!("  Photos: {}", grid_config.reload_count());
    println!(
        "  Concurrency: {} (timeout {}s)",
        fetch_config.max_concurrent(),
        fetch_config.timeout().as_secs()
    );
    println!();

    let start = Instant::now();
    grid.reload_all();

    let mut round = 0;
    let interrupted = loop {
        if wait_until_settled(&mut grid, &mut updates).await {
            break true;
        }

        let failed = grid.summary().failed;
        if failed == 0 || round >= retries {
            break false;
        }

        round += 1;
        println!("Retrying {} failed photo(s) (round {}/{})...", failed, round, retries);
        info!(round = round, failed = failed, "Retrying failed photos");
        grid.retry_failed();
    };

    let elapsed = start.elapsed();
    let summary = grid.summary();

    println!();
    if interrupted {
        println!("Interrupted after {:.2}s", elapsed.as_secs_f64());
    } else {
        println!("Finished in {:.2}s", elapsed.as_secs_f64());
    }
    print_summary(&grid, &summary);
    grid.queue().log_stats();

    if !interrupted && summary.failed > 0 {
        return Err(CliError::Incomplete {
            failed: summary.failed,
            total: summary.total(),
        });
    }

    Ok(())
}

/// Applies updates until every photo is settled.
///
/// Returns true if interrupted by Ctrl-C, in which case every fetch has been
/// cancelled.
async fn wait_until_settled<C: AsyncHttpClient>(
    grid: &mut PhotoGrid<C>,
    updates: &mut UnboundedReceiver<GridUpdate>,
) -> bool {
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    while !grid.is_settled() {
        tokio::select! {
            update = updates.recv() => {
                let Some(update) = update else { break };
                if let Some(key) = grid.apply(update) {
                    if let Some(record) = grid.record(key) {
                        if record.state() == PhotoState::Failed {
                            let reason = record
                                .error()
                                .map(ToString::to_string)
                                .unwrap_or_default();
                            println!("  ✗ {}: {}", key, reason);
                        }
                    }
                }
            }
            _ = &mut ctrl_c => {
                let cancelled = grid.cancel_all();
                warn!(cancelled = cancelled, "Interrupted, cancelled in-flight fetches");
                return true;
            }
        }
    }

    false
}

fn print_summary<C: AsyncHttpClient>(grid: &PhotoGrid<C>, summary: &GridSummary) {
    let layout = grid.layout();
    let stats = grid.queue().stats();

    println!(
        "  Loaded:  {}/{} ({} failed, {} pending)",
        summary.success,
        summary.total(),
        summary.failed,
        summary.new + summary.downloading
    );
    println!(
        "  Pages:   {} of {}x{} ({} cells)",
        layout.page_count(grid.len()),
        layout.columns(),
        layout.rows(),
        grid.slot_count()
    );
    println!(
        "  Queue:   {} submitted, {} deduplicated, {} cancelled, peak {} running",
        stats.submitted, stats.deduplicated, stats.cancelled, stats.peak_running
    );
}
