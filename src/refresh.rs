use anyhow::{Context, Result};
use log::{info, warn};
use std::thread;
use std::time::{Duration, Instant};

/// Run `refresh` once, then again every `interval`. Only the first run may
/// fail the loop; later failures are logged and the previous outputs stay
/// in place. `max_runs` bounds the loop, `None` runs forever.
pub fn watch<F>(interval: Duration, max_runs: Option<usize>, mut refresh: F) -> Result<()>
where
    F: FnMut() -> Result<()>,
{
    refresh().context("initial refresh failed")?;
    let mut runs = 1;

    while max_runs.map_or(true, |max| runs < max) {
        thread::sleep(interval);
        let started = Instant::now();
        match refresh() {
            Ok(()) => info!("Refresh #{} finished in {:.1?}", runs, started.elapsed()),
            Err(e) => warn!("Refresh #{} failed, keeping previous output: {:#}", runs, e),
        }
        runs += 1;
    }
    Ok(())
}
