use anyhow::Result;
use gas_ingest::calculator::scale;
use gas_ingest::parsers::benchmarks::BenchmarkLoader;
use gas_ingest::{DashboardConfig, NormalizedSeries, SpreadCalculator};
use log::info;

use crate::output::OutputWriter;

/// Daily benchmark prices, one spread table per configured pair and the
/// last-updated stamp of the price files.
pub fn run(config: &DashboardConfig, out: &OutputWriter) -> Result<()> {
    let loader = BenchmarkLoader::new(config);

    let daily = loader.daily_benchmarks()?;
    info!(
        "Benchmarks: {} complete days ({:?} to {:?})",
        daily.len(),
        daily.first_date(),
        daily.last_date()
    );
    out.write_series("benchmarks_daily.csv", &daily)?;
    out.write_series(
        "benchmarks_daily_per_therm.csv",
        &per_therm(&daily, config.conversions.therms_per_mmbtu)?,
    )?;

    for spread in &config.spreads {
        let table = SpreadCalculator::new(spread.clone()).calculate(&daily)?;
        out.write_series(&format!("benchmarks_spread_{}.csv", file_slug(&spread.name)), &table)?;
    }

    out.write_text("benchmarks_last_updated.txt", &loader.last_updated()?)?;
    Ok(())
}

/// USD/MMBtu prices restated in USD/therm.
fn per_therm(daily: &NormalizedSeries, therms_per_mmbtu: f64) -> Result<NormalizedSeries> {
    let mut scaled = daily.clone();
    for column in &daily.columns {
        scaled = scale(&scaled, column, 1.0 / therms_per_mmbtu)?;
    }
    Ok(scaled)
}

/// `"HH-TTF"` -> `"hh_ttf"`.
pub fn file_slug(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_page_from_local_csv_files() {
        let data = tempfile::tempdir().unwrap();
        fs::write(
            data.path().join("HenryHub_daily.csv"),
            "observation_date,DHHNGSP\n2024-01-01,2.00\n2024-01-02,2.10\n",
        )
        .unwrap();
        fs::write(data.path().join("JKM_daily.csv"), "Date,Price\n2024-01-01,9.5\n2024-01-02,9.8\n").unwrap();
        fs::write(data.path().join("TTF_daily.csv"), "Date,Price\n2024-01-01,29.93\n").unwrap();

        let mut config = DashboardConfig::default();
        config.data_dir = data.path().to_path_buf();
        config.sources.henry_hub.extension = ".csv".to_string();
        config.sources.henry_hub.sheet = None;

        let out_dir = tempfile::tempdir().unwrap();
        let out = OutputWriter::new(out_dir.path()).unwrap();
        run(&config, &out).unwrap();

        let daily = fs::read_to_string(out_dir.path().join("benchmarks_daily.csv")).unwrap();
        let lines: Vec<&str> = daily.lines().collect();
        assert_eq!(lines[0], "Date,Henry Hub,JKM,TTF (USD)");
        assert_eq!(lines.len(), 2, "only 2024-01-01 has all three prices");

        let spread = fs::read_to_string(out_dir.path().join("benchmarks_spread_hh_ttf.csv")).unwrap();
        assert!(spread.starts_with("Date,Henry Hub,TTF (USD),Spread,Variable Cost Spread,Full Cost Spread\n"));

        let therms = fs::read_to_string(out_dir.path().join("benchmarks_daily_per_therm.csv")).unwrap();
        assert!(therms.lines().nth(1).unwrap().starts_with("2024-01-01,0.2,"));

        let stamp = fs::read_to_string(out_dir.path().join("benchmarks_last_updated.txt")).unwrap();
        assert!(stamp.starts_with("Last updated: "));
    }

    #[test]
    fn test_slug() {
        assert_eq!(file_slug("HH-JKM"), "hh_jkm");
    }
}
