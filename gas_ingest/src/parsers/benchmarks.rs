use log::info;

use crate::config::{DashboardConfig, SourceConfig};
use crate::data_loader::{Grid, RawTable};
use crate::error::Result;
use crate::locator::FileLocator;
use crate::merger::merge;
use crate::models::{MergedTable, NormalizedSeries};
use crate::parsers::resolve_source;

pub const HENRY_HUB: &str = "Henry Hub";
pub const JKM: &str = "JKM";
pub const TTF_USD: &str = "TTF (USD)";

/// Keep `(date_column, value_column × factor)` pairs that both parse.
pub fn date_value_series(
    table: &RawTable,
    date_column: &str,
    value_column: &str,
    name: &str,
    factor: f64,
) -> Result<NormalizedSeries> {
    let date_idx = table.column_index(date_column)?;
    let value_idx = table.column_index(value_column)?;

    let mut series = NormalizedSeries::new(name, &[name]);
    for record in &table.records {
        if let (Some(date), Some(value)) = (record.get(date_idx).as_date(), record.get(value_idx).as_f64()) {
            series.push(date, vec![Some(value * factor)])?;
        }
    }
    Ok(series.sort_by_date())
}

/// FRED daily Henry Hub export: `observation_date`, `DHHNGSP`.
pub fn parse_henry_hub(table: &RawTable) -> Result<NormalizedSeries> {
    date_value_series(table, "observation_date", "DHHNGSP", HENRY_HUB, 1.0)
}

/// JKM settlement CSV with `Date`, `Price` in USD/MMBtu.
pub fn parse_jkm(table: &RawTable) -> Result<NormalizedSeries> {
    date_value_series(table, "Date", "Price", JKM, 1.0)
}

/// TTF settlement CSV in EUR/MWh, converted to USD/MMBtu by `factor`.
pub fn parse_ttf(table: &RawTable, factor: f64) -> Result<NormalizedSeries> {
    date_value_series(table, "Date", "Price", TTF_USD, factor)
}

/// Reads the three daily benchmarks from the data directory. Missing files
/// become empty series.
pub struct BenchmarkLoader<'a> {
    locator: FileLocator,
    config: &'a DashboardConfig,
}

impl<'a> BenchmarkLoader<'a> {
    pub fn new(config: &'a DashboardConfig) -> Self {
        Self {
            locator: FileLocator::new(&config.data_dir),
            config,
        }
    }

    fn load(
        &self,
        source: &SourceConfig,
        name: &str,
        parse: impl Fn(&RawTable) -> Result<NormalizedSeries>,
    ) -> Result<NormalizedSeries> {
        match resolve_source(&self.locator, source)? {
            Some(path) => {
                let series = parse(&Grid::load_table(&path, source)?)?;
                info!("Loaded {} {} prices from {}", series.len(), name, path.display());
                Ok(series)
            }
            None => Ok(NormalizedSeries::empty(name, &[name])),
        }
    }

    pub fn load_henry_hub(&self) -> Result<NormalizedSeries> {
        self.load(&self.config.sources.henry_hub, HENRY_HUB, parse_henry_hub)
    }

    pub fn load_jkm(&self) -> Result<NormalizedSeries> {
        self.load(&self.config.sources.jkm, JKM, parse_jkm)
    }

    pub fn load_ttf(&self) -> Result<NormalizedSeries> {
        let factor = self.config.conversions.eur_mwh_to_usd_mmbtu();
        self.load(&self.config.sources.ttf, TTF_USD, |table| parse_ttf(table, factor))
    }

    /// Henry Hub, JKM and TTF (USD) on the dates all three report.
    pub fn daily_benchmarks(&self) -> Result<MergedTable> {
        let henry_hub = self.load_henry_hub()?;
        let jkm = self.load_jkm()?;
        let ttf = self.load_ttf()?;
        Ok(merge(&[&henry_hub, &jkm, &ttf]))
    }

    pub fn last_updated(&self) -> Result<String> {
        let sources = &self.config.sources;
        self.locator.last_updated(
            &[
                sources.henry_hub.keyword.as_str(),
                sources.jkm.keyword.as_str(),
                sources.ttf.keyword.as_str(),
            ],
            &[".csv", ".xlsx"],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_loader::{Cell, RawRecord};
    use chrono::NaiveDate;

    fn record(cells: &[&str]) -> RawRecord {
        RawRecord {
            cells: cells.iter().map(|c| Cell::text(c)).collect(),
        }
    }

    #[test]
    fn test_unparseable_dates_are_dropped() {
        let table = RawTable {
            columns: vec!["Date".into(), "Price".into()],
            records: vec![
                record(&["2024-01-02", "12.1"]),
                record(&["garbage", "12.2"]),
                record(&["2024-01-01", "n/a"]),
                record(&["2024-01-01", "11.9"]),
            ],
        };
        let series = parse_jkm(&table).unwrap();
        let dates: Vec<NaiveDate> = series.rows.iter().map(|r| r.date).collect();
        assert_eq!(
            dates,
            vec![NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()]
        );
    }

    #[test]
    fn test_ttf_converted_to_usd_per_mmbtu() {
        let table = RawTable {
            columns: vec!["Date".into(), "Price".into()],
            records: vec![record(&["2024-01-01", "34.12"])],
        };
        let factor = 1.14 / 3.412;
        let series = parse_ttf(&table, factor).unwrap();
        assert_eq!(series.columns, vec![TTF_USD]);
        assert!((series.rows[0].values[0].unwrap() - 11.4).abs() < 1e-9);
    }

    #[test]
    fn test_henry_hub_columns_required() {
        let table = RawTable {
            columns: vec!["Date".into(), "Price".into()],
            records: vec![],
        };
        assert!(parse_henry_hub(&table).is_err());
    }

    #[test]
    fn test_missing_files_give_empty_benchmarks() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = DashboardConfig::default();
        config.data_dir = dir.path().to_path_buf();

        let loader = BenchmarkLoader::new(&config);
        let jkm = loader.load_jkm().unwrap();
        assert!(jkm.is_empty());
        assert_eq!(jkm.columns, vec![JKM]);
        assert!(loader.daily_benchmarks().unwrap().is_empty());
    }

    #[test]
    fn test_csv_benchmarks_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("JKM_daily.csv"), "Date,Price\n2024-01-01,9.5\n2024-01-02,9.8\n").unwrap();
        std::fs::write(dir.path().join("TTF_daily.csv"), "Date,Price\n2024-01-02,34.12\n").unwrap();

        let mut config = DashboardConfig::default();
        config.data_dir = dir.path().to_path_buf();
        let loader = BenchmarkLoader::new(&config);

        let jkm = loader.load_jkm().unwrap();
        let ttf = loader.load_ttf().unwrap();
        assert_eq!(jkm.len(), 2);
        assert_eq!(ttf.len(), 1);

        let merged = merge(&[&jkm, &ttf]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged.columns, vec![JKM, TTF_USD]);
    }
}
