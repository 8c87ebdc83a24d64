use anyhow::Result;
use chrono::{Datelike, Local};
use gas_ingest::models::TradeRecord;
use gas_ingest::parsers::trade::{
    exports_by_region, exports_by_year, exports_europe_asia, monthly_imports_exports, parse_trade,
};
use gas_ingest::LabelMapper;
use log::info;
use serde::Serialize;
use std::ops::RangeInclusive;

use crate::output::OutputWriter;
use crate::sources::SourceReader;

/// First year of the Europe vs Asia export comparison.
const EUROPE_ASIA_SINCE: i32 = 2021;

#[derive(Serialize)]
struct YearlyExports {
    year: i32,
    volume_mmcf: f64,
}

/// US imports and exports by month, region and year.
pub fn run(sources: &SourceReader, out: &OutputWriter) -> Result<()> {
    let config = sources.config();
    let filters = &config.filters;

    let table = sources.table_or_empty(&config.sources.trade)?;
    let records = parse_trade(&table, filters, &LabelMapper::regions(filters))?;
    info!("Trade: {} monthly country records", records.len());

    write_tables(&records, filters.min_year..=Local::now().year(), out)?;
    out.write_text("trade_last_updated.txt", &sources.last_updated(&[&config.sources.trade])?)?;
    Ok(())
}

fn write_tables(records: &[TradeRecord], years: RangeInclusive<i32>, out: &OutputWriter) -> Result<()> {
    out.write_observations("trade_monthly_ltm.csv", &monthly_imports_exports(records), "Activity", "Volume (MMCF)")?;
    out.write_records("trade_exports_by_region.csv", &exports_by_region(records))?;

    let yearly: Vec<YearlyExports> = exports_by_year(records, years)
        .into_iter()
        .map(|(year, volume_mmcf)| YearlyExports { year, volume_mmcf })
        .collect();
    out.write_records("trade_exports_by_year.csv", &yearly)?;

    out.write_observations(
        "trade_exports_europe_asia.csv",
        &exports_europe_asia(records, EUROPE_ASIA_SINCE),
        "Region",
        "Volume (MMCF)",
    )?;
    Ok(())
}
