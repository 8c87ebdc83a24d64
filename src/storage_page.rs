use anyhow::Result;
use gas_ingest::parsers::storage::{parse_eu_storage, parse_us_storage};
use gas_ingest::DerivedSeries;
use log::info;

use crate::output::OutputWriter;
use crate::sources::SourceReader;

/// US storage against its published band and the EU total against a band
/// built from its own history.
pub fn run(sources: &SourceReader, out: &OutputWriter) -> Result<()> {
    let config = sources.config();

    let us_table = sources.table_or_empty(&config.sources.us_storage)?;
    let us = parse_us_storage(&us_table, config.filters.min_year)?;
    info!("US storage: {} months", us.len());

    let eu_table = sources.table_or_empty(&config.sources.eu_storage)?;
    let eu = parse_eu_storage(&eu_table, config.conversions.bcf_per_mcm)?;
    info!("EU storage: {} months", eu.len());

    write_tables(&us, &eu, out)?;
    out.write_text(
        "storage_last_updated.txt",
        &sources.last_updated(&[&config.sources.us_storage, &config.sources.eu_storage])?,
    )?;
    Ok(())
}

fn write_tables(us: &DerivedSeries, eu: &DerivedSeries, out: &OutputWriter) -> Result<()> {
    out.write_series("storage_us.csv", us)?;
    out.write_series("storage_eu.csv", eu)?;
    Ok(())
}
