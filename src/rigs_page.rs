use anyhow::Result;
use gas_ingest::models::{RigRecord, YearlyRigCount};
use gas_ingest::parsers::production::{parse_production, production_long, yoy_production_change};
use gas_ingest::parsers::rigs::{basin_snapshot, parse_rig_weekly, parse_rig_yearly};
use gas_ingest::{FilterConfig, Grid, LabelMapper, NormalizedSeries};
use log::{info, warn};
use serde::Serialize;

use crate::output::OutputWriter;
use crate::sources::SourceReader;

#[derive(Serialize)]
struct ProductionChange {
    basin: String,
    yoy_change_bcfd: f64,
    label: String,
}

/// Rig counts by basin and dry shale production by formation.
pub fn run(sources: &SourceReader, out: &OutputWriter) -> Result<()> {
    let config = sources.config();
    let filters = &config.filters;
    let basins = LabelMapper::basins(filters);

    // Weekly and yearly sheets share one workbook; fetch it once.
    let Some(workbook) = sources.path(&config.sources.rig_weekly)? else {
        warn!("Rig count workbook unavailable, skipping rig tables");
        return Ok(());
    };
    let weekly = parse_rig_weekly(Grid::load_table(&workbook, &config.sources.rig_weekly)?, filters, &basins)?;
    let yearly = parse_rig_yearly(Grid::load_table(&workbook, &config.sources.rig_yearly)?, filters, &basins)?;
    info!("Rigs: {} weekly records, {} basin-years", weekly.len(), yearly.len());

    let production_table = sources.table_or_empty(&config.sources.production)?;
    let production = parse_production(&production_table, filters)?;

    write_tables(&weekly, &yearly, &production, filters, out)?;
    out.write_text(
        "rigs_last_updated.txt",
        &sources.last_updated(&[&config.sources.rig_weekly, &config.sources.production])?,
    )?;
    Ok(())
}

fn write_tables(
    weekly: &[RigRecord],
    yearly: &[YearlyRigCount],
    production: &NormalizedSeries,
    filters: &FilterConfig,
    out: &OutputWriter,
) -> Result<()> {
    out.write_records("rigs_yearly_by_basin.csv", yearly)?;
    out.write_records("rigs_current_week.csv", &basin_snapshot(weekly, filters)?)?;

    out.write_observations(
        "rigs_production_long.csv",
        &production_long(production),
        "Basin",
        "Production (Bcf/d)",
    )?;

    let changes: Vec<ProductionChange> = yoy_production_change(production, filters.production_yoy_tolerance_days)?
        .into_iter()
        .map(|(basin, change)| ProductionChange {
            label: format!("{:.2} BCF/d", change),
            basin,
            yoy_change_bcfd: change,
        })
        .collect();
    out.write_records("rigs_production_yoy_change.csv", &changes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::fs;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn rig(date: NaiveDate, basin: &str, count: f64) -> RigRecord {
        RigRecord {
            publish_date: date,
            country: "UNITED STATES".to_string(),
            basin: basin.to_string(),
            drill_for: "Gas".to_string(),
            trajectory: None,
            well_depth: None,
            rig_count: count,
        }
    }

    fn production(months: &[(NaiveDate, f64, f64)]) -> NormalizedSeries {
        let mut series = NormalizedSeries::new("production", &["Haynesville", "Permian"]);
        for &(date, haynesville, permian) in months {
            series.push(date, vec![Some(haynesville), Some(permian)]).unwrap();
        }
        series
    }

    #[test]
    fn test_rig_and_production_tables() {
        let weekly = vec![rig(d(2023, 1, 6), "Haynesville", 10.0), rig(d(2024, 1, 5), "Haynesville", 15.0)];
        let yearly = vec![YearlyRigCount { year: 2023, basin: "Haynesville".into(), rig_count: 12.0 }];
        let production = production(&[(d(2023, 1, 1), 14.0, 0.0), (d(2024, 1, 1), 15.5, 0.0)]);

        let dir = tempfile::tempdir().unwrap();
        let out = OutputWriter::new(dir.path()).unwrap();
        write_tables(&weekly, &yearly, &production, &FilterConfig::default(), &out).unwrap();

        let yearly = fs::read_to_string(dir.path().join("rigs_yearly_by_basin.csv")).unwrap();
        assert_eq!(yearly, "year,basin,rig_count\n2023,Haynesville,12.0\n");

        let snapshot = fs::read_to_string(dir.path().join("rigs_current_week.csv")).unwrap();
        let lines: Vec<&str> = snapshot.lines().collect();
        assert_eq!(lines[0], "basin,publish_date,rig_count,prior_year_rig_count,yoy_pct,mom_pct");
        assert!(lines[1].starts_with("Haynesville,2024-01-05,15.0,10.0,50.0"));

        // Zero production is left out of the long table.
        let long = fs::read_to_string(dir.path().join("rigs_production_long.csv")).unwrap();
        assert_eq!(long.lines().count(), 3);
        assert!(long.starts_with("Date,Basin,Production (Bcf/d)\n"));
        assert!(!long.contains("Permian"));

        let changes = fs::read_to_string(dir.path().join("rigs_production_yoy_change.csv")).unwrap();
        assert!(changes.contains("Haynesville,1.5,1.50 BCF/d"));
        assert!(changes.contains("Permian,0.0,0.00 BCF/d"));
    }

    #[test]
    fn test_missing_prior_year_publishes_nothing() {
        let weekly = vec![rig(d(2024, 1, 5), "Haynesville", 15.0)];
        let production = production(&[(d(2024, 1, 1), 15.5, 0.0)]);

        let dir = tempfile::tempdir().unwrap();
        let out = OutputWriter::new(dir.path()).unwrap();
        let result = out.publish(|staged| write_tables(&weekly, &[], &production, &FilterConfig::default(), staged));

        assert!(result.is_err());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
