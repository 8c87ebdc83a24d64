use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::calculator::{group_sum, month_start, period_over_period, prior_year_point, year_over_year};
use crate::config::FilterConfig;
use crate::data_loader::RawTable;
use crate::error::{PipelineError, Result};
use crate::label_mapper::LabelMapper;
use crate::models::{Observation, RigRecord, YearlyRigCount};
use crate::parsers::text_at;

/// Baker Hughes "NAM Weekly" sheet, already sliced at its sniffed header.
pub fn parse_rig_weekly(table: RawTable, filters: &FilterConfig, basins: &LabelMapper) -> Result<Vec<RigRecord>> {
    let table = table
        .drop_blank_rows()
        .drop_blank_columns()
        .strip_text()
        .drop_columns(&filters.rig_drop_columns);

    let country = table.column_index("Country")?;
    let drill_for = table.column_index("DrillFor")?;
    let publish_date = table.column_index("US_PublishDate")?;
    let basin = table.column_index("Basin")?;
    let count = table.column_index("Rig Count Value")?;
    let trajectory = table.column_index("Trajectory").ok();
    let well_depth = table.column_index("WellDepth").ok();

    let mut records = Vec::new();
    for (row, record) in table.records.iter().enumerate() {
        let Some(record_country) = text_at(&table, row, country) else {
            continue;
        };
        let Some(record_drill_for) = text_at(&table, row, drill_for) else {
            continue;
        };
        if record_country != filters.country || record_drill_for != filters.drill_for {
            continue;
        }
        let Some(date) = record.get(publish_date).as_date() else {
            continue;
        };
        if date.year() < filters.min_year {
            continue;
        }
        let (Some(raw_basin), Some(rig_count)) = (text_at(&table, row, basin), record.get(count).as_f64()) else {
            continue;
        };

        records.push(RigRecord {
            publish_date: date,
            country: record_country,
            basin: basins.map(&raw_basin),
            drill_for: record_drill_for,
            trajectory: trajectory.and_then(|i| text_at(&table, row, i)),
            well_depth: well_depth.and_then(|i| text_at(&table, row, i)),
            rig_count,
        });
    }
    Ok(records)
}

/// Baker Hughes "NAM Yearly" sheet summed by `(Year, Basin)` over the focus
/// basins.
pub fn parse_rig_yearly(table: RawTable, filters: &FilterConfig, basins: &LabelMapper) -> Result<Vec<YearlyRigCount>> {
    let table = table.drop_blank_rows().drop_blank_columns().strip_text();

    let country = table.column_index("Country")?;
    let drill_for = table.column_index("DrillFor")?;
    let basin = table.column_index("Basin")?;
    let year = table.column_index("Year")?;
    let count = table.column_index("Rig Count Value")?;

    let mut sums: BTreeMap<(i32, String), f64> = BTreeMap::new();
    for (row, record) in table.records.iter().enumerate() {
        if text_at(&table, row, country).as_deref() != Some(filters.country.as_str())
            || text_at(&table, row, drill_for).as_deref() != Some(filters.drill_for.as_str())
        {
            continue;
        }
        let Some(raw_basin) = text_at(&table, row, basin) else {
            continue;
        };
        let canonical = basins.map(&raw_basin);
        if !filters.focus_basins.contains(&canonical) {
            continue;
        }
        let (Some(record_year), Some(rig_count)) = (record.get(year).as_f64(), record.get(count).as_f64()) else {
            continue;
        };
        let record_year = record_year as i32;
        if record_year < filters.min_year {
            continue;
        }
        *sums.entry((record_year, canonical)).or_insert(0.0) += rig_count;
    }

    Ok(sums
        .into_iter()
        .map(|((year, basin), rig_count)| YearlyRigCount { year, basin, rig_count })
        .collect())
}

/// Current-week rig count of one basin with its year-over-year and
/// month-over-month changes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BasinSnapshot {
    pub basin: String,
    pub publish_date: NaiveDate,
    pub rig_count: f64,
    pub prior_year_rig_count: Option<f64>,
    pub yoy_pct: Option<f64>,
    pub mom_pct: Option<f64>,
}

/// Rig records as `(publish date, basin, count)` observations.
pub fn rig_observations(records: &[RigRecord]) -> Vec<Observation> {
    records
        .iter()
        .map(|r| Observation::new(r.publish_date, r.basin.clone(), r.rig_count))
        .collect()
}

/// Snapshot of the latest publish date for each focus basin. YoY compares
/// against the weekly total nearest to one year earlier (within the
/// configured tolerance); MoM compares monthly sums.
pub fn basin_snapshot(records: &[RigRecord], filters: &FilterConfig) -> Result<Vec<BasinSnapshot>> {
    let latest = records
        .iter()
        .map(|r| r.publish_date)
        .max()
        .ok_or_else(|| PipelineError::NoData("weekly rig count".to_string()))?;

    let focus: Vec<RigRecord> = records
        .iter()
        .filter(|r| filters.focus_basins.contains(&r.basin))
        .cloned()
        .collect();
    let observations = rig_observations(&focus);

    let weekly = group_sum(&observations, |d| d);
    let mut weekly_by_basin: BTreeMap<&str, Vec<(NaiveDate, f64)>> = BTreeMap::new();
    for obs in &weekly {
        weekly_by_basin
            .entry(obs.category.as_str())
            .or_default()
            .push((obs.date, obs.value));
    }

    let current_month = month_start(latest);
    let mom: BTreeMap<String, Option<f64>> = period_over_period(&group_sum(&observations, month_start))
        .into_iter()
        .filter(|c| c.date == current_month)
        .map(|c| (c.category, c.pct_change))
        .collect();

    let mut snapshot = Vec::new();
    for (basin, points) in &weekly_by_basin {
        let Some(&(_, rig_count)) = points.iter().find(|(date, _)| *date == latest) else {
            continue;
        };
        let prior = prior_year_point(points, latest, filters.yoy_tolerance_days).map(|(_, v)| v);
        snapshot.push(BasinSnapshot {
            basin: basin.to_string(),
            publish_date: latest,
            rig_count,
            prior_year_rig_count: prior,
            yoy_pct: year_over_year(points, latest, rig_count, filters.yoy_tolerance_days),
            mom_pct: mom.get(*basin).copied().flatten(),
        });
    }
    Ok(snapshot)
}
