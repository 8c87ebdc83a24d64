use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;
use std::ops::RangeInclusive;

use crate::calculator::{group_sum, month_start, total_by_category};
use crate::config::FilterConfig;
use crate::data_loader::RawTable;
use crate::error::Result;
use crate::label_mapper::LabelMapper;
use crate::models::{Observation, TradeRecord};
use crate::parsers::text_at;

pub const IMPORTS: &str = "Imports";
pub const EXPORTS: &str = "Exports";
pub const EUROPE: &str = "Europe";
pub const ASIA: &str = "Asia";

/// DOE "By Country Summary" sheet of monthly imports and exports.
pub fn parse_trade(table: &RawTable, filters: &FilterConfig, regions: &LabelMapper) -> Result<Vec<TradeRecord>> {
    let idx = table.column_indexes(&["Transaction Month", "Country", "Activity", "Volume (MMCF)"])?;

    let mut records = Vec::new();
    for (row, record) in table.records.iter().enumerate() {
        let Some(month) = record.get(idx[0]).as_date() else {
            continue;
        };
        if month.year() < filters.min_year {
            continue;
        }
        let (Some(activity), Some(volume)) = (text_at(table, row, idx[2]), record.get(idx[3]).as_f64()) else {
            continue;
        };
        let country = text_at(table, row, idx[1]).unwrap_or_default();

        records.push(TradeRecord {
            month,
            region: regions.map(&country),
            country,
            activity,
            volume_mmcf: volume,
        });
    }
    Ok(records)
}

/// Records in the twelve months ending at the latest transaction month.
pub fn last_12_months(records: &[TradeRecord]) -> Vec<&TradeRecord> {
    let Some(latest) = records.iter().map(|r| r.month).max() else {
        return Vec::new();
    };
    let start = latest.checked_sub_months(Months::new(12)).unwrap_or(latest);
    records.iter().filter(|r| r.month > start && r.month <= latest).collect()
}

fn observations<'a, F>(records: impl IntoIterator<Item = &'a TradeRecord>, category: F) -> Vec<Observation>
where
    F: Fn(&TradeRecord) -> String,
{
    records
        .into_iter()
        .map(|r| Observation::new(r.month, category(r), r.volume_mmcf))
        .collect()
}

/// LTM volume per `(month, activity)` for imports and exports.
pub fn monthly_imports_exports(records: &[TradeRecord]) -> Vec<Observation> {
    let ltm = last_12_months(records)
        .into_iter()
        .filter(|r| r.activity == IMPORTS || r.activity == EXPORTS);
    group_sum(&observations(ltm, |r| r.activity.clone()), month_start)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionVolume {
    pub region: String,
    pub volume_mmcf: f64,
    pub label: String,
}

/// Short bar label: `1.50M`, `2.50K` or `999.00`.
pub fn format_volume(value: f64) -> String {
    if value >= 1_000_000.0 {
        format!("{:.2}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("{:.2}K", value / 1_000.0)
    } else {
        format!("{:.2}", value)
    }
}

/// LTM exports per region, largest first.
pub fn exports_by_region(records: &[TradeRecord]) -> Vec<RegionVolume> {
    let exports = last_12_months(records).into_iter().filter(|r| r.activity == EXPORTS);
    total_by_category(&observations(exports, |r| r.region.clone()))
        .into_iter()
        .map(|(region, volume_mmcf)| RegionVolume {
            label: format_volume(volume_mmcf),
            region,
            volume_mmcf,
        })
        .collect()
}

/// Total exports per calendar year within `years`.
pub fn exports_by_year(records: &[TradeRecord], years: RangeInclusive<i32>) -> Vec<(i32, f64)> {
    let exports = records
        .iter()
        .filter(|r| r.activity == EXPORTS && years.contains(&r.month.year()));
    let year_start = |d: NaiveDate| NaiveDate::from_ymd_opt(d.year(), 1, 1).unwrap_or(d);
    group_sum(&observations(exports, |_| EXPORTS.to_string()), year_start)
        .into_iter()
        .map(|obs| (obs.date.year(), obs.value))
        .collect()
}

/// Monthly exports to Europe and Asia from `since_year` on.
pub fn exports_europe_asia(records: &[TradeRecord], since_year: i32) -> Vec<Observation> {
    let exports = records.iter().filter(|r| {
        r.activity == EXPORTS && r.month.year() >= since_year && (r.region == EUROPE || r.region == ASIA)
    });
    group_sum(&observations(exports, |r| r.region.clone()), |d| d)
}
