use chrono::NaiveDate;
use log::debug;
use std::collections::{BTreeMap, BTreeSet};

use crate::models::{MergedTable, NormalizedSeries, SeriesRow};

/// Outer-join `series` on `Date`, then drop every row with a missing value
/// in any contributing column. The surviving dates are those where all
/// inputs have complete rows, so the join order does not matter.
///
/// Duplicate dates inside one input collapse to their last row. A column
/// name already taken by an earlier input gets the input's name appended.
pub fn merge(series: &[&NormalizedSeries]) -> MergedTable {
    let name = series
        .iter()
        .map(|s| s.name.as_str())
        .collect::<Vec<_>>()
        .join(" + ");

    let mut columns: Vec<String> = Vec::new();
    for s in series {
        for column in &s.columns {
            let label = if columns.contains(column) {
                format!("{} ({})", column, s.name)
            } else {
                column.clone()
            };
            columns.push(label);
        }
    }

    let indexed: Vec<BTreeMap<NaiveDate, &SeriesRow>> = series
        .iter()
        .map(|s| s.rows.iter().map(|r| (r.date, r)).collect())
        .collect();

    let all_dates: BTreeSet<NaiveDate> = indexed.iter().flat_map(|m| m.keys().copied()).collect();

    let mut rows = Vec::new();
    for date in all_dates {
        let mut values = Vec::with_capacity(columns.len());
        for (input, index) in series.iter().zip(&indexed) {
            match index.get(&date) {
                Some(row) => values.extend(row.values.iter().copied()),
                None => values.extend(std::iter::repeat(None).take(input.columns.len())),
            }
        }
        rows.push(SeriesRow { date, values });
    }

    let outer = NormalizedSeries { name, columns, rows };
    let outer_len = outer.len();
    let merged = outer.drop_missing();
    debug!(
        "Merged {} series: {} outer rows, {} complete",
        series.len(),
        outer_len,
        merged.len()
    );
    merged
}
