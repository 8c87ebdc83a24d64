use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::SpreadConfig;
use crate::error::Result;
use crate::models::{DerivedSeries, NormalizedSeries, Observation};

pub const BAND_AVG: &str = "5-Year Avg";
pub const BAND_HIGH: &str = "5-Year High";
pub const BAND_LOW: &str = "5-Year Low";

/// `(current - previous) / previous * 100`, undefined for a zero or
/// non-finite base.
pub fn percent_change(current: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 || !previous.is_finite() || !current.is_finite() {
        return None;
    }
    Some((current - previous) / previous * 100.0)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodChange {
    pub date: NaiveDate,
    pub category: String,
    pub value: f64,
    pub pct_change: Option<f64>,
}

/// Percent change against the preceding period of the same category. The
/// first period of every category has no value.
pub fn period_over_period(observations: &[Observation]) -> Vec<PeriodChange> {
    let mut groups: BTreeMap<&str, Vec<&Observation>> = BTreeMap::new();
    for obs in observations {
        groups.entry(obs.category.as_str()).or_default().push(obs);
    }

    let mut changes = Vec::with_capacity(observations.len());
    for (_, mut group) in groups {
        group.sort_by_key(|o| o.date);
        let mut previous: Option<f64> = None;
        for obs in group {
            changes.push(PeriodChange {
                date: obs.date,
                category: obs.category.clone(),
                value: obs.value,
                pct_change: previous.and_then(|p| percent_change(obs.value, p)),
            });
            previous = Some(obs.value);
        }
    }
    changes
}

pub fn one_year_before(date: NaiveDate) -> NaiveDate {
    date.checked_sub_months(Months::new(12)).unwrap_or(date)
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Point closest to `target`, as long as it lies within `tolerance_days`.
/// Ties go to the earlier point.
pub fn nearest_within(points: &[(NaiveDate, f64)], target: NaiveDate, tolerance_days: i64) -> Option<(NaiveDate, f64)> {
    points
        .iter()
        .map(|&(date, value)| ((date - target).num_days().abs(), date, value))
        .filter(|(distance, _, _)| *distance <= tolerance_days)
        .min_by_key(|(distance, date, _)| (*distance, *date))
        .map(|(_, date, value)| (date, value))
}

/// Matching point roughly one year before `date`.
pub fn prior_year_point(points: &[(NaiveDate, f64)], date: NaiveDate, tolerance_days: i64) -> Option<(NaiveDate, f64)> {
    nearest_within(points, one_year_before(date), tolerance_days)
}

/// Year-over-year percent change of `value` observed at `date`.
pub fn year_over_year(points: &[(NaiveDate, f64)], date: NaiveDate, value: f64, tolerance_days: i64) -> Option<f64> {
    prior_year_point(points, date, tolerance_days).and_then(|(_, prior)| percent_change(value, prior))
}

/// Attach per-calendar-month mean, max and min of `column`, computed over
/// the full history of the series.
pub fn monthly_band(series: &NormalizedSeries, column: &str) -> Result<DerivedSeries> {
    let idx = series.column_index(column)?;

    let mut by_month: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for row in &series.rows {
        if let Some(value) = row.values[idx] {
            by_month.entry(row.date.month()).or_default().push(value);
        }
    }

    let stats: BTreeMap<u32, (f64, f64, f64)> = by_month
        .into_iter()
        .map(|(month, values)| {
            let avg = values.iter().sum::<f64>() / values.len() as f64;
            let high = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let low = values.iter().copied().fold(f64::INFINITY, f64::min);
            (month, (avg, high, low))
        })
        .collect();

    let lookup = |pick: fn(&(f64, f64, f64)) -> f64| -> Vec<Option<f64>> {
        series
            .rows
            .iter()
            .map(|r| stats.get(&r.date.month()).map(pick))
            .collect()
    };
    let avg = lookup(|s| s.0);
    let high = lookup(|s| s.1);
    let low = lookup(|s| s.2);

    series
        .clone()
        .with_column(BAND_AVG, avg)?
        .with_column(BAND_HIGH, high)?
        .with_column(BAND_LOW, low)
}

/// Running total per category in ascending date order.
pub fn cumulative_by_category(observations: &[Observation]) -> Vec<Observation> {
    let mut sorted: Vec<&Observation> = observations.iter().collect();
    sorted.sort_by(|a, b| a.category.cmp(&b.category).then(a.date.cmp(&b.date)));

    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    sorted
        .into_iter()
        .map(|obs| {
            let total = totals.entry(obs.category.as_str()).or_insert(0.0);
            *total += obs.value;
            Observation::new(obs.date, obs.category.clone(), *total)
        })
        .collect()
}

/// Sum values by `(period(date), category)`, sorted by period then category.
pub fn group_sum(observations: &[Observation], period: impl Fn(NaiveDate) -> NaiveDate) -> Vec<Observation> {
    let mut sums: BTreeMap<(NaiveDate, &str), f64> = BTreeMap::new();
    for obs in observations {
        *sums.entry((period(obs.date), obs.category.as_str())).or_insert(0.0) += obs.value;
    }
    sums.into_iter()
        .map(|((date, category), value)| Observation::new(date, category, value))
        .collect()
}

/// Sum values by category alone, largest first.
pub fn total_by_category(observations: &[Observation]) -> Vec<(String, f64)> {
    let mut sums: BTreeMap<&str, f64> = BTreeMap::new();
    for obs in observations {
        *sums.entry(obs.category.as_str()).or_insert(0.0) += obs.value;
    }
    let mut totals: Vec<(String, f64)> = sums.into_iter().map(|(c, v)| (c.to_string(), v)).collect();
    totals.sort_by(|a, b| b.1.total_cmp(&a.1));
    totals
}

/// Multiply one column by a fixed factor.
pub fn scale(series: &NormalizedSeries, column: &str, factor: f64) -> Result<NormalizedSeries> {
    let idx = series.column_index(column)?;
    let mut scaled = series.clone();
    for row in &mut scaled.rows {
        row.values[idx] = row.values[idx].map(|v| v * factor);
    }
    Ok(scaled)
}

/// Wide to long: every non-missing cell becomes one observation whose
/// category is the column name.
pub fn melt(series: &NormalizedSeries) -> Vec<Observation> {
    let mut long = Vec::with_capacity(series.rows.len() * series.columns.len());
    for (idx, column) in series.columns.iter().enumerate() {
        for row in &series.rows {
            if let Some(value) = row.values[idx] {
                long.push(Observation::new(row.date, column.clone(), value));
            }
        }
    }
    long
}

pub const SPREAD: &str = "Spread";
pub const VARIABLE_COST_SPREAD: &str = "Variable Cost Spread";
pub const FULL_COST_SPREAD: &str = "Full Cost Spread";

/// Price differential between two benchmarks net of transport costs.
pub struct SpreadCalculator {
    config: SpreadConfig,
}

impl SpreadCalculator {
    pub fn new(config: SpreadConfig) -> Self {
        Self { config }
    }

    pub fn spread(&self, origin: f64, destination: f64) -> f64 {
        destination - origin
    }

    /// Destination minus marked-up origin, shipping and regasification.
    pub fn variable_cost_spread(&self, origin: f64, destination: f64) -> f64 {
        destination - origin * self.config.markup - self.config.shipping - self.config.regasification
    }

    /// Variable-cost spread minus liquefaction.
    pub fn full_cost_spread(&self, origin: f64, destination: f64) -> f64 {
        self.variable_cost_spread(origin, destination) - self.config.liquefaction
    }

    /// Spread table over the dates where both prices are present.
    pub fn calculate(&self, prices: &NormalizedSeries) -> Result<DerivedSeries> {
        let origin_idx = prices.column_index(&self.config.origin)?;
        let destination_idx = prices.column_index(&self.config.destination)?;

        let mut result = NormalizedSeries::new(
            self.config.name.clone(),
            &[
                self.config.origin.as_str(),
                self.config.destination.as_str(),
                SPREAD,
                VARIABLE_COST_SPREAD,
                FULL_COST_SPREAD,
            ],
        );

        for row in &prices.rows {
            if let (Some(origin), Some(destination)) = (row.values[origin_idx], row.values[destination_idx]) {
                result.push(
                    row.date,
                    vec![
                        Some(origin),
                        Some(destination),
                        Some(self.spread(origin, destination)),
                        Some(self.variable_cost_spread(origin, destination)),
                        Some(self.full_cost_spread(origin, destination)),
                    ],
                )?;
            }
        }

        Ok(result.sort_by_date())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn hh_ttf_config() -> SpreadConfig {
        SpreadConfig {
            name: "HH-TTF".to_string(),
            origin: "Henry Hub".to_string(),
            destination: "TTF (USD)".to_string(),
            markup: 1.15,
            shipping: 0.70,
            regasification: 0.35,
            liquefaction: 2.50,
        }
    }

    #[test]
    fn test_spread_with_costs() {
        let mut prices = NormalizedSeries::new("benchmarks", &["Henry Hub", "TTF (USD)"]);
        prices.push(d(2024, 1, 1), vec![Some(2.00), Some(10.00)]).unwrap();
        prices.push(d(2024, 1, 2), vec![Some(2.10), None]).unwrap();

        let spreads = SpreadCalculator::new(hh_ttf_config()).calculate(&prices).unwrap();
        assert_eq!(spreads.len(), 1);

        let row = &spreads.rows[0];
        let spread = row.values[spreads.column_index(SPREAD).unwrap()].unwrap();
        let variable = row.values[spreads.column_index(VARIABLE_COST_SPREAD).unwrap()].unwrap();
        let full = row.values[spreads.column_index(FULL_COST_SPREAD).unwrap()].unwrap();
        assert!((spread - 8.00).abs() < 1e-9);
        assert!((variable - 6.65).abs() < 1e-9);
        assert!((full - 4.15).abs() < 1e-9);
    }

    #[test]
    fn test_weekly_rig_change() {
        let obs = vec![
            Observation::new(d(2024, 1, 12), "A", 7.0),
            Observation::new(d(2024, 1, 5), "A", 5.0),
        ];
        let changes = period_over_period(&obs);
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].date, d(2024, 1, 5));
        assert_eq!(changes[0].pct_change, None);
        assert!((changes[1].pct_change.unwrap() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_first_period_of_each_group_has_no_change() {
        let obs = vec![
            Observation::new(d(2024, 1, 1), "Permian", 100.0),
            Observation::new(d(2024, 2, 1), "Permian", 110.0),
            Observation::new(d(2024, 2, 1), "Utica", 10.0),
            Observation::new(d(2024, 3, 1), "Utica", 0.0),
            Observation::new(d(2024, 4, 1), "Utica", 5.0),
        ];
        let changes = period_over_period(&obs);

        for category in ["Permian", "Utica"] {
            let first = changes
                .iter()
                .filter(|c| c.category == category)
                .min_by_key(|c| c.date)
                .unwrap();
            assert_eq!(first.pct_change, None);
        }
        let utica_april = changes
            .iter()
            .find(|c| c.category == "Utica" && c.date == d(2024, 4, 1))
            .unwrap();
        assert_eq!(utica_april.pct_change, None);
    }

    #[test]
    fn test_year_over_year_tolerance() {
        let points = vec![(d(2023, 1, 6), 50.0), (d(2023, 1, 13), 52.0)];

        // 2024-01-05 minus a year is 2023-01-05; 2023-01-06 is one day off
        let yoy = year_over_year(&points, d(2024, 1, 5), 55.0, 3).unwrap();
        assert!((yoy - 10.0).abs() < 1e-9);

        // nothing within three days of 2023-01-20
        assert_eq!(year_over_year(&points, d(2024, 1, 20), 55.0, 3), None);
    }

    #[test]
    fn test_one_year_before_leap_day() {
        assert_eq!(one_year_before(d(2024, 2, 29)), d(2023, 2, 28));
    }

    #[test]
    fn test_monthly_band_bounds() {
        let mut series = NormalizedSeries::new("storage", &["Total"]);
        let values = [(2021, 1, 80.0), (2022, 1, 60.0), (2023, 1, 70.0), (2022, 7, 40.0), (2023, 7, 50.0)];
        for (y, m, v) in values {
            series.push(d(y, m, 1), vec![Some(v)]).unwrap();
        }

        let banded = monthly_band(&series, "Total").unwrap();
        let total = banded.column_index("Total").unwrap();
        let avg = banded.column_index(BAND_AVG).unwrap();
        let high = banded.column_index(BAND_HIGH).unwrap();
        let low = banded.column_index(BAND_LOW).unwrap();

        for row in &banded.rows {
            let v = row.values[total].unwrap();
            let (a, h, l) = (row.values[avg].unwrap(), row.values[high].unwrap(), row.values[low].unwrap());
            assert!(l <= v && v <= h);
            assert!(l <= a && a <= h);
        }

        let january = &banded.rows[0];
        assert_eq!(january.values[avg], Some(70.0));
        assert_eq!(january.values[high], Some(80.0));
        assert_eq!(january.values[low], Some(60.0));
    }

    #[test]
    fn test_cumulative_by_category() {
        let obs = vec![
            Observation::new(d(2026, 1, 1), "Expansion", 300.0),
            Observation::new(d(2025, 1, 1), "Expansion", 100.0),
            Observation::new(d(2025, 1, 1), "New Pipeline", 50.0),
        ];
        let cumulative = cumulative_by_category(&obs);
        assert_eq!(
            cumulative,
            vec![
                Observation::new(d(2025, 1, 1), "Expansion", 100.0),
                Observation::new(d(2026, 1, 1), "Expansion", 400.0),
                Observation::new(d(2025, 1, 1), "New Pipeline", 50.0),
            ]
        );
    }

    #[test]
    fn test_scale_round_trip() {
        let mut series = NormalizedSeries::new("eu", &["Total"]);
        series.push(d(2024, 1, 1), vec![Some(1234.5)]).unwrap();
        series.push(d(2024, 2, 1), vec![None]).unwrap();

        let k = 0.0353147;
        let back = scale(&scale(&series, "Total", k).unwrap(), "Total", 1.0 / k).unwrap();
        assert!((back.rows[0].values[0].unwrap() - 1234.5).abs() < 1e-9);
        assert_eq!(back.rows[1].values[0], None);
    }

    #[test]
    fn test_group_sum_by_month_and_melt() {
        let obs = vec![
            Observation::new(d(2024, 1, 5), "Permian", 3.0),
            Observation::new(d(2024, 1, 12), "Permian", 4.0),
            Observation::new(d(2024, 2, 2), "Permian", 5.0),
        ];
        let monthly = group_sum(&obs, month_start);
        assert_eq!(monthly[0], Observation::new(d(2024, 1, 1), "Permian", 7.0));
        assert_eq!(monthly[1], Observation::new(d(2024, 2, 1), "Permian", 5.0));

        let mut wide = NormalizedSeries::new("production", &["Permian", "Utica"]);
        wide.push(d(2024, 1, 1), vec![Some(20.0), None]).unwrap();
        let long = melt(&wide);
        assert_eq!(long, vec![Observation::new(d(2024, 1, 1), "Permian", 20.0)]);
    }
}
