use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gas_ingest::calculator::{group_sum, month_start, monthly_band, period_over_period};
use gas_ingest::{merge, DashboardConfig, NormalizedSeries, Observation, SpreadCalculator};

fn daily_series(name: &str, days: i64, offset: i64, base: f64) -> NormalizedSeries {
    let start = NaiveDate::from_ymd_opt(2016, 1, 1).unwrap();
    let mut series = NormalizedSeries::new(name, &[name]);
    for day in 0..days {
        // Skip weekends on alternating inputs so the join has real gaps
        if (day + offset) % 7 >= 5 {
            continue;
        }
        let value = base + (day as f64 * 0.01).sin();
        series.push(start + Duration::days(day), vec![Some(value)]).unwrap();
    }
    series
}

fn benchmark_merge(c: &mut Criterion) {
    let henry_hub = daily_series("Henry Hub", 3_000, 0, 3.0);
    let jkm = daily_series("JKM", 3_000, 1, 12.0);
    let ttf = daily_series("TTF (USD)", 3_000, 2, 10.0);

    c.bench_function("merge_three_daily_benchmarks", |b| {
        b.iter(|| black_box(merge(&[&henry_hub, &jkm, &ttf])));
    });
}

fn benchmark_spread(c: &mut Criterion) {
    let config = DashboardConfig::default();
    let hh = daily_series("Henry Hub", 3_000, 0, 3.0);
    let ttf = daily_series("TTF (USD)", 3_000, 0, 10.0);
    let merged = merge(&[&hh, &ttf]);
    let calculator = SpreadCalculator::new(config.spreads[0].clone());

    c.bench_function("hh_ttf_spread_series", |b| {
        b.iter(|| black_box(calculator.calculate(&merged)));
    });
}

fn benchmark_band_and_changes(c: &mut Criterion) {
    let storage = daily_series("Total", 3_000, 0, 3_000.0);

    let basins = ["Marcellus", "Haynesville", "Permian", "Eagle Ford", "Utica", "Woodford"];
    let start = NaiveDate::from_ymd_opt(2016, 1, 1).unwrap();
    let observations: Vec<Observation> = (0..450)
        .flat_map(|week| {
            basins.iter().enumerate().map(move |(i, basin)| {
                Observation::new(start + Duration::weeks(week), *basin, (10 + (week + i as i64) % 40) as f64)
            })
        })
        .collect();

    c.bench_function("monthly_band", |b| {
        b.iter(|| black_box(monthly_band(&storage, "Total")));
    });

    c.bench_function("monthly_rig_changes", |b| {
        b.iter(|| black_box(period_over_period(&group_sum(&observations, month_start))));
    });
}

criterion_group!(benches, benchmark_merge, benchmark_spread, benchmark_band_and_changes);
criterion_main!(benches);
