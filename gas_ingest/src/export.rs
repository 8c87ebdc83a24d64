use log::info;
use polars::prelude::*;
use std::io::Write;

use crate::error::Result;
use crate::models::{NormalizedSeries, Observation};

impl NormalizedSeries {
    /// `Date` as ISO text followed by one nullable Float64 column per value
    /// column.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let dates: Vec<String> = self
            .rows
            .iter()
            .map(|r| r.date.format("%Y-%m-%d").to_string())
            .collect();

        let mut columns = Vec::with_capacity(self.columns.len() + 1);
        columns.push(Series::new("Date".into(), dates));
        for (idx, name) in self.columns.iter().enumerate() {
            let values: Vec<Option<f64>> = self.rows.iter().map(|r| r.values[idx]).collect();
            columns.push(Series::new(name.as_str().into(), values));
        }

        Ok(DataFrame::new(columns)?)
    }
}

/// Long-format table with `Date`, the category column and the value column.
pub fn observations_to_dataframe(observations: &[Observation], category: &str, value: &str) -> Result<DataFrame> {
    let dates: Vec<String> = observations
        .iter()
        .map(|o| o.date.format("%Y-%m-%d").to_string())
        .collect();
    let categories: Vec<&str> = observations.iter().map(|o| o.category.as_str()).collect();
    let values: Vec<f64> = observations.iter().map(|o| o.value).collect();

    Ok(DataFrame::new(vec![
        Series::new("Date".into(), dates),
        Series::new(category.into(), categories),
        Series::new(value.into(), values),
    ])?)
}

/// Write `df` as CSV with a header row.
pub fn write_csv<W: Write>(df: &mut DataFrame, writer: W) -> Result<()> {
    CsvWriter::new(writer).include_header(true).finish(df)?;
    info!("Wrote {} rows x {} columns", df.height(), df.width());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_series_to_csv() {
        let mut series = NormalizedSeries::new("benchmarks", &["Henry Hub", "JKM"]);
        series.push(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), vec![Some(2.5), None]).unwrap();

        let mut df = series.to_dataframe().unwrap();
        assert_eq!(df.shape(), (1, 3));

        let mut buffer = Vec::new();
        write_csv(&mut df, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Date,Henry Hub,JKM"));
        assert_eq!(lines.next(), Some("2024-01-01,2.5,"));
    }

    #[test]
    fn test_observations_to_dataframe() {
        let obs = vec![Observation::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), "Permian", 20.0)];
        let df = observations_to_dataframe(&obs, "Basin", "Production (Bcf/d)").unwrap();
        assert_eq!(df.get_column_names().len(), 3);
        assert_eq!(df.height(), 1);
    }
}
