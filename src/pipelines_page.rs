use anyhow::Result;
use gas_ingest::models::PipelineProject;
use gas_ingest::parsers::pipeline_projects::{
    capacity_by_year, cumulative_capacity_by_type, filter_options, parse_pipeline_projects, ProjectFilter,
};
use log::info;
use serde::Serialize;

use crate::output::OutputWriter;
use crate::sources::SourceReader;

#[derive(Serialize)]
struct FilterOptionRow<'a> {
    filter: &'a str,
    value: String,
}

/// LNG-serving pipeline projects with their capacity aggregates.
pub fn run(sources: &SourceReader, filter: &ProjectFilter, out: &OutputWriter) -> Result<()> {
    let config = sources.config();
    let table = sources.table_or_empty(&config.sources.pipeline_projects)?;
    let projects = parse_pipeline_projects(&table, &config.filters.demand_served)?;
    info!("Pipelines: {} projects serving {}", projects.len(), config.filters.demand_served);

    write_tables(&projects, filter, out)?;
    out.write_text(
        "pipelines_last_updated.txt",
        &sources.last_updated(&[&config.sources.pipeline_projects])?,
    )?;
    Ok(())
}

fn write_tables(projects: &[PipelineProject], filter: &ProjectFilter, out: &OutputWriter) -> Result<()> {
    let selected: Vec<PipelineProject> = filter.apply(projects).into_iter().cloned().collect();
    out.write_records("pipelines_projects.csv", &selected)?;

    out.write_observations("pipelines_capacity_by_year.csv", &capacity_by_year(&selected), "Series", "Capacity (MMcf/d)")?;
    out.write_observations(
        "pipelines_cumulative_capacity.csv",
        &cumulative_capacity_by_type(&selected),
        "Project Type",
        "Cumulative Capacity (MMcf/d)",
    )?;

    // Options always come from the unfiltered set.
    let options = filter_options(projects);
    let mut rows: Vec<FilterOptionRow> = Vec::new();
    rows.extend(options.statuses.into_iter().map(|value| FilterOptionRow { filter: "status", value }));
    rows.extend(options.states.into_iter().map(|value| FilterOptionRow { filter: "state", value }));
    rows.extend(options.years.into_iter().map(|y| FilterOptionRow { filter: "year_in_service", value: y.to_string() }));
    rows.extend(options.project_types.into_iter().map(|value| FilterOptionRow { filter: "project_type", value }));
    out.write_records("pipelines_filter_options.csv", &rows)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn project(name: &str, status: &str, year: i32, capacity: f64) -> PipelineProject {
        PipelineProject {
            last_updated: None,
            project_name: name.to_string(),
            operator: "Operator".to_string(),
            project_type: "Expansion".to_string(),
            status: status.to_string(),
            year_in_service: Some(year),
            states: "TX".to_string(),
            capacity_mmcfd: Some(capacity),
            notes: String::new(),
            demand_served: "LNG".to_string(),
        }
    }

    #[test]
    fn test_filtered_tables_keep_full_options() {
        let projects = vec![
            project("A", "Completed", 2023, 500.0),
            project("B", "Announced", 2026, 1200.0),
        ];
        let mut filter = ProjectFilter::default();
        filter.statuses.insert("Completed".to_string());

        let dir = tempfile::tempdir().unwrap();
        let out = OutputWriter::new(dir.path()).unwrap();
        write_tables(&projects, &filter, &out).unwrap();

        let table = fs::read_to_string(dir.path().join("pipelines_projects.csv")).unwrap();
        assert_eq!(table.lines().count(), 2);
        assert!(table.contains(",A,"));

        let by_year = fs::read_to_string(dir.path().join("pipelines_capacity_by_year.csv")).unwrap();
        assert!(by_year.lines().nth(1).unwrap().starts_with("2023-01-01,Total,500"));

        let options = fs::read_to_string(dir.path().join("pipelines_filter_options.csv")).unwrap();
        assert!(options.contains("status,Announced"));
        assert!(options.contains("year_in_service,2026"));
    }
}
