use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

use crate::calculator::cumulative_by_category;
use crate::data_loader::RawTable;
use crate::error::Result;
use crate::models::{Observation, PipelineProject};
use crate::parsers::text_at;

const KEPT_COLUMNS: [&str; 10] = [
    "Last Updated Date",
    "Project Name",
    "Pipeline Operator Name",
    "Project Type",
    "Status",
    "Year In Service Date",
    "State(s)",
    "Additional Capacity (MMcf/d)",
    "Notes",
    "Demand Served",
];

/// EIA pipeline project workbook, restricted to projects whose "Demand
/// Served" mentions `demand_served` (case-insensitive).
pub fn parse_pipeline_projects(table: &RawTable, demand_served: &str) -> Result<Vec<PipelineProject>> {
    let idx = table.column_indexes(&KEPT_COLUMNS)?;
    let needle = demand_served.to_lowercase();

    let mut projects = Vec::new();
    for (row, record) in table.records.iter().enumerate() {
        if idx.iter().all(|&i| record.get(i).is_empty()) {
            continue;
        }

        let text = |column: usize| text_at(table, row, idx[column]).unwrap_or_default();
        let demand = text(9);
        if !demand.to_lowercase().contains(&needle) {
            continue;
        }

        projects.push(PipelineProject {
            last_updated: record.get(idx[0]).as_date(),
            project_name: text(1),
            operator: text(2),
            project_type: text(3),
            status: text(4),
            year_in_service: record.get(idx[5]).as_f64().map(|y| y as i32),
            states: text(6),
            capacity_mmcfd: record.get(idx[7]).as_f64(),
            notes: text(8),
            demand_served: demand,
        });
    }
    Ok(projects)
}

/// Optional table filters; an empty set matches everything.
#[derive(Debug, Clone, Default)]
pub struct ProjectFilter {
    pub statuses: HashSet<String>,
    pub states: HashSet<String>,
    pub years: HashSet<i32>,
    pub project_types: HashSet<String>,
}

impl ProjectFilter {
    pub fn matches(&self, project: &PipelineProject) -> bool {
        (self.statuses.is_empty() || self.statuses.contains(&project.status))
            && (self.states.is_empty() || self.states.contains(&project.states))
            && (self.years.is_empty()
                || project.year_in_service.map_or(false, |y| self.years.contains(&y)))
            && (self.project_types.is_empty() || self.project_types.contains(&project.project_type))
    }

    pub fn apply<'a>(&self, projects: &'a [PipelineProject]) -> Vec<&'a PipelineProject> {
        projects.iter().filter(|p| self.matches(p)).collect()
    }
}

/// Sorted distinct values offered by each filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterOptions {
    pub statuses: Vec<String>,
    pub states: Vec<String>,
    pub years: Vec<i32>,
    pub project_types: Vec<String>,
}

pub fn filter_options(projects: &[PipelineProject]) -> FilterOptions {
    fn distinct<T: Ord + Clone>(values: impl Iterator<Item = T>) -> Vec<T> {
        values.collect::<BTreeSet<T>>().into_iter().collect()
    }
    let non_empty = |s: &String| !s.is_empty();

    FilterOptions {
        statuses: distinct(projects.iter().map(|p| p.status.clone()).filter(non_empty)),
        states: distinct(projects.iter().map(|p| p.states.clone()).filter(non_empty)),
        years: distinct(projects.iter().filter_map(|p| p.year_in_service)),
        project_types: distinct(projects.iter().map(|p| p.project_type.clone()).filter(non_empty)),
    }
}

fn year_start(year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 1, 1)
}

/// Capacity additions per in-service year, one observation per
/// `(year, category(project))`. Projects without a year or capacity are
/// left out.
pub fn capacity_additions<F>(projects: &[PipelineProject], category: F) -> Vec<Observation>
where
    F: Fn(&PipelineProject) -> String,
{
    let observations: Vec<Observation> = projects
        .iter()
        .filter_map(|p| {
            let date = year_start(p.year_in_service?)?;
            Some(Observation::new(date, category(p), p.capacity_mmcfd?))
        })
        .collect();
    crate::calculator::group_sum(&observations, |d| d)
}

/// Total capacity added per in-service year.
pub fn capacity_by_year(projects: &[PipelineProject]) -> Vec<Observation> {
    capacity_additions(projects, |_| "Total".to_string())
}

/// Running capacity per project type.
pub fn cumulative_capacity_by_type(projects: &[PipelineProject]) -> Vec<Observation> {
    cumulative_by_category(&capacity_additions(projects, |p| p.project_type.clone()))
}
