use std::collections::HashMap;

use crate::config::FilterConfig;

/// Collapses raw labels into canonical categories through a fixed table.
#[derive(Debug, Clone, Default)]
pub struct LabelMapper {
    mappings: HashMap<String, String>,
    fallback: Option<String>,
}

impl LabelMapper {
    pub fn new(mappings: HashMap<String, String>) -> Self {
        Self {
            mappings,
            fallback: None,
        }
    }

    /// Unmapped labels become `fallback` instead of passing through.
    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = Some(fallback.into());
        self
    }

    /// Sub-basin aliases to their parent basin.
    pub fn basins(filters: &FilterConfig) -> Self {
        Self::new(filters.basin_aliases.clone())
    }

    /// Countries to export regions, `RoW` for the rest.
    pub fn regions(filters: &FilterConfig) -> Self {
        Self::new(filters.regions.clone()).with_fallback(filters.fallback_region.clone())
    }

    pub fn get_mapping(&self, label: &str) -> Option<&str> {
        self.mappings.get(label).map(String::as_str)
    }

    pub fn map(&self, label: &str) -> String {
        match (self.get_mapping(label), &self.fallback) {
            (Some(mapped), _) => mapped.to_string(),
            (None, Some(fallback)) => fallback.clone(),
            (None, None) => label.to_string(),
        }
    }

    pub fn add_mapping(&mut self, label: impl Into<String>, canonical: impl Into<String>) {
        self.mappings.insert(label.into(), canonical.into());
    }
}
