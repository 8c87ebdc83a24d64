use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, Result};

/// What a parser does when its source file cannot be located.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingPolicy {
    /// Return an empty table with the expected columns.
    Empty,
    /// Abort with `PipelineError::NotFound`.
    Fail,
}

/// How the header row of a sheet is found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderLocator {
    /// Zero-based sheet row.
    Row(usize),
    /// First row with a cell containing this text (case-insensitive).
    Marker(String),
}

impl Default for HeaderLocator {
    fn default() -> Self {
        HeaderLocator::Row(0)
    }
}

/// Declarative description of one raw source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Substring searched in file names of the data directory.
    pub keyword: String,
    pub extension: String,
    /// Worksheet name for spreadsheet sources.
    #[serde(default)]
    pub sheet: Option<String>,
    #[serde(default)]
    pub header: HeaderLocator,
    /// Zero-based sheet rows dropped after the header.
    #[serde(default)]
    pub skip_rows: Vec<usize>,
    pub missing: MissingPolicy,
    /// Remote workbook fetched before parsing.
    #[serde(default)]
    pub url: Option<String>,
    /// Local file name the download is saved under.
    #[serde(default)]
    pub file_name: Option<String>,
}

impl SourceConfig {
    fn local(keyword: &str, extension: &str, missing: MissingPolicy) -> Self {
        Self {
            keyword: keyword.to_string(),
            extension: extension.to_string(),
            sheet: None,
            header: HeaderLocator::Row(0),
            skip_rows: Vec::new(),
            missing,
            url: None,
            file_name: None,
        }
    }

    fn remote(url: &str, file_name: &str, sheet: &str, header: HeaderLocator) -> Self {
        let keyword = file_name.trim_end_matches(".xlsx").to_string();
        Self {
            keyword,
            extension: ".xlsx".to_string(),
            sheet: Some(sheet.to_string()),
            header,
            skip_rows: Vec::new(),
            missing: MissingPolicy::Fail,
            url: Some(url.to_string()),
            file_name: Some(file_name.to_string()),
        }
    }

    fn with_sheet(mut self, sheet: &str, header: HeaderLocator) -> Self {
        self.sheet = Some(sheet.to_string());
        self.header = header;
        self
    }

    pub fn sheet_name(&self) -> Result<&str> {
        self.sheet
            .as_deref()
            .ok_or_else(|| PipelineError::Config(format!("source '{}' has no sheet", self.keyword)))
    }
}

/// Fixed conversion factors applied at parse time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitConversions {
    pub eur_usd: f64,
    /// MMBtu in one MWh.
    pub mmbtu_per_mwh: f64,
    /// Therms in one MMBtu.
    pub therms_per_mmbtu: f64,
    /// Bcf in one million cubic meters.
    pub bcf_per_mcm: f64,
}

impl Default for UnitConversions {
    fn default() -> Self {
        Self {
            eur_usd: 1.14,
            mmbtu_per_mwh: 3.412,
            therms_per_mmbtu: 10.0,
            bcf_per_mcm: 0.0353147,
        }
    }
}

impl UnitConversions {
    /// EUR/MWh to USD/MMBtu.
    pub fn eur_mwh_to_usd_mmbtu(&self) -> f64 {
        self.eur_usd / self.mmbtu_per_mwh
    }
}

/// A benchmark pair and the per-unit costs of moving gas between them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadConfig {
    pub name: String,
    /// Column of the origin (buy) price.
    pub origin: String,
    /// Column of the destination (sell) price.
    pub destination: String,
    pub markup: f64,
    pub shipping: f64,
    pub regasification: f64,
    pub liquefaction: f64,
}

/// Categorical filters and label tables shared by the parsers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub min_year: i32,
    pub country: String,
    pub drill_for: String,
    pub focus_basins: Vec<String>,
    /// Alias label -> canonical basin.
    pub basin_aliases: HashMap<String, String>,
    /// Country -> region; unmapped countries fall into `fallback_region`.
    pub regions: HashMap<String, String>,
    pub fallback_region: String,
    /// Substring of "Demand Served" selecting LNG projects.
    pub demand_served: String,
    /// Columns dropped from the weekly rig table.
    pub rig_drop_columns: Vec<String>,
    /// Days around `date - 1 year` accepted as the prior-year match.
    pub yoy_tolerance_days: i64,
    /// Same window for the monthly production series.
    pub production_yoy_tolerance_days: i64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        let focus_basins = ["Marcellus", "Haynesville", "Permian", "Eagle Ford", "Utica", "Woodford"]
            .iter()
            .map(|b| b.to_string())
            .collect();

        let basin_aliases = ["Ardmore Woodford", "Arkoma Woodford", "Cana Woodford"]
            .iter()
            .map(|alias| (alias.to_string(), "Woodford".to_string()))
            .collect();

        Self {
            min_year: 2016,
            country: "UNITED STATES".to_string(),
            drill_for: "Gas".to_string(),
            focus_basins,
            basin_aliases,
            regions: default_regions(),
            fallback_region: "RoW".to_string(),
            demand_served: "LNG".to_string(),
            rig_drop_columns: ["County", "GOM", "Location", "State/Province"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            yoy_tolerance_days: 3,
            production_yoy_tolerance_days: 16,
        }
    }
}

fn default_regions() -> HashMap<String, String> {
    let table: &[(&str, &[&str])] = &[
        ("North America", &["Canada", "Mexico", "United States"]),
        (
            "Europe",
            &[
                "United Kingdom", "France", "Germany", "Spain", "Italy", "Netherlands", "Belgium",
                "Portugal", "Greece", "Turkey", "Croatia", "Poland", "Finland", "Lithuania", "Malta",
            ],
        ),
        (
            "Asia",
            &[
                "Japan", "South Korea", "China", "India", "Pakistan", "Thailand", "Singapore",
                "Bangladesh", "Taiwan", "Malaysia", "Indonesia", "Philippines",
            ],
        ),
        (
            "Middle East",
            &["United Arab Emirates", "Qatar", "Saudi Arabia", "Kuwait", "Israel", "Oman", "Jordan"],
        ),
        (
            "Africa",
            &["South Africa", "Egypt", "Morocco", "Algeria", "Nigeria", "Mauritania", "Senegal"],
        ),
        ("South America", &["Brazil", "Argentina", "Chile", "Colombia", "Peru"]),
        ("Oceania", &["Australia", "New Zealand"]),
    ];

    table
        .iter()
        .flat_map(|(region, countries)| {
            countries
                .iter()
                .map(move |country| (country.to_string(), region.to_string()))
        })
        .collect()
}

/// Every source the dashboard reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sources {
    pub henry_hub: SourceConfig,
    pub jkm: SourceConfig,
    pub ttf: SourceConfig,
    pub pipeline_projects: SourceConfig,
    pub us_storage: SourceConfig,
    pub eu_storage: SourceConfig,
    pub rig_weekly: SourceConfig,
    pub rig_yearly: SourceConfig,
    pub production: SourceConfig,
    pub trade: SourceConfig,
}

const RIG_URL: &str = "https://rigcount.bakerhughes.com/static-files/10ef884d-be25-4591-afdc-d9f3b7ab7c67";

impl Default for Sources {
    fn default() -> Self {
        let rig_weekly = SourceConfig::remote(
            RIG_URL,
            "baker_hughes_rig_count.xlsx",
            "NAM Weekly",
            HeaderLocator::Marker("Date".to_string()),
        );
        let rig_yearly = rig_weekly
            .clone()
            .with_sheet("NAM Yearly", HeaderLocator::Marker("Basin".to_string()));

        let mut eu_storage = SourceConfig::local("EUR", ".xlsx", MissingPolicy::Fail)
            .with_sheet("Sheet 1", HeaderLocator::Row(9));
        eu_storage.skip_rows = vec![10, 11];

        Self {
            henry_hub: SourceConfig::local("HenryHub", ".xlsx", MissingPolicy::Empty)
                .with_sheet("Daily", HeaderLocator::Row(0)),
            jkm: SourceConfig::local("JKM", ".csv", MissingPolicy::Empty),
            ttf: SourceConfig::local("TTF", ".csv", MissingPolicy::Empty),
            pipeline_projects: SourceConfig::remote(
                "https://www.eia.gov/naturalgas/pipelines/EIA-NaturalGasPipelineProjects_Apr2025.xlsx",
                "pipeline_projects.xlsx",
                "Natural Gas Pipeline Projects",
                HeaderLocator::Row(1),
            ),
            us_storage: SourceConfig::remote(
                "https://www.eia.gov/outlooks/steo/xls/Fig27.xlsx",
                "monthly_gas_storage.xlsx",
                "27",
                HeaderLocator::Row(27),
            ),
            eu_storage,
            rig_weekly,
            rig_yearly,
            production: SourceConfig::remote(
                "https://www.eia.gov/outlooks/steo/xls/Fig43.xlsx",
                "dry_shale_gas_production_by_formation.xlsx",
                "43",
                HeaderLocator::Row(27),
            ),
            trade: SourceConfig::remote(
                "https://www.energy.gov/sites/default/files/2025-08/1.%20U.S.%20Natural%20Gas%20Imports%20Exports%20and%20Re-Exports%20Summary%20%28Jan%202000%20-Jun%202025%29.xlsx",
                "import_and_exports.xlsx",
                "By Country Summary",
                HeaderLocator::Row(0),
            ),
        }
    }
}

/// Top-level configuration. Every field has an in-code default; a TOML file
/// only needs the keys it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Directory scanned for locally supplied files.
    pub data_dir: PathBuf,
    /// Directory downloads are written to.
    pub download_dir: PathBuf,
    pub output_dir: PathBuf,
    pub refresh_interval_secs: u64,
    pub sources: Sources,
    pub conversions: UnitConversions,
    pub filters: FilterConfig,
    pub spreads: Vec<SpreadConfig>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            download_dir: PathBuf::from("downloads"),
            output_dir: PathBuf::from("dashboard_output"),
            refresh_interval_secs: 60,
            sources: Sources::default(),
            conversions: UnitConversions::default(),
            filters: FilterConfig::default(),
            spreads: vec![
                SpreadConfig {
                    name: "HH-TTF".to_string(),
                    origin: "Henry Hub".to_string(),
                    destination: "TTF (USD)".to_string(),
                    markup: 1.15,
                    shipping: 0.70,
                    regasification: 0.35,
                    liquefaction: 2.50,
                },
                SpreadConfig {
                    name: "HH-JKM".to_string(),
                    origin: "Henry Hub".to_string(),
                    destination: "JKM".to_string(),
                    markup: 1.15,
                    shipping: 1.40,
                    regasification: 0.35,
                    liquefaction: 2.50,
                },
            ],
        }
    }
}

impl DashboardConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: DashboardConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, otherwise use the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                Self::from_toml_str(&text)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.refresh_interval_secs == 0 {
            return Err(PipelineError::Config("refresh_interval_secs must be > 0".to_string()));
        }
        let c = &self.conversions;
        for (name, factor) in [
            ("eur_usd", c.eur_usd),
            ("mmbtu_per_mwh", c.mmbtu_per_mwh),
            ("therms_per_mmbtu", c.therms_per_mmbtu),
            ("bcf_per_mcm", c.bcf_per_mcm),
        ] {
            if !(factor.is_finite() && factor > 0.0) {
                return Err(PipelineError::Config(format!("conversion {} must be positive", name)));
            }
        }
        Ok(())
    }
}
