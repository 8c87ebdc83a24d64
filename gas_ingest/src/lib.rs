pub mod calculator;
pub mod config;
pub mod data_loader;
pub mod error;
pub mod export;
pub mod label_mapper;
pub mod locator;
pub mod merger;
pub mod models;
pub mod parsers;

pub use calculator::SpreadCalculator;
pub use config::{DashboardConfig, FilterConfig, HeaderLocator, MissingPolicy, SourceConfig, Sources, SpreadConfig, UnitConversions};
pub use data_loader::{Cell, Grid, RawRecord, RawTable};
pub use error::{PipelineError, Result};
pub use label_mapper::LabelMapper;
pub use locator::FileLocator;
pub use merger::merge;
pub use models::{DerivedSeries, MergedTable, NormalizedSeries, Observation};
