use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no file matching '{keyword}*{extension}' in {dir}")]
    NotFound {
        keyword: String,
        extension: String,
        dir: PathBuf,
    },

    #[error("sheet '{sheet}' not found in {path}")]
    SheetNotFound { path: PathBuf, sheet: String },

    #[error("no header row containing '{marker}' in sheet '{sheet}'")]
    HeaderNotFound { sheet: String, marker: String },

    #[error("header row {row} is past the end of sheet '{sheet}' ({height} rows)")]
    HeaderOutOfRange {
        sheet: String,
        row: usize,
        height: usize,
    },

    #[error("row of {got} values pushed to '{series}' with {expected} columns")]
    RowWidth {
        series: String,
        expected: usize,
        got: usize,
    },

    #[error("column '{0}' not found")]
    MissingColumn(String),

    #[error("no data left for {0}")]
    NoData(String),

    #[error("invalid config: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Polars(#[from] polars::prelude::PolarsError),

    #[error(transparent)]
    Spreadsheet(#[from] calamine::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Pattern(#[from] glob::PatternError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
