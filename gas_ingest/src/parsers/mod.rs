//! One parser per raw source. Each turns a [`RawTable`] into typed,
//! normalized rows; the `load_*` wrappers add file location and the
//! source's missing-file policy.

pub mod benchmarks;
pub mod pipeline_projects;
pub mod production;
pub mod rigs;
pub mod storage;
pub mod trade;

use log::warn;
use std::path::PathBuf;

use crate::config::{MissingPolicy, SourceConfig};
use crate::data_loader::{Cell, RawTable};
use crate::error::{PipelineError, Result};
use crate::locator::FileLocator;

/// Locate `source`, applying its missing-file policy. `Ok(None)` means the
/// caller should fall back to an empty table.
pub fn resolve_source(locator: &FileLocator, source: &SourceConfig) -> Result<Option<PathBuf>> {
    match locator.locate(&source.keyword, &source.extension)? {
        Some(path) => Ok(Some(path)),
        None => match source.missing {
            MissingPolicy::Empty => {
                warn!(
                    "No '{}*{}' file in {}, using an empty table",
                    source.keyword,
                    source.extension,
                    locator.dir().display()
                );
                Ok(None)
            }
            MissingPolicy::Fail => Err(PipelineError::NotFound {
                keyword: source.keyword.clone(),
                extension: source.extension.clone(),
                dir: locator.dir().to_path_buf(),
            }),
        },
    }
}

/// Text of a cell, `None` when empty.
pub(crate) fn text_at(table: &RawTable, record: usize, column: usize) -> Option<String> {
    let cell: &Cell = table.records[record].get(column);
    cell.as_text().map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}
