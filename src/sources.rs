use anyhow::Result;
use gas_ingest::parsers::resolve_source;
use gas_ingest::{DashboardConfig, FileLocator, Grid, RawTable, SourceConfig};
use std::path::PathBuf;

use crate::download::Downloader;

/// Resolves configured sources to files on disk. Remote workbooks are
/// downloaded on every call unless running offline, in which case the last
/// download is reused.
pub struct SourceReader<'a> {
    config: &'a DashboardConfig,
    downloader: Option<Downloader>,
}

impl<'a> SourceReader<'a> {
    pub fn new(config: &'a DashboardConfig, offline: bool) -> Result<Self> {
        let downloader = if offline { None } else { Some(Downloader::new()?) };
        Ok(Self { config, downloader })
    }

    pub fn config(&self) -> &'a DashboardConfig {
        self.config
    }

    fn locator_for(&self, source: &SourceConfig) -> FileLocator {
        if source.url.is_some() {
            FileLocator::new(&self.config.download_dir)
        } else {
            FileLocator::new(&self.config.data_dir)
        }
    }

    /// Current file for `source`; `None` only under the `Empty` missing
    /// policy.
    pub fn path(&self, source: &SourceConfig) -> Result<Option<PathBuf>> {
        if let (Some(url), Some(file_name), Some(downloader)) = (&source.url, &source.file_name, &self.downloader) {
            return Ok(Some(downloader.download(url, &self.config.download_dir, file_name)?));
        }
        Ok(resolve_source(&self.locator_for(source), source)?)
    }

    pub fn table(&self, source: &SourceConfig) -> Result<Option<RawTable>> {
        match self.path(source)? {
            Some(path) => Ok(Some(Grid::load_table(&path, source)?)),
            None => Ok(None),
        }
    }

    /// Like [`SourceReader::table`], but an empty table stands in for a
    /// missing file.
    pub fn table_or_empty(&self, source: &SourceConfig) -> Result<RawTable> {
        Ok(self.table(source)?.unwrap_or_default())
    }

    /// Stamp for the newest file backing `sources`.
    pub fn last_updated(&self, sources: &[&SourceConfig]) -> Result<String> {
        let mut newest = None;
        for source in sources {
            let locator = self.locator_for(source);
            let found = locator.newest_modification(&[source.keyword.as_str()], &[source.extension.as_str()])?;
            newest = newest.max(found);
        }
        Ok(match newest {
            Some(modified) => gas_ingest::locator::format_last_updated(modified),
            None => "No files found".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gas_ingest::PipelineError;

    #[test]
    fn test_offline_reuses_previous_download() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = DashboardConfig::default();
        config.download_dir = dir.path().join("downloads");
        config.data_dir = dir.path().join("data");

        let reader = SourceReader::new(&config, true).unwrap();
        let err = reader.path(&config.sources.trade).unwrap_err();
        assert!(matches!(err.downcast_ref::<PipelineError>(), Some(PipelineError::NotFound { .. })));

        std::fs::create_dir_all(&config.download_dir).unwrap();
        let saved = config.download_dir.join("import_and_exports.xlsx");
        std::fs::write(&saved, b"stub").unwrap();
        assert_eq!(reader.path(&config.sources.trade).unwrap(), Some(saved));
        assert!(reader.last_updated(&[&config.sources.trade]).unwrap().starts_with("Last updated: "));
    }

    #[test]
    fn test_local_sources_read_from_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = DashboardConfig::default();
        config.data_dir = dir.path().to_path_buf();

        let reader = SourceReader::new(&config, true).unwrap();
        assert!(reader.table(&config.sources.jkm).unwrap().is_none());
        assert_eq!(reader.last_updated(&[&config.sources.jkm]).unwrap(), "No files found");

        std::fs::write(dir.path().join("JKM_daily.csv"), "Date,Price\n2024-01-02,9.8\n").unwrap();
        let table = reader.table_or_empty(&config.sources.jkm).unwrap();
        assert_eq!(table.columns, vec!["Date", "Price"]);
        assert_eq!(table.records.len(), 1);
    }
}
