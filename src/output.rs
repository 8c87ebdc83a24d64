use anyhow::{Context, Result};
use gas_ingest::export::{observations_to_dataframe, write_csv};
use gas_ingest::{NormalizedSeries, Observation};
use log::{debug, info};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Writes page tables into one directory. Every file is written to a
/// temporary sibling and renamed into place, so a failed run never leaves a
/// half-written table behind. [`OutputWriter::publish`] extends that to a
/// whole page: its tables land together or not at all.
pub struct OutputWriter {
    output_dir: PathBuf,
}

impl OutputWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)
            .with_context(|| format!("creating output directory {}", output_dir.display()))?;
        Ok(Self { output_dir })
    }

    pub fn dir(&self) -> &Path {
        &self.output_dir
    }

    fn persist<F>(&self, file_name: &str, write: F) -> Result<PathBuf>
    where
        F: FnOnce(&mut NamedTempFile) -> Result<()>,
    {
        let path = self.output_dir.join(file_name);
        let mut tmp = NamedTempFile::new_in(&self.output_dir)?;
        write(&mut tmp)?;
        tmp.flush()?;
        tmp.persist(&path)
            .with_context(|| format!("replacing {}", path.display()))?;
        debug!("Wrote {}", path.display());
        Ok(path)
    }

    /// Runs `build` against a staging directory inside the output directory
    /// and moves the staged files into place only once it succeeds. On
    /// error the staging directory is removed and existing tables are left
    /// as they were.
    pub fn publish<F>(&self, build: F) -> Result<Vec<PathBuf>>
    where
        F: FnOnce(&OutputWriter) -> Result<()>,
    {
        let staging = tempfile::Builder::new()
            .prefix(".staging")
            .tempdir_in(&self.output_dir)
            .with_context(|| format!("creating staging directory in {}", self.output_dir.display()))?;
        let staged = OutputWriter {
            output_dir: staging.path().to_path_buf(),
        };
        build(&staged)?;

        let mut names = fs::read_dir(staging.path())?
            .map(|entry| entry.map(|e| e.file_name()))
            .collect::<std::io::Result<Vec<_>>>()?;
        names.sort();

        let mut published = Vec::with_capacity(names.len());
        for name in names {
            let target = self.output_dir.join(&name);
            fs::rename(staging.path().join(&name), &target)
                .with_context(|| format!("replacing {}", target.display()))?;
            info!("Saved {}", target.display());
            published.push(target);
        }
        Ok(published)
    }

    /// Wide date-keyed table.
    pub fn write_series(&self, file_name: &str, series: &NormalizedSeries) -> Result<PathBuf> {
        let mut df = series.to_dataframe()?;
        self.persist(file_name, |tmp| Ok(write_csv(&mut df, tmp.as_file_mut())?))
    }

    /// Long `(Date, category, value)` table.
    pub fn write_observations(
        &self,
        file_name: &str,
        observations: &[Observation],
        category: &str,
        value: &str,
    ) -> Result<PathBuf> {
        let mut df = observations_to_dataframe(observations, category, value)?;
        self.persist(file_name, |tmp| Ok(write_csv(&mut df, tmp.as_file_mut())?))
    }

    /// One CSV row per serialized record.
    pub fn write_records<T: Serialize>(&self, file_name: &str, records: &[T]) -> Result<PathBuf> {
        self.persist(file_name, |tmp| {
            let mut wtr = csv::Writer::from_writer(tmp.as_file_mut());
            for record in records {
                wtr.serialize(record)?;
            }
            wtr.flush()?;
            Ok(())
        })
    }

    pub fn write_text(&self, file_name: &str, text: &str) -> Result<PathBuf> {
        self.persist(file_name, |tmp| {
            writeln!(tmp, "{}", text)?;
            Ok(())
        })
    }
}
