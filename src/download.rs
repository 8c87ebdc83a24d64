use anyhow::{Context, Result};
use log::info;
use reqwest::blocking::Client;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;

/// Fetches published workbooks. No retries; a network failure is the
/// caller's error.
pub struct Downloader {
    client: Client,
}

impl Downloader {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self { client })
    }

    /// GET `url` and save the body as `dest_dir/file_name`, replacing any
    /// previous download.
    pub fn download(&self, url: &str, dest_dir: &Path, file_name: &str) -> Result<PathBuf> {
        fs::create_dir_all(dest_dir)?;
        let dest_path = dest_dir.join(file_name);

        info!("Downloading {}", url);
        let resp = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .with_context(|| format!("fetching {}", url))?;
        let bytes = resp.bytes()?;

        let mut tmp = NamedTempFile::new_in(dest_dir)?;
        tmp.write_all(&bytes)?;
        tmp.persist(&dest_path)
            .with_context(|| format!("saving {}", dest_path.display()))?;

        info!("Saved {} bytes to {}", bytes.len(), dest_path.display());
        Ok(dest_path)
    }
}
