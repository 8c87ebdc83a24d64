use chrono::{DateTime, Utc};
use chrono_tz::America::New_York;
use glob::{glob, Pattern};
use log::debug;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::Result;

/// Finds the newest file in a directory by keyword and extension.
#[derive(Debug, Clone)]
pub struct FileLocator {
    dir: PathBuf,
}

impl FileLocator {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Most recently modified file whose name contains `keyword` and ends
    /// with `extension`. `None` when nothing matches.
    pub fn locate(&self, keyword: &str, extension: &str) -> Result<Option<PathBuf>> {
        Ok(self
            .candidates(keyword, extension)?
            .into_iter()
            .max_by_key(|(_, modified)| *modified)
            .map(|(path, _)| path))
    }

    fn candidates(&self, keyword: &str, extension: &str) -> Result<Vec<(PathBuf, SystemTime)>> {
        // The directory is matched literally; only the file name is a pattern.
        let dir = Pattern::escape(&self.dir.to_string_lossy());
        let pattern = Path::new(&dir).join(format!(
            "*{}*{}",
            Pattern::escape(keyword),
            Pattern::escape(extension)
        ));

        let mut found = Vec::new();
        for path in glob(&pattern.to_string_lossy())?.filter_map(|entry| entry.ok()) {
            if !path.is_file() {
                continue;
            }
            // The glob also accepts the keyword inside the extension part;
            // recheck against the file name alone.
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            let stem = name.strip_suffix(extension).unwrap_or("");
            if !name.ends_with(extension) || !stem.contains(keyword) {
                continue;
            }
            let modified = std::fs::metadata(&path)?.modified()?;
            found.push((path, modified));
        }
        debug!(
            "{} candidate(s) for '{}*{}' in {}",
            found.len(),
            keyword,
            extension,
            self.dir.display()
        );
        Ok(found)
    }

    /// Newest modification time over the latest file of every
    /// keyword/extension combination.
    pub fn newest_modification(&self, keywords: &[&str], extensions: &[&str]) -> Result<Option<SystemTime>> {
        let mut newest = None;
        for keyword in keywords {
            for extension in extensions {
                if let Some(path) = self.locate(keyword, extension)? {
                    let modified = std::fs::metadata(&path)?.modified()?;
                    newest = newest.max(Some(modified));
                }
            }
        }
        Ok(newest)
    }

    /// "Last updated: June 01, 2025 at 09:30 AM EDT", in New York time.
    pub fn last_updated(&self, keywords: &[&str], extensions: &[&str]) -> Result<String> {
        Ok(match self.newest_modification(keywords, extensions)? {
            Some(modified) => format_last_updated(modified),
            None => "No files found".to_string(),
        })
    }
}

pub fn format_last_updated(modified: SystemTime) -> String {
    let utc: DateTime<Utc> = modified.into();
    let local = utc.with_timezone(&New_York);
    format!("Last updated: {}", local.format("%B %d, %Y at %I:%M %p %Z"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs::{self, File};
    use std::time::{Duration, UNIX_EPOCH};

    fn touch(dir: &Path, name: &str, modified: SystemTime) -> PathBuf {
        let path = dir.join(name);
        let file = File::create(&path).unwrap();
        file.set_modified(modified).unwrap();
        path
    }

    fn at(y: i32, m: u32, d: u32) -> SystemTime {
        let ts = Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap().timestamp();
        UNIX_EPOCH + Duration::from_secs(ts as u64)
    }

    #[test]
    fn test_locate_picks_newest() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "JKM_jan.csv", at(2024, 1, 1));
        let newer = touch(dir.path(), "JKM_feb.csv", at(2024, 2, 1));
        touch(dir.path(), "TTF_mar.csv", at(2024, 3, 1));

        let locator = FileLocator::new(dir.path());
        assert_eq!(locator.locate("JKM", ".csv").unwrap(), Some(newer));
    }

    #[test]
    fn test_locate_none_and_case_sensitive() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "jkm_prices.csv", at(2024, 1, 1));
        touch(dir.path(), "JKM_prices.xlsx", at(2024, 1, 1));
        fs::create_dir(dir.path().join("JKM_dir.csv")).unwrap();

        let locator = FileLocator::new(dir.path());
        assert_eq!(locator.locate("JKM", ".csv").unwrap(), None);
    }

    #[test]
    fn test_directory_with_glob_metacharacters() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("prices[2024]");
        fs::create_dir(&dir).unwrap();
        let jkm = touch(&dir, "JKM_daily.csv", at(2024, 1, 1));
        // Would match an unescaped "prices[2024]" character class.
        let decoy = root.path().join("prices2");
        fs::create_dir(&decoy).unwrap();
        touch(&decoy, "JKM_daily.csv", at(2024, 6, 1));

        let locator = FileLocator::new(&dir);
        assert_eq!(locator.locate("JKM", ".csv").unwrap(), Some(jkm));
        assert!(locator.last_updated(&["JKM"], &[".csv"]).unwrap().starts_with("Last updated: "));
    }

    #[test]
    fn test_missing_directory_is_not_an_error() {
        let locator = FileLocator::new("/definitely/not/here");
        assert_eq!(locator.locate("JKM", ".csv").unwrap(), None);
    }

    #[test]
    fn test_last_updated_format() {
        let dir = tempfile::tempdir().unwrap();
        let locator = FileLocator::new(dir.path());
        assert_eq!(locator.last_updated(&["JKM"], &[".csv"]).unwrap(), "No files found");

        // 2025-06-01 13:30 UTC is 09:30 EDT
        let ts = Utc.with_ymd_and_hms(2025, 6, 1, 13, 30, 0).unwrap().timestamp();
        touch(dir.path(), "JKM.csv", UNIX_EPOCH + Duration::from_secs(ts as u64));
        assert_eq!(
            locator.last_updated(&["JKM", "TTF"], &[".csv", ".xlsx"]).unwrap(),
            "Last updated: June 01, 2025 at 09:30 AM EDT"
        );
    }
}
