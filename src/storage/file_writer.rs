use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::info;

use crate::errors::FeederResult;
use crate::storage::traits::FeedWriter;

/// Writes feeds into a directory. Files are written to a temporary sibling
/// and renamed into place, so readers never see a half-written feed.
pub struct DirectoryFeedWriter {
    dir: PathBuf,
}

impl DirectoryFeedWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl FeedWriter for DirectoryFeedWriter {
    fn write(&self, file_name: &str, contents: &[u8]) -> FeederResult<PathBuf> {
        fs::create_dir_all(&self.dir)?;

        let target = self.dir.join(file_name);
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let temp_path = target.with_extension(format!("tmp.{:016x}", suffix));

        let result = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)
            .and_then(|mut file| {
                file.write_all(contents)?;
                file.sync_all()
            })
            .and_then(|()| fs::rename(&temp_path, &target));

        if let Err(e) = result {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }

        info!(path = %target.display(), bytes = contents.len(), "Wrote feed");
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_creates_directory_and_writes_file() {
        let temp_dir = TempDir::new().unwrap();
        let writer = DirectoryFeedWriter::new(temp_dir.path().join("feeds"));

        let path = writer.write("Example.xml", b"<rss/>").unwrap();

        assert_eq!(path, temp_dir.path().join("feeds").join("Example.xml"));
        assert_eq!(fs::read(&path).unwrap(), b"<rss/>");
    }

    #[test]
    fn test_overwrites_existing_feed_without_leftovers() {
        let temp_dir = TempDir::new().unwrap();
        let writer = DirectoryFeedWriter::new(temp_dir.path());

        writer.write("feed.xml", b"old").unwrap();
        writer.write("feed.xml", b"new").unwrap();

        assert_eq!(fs::read(temp_dir.path().join("feed.xml")).unwrap(), b"new");
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }
}
