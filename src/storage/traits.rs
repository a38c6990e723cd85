use std::path::PathBuf;

use crate::errors::FeederResult;

#[cfg_attr(test, mockall::automock)]
pub trait FeedWriter {
    /// Persist a rendered feed under `file_name`, returning where it landed.
    fn write(&self, file_name: &str, contents: &[u8]) -> FeederResult<PathBuf>;
}
