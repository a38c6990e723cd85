pub mod file_writer;
pub mod traits;

pub use file_writer::DirectoryFeedWriter;
pub use traits::FeedWriter;
