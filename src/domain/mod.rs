pub mod feed;
pub mod plan;

pub use feed::{FeedDocument, FeedItem};
pub use plan::{CssSelector, DateSpec, DescriptionType, FeedExtractionPlan, WaitStrategy};
