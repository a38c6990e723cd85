pub mod extract_service;
pub mod generate_service;
pub mod resolve_service;
pub mod rss_service;

pub use extract_service::extract;
pub use generate_service::{GenerateService, GeneratedFeed};
pub use resolve_service::resolve;
pub use rss_service::{output_file_name, output_identifier, to_rss};
