pub mod http;
pub mod session;
pub mod traits;

pub use http::HttpDocumentProvider;
pub use session::DocumentSession;
pub use traits::{DocumentProvider, RenderedPage};
