use url::Url;

use crate::errors::FetchError;

/// A page as the provider finished rendering it.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// Final URL after redirects; relative links resolve against it.
    pub url: Url,
    pub html: String,
}

#[cfg_attr(test, mockall::automock)]
pub trait DocumentProvider {
    /// Acquire whatever session the provider needs (client, browser, ...)
    fn open(&mut self) -> Result<(), FetchError>;

    /// Load and render a page within the open session
    fn load(&mut self, url: &Url) -> Result<RenderedPage, FetchError>;

    /// Release the session. Called exactly once per successful `open`.
    fn close(&mut self);
}
