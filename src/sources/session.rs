use std::thread;
use std::time::{Duration, Instant};

use scraper::{Html, Selector};
use tracing::{debug, warn};
use url::Url;

use crate::domain::WaitStrategy;
use crate::errors::FetchError;
use crate::sources::traits::{DocumentProvider, RenderedPage};

/// An open provider session. The provider is closed when this guard is
/// dropped, whichever way the caller leaves its scope.
pub struct DocumentSession<'a, P: DocumentProvider> {
    provider: &'a mut P,
}

impl<'a, P: DocumentProvider> DocumentSession<'a, P> {
    pub fn open(provider: &'a mut P) -> Result<Self, FetchError> {
        provider.open()?;
        debug!("Opened document session");
        Ok(Self { provider })
    }

    pub fn load(&mut self, url: &Url) -> Result<RenderedPage, FetchError> {
        self.provider.load(url)
    }

    /// Load `url` and apply the wait strategy. `ready` is only consulted by
    /// the polling strategy.
    pub fn load_settled(
        &mut self,
        url: &Url,
        wait: WaitStrategy,
        ready: &Selector,
    ) -> Result<RenderedPage, FetchError> {
        let page = self.load(url)?;

        match wait {
            WaitStrategy::None => Ok(page),
            WaitStrategy::Fixed { millis } => {
                debug!(millis, "Waiting for page to settle");
                thread::sleep(Duration::from_millis(millis));
                Ok(page)
            }
            WaitStrategy::PollSelector {
                timeout_ms,
                interval_ms,
            } => self.poll_until_ready(
                url,
                page,
                ready,
                Duration::from_millis(timeout_ms),
                Duration::from_millis(interval_ms),
            ),
        }
    }

    fn poll_until_ready(
        &mut self,
        url: &Url,
        mut page: RenderedPage,
        ready: &Selector,
        timeout: Duration,
        interval: Duration,
    ) -> Result<RenderedPage, FetchError> {
        let deadline = Instant::now() + timeout;
        let mut attempts = 1;

        loop {
            if has_match(&page, ready) {
                debug!(attempts, "Page ready");
                return Ok(page);
            }

            if Instant::now() >= deadline {
                warn!(attempts, %url, "Posts never appeared, using last loaded page");
                return Ok(page);
            }

            thread::sleep(interval);
            page = self.load(url)?;
            attempts += 1;
        }
    }
}

impl<P: DocumentProvider> Drop for DocumentSession<'_, P> {
    fn drop(&mut self) {
        self.provider.close();
        debug!("Released document session");
    }
}

fn has_match(page: &RenderedPage, selector: &Selector) -> bool {
    Html::parse_document(&page.html)
        .select(selector)
        .next()
        .is_some()
}
