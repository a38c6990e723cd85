use std::fs;
use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{debug, info, instrument};
use url::Url;

use crate::config::Config;
use crate::errors::FetchError;
use crate::sources::traits::{DocumentProvider, RenderedPage};

/// Loads `http(s)` pages with a blocking client and `file://` pages from
/// disk. The client only exists between `open` and `close`.
pub struct HttpDocumentProvider {
    user_agent: String,
    timeout: Duration,
    client: Option<Client>,
}

impl HttpDocumentProvider {
    pub fn new(config: &Config) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            client: None,
        }
    }

    fn load_http(&self, url: &Url) -> Result<RenderedPage, FetchError> {
        let client = self.client.as_ref().ok_or(FetchError::NoSession)?;

        let response = client.get(url.as_str()).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let html = response.text()?;

        debug!(url = %final_url, bytes = html.len(), "Fetched page");

        Ok(RenderedPage {
            url: final_url,
            html,
        })
    }

    fn load_file(url: &Url) -> Result<RenderedPage, FetchError> {
        let path = url
            .to_file_path()
            .map_err(|_| FetchError::UnsupportedScheme(url.to_string()))?;

        let html = fs::read_to_string(&path).map_err(|source| FetchError::File {
            path: path.display().to_string(),
            source,
        })?;

        debug!(path = %path.display(), bytes = html.len(), "Read local page");

        Ok(RenderedPage {
            url: url.clone(),
            html,
        })
    }
}

impl DocumentProvider for HttpDocumentProvider {
    fn open(&mut self) -> Result<(), FetchError> {
        let client = Client::builder()
            .user_agent(self.user_agent.clone())
            .timeout(self.timeout)
            .build()?;

        self.client = Some(client);
        Ok(())
    }

    #[instrument(level = "info", skip_all, fields(%url))]
    fn load(&mut self, url: &Url) -> Result<RenderedPage, FetchError> {
        info!("Loading page");

        match url.scheme() {
            "http" | "https" => self.load_http(url),
            "file" => Self::load_file(url),
            other => Err(FetchError::UnsupportedScheme(other.to_string())),
        }
    }

    fn close(&mut self) {
        if self.client.take().is_some() {
            debug!("Closed HTTP session");
        }
    }
}
