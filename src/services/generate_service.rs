use std::path::PathBuf;

use chrono::Utc;
use scraper::Html;
use tracing::{info, instrument};

use crate::domain::FeedExtractionPlan;
use crate::errors::FeederResult;
use crate::services::extract_service::extract;
use crate::services::rss_service::{output_file_name, to_rss};
use crate::sources::{DocumentProvider, DocumentSession};
use crate::storage::FeedWriter;

#[derive(Debug, Clone)]
pub struct GeneratedFeed {
    pub file_name: String,
    pub rss: Vec<u8>,
    pub item_count: usize,
}

pub struct GenerateService<P: DocumentProvider, W: FeedWriter> {
    provider: P,
    writer: W,
}

impl<P: DocumentProvider, W: FeedWriter> GenerateService<P, W> {
    pub fn new(provider: P, writer: W) -> Self {
        Self { provider, writer }
    }

    /// Load the page, extract every item and render the RSS document.
    /// Nothing is written; the provider session is closed before returning.
    #[instrument(level = "info", skip_all, fields(url = %plan.website_url))]
    pub fn render(&mut self, plan: &FeedExtractionPlan) -> FeederResult<GeneratedFeed> {
        let feed = {
            let mut session = DocumentSession::open(&mut self.provider)?;
            let page = session.load_settled(
                &plan.website_url,
                plan.wait,
                plan.posts_list_selector.compiled(),
            )?;
            let document = Html::parse_document(&page.html);
            extract(plan, &document, &page.url)?
        };

        let feed = feed.with_last_build_date(Utc::now());
        let rss = to_rss(&feed)?;

        info!(items = feed.items.len(), bytes = rss.len(), "Rendered feed");

        Ok(GeneratedFeed {
            file_name: output_file_name(plan),
            rss,
            item_count: feed.items.len(),
        })
    }

    /// Render the feed and persist it. Failed runs write nothing.
    pub fn generate(&mut self, plan: &FeedExtractionPlan) -> FeederResult<(GeneratedFeed, PathBuf)> {
        let feed = self.render(plan)?;
        let path = self.writer.write(&feed.file_name, &feed.rss)?;
        Ok((feed, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ExtractionError, FeederError, FetchError};
    use crate::services::resolve_service::resolve;
    use crate::sources::traits::MockDocumentProvider;
    use crate::sources::RenderedPage;
    use crate::storage::traits::MockFeedWriter;
    use serde_json::json;
    use url::Url;

    fn plan() -> FeedExtractionPlan {
        resolve(&json!({
            "website_url": "https://example.com/blog",
            "website_title": "Example Blog",
            "website_description": "Posts from example.com",
            "posts_list_selector": ".post",
            "title_selector": ".t",
            "link_selector": "a",
            "wait": {"strategy": "none"}
        }))
        .unwrap()
    }

    fn provider_serving(html: &'static str) -> MockDocumentProvider {
        let mut provider = MockDocumentProvider::new();
        provider.expect_open().times(1).returning(|| Ok(()));
        provider.expect_load().times(1).returning(move |url: &Url| {
            Ok(RenderedPage {
                url: url.clone(),
                html: html.to_string(),
            })
        });
        provider.expect_close().times(1).return_const(());
        provider
    }

    #[test]
    fn test_generate_writes_feed() {
        let provider = provider_serving(
            r#"
            <div class="post"><span class="t">One</span><a href="/1">x</a></div>
            <div class="post"><span class="t">Two</span><a href="/2">x</a></div>
            "#,
        );
        let mut writer = MockFeedWriter::new();
        writer
            .expect_write()
            .withf(|name, contents| name == "ExampleBlog.xml" && !contents.is_empty())
            .times(1)
            .returning(|name, _| Ok(PathBuf::from("feeds").join(name)));

        let mut service = GenerateService::new(provider, writer);
        let (feed, path) = service.generate(&plan()).unwrap();

        assert_eq!(feed.item_count, 2);
        assert_eq!(path, PathBuf::from("feeds/ExampleBlog.xml"));

        let xml = String::from_utf8(feed.rss).unwrap();
        assert_eq!(xml.matches("<item>").count(), 2);
        assert!(!xml.contains("<pubDate>"));
        assert!(xml.contains("<lastBuildDate>"));
    }

    #[test]
    fn test_extraction_failure_releases_session_and_writes_nothing() {
        let provider = provider_serving(
            r#"
            <div class="post"><span class="t">One</span><a href="/1">x</a></div>
            <div class="post"><a href="/2">no title</a></div>
            "#,
        );
        let mut writer = MockFeedWriter::new();
        writer.expect_write().never();

        let mut service = GenerateService::new(provider, writer);
        let err = service.generate(&plan()).unwrap_err();

        assert!(matches!(
            err,
            FeederError::Extraction(ExtractionError::NoMatch { index: 1, .. })
        ));
    }

    #[test]
    fn test_fetch_failure_releases_session() {
        let mut provider = MockDocumentProvider::new();
        provider.expect_open().times(1).returning(|| Ok(()));
        provider.expect_load().times(1).returning(|url: &Url| {
            Err(FetchError::Status {
                url: url.to_string(),
                status: 503,
            })
        });
        provider.expect_close().times(1).return_const(());

        let mut writer = MockFeedWriter::new();
        writer.expect_write().never();

        let mut service = GenerateService::new(provider, writer);
        let err = service.generate(&plan()).unwrap_err();

        assert!(matches!(
            err,
            FeederError::Fetch(FetchError::Status { status: 503, .. })
        ));
    }

    #[test]
    fn test_render_empty_page() {
        let provider = provider_serving("<p>No posts today</p>");
        let mut writer = MockFeedWriter::new();
        writer.expect_write().never();

        let mut service = GenerateService::new(provider, writer);
        let feed = service.render(&plan()).unwrap();

        assert_eq!(feed.item_count, 0);
        assert_eq!(feed.file_name, "ExampleBlog.xml");
    }
}
