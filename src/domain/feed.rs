use chrono::{DateTime, Utc};

use super::FeedExtractionPlan;

/// One syndicated entry. Fields are only set through the constructor and
/// `with_*` builders, so the guid can never drift from the link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    title: String,
    link: String,
    guid: String,
    description_html: String,
    published_at: Option<DateTime<Utc>>,
}

impl FeedItem {
    /// The guid always mirrors the link.
    pub fn new(title: String, link: String) -> Self {
        Self {
            title,
            guid: link.clone(),
            link,
            description_html: String::new(),
            published_at: None,
        }
    }

    pub fn with_description(mut self, description_html: String) -> Self {
        self.description_html = description_html;
        self
    }

    pub fn with_published(mut self, published_at: Option<DateTime<Utc>>) -> Self {
        self.published_at = published_at;
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn guid(&self) -> &str {
        &self.guid
    }

    pub fn description_html(&self) -> &str {
        &self.description_html
    }

    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        self.published_at
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedDocument {
    pub title: String,
    pub link: String,
    pub description: String,
    pub ttl_minutes: Option<u32>,
    pub last_build_date: Option<DateTime<Utc>>,
    pub items: Vec<FeedItem>,
}

impl FeedDocument {
    pub fn from_plan(plan: &FeedExtractionPlan, items: Vec<FeedItem>) -> Self {
        Self {
            title: plan.website_title.clone(),
            link: plan.website_url.to_string(),
            description: plan.website_description.clone(),
            ttl_minutes: plan.ttl_minutes,
            last_build_date: None,
            items,
        }
    }

    pub fn with_last_build_date(mut self, built_at: DateTime<Utc>) -> Self {
        self.last_build_date = Some(built_at);
        self
    }
}
