use scraper::Selector;
use serde::{Deserialize, Serialize, Serializer};
use url::Url;

use crate::errors::ConfigError;

/// A CSS selector kept alongside its source text so plans can be
/// compared and serialized back to their raw form.
#[derive(Debug, Clone)]
pub struct CssSelector {
    source: String,
    compiled: Selector,
}

impl CssSelector {
    pub fn parse(field: &'static str, source: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidSelector {
            field,
            selector: source.to_string(),
        };

        if source.trim().is_empty() {
            return Err(invalid());
        }

        let compiled = Selector::parse(source).map_err(|_| invalid())?;

        Ok(Self {
            source: source.to_string(),
            compiled,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn compiled(&self) -> &Selector {
        &self.compiled
    }
}

impl PartialEq for CssSelector {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for CssSelector {}

impl Serialize for CssSelector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl std::fmt::Display for CssSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DescriptionType {
    #[default]
    Text,
    Html,
}

impl DescriptionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DescriptionType::Text => "text",
            DescriptionType::Html => "html",
        }
    }
}

impl std::str::FromStr for DescriptionType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(DescriptionType::Text),
            "html" => Ok(DescriptionType::Html),
            _ => Err(ConfigError::UnknownDescriptionType(s.to_string())),
        }
    }
}

pub const DEFAULT_SETTLE_MILLIS: u64 = 2000;

fn default_poll_timeout() -> u64 {
    10_000
}

fn default_poll_interval() -> u64 {
    500
}

/// How long to let a freshly loaded page settle before extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case", deny_unknown_fields)]
pub enum WaitStrategy {
    None,
    Fixed {
        millis: u64,
    },
    /// Reload until the posts list selector matches or the timeout elapses.
    PollSelector {
        #[serde(default = "default_poll_timeout")]
        timeout_ms: u64,
        #[serde(default = "default_poll_interval")]
        interval_ms: u64,
    },
}

impl Default for WaitStrategy {
    fn default() -> Self {
        WaitStrategy::Fixed {
            millis: DEFAULT_SETTLE_MILLIS,
        }
    }
}

/// Date extraction is only possible with both halves present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateSpec {
    #[serde(rename = "date_selector")]
    pub selector: CssSelector,
    #[serde(rename = "date_format")]
    pub format: String,
}

/// A validated site configuration. Every optional field already carries
/// its default, so extraction never re-checks presence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedExtractionPlan {
    pub website_url: Url,
    pub website_title: String,
    pub website_description: String,
    pub posts_list_selector: CssSelector,
    pub title_selector: CssSelector,
    pub link_selector: CssSelector,
    pub image_selector: Option<CssSelector>,
    pub description_selector: Option<CssSelector>,
    pub description_type: DescriptionType,
    #[serde(flatten)]
    pub date: Option<DateSpec>,
    pub file_name: Option<String>,
    pub ttl_minutes: Option<u32>,
    pub wait: WaitStrategy,
}
