use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use crate::domain::{CssSelector, DateSpec, DescriptionType, FeedExtractionPlan, WaitStrategy};
use crate::errors::ConfigError;

/// Validate a raw configuration record and normalize it into a plan.
///
/// Pure function: nothing is fetched and no defaults are deferred to
/// extraction time.
pub fn resolve(raw: &Value) -> Result<FeedExtractionPlan, ConfigError> {
    let record = Record::new(raw)?;

    let website_url = parse_website_url(&record.required_str("website_url", &[])?)?;
    let website_title = record.required_str("website_title", &[])?;
    let website_description = record.required_str("website_description", &[])?;

    let posts_list_selector = record.required_selector("posts_list_selector", &["elements_selector"])?;
    let title_selector = record.required_selector("title_selector", &[])?;
    let link_selector = record.required_selector("link_selector", &[])?;
    let image_selector = record.optional_selector("image_selector")?;
    let description_selector = record.optional_selector("description_selector")?;

    let description_type = match record.optional_str("description_type", &[])? {
        Some(value) => value.parse::<DescriptionType>()?,
        None => DescriptionType::default(),
    };

    let date = match (
        record.optional_selector("date_selector")?,
        record.optional_str("date_format", &[])?,
    ) {
        (Some(selector), Some(format)) => Some(DateSpec { selector, format }),
        (None, None) => None,
        (Some(_), None) => {
            return Err(ConfigError::UnpairedField {
                present: "date_selector",
                missing: "date_format",
            })
        }
        (None, Some(_)) => {
            return Err(ConfigError::UnpairedField {
                present: "date_format",
                missing: "date_selector",
            })
        }
    };

    let file_name = record
        .optional_str("file_name", &[])?
        .map(|name| validate_file_name(&name))
        .transpose()?;

    let ttl_minutes = record.optional_u32("ttl_minutes", &["ttl"])?;
    let wait = record.wait_strategy()?;

    let plan = FeedExtractionPlan {
        website_url,
        website_title,
        website_description,
        posts_list_selector,
        title_selector,
        link_selector,
        image_selector,
        description_selector,
        description_type,
        date,
        file_name,
        ttl_minutes,
        wait,
    };

    debug!(url = %plan.website_url, posts = %plan.posts_list_selector, "Resolved extraction plan");

    Ok(plan)
}

fn parse_website_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidUrl {
            url: raw.to_string(),
            reason: "URL cannot be used as a base for relative links".to_string(),
        });
    }

    Ok(url)
}

fn validate_file_name(name: &str) -> Result<String, ConfigError> {
    let trimmed = name.trim();

    if trimmed.is_empty() || trimmed.contains(['/', '\\']) || trimmed == "." || trimmed == ".." {
        return Err(ConfigError::WrongType {
            field: "file_name",
            expected: "a plain, non-empty file name",
        });
    }

    Ok(trimmed.to_string())
}

/// Field lookup over a JSON object. `null` is treated as absent.
struct Record<'a> {
    fields: &'a Map<String, Value>,
}

impl<'a> Record<'a> {
    fn new(raw: &'a Value) -> Result<Self, ConfigError> {
        raw.as_object()
            .map(|fields| Self { fields })
            .ok_or(ConfigError::NotAnObject)
    }

    fn lookup(&self, field: &'static str, aliases: &[&'static str]) -> Option<&'a Value> {
        std::iter::once(&field)
            .chain(aliases.iter())
            .filter_map(|key| self.fields.get(*key))
            .find(|value| !value.is_null())
    }

    fn optional_str(
        &self,
        field: &'static str,
        aliases: &[&'static str],
    ) -> Result<Option<String>, ConfigError> {
        match self.lookup(field, aliases) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(ConfigError::WrongType {
                field,
                expected: "a string",
            }),
        }
    }

    fn required_str(
        &self,
        field: &'static str,
        aliases: &[&'static str],
    ) -> Result<String, ConfigError> {
        self.optional_str(field, aliases)?
            .ok_or(ConfigError::MissingField(field))
    }

    fn optional_selector(&self, field: &'static str) -> Result<Option<CssSelector>, ConfigError> {
        self.optional_str(field, &[])?
            .map(|s| CssSelector::parse(field, &s))
            .transpose()
    }

    fn required_selector(
        &self,
        field: &'static str,
        aliases: &[&'static str],
    ) -> Result<CssSelector, ConfigError> {
        let source = self.required_str(field, aliases)?;
        CssSelector::parse(field, &source)
    }

    fn optional_u32(
        &self,
        field: &'static str,
        aliases: &[&'static str],
    ) -> Result<Option<u32>, ConfigError> {
        match self.lookup(field, aliases) {
            None => Ok(None),
            Some(value) => value
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .map(Some)
                .ok_or(ConfigError::WrongType {
                    field,
                    expected: "a non-negative integer",
                }),
        }
    }

    fn wait_strategy(&self) -> Result<WaitStrategy, ConfigError> {
        let Some(value) = self.lookup("wait", &[]) else {
            return Ok(WaitStrategy::default());
        };

        let wait: WaitStrategy = serde_json::from_value(value.clone())
            .map_err(|e| ConfigError::InvalidWait(e.to_string()))?;

        if let WaitStrategy::PollSelector { interval_ms: 0, .. } = wait {
            return Err(ConfigError::InvalidWait(
                "interval_ms must be greater than zero".to_string(),
            ));
        }

        Ok(wait)
    }
}
