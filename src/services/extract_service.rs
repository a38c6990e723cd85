use std::sync::LazyLock;

use chrono::format::{Parsed, StrftimeItems};
use chrono::{DateTime, Utc};
use quick_xml::escape::{escape, partial_escape};
use regex::Regex;
use scraper::{ElementRef, Html};
use tracing::{debug, info, instrument};
use url::Url;

use crate::domain::{DescriptionType, FeedDocument, FeedExtractionPlan, FeedItem};
use crate::errors::ExtractionError;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Whether a failed field aborts the run or is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldPolicy {
    Required,
    Tolerant,
}

/// One per-item extraction step. Steps run in `FieldStep::ORDER`; the image
/// step reads the title and appends to the description, so order matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldStep {
    Title,
    Link,
    Description,
    Image,
    Date,
}

impl FieldStep {
    pub const ORDER: [FieldStep; 5] = [
        FieldStep::Title,
        FieldStep::Link,
        FieldStep::Description,
        FieldStep::Image,
        FieldStep::Date,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FieldStep::Title => "title",
            FieldStep::Link => "link",
            FieldStep::Description => "description",
            FieldStep::Image => "image",
            FieldStep::Date => "date",
        }
    }

    pub fn policy(&self) -> FieldPolicy {
        match self {
            FieldStep::Title | FieldStep::Link | FieldStep::Date => FieldPolicy::Required,
            FieldStep::Description | FieldStep::Image => FieldPolicy::Tolerant,
        }
    }
}

#[derive(Debug)]
enum StepFailure {
    NoMatch(String),
    MissingAttribute(&'static str),
    BadUrl {
        value: String,
        source: url::ParseError,
    },
    BadDate {
        value: String,
        format: String,
        source: chrono::ParseError,
    },
}

impl StepFailure {
    fn into_error(self, index: usize, step: FieldStep) -> ExtractionError {
        let field = step.name();
        match self {
            StepFailure::NoMatch(selector) => ExtractionError::NoMatch {
                index,
                field,
                selector,
            },
            StepFailure::MissingAttribute(attribute) => ExtractionError::MissingAttribute {
                index,
                field,
                attribute,
            },
            StepFailure::BadUrl { value, source } => ExtractionError::BadUrl {
                index,
                field,
                value,
                source,
            },
            StepFailure::BadDate {
                value,
                format,
                source,
            } => ExtractionError::BadDate {
                index,
                value,
                format,
                source,
            },
        }
    }
}

#[derive(Debug, Default)]
struct ItemDraft {
    title: String,
    link: String,
    description: String,
    published_at: Option<DateTime<Utc>>,
}

impl ItemDraft {
    fn finish(self) -> FeedItem {
        FeedItem::new(self.title, self.link)
            .with_description(self.description)
            .with_published(self.published_at)
    }
}

/// Build a feed from every item container in `document`.
///
/// Relative links and image sources are resolved against `base_url`, the
/// URL the document was actually loaded from. Any required field failure
/// aborts the whole extraction; no partial feed is returned.
#[instrument(level = "debug", skip_all, fields(url = %base_url, posts = %plan.posts_list_selector))]
pub fn extract(
    plan: &FeedExtractionPlan,
    document: &Html,
    base_url: &Url,
) -> Result<FeedDocument, ExtractionError> {
    let items = document
        .select(plan.posts_list_selector.compiled())
        .enumerate()
        .map(|(index, container)| extract_item(plan, container, base_url, index))
        .collect::<Result<Vec<_>, _>>()?;

    info!(count = items.len(), "Extracted feed items");

    Ok(FeedDocument::from_plan(plan, items))
}

fn extract_item(
    plan: &FeedExtractionPlan,
    container: ElementRef<'_>,
    base_url: &Url,
    index: usize,
) -> Result<FeedItem, ExtractionError> {
    let mut draft = ItemDraft::default();

    for step in FieldStep::ORDER {
        if let Err(failure) = run_step(step, plan, container, base_url, &mut draft) {
            match step.policy() {
                FieldPolicy::Required => return Err(failure.into_error(index, step)),
                FieldPolicy::Tolerant => {
                    debug!(index, field = step.name(), ?failure, "Skipping optional field");
                }
            }
        }
    }

    Ok(draft.finish())
}

fn run_step(
    step: FieldStep,
    plan: &FeedExtractionPlan,
    container: ElementRef<'_>,
    base_url: &Url,
    draft: &mut ItemDraft,
) -> Result<(), StepFailure> {
    match step {
        FieldStep::Title => {
            let element = first_match(container, plan.title_selector.compiled(), plan.title_selector.as_str())?;
            draft.title = rendered_text(element);
        }
        FieldStep::Link => {
            let element = first_match(container, plan.link_selector.compiled(), plan.link_selector.as_str())?;
            draft.link = resolved_attr(element, "href", base_url)?;
        }
        FieldStep::Description => {
            let Some(selector) = &plan.description_selector else {
                return Ok(());
            };
            let element = first_match(container, selector.compiled(), selector.as_str())?;
            draft.description = match plan.description_type {
                DescriptionType::Html => element.inner_html(),
                DescriptionType::Text => format!("<p>{}</p>", partial_escape(rendered_text(element).as_str())),
            };
        }
        FieldStep::Image => {
            let Some(selector) = &plan.image_selector else {
                return Ok(());
            };
            let element = first_match(container, selector.compiled(), selector.as_str())?;
            let src = resolved_attr(element, "src", base_url)?;
            draft.description.push_str(&format!(
                r#"<img src="{}" alt="{}">"#,
                escape(src.as_str()),
                escape(draft.title.as_str())
            ));
        }
        FieldStep::Date => {
            let Some(date) = &plan.date else {
                return Ok(());
            };
            let element = first_match(container, date.selector.compiled(), date.selector.as_str())?;
            let value = rendered_text(element);
            let parsed = parse_date(&value, &date.format).map_err(|source| StepFailure::BadDate {
                value: value.clone(),
                format: date.format.clone(),
                source,
            })?;
            draft.published_at = Some(parsed);
        }
    }

    Ok(())
}

fn first_match<'a>(
    container: ElementRef<'a>,
    selector: &scraper::Selector,
    source: &str,
) -> Result<ElementRef<'a>, StepFailure> {
    container
        .select(selector)
        .next()
        .ok_or_else(|| StepFailure::NoMatch(source.to_string()))
}

/// Text content with runs of whitespace collapsed, the way a browser
/// renders it.
fn rendered_text(element: ElementRef<'_>) -> String {
    let raw: String = element.text().collect();
    WHITESPACE.replace_all(raw.trim(), " ").into_owned()
}

fn resolved_attr(
    element: ElementRef<'_>,
    attribute: &'static str,
    base_url: &Url,
) -> Result<String, StepFailure> {
    let value = element
        .value()
        .attr(attribute)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(StepFailure::MissingAttribute(attribute))?;

    base_url
        .join(value)
        .map(String::from)
        .map_err(|source| StepFailure::BadUrl {
            value: value.to_string(),
            source,
        })
}

/// Parse `value` with a strftime pattern. Fields the pattern leaves out
/// default to zero: a date-only pattern yields midnight and an hour-only
/// pattern yields the top of that hour. The wall-clock value is taken as
/// UTC without conversion.
pub fn parse_date(value: &str, format: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let mut parsed = Parsed::new();
    chrono::format::parse(&mut parsed, value, StrftimeItems::new(format))?;

    if parsed.timestamp().is_none() {
        if parsed.hour_mod_12().is_none() && parsed.hour_div_12().is_none() {
            parsed.set_hour(0)?;
        }
        if parsed.minute().is_none() {
            parsed.set_minute(0)?;
        }
    }

    parsed.to_naive_datetime_with_offset(0).map(|datetime| datetime.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::resolve_service::resolve;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn plan_with(extra: Value) -> FeedExtractionPlan {
        let mut raw = json!({
            "website_url": "https://example.com/blog/",
            "website_title": "Example Blog",
            "website_description": "Posts from example.com",
            "posts_list_selector": ".post",
            "title_selector": ".t",
            "link_selector": "a"
        });
        for (key, value) in extra.as_object().unwrap() {
            raw.as_object_mut().unwrap().insert(key.clone(), value.clone());
        }
        resolve(&raw).unwrap()
    }

    fn run(plan: &FeedExtractionPlan, html: &str) -> Result<FeedDocument, ExtractionError> {
        let document = Html::parse_document(html);
        extract(plan, &document, &plan.website_url)
    }

    #[test]
    fn test_two_posts_without_optional_fields() {
        let plan = plan_with(json!({}));
        let html = r#"
            <div class="post"><span class="t">First</span><a href="/p/1">read</a></div>
            <div class="post"><span class="t">Second</span><a href="/p/2">read</a></div>
        "#;

        let feed = run(&plan, html).unwrap();

        assert_eq!(feed.items.len(), 2);
        assert_eq!(feed.items[0].title(), "First");
        assert_eq!(feed.items[0].link(), "https://example.com/p/1");
        assert_eq!(feed.items[1].title(), "Second");
        for item in &feed.items {
            assert_eq!(item.description_html(), "");
            assert!(item.published_at().is_none());
            assert_eq!(item.guid(), item.link());
        }
    }

    #[test]
    fn test_no_containers_yields_empty_feed() {
        let plan = plan_with(json!({"ttl_minutes": 30}));
        let feed = run(&plan, "<p>Nothing here</p>").unwrap();

        assert!(feed.items.is_empty());
        assert_eq!(feed.title, "Example Blog");
        assert_eq!(feed.link, "https://example.com/blog/");
        assert_eq!(feed.ttl_minutes, Some(30));
    }

    #[test]
    fn test_missing_title_aborts_run() {
        let plan = plan_with(json!({}));
        let html = r#"
            <div class="post"><span class="t">First</span><a href="/p/1">read</a></div>
            <div class="post"><a href="/p/2">untitled</a></div>
        "#;

        let err = run(&plan, html).unwrap_err();
        assert!(matches!(
            err,
            ExtractionError::NoMatch {
                index: 1,
                field: "title",
                ..
            }
        ));
    }

    #[test]
    fn test_link_without_href_aborts_run() {
        let plan = plan_with(json!({}));
        let html = r#"<div class="post"><span class="t">First</span><a>read</a></div>"#;

        let err = run(&plan, html).unwrap_err();
        assert!(matches!(
            err,
            ExtractionError::MissingAttribute {
                field: "link",
                attribute: "href",
                ..
            }
        ));
    }

    #[test]
    fn test_html_description_with_image() {
        let plan = plan_with(json!({
            "description_selector": ".d",
            "description_type": "html",
            "image_selector": "img"
        }));
        let html = r#"
            <div class="post">
                <span class="t">Hello</span><a href="https://example.com/hello">x</a>
                <div class="d"><b>x</b></div>
                <img src="https://example.com/a.png">
            </div>
        "#;

        let feed = run(&plan, html).unwrap();

        assert_eq!(
            feed.items[0].description_html(),
            r#"<b>x</b><img src="https://example.com/a.png" alt="Hello">"#
        );
    }

    #[test]
    fn test_relative_image_src_is_resolved() {
        let plan = plan_with(json!({"image_selector": "img"}));
        let html = r#"
            <div class="post"><span class="t">Hi</span><a href="/hi">x</a><img src="a.png"></div>
        "#;

        let feed = run(&plan, html).unwrap();

        assert_eq!(
            feed.items[0].description_html(),
            r#"<img src="https://example.com/blog/a.png" alt="Hi">"#
        );
    }

    #[test]
    fn test_text_description_is_wrapped_and_escaped() {
        let plan = plan_with(json!({"description_selector": ".d"}));
        let html = r#"
            <div class="post"><span class="t">T</span><a href="/t">x</a>
            <p class="d">  Fish &amp;
               chips  </p></div>
        "#;

        let feed = run(&plan, html).unwrap();
        assert_eq!(feed.items[0].description_html(), "<p>Fish &amp; chips</p>");
    }

    #[test]
    fn test_text_description_keeps_quotes_literal() {
        let plan = plan_with(json!({"description_selector": ".d"}));
        let html = r#"
            <div class="post"><span class="t">T</span><a href="/t">x</a>
            <p class="d">Mike's "best" post &lt;3</p></div>
        "#;

        let feed = run(&plan, html).unwrap();
        assert_eq!(
            feed.items[0].description_html(),
            r#"<p>Mike's "best" post &lt;3</p>"#
        );
    }

    #[test]
    fn test_image_without_src_leaves_description_untouched() {
        let plan = plan_with(json!({
            "description_selector": ".d",
            "description_type": "html",
            "image_selector": "img"
        }));
        let html = r#"
            <div class="post"><span class="t">A</span><a href="/a">x</a>
            <div class="d"><b>x</b></div><img alt="no source"></div>
            <div class="post"><span class="t">B</span><a href="/b">x</a>
            <div class="d"><b>x</b></div><img src="   "></div>
        "#;

        let feed = run(&plan, html).unwrap();

        assert_eq!(feed.items.len(), 2);
        for item in &feed.items {
            assert_eq!(item.description_html(), "<b>x</b>");
        }
    }

    #[test]
    fn test_missing_optional_fields_are_tolerated() {
        let plan = plan_with(json!({
            "description_selector": ".d",
            "image_selector": "img"
        }));
        let html = r#"<div class="post"><span class="t">T</span><a href="/t">x</a></div>"#;

        let feed = run(&plan, html).unwrap();
        assert_eq!(feed.items[0].description_html(), "");
    }

    #[test]
    fn test_no_image_selector_means_no_img() {
        let plan = plan_with(json!({"description_selector": ".d", "description_type": "text"}));
        let html = r#"
            <div class="post"><span class="t">T</span><a href="/t">x</a>
            <p class="d">Body</p><img src="a.png"></div>
        "#;

        let feed = run(&plan, html).unwrap();
        assert!(!feed.items[0].description_html().contains("<img"));
    }

    #[test]
    fn test_dates_are_parsed_as_utc() {
        let plan = plan_with(json!({
            "date_selector": "time",
            "date_format": "%B %d, %Y"
        }));
        let html = r#"
            <div class="post"><span class="t">T</span><a href="/t">x</a>
            <time>March 05, 2024</time></div>
        "#;

        let feed = run(&plan, html).unwrap();
        assert_eq!(
            feed.items[0].published_at(),
            Some(Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_bad_date_aborts_run() {
        let plan = plan_with(json!({
            "date_selector": "time",
            "date_format": "%Y-%m-%d"
        }));
        let html = r#"
            <div class="post"><span class="t">T</span><a href="/t">x</a>
            <time>yesterday</time></div>
        "#;

        let err = run(&plan, html).unwrap_err();
        assert!(matches!(err, ExtractionError::BadDate { index: 0, .. }));
    }

    #[test]
    fn test_missing_date_element_aborts_run() {
        let plan = plan_with(json!({
            "date_selector": "time",
            "date_format": "%Y-%m-%d"
        }));
        let html = r#"<div class="post"><span class="t">T</span><a href="/t">x</a></div>"#;

        let err = run(&plan, html).unwrap_err();
        assert!(matches!(err, ExtractionError::NoMatch { field: "date", .. }));
    }

    #[test]
    fn test_parse_date_with_time() {
        let parsed = parse_date("2024-01-15 12:30", "%Y-%m-%d %H:%M").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 15, 12, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_date_keeps_hour_without_minutes() {
        let parsed = parse_date("2024-01-15 14", "%Y-%m-%d %H").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 15, 14, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_date_only_yields_midnight() {
        let parsed = parse_date("2024-01-15", "%Y-%m-%d").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_date_with_seconds() {
        let parsed = parse_date("2024-01-15T08:05:09", "%Y-%m-%dT%H:%M:%S").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 15, 8, 5, 9).unwrap());
    }

    #[test]
    fn test_parse_date_rejects_trailing_garbage() {
        assert!(parse_date("2024-01-15 junk", "%Y-%m-%d").is_err());
    }

    #[test]
    fn test_step_order_and_policies() {
        assert_eq!(FieldStep::ORDER[0], FieldStep::Title);
        assert_eq!(FieldStep::Title.policy(), FieldPolicy::Required);
        assert_eq!(FieldStep::Link.policy(), FieldPolicy::Required);
        assert_eq!(FieldStep::Date.policy(), FieldPolicy::Required);
        assert_eq!(FieldStep::Description.policy(), FieldPolicy::Tolerant);
        assert_eq!(FieldStep::Image.policy(), FieldPolicy::Tolerant);

        let description = FieldStep::ORDER.iter().position(|s| *s == FieldStep::Description);
        let image = FieldStep::ORDER.iter().position(|s| *s == FieldStep::Image);
        assert!(description < image);
    }
}
