use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::domain::{FeedDocument, FeedExtractionPlan, FeedItem};
use crate::errors::FeederResult;

pub const GENERATOR: &str = concat!("feedgen ", env!("CARGO_PKG_VERSION"));

const FALLBACK_IDENTIFIER: &str = "feed";

/// Render a feed document as a pretty-printed RSS 2.0 document.
pub fn to_rss(feed: &FeedDocument) -> FeederResult<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    writer.write_event(Event::Start(rss))?;
    writer.write_event(Event::Start(BytesStart::new("channel")))?;

    write_text_element(&mut writer, "title", &feed.title)?;
    write_text_element(&mut writer, "link", &feed.link)?;
    write_text_element(&mut writer, "description", &feed.description)?;
    write_text_element(&mut writer, "generator", GENERATOR)?;

    if let Some(built_at) = feed.last_build_date {
        write_text_element(&mut writer, "lastBuildDate", &built_at.to_rfc2822())?;
    }

    if let Some(ttl) = feed.ttl_minutes {
        write_text_element(&mut writer, "ttl", &ttl.to_string())?;
    }

    for item in &feed.items {
        write_item(&mut writer, item)?;
    }

    writer.write_event(Event::End(BytesEnd::new("channel")))?;
    writer.write_event(Event::End(BytesEnd::new("rss")))?;

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    Ok(bytes)
}

fn write_item(writer: &mut Writer<Vec<u8>>, item: &FeedItem) -> FeederResult<()> {
    writer.write_event(Event::Start(BytesStart::new("item")))?;

    write_text_element(writer, "title", item.title())?;
    write_text_element(writer, "link", item.link())?;

    let mut guid = BytesStart::new("guid");
    guid.push_attribute(("isPermaLink", "false"));
    writer.write_event(Event::Start(guid))?;
    writer.write_event(Event::Text(BytesText::new(item.guid())))?;
    writer.write_event(Event::End(BytesEnd::new("guid")))?;

    write_text_element(writer, "description", item.description_html())?;

    if let Some(published) = item.published_at() {
        write_text_element(writer, "pubDate", &published.to_rfc2822())?;
    }

    writer.write_event(Event::End(BytesEnd::new("item")))?;
    Ok(())
}

fn write_text_element(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> FeederResult<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// The configured file name, or the alphanumeric characters of the title.
pub fn output_identifier(plan: &FeedExtractionPlan) -> String {
    if let Some(name) = &plan.file_name {
        return name.clone();
    }

    let sanitized: String = plan
        .website_title
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect();

    if sanitized.is_empty() {
        FALLBACK_IDENTIFIER.to_string()
    } else {
        sanitized
    }
}

pub fn output_file_name(plan: &FeedExtractionPlan) -> String {
    let identifier = output_identifier(plan);
    if identifier.to_lowercase().ends_with(".xml") {
        identifier
    } else {
        format!("{}.xml", identifier)
    }
}
