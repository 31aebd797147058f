//! Minimal RSS 2.0 / Atom reader.
//!
//! Only the fields the collector scores on are extracted: title, summary,
//! link, publication date and author.

use std::sync::LazyLock;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;

use crate::error::{TrendError, TrendResult};

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

/// One `<item>` or `<entry>` of a feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedEntry {
    pub title: String,
    /// Plain-text summary, HTML stripped
    pub summary: String,
    pub link: String,
    pub published: String,
    pub author: String,
}

#[derive(Clone, Copy, PartialEq)]
enum Field {
    Title,
    Summary,
    Link,
    Published,
    Author,
}

fn field_for(local_name: &[u8]) -> Option<Field> {
    match local_name {
        b"title" => Some(Field::Title),
        b"description" | b"summary" | b"content" | b"encoded" => Some(Field::Summary),
        b"link" => Some(Field::Link),
        b"pubDate" | b"published" | b"updated" | b"date" => Some(Field::Published),
        b"author" | b"creator" | b"name" => Some(Field::Author),
        _ => None,
    }
}

fn is_entry(local_name: &[u8]) -> bool {
    local_name == b"item" || local_name == b"entry"
}

/// Parse a feed document into its entries, in document order.
pub fn parse_feed(xml: &str) -> TrendResult<Vec<FeedEntry>> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    let mut entries = Vec::new();
    let mut current: Option<FeedEntry> = None;
    let mut field: Option<Field> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = e.local_name();
                if is_entry(name.as_ref()) {
                    current = Some(FeedEntry::default());
                    field = None;
                } else if let Some(entry) = current.as_mut() {
                    // First occurrence wins, e.g. `title` over `media:title`
                    field = field_for(name.as_ref()).filter(|f| slot(entry, *f).trim().is_empty());
                    if field == Some(Field::Link) {
                        set_link_from_href(entry, &e);
                    }
                }
            }
            Ok(Event::Empty(e)) => {
                if let Some(entry) = current.as_mut() {
                    if e.local_name().as_ref() == b"link" {
                        set_link_from_href(entry, &e);
                    }
                }
            }
            Ok(Event::Text(t)) => {
                if let (Some(entry), Some(f)) = (current.as_mut(), field) {
                    let text = t
                        .unescape()
                        .map_err(|e| TrendError::feed_parse(e.to_string()))?;
                    append(entry, f, &text);
                }
            }
            Ok(Event::CData(t)) => {
                if let (Some(entry), Some(f)) = (current.as_mut(), field) {
                    append(entry, f, &String::from_utf8_lossy(&t.into_inner()));
                }
            }
            Ok(Event::End(e)) => {
                if is_entry(e.local_name().as_ref()) {
                    if let Some(mut entry) = current.take() {
                        entry.title = entry.title.trim().to_string();
                        entry.summary = strip_html(&entry.summary);
                        entry.link = entry.link.trim().to_string();
                        entry.published = entry.published.trim().to_string();
                        entry.author = entry.author.trim().to_string();
                        if !entry.title.is_empty() {
                            entries.push(entry);
                        }
                    }
                }
                field = None;
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(TrendError::feed_parse(format!(
                    "XML error at position {}: {e}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(entries)
}

fn slot(entry: &mut FeedEntry, field: Field) -> &mut String {
    match field {
        Field::Title => &mut entry.title,
        Field::Summary => &mut entry.summary,
        Field::Link => &mut entry.link,
        Field::Published => &mut entry.published,
        Field::Author => &mut entry.author,
    }
}

fn append(entry: &mut FeedEntry, field: Field, text: &str) {
    slot(entry, field).push_str(text);
}

fn set_link_from_href(entry: &mut FeedEntry, e: &BytesStart<'_>) {
    if !entry.link.is_empty() {
        return;
    }
    if let Ok(Some(href)) = e.try_get_attribute("href") {
        if let Ok(value) = href.unescape_value() {
            entry.link = value.into_owned();
        }
    }
}

/// Drop markup and collapse whitespace.
pub fn strip_html(text: &str) -> String {
    HTML_TAG
        .replace_all(text, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rss() {
        let xml = r#"<?xml version="1.0"?>
<rss version="2.0" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <channel>
    <title>Channel title is ignored</title>
    <item>
      <title>Bitcoin &amp; Telegram gifts</title>
      <description><![CDATA[<p>New <b>crypto</b> bots</p>]]></description>
      <link>https://example.com/a</link>
      <pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate>
      <dc:creator>Alice</dc:creator>
    </item>
    <item>
      <title>Second</title>
    </item>
  </channel>
</rss>"#;

        let entries = parse_feed(xml).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "Bitcoin & Telegram gifts");
        assert_eq!(entries[0].summary, "New crypto bots");
        assert_eq!(entries[0].link, "https://example.com/a");
        assert_eq!(entries[0].author, "Alice");
        assert_eq!(entries[1].summary, "");
    }

    #[test]
    fn test_parse_atom() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Trending</title>
  <entry>
    <title>Free telegram bot</title>
    <link rel="alternate" href="https://video.example/watch?v=1"/>
    <author><name>Bob</name></author>
    <published>2024-01-01T00:00:00Z</published>
    <summary>Watch this</summary>
  </entry>
</feed>"#;

        let entries = parse_feed(xml).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].link, "https://video.example/watch?v=1");
        assert_eq!(entries[0].author, "Bob");
        assert_eq!(entries[0].published, "2024-01-01T00:00:00Z");
    }

    #[test]
    fn test_malformed_feed_is_an_error() {
        assert!(parse_feed("<rss><channel><item><title>x</wrong></item>").is_err());
    }
}
