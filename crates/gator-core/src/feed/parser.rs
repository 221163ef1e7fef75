use quick_xml::events::{BytesText, Event};
use quick_xml::Reader;

use super::models::FetchedItem;
use crate::{Error, Result};

/// Channel-level data decoded from an RSS document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RssFeed {
    pub title: String,
    pub link: String,
    pub description: String,
    pub items: Vec<FetchedItem>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    Description,
    PubDate,
}

impl Field {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"title" => Some(Field::Title),
            b"link" => Some(Field::Link),
            b"description" => Some(Field::Description),
            b"pubDate" => Some(Field::PubDate),
            _ => None,
        }
    }
}

/// Parse an RSS 2.0 document.
///
/// Only `channel` and its direct `item` children are read; everything else is
/// skipped. Titles and descriptions are HTML-unescaped after XML decoding since
/// many feeds encode entities twice. `url` is only used for error messages.
pub fn parse_rss(content: &[u8], url: &str) -> Result<RssFeed> {
    let mut reader = Reader::from_reader(content);

    let mut feed = RssFeed::default();
    let mut saw_channel = false;
    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut current_item: Option<FetchedItem> = None;
    let mut buf = Vec::new();

    let parse_error = |message: String| Error::FeedParse {
        url: url.to_string(),
        message,
    };

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = e.name().as_ref().to_vec();
                if name == b"channel" {
                    saw_channel = true;
                }
                if name == b"item" && is_channel(&path) {
                    current_item = Some(FetchedItem::default());
                }
                path.push(name);
            }
            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"item" && path.len() >= 2 && is_channel(&path[..path.len() - 1]) {
                    if let Some(item) = current_item.take() {
                        feed.items.push(item);
                    }
                }
                path.pop();
            }
            Ok(Event::Empty(e)) => {
                if e.name().as_ref() == b"channel" {
                    saw_channel = true;
                }
            }
            Ok(Event::Text(e)) => {
                let text = decode_text(&e);
                append_text(&path, &mut feed, current_item.as_mut(), &text);
            }
            Ok(Event::CData(e)) => {
                let text = String::from_utf8_lossy(&e).to_string();
                append_text(&path, &mut feed, current_item.as_mut(), &text);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(parse_error(format!(
                    "XML error at position {}: {}",
                    reader.error_position(),
                    e
                )));
            }
            _ => {}
        }
        buf.clear();
    }

    if !path.is_empty() {
        return Err(parse_error("unexpected end of document".to_string()));
    }
    if !saw_channel {
        return Err(parse_error("missing <channel> element".to_string()));
    }

    // A field can span several text and CDATA events, so trim only once it is whole
    finish_field(&mut feed.title, true);
    finish_field(&mut feed.link, false);
    finish_field(&mut feed.description, true);
    for item in &mut feed.items {
        finish_field(&mut item.title, true);
        finish_field(&mut item.link, false);
        finish_field(&mut item.description, true);
        finish_field(&mut item.pub_date, false);
    }

    Ok(feed)
}

/// True when `path` ends at the channel element
fn is_channel(path: &[Vec<u8>]) -> bool {
    path.last().map(|n| n.as_slice() == b"channel").unwrap_or(false)
}

fn append_text(path: &[Vec<u8>], feed: &mut RssFeed, item: Option<&mut FetchedItem>, text: &str) {
    let Some((leaf, parents)) = path.split_last() else {
        return;
    };
    let Some(field) = Field::from_name(leaf) else {
        return;
    };

    let target = match parents.last().map(|p| p.as_slice()) {
        Some(b"item") if parents.len() >= 2 && is_channel(&parents[..parents.len() - 1]) => {
            match item {
                Some(item) => match field {
                    Field::Title => &mut item.title,
                    Field::Link => &mut item.link,
                    Field::Description => &mut item.description,
                    Field::PubDate => &mut item.pub_date,
                },
                None => return,
            }
        }
        Some(b"channel") => match field {
            Field::Title => &mut feed.title,
            Field::Link => &mut feed.link,
            Field::Description => &mut feed.description,
            Field::PubDate => return,
        },
        _ => return,
    };

    target.push_str(text);
}

fn decode_text(e: &BytesText<'_>) -> String {
    match e.unescape() {
        Ok(text) => text.into_owned(),
        Err(_) => {
            // Entities XML doesn't know about (e.g. &nbsp;) are kept for the HTML pass
            let raw = String::from_utf8_lossy(e);
            match quick_xml::escape::unescape(&escape_unknown_entities(&raw)) {
                Ok(text) => text.into_owned(),
                Err(_) => raw.into_owned(),
            }
        }
    }
}

/// Escape the `&` of every reference that is not an XML entity
fn escape_unknown_entities(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let known = after
            .find(';')
            .map(|end| is_xml_entity(&after[..end]))
            .unwrap_or(false);
        out.push_str(if known { "&" } else { "&amp;" });
        rest = after;
    }
    out.push_str(rest);

    out
}

fn is_xml_entity(name: &str) -> bool {
    matches!(name, "lt" | "gt" | "amp" | "apos" | "quot") || name.starts_with('#')
}

fn finish_field(field: &mut String, html: bool) {
    let trimmed = field.trim();
    if trimmed.len() != field.len() {
        *field = trimmed.to_string();
    }
    if html && field.contains('&') {
        *field = html_escape::decode_html_entities(field).into_owned();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://example.com/feed.xml";

    #[test]
    fn test_parse_channel_and_items() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom">
  <channel>
    <title>Boot.dev Blog</title>
    <link>https://blog.boot.dev/</link>
    <atom:link href="https://blog.boot.dev/index.xml" rel="self" type="application/rss+xml"/>
    <description>Recent content</description>
    <image>
      <title>Logo</title>
      <url>https://blog.boot.dev/logo.png</url>
    </image>
    <item>
      <title>First post</title>
      <link>https://blog.boot.dev/first/</link>
      <description>One</description>
      <pubDate>Mon, 01 May 2023 12:30:45 +0000</pubDate>
    </item>
    <item>
      <title>Second post</title>
      <link>https://blog.boot.dev/second/</link>
      <description><![CDATA[<p>Two & more</p>]]></description>
      <pubDate>2023/05/02</pubDate>
    </item>
  </channel>
</rss>"#;

        let feed = parse_rss(xml.as_bytes(), URL).unwrap();
        assert_eq!(feed.title, "Boot.dev Blog");
        assert_eq!(feed.link, "https://blog.boot.dev/");
        assert_eq!(feed.description, "Recent content");
        assert_eq!(feed.items.len(), 2);
        assert_eq!(
            feed.items[0],
            FetchedItem {
                title: "First post".to_string(),
                link: "https://blog.boot.dev/first/".to_string(),
                description: "One".to_string(),
                pub_date: "Mon, 01 May 2023 12:30:45 +0000".to_string(),
            }
        );
        assert_eq!(feed.items[1].description, "<p>Two & more</p>");
        assert_eq!(feed.items[1].pub_date, "2023/05/02");
    }

    #[test]
    fn test_entities_are_decoded() {
        let xml = r#"<rss><channel>
            <title>Tom &amp;amp; Jerry</title>
            <description>Caf&amp;eacute;</description>
            <item>
              <title>Salt &amp; Pepper</title>
              <link>https://example.com/a?x=1&amp;y=2</link>
              <description>&amp;lt;b&amp;gt;bold&amp;lt;/b&amp;gt;&amp;nbsp;text</description>
            </item>
        </channel></rss>"#;

        let feed = parse_rss(xml.as_bytes(), URL).unwrap();
        assert_eq!(feed.title, "Tom & Jerry");
        assert_eq!(feed.description, "Café");
        assert_eq!(feed.items[0].title, "Salt & Pepper");
        assert_eq!(feed.items[0].link, "https://example.com/a?x=1&y=2");
        assert_eq!(feed.items[0].description, "<b>bold</b>\u{a0}text");
    }

    #[test]
    fn test_unknown_entity_does_not_block_xml_decoding() {
        let xml = "<rss><channel><item><title>Tom &amp;amp; Jerry&nbsp;</title>\
                   <description>&lt;p&gt;Fish &amp;amp; Chips&lt;/p&gt;&hellip;</description></item></channel></rss>";

        let feed = parse_rss(xml.as_bytes(), URL).unwrap();
        assert_eq!(feed.items[0].title, "Tom & Jerry\u{a0}");
        assert_eq!(feed.items[0].description, "<p>Fish & Chips</p>\u{2026}");
    }

    #[test]
    fn test_text_around_cdata_keeps_spacing() {
        let xml = r#"<rss><channel>
            <item>
              <title>Hello <![CDATA[big]]> world</title>
              <description>
                Read <![CDATA[<b>this</b>]]> now
              </description>
              <pubDate>
                2023/05/01
              </pubDate>
            </item>
        </channel></rss>"#;

        let feed = parse_rss(xml.as_bytes(), URL).unwrap();
        assert_eq!(feed.items[0].title, "Hello big world");
        assert_eq!(feed.items[0].description, "Read <b>this</b> now");
        assert_eq!(feed.items[0].pub_date, "2023/05/01");
    }

    #[test]
    fn test_empty_channel() {
        let feed = parse_rss(b"<rss version=\"2.0\"><channel></channel></rss>", URL).unwrap();
        assert!(feed.items.is_empty());
        assert!(feed.title.is_empty());
    }

    #[test]
    fn test_malformed_xml_carries_url() {
        let err = parse_rss(b"<rss><channel><title>Broken</channel></rss>", URL).unwrap_err();
        match err {
            Error::FeedParse { url, .. } => assert_eq!(url, URL),
            e => panic!("Expected FeedParse error, got {:?}", e),
        }
    }

    #[test]
    fn test_truncated_document_is_error() {
        assert!(parse_rss(b"<rss><channel><item><title>x</title>", URL).is_err());
    }

    #[test]
    fn test_non_rss_document_is_error() {
        let err = parse_rss(b"<html><body>Not a feed</body></html>", URL).unwrap_err();
        assert!(matches!(err, Error::FeedParse { .. }));
    }
}
