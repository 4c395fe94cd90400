//! Google News RSS search client.
//!
//! Each configured keyword becomes one request to the search feed:
//!
//! ```text
//! https://news.google.com/rss/search?q=%22Green%20Flag%20Ventures%22&hl=en-US&gl=US&ceid=US:en
//! ```
//!
//! The response is a plain RSS 2.0 document, read with quick-xml's event
//! reader. Items are picked up wherever they sit in the document; only the
//! first occurrence of each child element counts, and markup inside a child
//! contributes its text. Items without a title, a link, or a parseable
//! `pubDate` are dropped one at a time.

use crate::config::{FeedConfig, Keyword};
use crate::error::FetchError;
use crate::models::{Article, UNKNOWN_SOURCE};
use crate::normalize::{clean_description, normalize_timestamp};
use crate::utils::truncate_for_log;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesRef, Event};
use quick_xml::reader::Reader;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy)]
enum Field {
    Title,
    Link,
    Description,
    PubDate,
    Source,
}

impl Field {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"title" => Some(Field::Title),
            b"link" => Some(Field::Link),
            b"description" => Some(Field::Description),
            b"pubDate" => Some(Field::PubDate),
            b"source" => Some(Field::Source),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct ItemBuilder {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
    pub_date: Option<String>,
    source: Option<String>,
}

impl ItemBuilder {
    /// Record `text` for `field` unless an earlier occurrence already did.
    fn set(&mut self, field: Field, text: String) {
        let slot = match field {
            Field::Title => &mut self.title,
            Field::Link => &mut self.link,
            Field::Description => &mut self.description,
            Field::PubDate => &mut self.pub_date,
            Field::Source => &mut self.source,
        };
        slot.get_or_insert(text);
    }

    fn build(self, keyword: &str, max_description_chars: usize) -> Option<Article> {
        let title = self.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())?;
        let link = self.link.map(|l| l.trim().to_string()).filter(|l| !l.is_empty())?;
        let published = self.pub_date.as_deref().and_then(normalize_timestamp)?;
        let description = self
            .description
            .map(|d| clean_description(&d, max_description_chars))
            .unwrap_or_default();
        let source = self
            .source
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| UNKNOWN_SOURCE.to_string());

        Some(Article {
            title,
            link,
            description,
            published,
            source,
            keyword: Some(keyword.to_string()),
        })
    }
}

/// Append the text an entity or character reference stands for.
///
/// Unknown named entities are kept verbatim.
fn push_reference(text: &mut String, reference: &BytesRef<'_>) -> Result<(), quick_xml::Error> {
    if let Some(ch) = reference.resolve_char_ref()? {
        text.push(ch);
        return Ok(());
    }
    let name = reference.decode()?;
    match resolve_predefined_entity(&name) {
        Some(value) => text.push_str(value),
        None => {
            text.push('&');
            text.push_str(&name);
            text.push(';');
        }
    }
    Ok(())
}

/// Parse a search feed document into articles tagged with `keyword`.
///
/// Fails only when the document is not well-formed XML or has no `<channel>`.
pub fn parse_feed(
    xml: &str,
    keyword: &str,
    max_description_chars: usize,
) -> Result<Vec<Article>, FetchError> {
    let mut reader = Reader::from_str(xml);

    let mut saw_channel = false;
    let mut item: Option<ItemBuilder> = None;
    // Nesting depth below the open <item>; 1 is a direct child.
    let mut depth = 0usize;
    let mut open: Option<(Field, String)> = None;

    let mut total = 0usize;
    let mut articles = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.name();
                if item.is_some() {
                    depth += 1;
                    if depth == 1 {
                        open = Field::from_name(name.as_ref()).map(|f| (f, String::new()));
                    }
                } else if name.as_ref() == b"item" {
                    item = Some(ItemBuilder::default());
                    depth = 0;
                } else if name.as_ref() == b"channel" {
                    saw_channel = true;
                }
            }
            Event::Empty(e) => {
                let name = e.name();
                match item.as_mut() {
                    Some(builder) if depth == 0 => {
                        if let Some(field) = Field::from_name(name.as_ref()) {
                            builder.set(field, String::new());
                        }
                    }
                    Some(_) => {}
                    None => saw_channel |= name.as_ref() == b"channel",
                }
            }
            Event::End(_) => {
                if depth > 0 {
                    depth -= 1;
                    if depth == 0 {
                        if let (Some(builder), Some((field, text))) = (item.as_mut(), open.take()) {
                            builder.set(field, text);
                        }
                    }
                } else if let Some(builder) = item.take() {
                    total += 1;
                    articles.extend(builder.build(keyword, max_description_chars));
                }
            }
            Event::Text(e) => {
                if let Some((_, text)) = open.as_mut() {
                    text.push_str(&e.decode().map_err(quick_xml::Error::from)?);
                }
            }
            Event::CData(e) => {
                if let Some((_, text)) = open.as_mut() {
                    text.push_str(&e.decode().map_err(quick_xml::Error::from)?);
                }
            }
            Event::GeneralRef(e) => {
                if let Some((_, text)) = open.as_mut() {
                    push_reference(text, &e)?;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_channel {
        return Err(FetchError::NotRss);
    }
    if articles.len() < total {
        debug!(
            keyword,
            dropped = total - articles.len(),
            "Dropped feed items missing title, link or date"
        );
    }
    Ok(articles)
}

/// HTTP client for the search feed.
#[derive(Debug)]
pub struct GoogleNewsClient {
    client: Client,
    feed: FeedConfig,
    max_description_chars: usize,
}

impl GoogleNewsClient {
    pub fn new(feed: &FeedConfig, max_description_chars: usize) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(feed.timeout_secs))
            .user_agent(feed.user_agent.as_str())
            .build()?;
        Ok(Self {
            client,
            feed: feed.clone(),
            max_description_chars,
        })
    }

    /// Search URL for a raw query string.
    pub fn search_url(&self, query: &str) -> String {
        format!(
            "{}?q={}&hl={}&gl={}&ceid={}",
            self.feed.endpoint,
            urlencoding::encode(query),
            self.feed.language,
            self.feed.region,
            self.feed.edition
        )
    }

    /// Fetch articles for one keyword.
    ///
    /// Never fails: network, status and parse errors are logged and yield an
    /// empty list so the other keywords still run.
    #[instrument(level = "info", skip_all, fields(keyword = %keyword.label))]
    pub async fn fetch_keyword(&self, keyword: &Keyword) -> Vec<Article> {
        match self.try_fetch(keyword).await {
            Ok(articles) => {
                info!(count = articles.len(), query = %keyword.query, "Fetched articles");
                articles
            }
            Err(e) => {
                warn!(error = %e, query = %keyword.query, "Fetch failed; skipping keyword");
                Vec::new()
            }
        }
    }

    async fn try_fetch(&self, keyword: &Keyword) -> Result<Vec<Article>, FetchError> {
        let url = self.search_url(&keyword.query);
        debug!(%url, "Requesting search feed");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.text().await?;
        parse_feed(&body, &keyword.label, self.max_description_chars).inspect_err(|_| {
            debug!(body = %truncate_for_log(&body, 300), "Unparseable feed body");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use mockito::Matcher;

    const FEED: &str = r##"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<rss xmlns:media="http://search.yahoo.com/mrss/" version="2.0">
  <channel>
    <generator>NFE/5.0</generator>
    <title>"Green Flag Ventures" - Google News</title>
    <link>https://news.google.com/search?q=%22Green+Flag+Ventures%22</link>
    <language>en-US</language>
    <item>
      <title>Green Flag Ventures closes second fund - Reuters</title>
      <link>https://news.google.com/rss/articles/abc</link>
      <guid isPermaLink="false">abc</guid>
      <pubDate>Tue, 06 May 2025 14:30:00 GMT</pubDate>
      <description>&lt;a href="https://news.google.com/rss/articles/abc" target="_blank"&gt;Green Flag Ventures closes second fund&lt;/a&gt;&amp;nbsp;&amp;nbsp;&lt;font color="#6f6f6f"&gt;Reuters&lt;/font&gt;</description>
      <source url="https://www.reuters.com">Reuters</source>
    </item>
    <item>
      <title>No date here</title>
      <link>https://news.google.com/rss/articles/nodate</link>
      <description>missing pubDate</description>
    </item>
    <item>
      <title>Bad date</title>
      <link>https://news.google.com/rss/articles/baddate</link>
      <pubDate>sometime last week</pubDate>
    </item>
    <item>
      <title></title>
      <link>https://news.google.com/rss/articles/notitle</link>
      <pubDate>Tue, 06 May 2025 14:30:00 GMT</pubDate>
    </item>
    <item>
      <title>No source, no description</title>
      <link>https://news.google.com/rss/articles/bare</link>
      <pubDate>Mon, 05 May 2025 08:00:00 +0200</pubDate>
    </item>
  </channel>
</rss>"##;

    fn feed_config(endpoint: String) -> FeedConfig {
        FeedConfig {
            endpoint,
            timeout_secs: 5,
            ..FeedConfig::default()
        }
    }

    fn keyword() -> Keyword {
        Keyword::new("Green Flag Ventures", "\"Green Flag Ventures\"", "#d1fae5", "#065f46")
    }

    #[test]
    fn test_parse_feed_keeps_complete_items() {
        let articles = parse_feed(FEED, "Green Flag Ventures", 400).unwrap();
        let links: Vec<&str> = articles.iter().map(|a| a.link.as_str()).collect();
        assert_eq!(
            links,
            vec![
                "https://news.google.com/rss/articles/abc",
                "https://news.google.com/rss/articles/bare"
            ]
        );
    }

    #[test]
    fn test_parse_feed_normalizes_fields() {
        let articles = parse_feed(FEED, "Green Flag Ventures", 400).unwrap();

        let first = &articles[0];
        assert_eq!(first.title, "Green Flag Ventures closes second fund - Reuters");
        assert_eq!(first.description, "Green Flag Ventures closes second fund Reuters");
        assert_eq!(first.source, "Reuters");
        assert_eq!(first.keyword.as_deref(), Some("Green Flag Ventures"));
        assert_eq!(
            first.published,
            Utc.with_ymd_and_hms(2025, 5, 6, 14, 30, 0).unwrap()
        );

        let bare = &articles[1];
        assert_eq!(bare.description, "");
        assert_eq!(bare.source, UNKNOWN_SOURCE);
        assert_eq!(bare.published, Utc.with_ymd_and_hms(2025, 5, 5, 6, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_feed_truncates_description() {
        let articles = parse_feed(FEED, "GFV", 10).unwrap();
        assert_eq!(articles[0].description, "Green Flag");
        assert_eq!(articles[0].keyword.as_deref(), Some("GFV"));
    }

    #[test]
    fn test_parse_feed_empty_channel() {
        let xml = r#"<rss version="2.0"><channel><title>nothing</title></channel></rss>"#;
        assert!(parse_feed(xml, "GFV", 400).unwrap().is_empty());
    }

    #[test]
    fn test_parse_feed_rejects_malformed_document() {
        assert!(parse_feed("<html><body>Sorry</body>", "GFV", 400).is_err());
        assert!(parse_feed("not xml at all", "GFV", 400).is_err());
        assert!(matches!(
            parse_feed("<rss><channel><item></channel></rss>", "GFV", 400),
            Err(FetchError::Parse(_))
        ));
    }

    fn item(title: &str, link: &str) -> String {
        format!(
            "<item><title>{title}</title><link>{link}</link>\
             <pubDate>Tue, 06 May 2025 14:30:00 GMT</pubDate></item>"
        )
    }

    #[test]
    fn test_parse_feed_tolerates_channel_siblings_between_items() {
        let xml = format!(
            r#"<rss xmlns:atom="http://www.w3.org/2005/Atom"><channel>{}<atom:link href="https://x" rel="self"/>{}</channel></rss>"#,
            item("One", "https://x/1"),
            item("Two", "https://x/2")
        );
        let links: Vec<String> = parse_feed(&xml, "GFV", 400)
            .unwrap()
            .into_iter()
            .map(|a| a.link)
            .collect();
        assert_eq!(links, vec!["https://x/1", "https://x/2"]);
    }

    #[test]
    fn test_parse_feed_repeated_child_keeps_first() {
        let xml = format!(
            "<rss><channel>\
             <item><title>Twice</title><link>https://x/first</link><link>https://x/second</link>\
             <pubDate>Tue, 06 May 2025 14:30:00 GMT</pubDate></item>{}\
             </channel></rss>",
            item("Sibling", "https://x/sibling")
        );
        let articles = parse_feed(&xml, "GFV", 400).unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].link, "https://x/first");
        assert_eq!(articles[1].title, "Sibling");
    }

    #[test]
    fn test_parse_feed_title_with_markup_uses_text() {
        let xml = format!(
            "<rss><channel>{}</channel></rss>",
            item("a <b>b</b> &amp; c", "https://x/markup")
        );
        let articles = parse_feed(&xml, "GFV", 400).unwrap();
        assert_eq!(articles[0].title, "a b & c");
    }

    #[test]
    fn test_parse_feed_empty_cdata_and_attribute_forms() {
        let xml = r#"<rss><channel>
            <item>
              <title><![CDATA[Fund <closes>]]></title>
              <link>https://x/cdata</link>
              <description/>
              <source url="https://example.com"/>
              <pubDate>06 May 2025 14:30:00 +0000</pubDate>
            </item>
            <item>
              <title/>
              <title>Second title ignored</title>
              <link>https://x/untitled</link>
              <pubDate>Tue, 06 May 2025 14:30:00 GMT</pubDate>
            </item>
        </channel></rss>"#;
        let articles = parse_feed(xml, "GFV", 400).unwrap();

        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Fund <closes>");
        assert_eq!(articles[0].description, "");
        assert_eq!(articles[0].source, UNKNOWN_SOURCE);
        assert_eq!(
            articles[0].published,
            Utc.with_ymd_and_hms(2025, 5, 6, 14, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_feed_ignores_nested_non_field_elements() {
        let xml = r#"<rss xmlns:media="http://search.yahoo.com/mrss/"><channel><item>
            <media:content url="https://x/img.jpg"><media:title>Not the title</media:title></media:content>
            <title>Real title &#8211; Reuters</title>
            <link>https://x/media</link>
            <pubDate>Tue, 06 May 2025 14:30:00 GMT</pubDate>
        </item></channel></rss>"#;
        let articles = parse_feed(xml, "GFV", 400).unwrap();
        assert_eq!(articles[0].title, "Real title \u{2013} Reuters");
    }

    #[test]
    fn test_search_url_escapes_query() {
        let client = GoogleNewsClient::new(&FeedConfig::default(), 400).unwrap();
        assert_eq!(
            client.search_url("\"GFV\" ventures"),
            "https://news.google.com/rss/search?q=%22GFV%22%20ventures&hl=en-US&gl=US&ceid=US:en"
        );
    }

    #[tokio::test]
    async fn test_fetch_keyword_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/rss/search")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "\"Green Flag Ventures\"".into()),
                Matcher::UrlEncoded("hl".into(), "en-US".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/xml")
            .with_body(FEED)
            .create_async()
            .await;

        let client =
            GoogleNewsClient::new(&feed_config(format!("{}/rss/search", server.url())), 400)
                .unwrap();
        let articles = client.fetch_keyword(&keyword()).await;

        assert_eq!(articles.len(), 2);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_keyword_http_error_yields_nothing() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/rss/search")
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body(FEED)
            .create_async()
            .await;

        let client =
            GoogleNewsClient::new(&feed_config(format!("{}/rss/search", server.url())), 400)
                .unwrap();
        assert!(client.fetch_keyword(&keyword()).await.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_keyword_garbage_body_yields_nothing() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/rss/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html><p>captcha</p>")
            .create_async()
            .await;

        let client =
            GoogleNewsClient::new(&feed_config(format!("{}/rss/search", server.url())), 400)
                .unwrap();
        assert!(client.fetch_keyword(&keyword()).await.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_keyword_unreachable_host_yields_nothing() {
        let client =
            GoogleNewsClient::new(&feed_config("http://127.0.0.1:1/rss/search".into()), 400)
                .unwrap();
        assert!(client.fetch_keyword(&keyword()).await.is_empty());
    }
}
