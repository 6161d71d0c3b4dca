use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use thiserror::Error;
use tracing::debug;

use super::models::{EntryEnclosure, FeedEntry, ParsedFeed};

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("failed to fetch feed from {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("feed {url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("document is neither RSS ({rss}) nor Atom ({atom})")]
    Unparseable { rss: String, atom: String },
}

/// Fetches and normalizes an upstream podcast feed.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<ParsedFeed, FeedError>;
}

/// Feed source backed by a shared reqwest client.
#[derive(Clone)]
pub struct HttpFeedSource {
    client: reqwest::Client,
}

impl HttpFeedSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self, url: &str) -> Result<ParsedFeed, FeedError> {
        debug!(url, "Fetching upstream feed");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FeedError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|source| FeedError::Request {
            url: url.to_string(),
            source,
        })?;

        parse_feed(&body)
    }
}

/// Parse feed bytes as RSS, falling back to Atom.
pub fn parse_feed(bytes: &[u8]) -> Result<ParsedFeed, FeedError> {
    match rss::Channel::read_from(bytes) {
        Ok(channel) => Ok(from_rss(&channel)),
        Err(rss_err) => {
            debug!(error = %rss_err, "Not an RSS document, trying Atom");
            match atom_syndication::Feed::read_from(bytes) {
                Ok(feed) => Ok(from_atom(&feed)),
                Err(atom_err) => Err(FeedError::Unparseable {
                    rss: rss_err.to_string(),
                    atom: atom_err.to_string(),
                }),
            }
        }
    }
}

fn from_rss(channel: &rss::Channel) -> ParsedFeed {
    let entries = channel
        .items()
        .iter()
        .map(|item| FeedEntry {
            title: item.title().unwrap_or("Untitled Episode").to_string(),
            description: item.description().unwrap_or_default().to_string(),
            link: item.link().map(String::from),
            enclosures: item
                .enclosure()
                .map(|enclosure| EntryEnclosure {
                    url: enclosure.url().to_string(),
                    length: enclosure.length().trim().parse().ok(),
                    mime_type: Some(enclosure.mime_type().to_string())
                        .filter(|s| !s.is_empty()),
                })
                .into_iter()
                .collect(),
            published: item.pub_date().and_then(parse_date),
        })
        .collect();

    ParsedFeed {
        title: non_empty(channel.title()),
        description: channel.description().to_string(),
        entries,
    }
}

fn from_atom(feed: &atom_syndication::Feed) -> ParsedFeed {
    let entries = feed
        .entries()
        .iter()
        .map(|entry| {
            let description = entry
                .summary()
                .map(|s| s.as_str().to_string())
                .or_else(|| {
                    entry
                        .content()
                        .and_then(|c| c.value().map(|v| v.to_string()))
                })
                .unwrap_or_default();

            let link = entry
                .links()
                .iter()
                .find(|link| link.rel() == "alternate")
                .or_else(|| entry.links().first())
                .map(|link| link.href().to_string());

            let enclosures = entry
                .links()
                .iter()
                .filter(|link| link.rel() == "enclosure")
                .map(|link| EntryEnclosure {
                    url: link.href().to_string(),
                    length: link.length().and_then(|l| l.trim().parse().ok()),
                    mime_type: link.mime_type().map(String::from),
                })
                .collect();

            let published = entry
                .published()
                .unwrap_or_else(|| entry.updated())
                .with_timezone(&Utc);

            FeedEntry {
                title: non_empty(entry.title().as_str())
                    .unwrap_or_else(|| "Untitled Episode".to_string()),
                description,
                link,
                enclosures,
                published: Some(published),
            }
        })
        .collect();

    ParsedFeed {
        title: non_empty(feed.title().as_str()),
        description: feed
            .subtitle()
            .map(|s| s.as_str().to_string())
            .unwrap_or_default(),
        entries,
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// RFC 2822 first, then the formats podcast hosts commonly get wrong.
fn parse_date(date_str: &str) -> Option<DateTime<Utc>> {
    const FALLBACK_FORMATS: [&str; 3] = [
        "%a, %d %b %Y %H:%M:%S %z",
        "%Y-%m-%dT%H:%M:%S%:z",
        "%Y-%m-%d %H:%M:%S %z",
    ];

    let date_str = date_str.trim();
    DateTime::parse_from_rfc2822(date_str)
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(date_str).ok())
        .or_else(|| {
            FALLBACK_FORMATS
                .iter()
                .find_map(|format| DateTime::<FixedOffset>::parse_from_str(date_str, format).ok())
        })
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SAMPLE_RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test Podcast</title>
    <description>A test podcast</description>
    <link>https://example.com</link>
    <item>
      <title>Episode 1</title>
      <description>First episode</description>
      <pubDate>Mon, 01 Jan 2024 12:30:15 +0000</pubDate>
      <enclosure url="https://example.com/ep1.mp3" length="1234567" type="audio/mpeg"/>
    </item>
    <item>
      <title>Episode 2</title>
      <link>https://example.com/ep2</link>
    </item>
  </channel>
</rss>"#;

    const SAMPLE_ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Cast</title>
  <subtitle>Talk in Atom</subtitle>
  <id>urn:uuid:feed</id>
  <updated>2024-02-01T10:00:00Z</updated>
  <entry>
    <title>Atom Episode</title>
    <id>urn:uuid:ep1</id>
    <updated>2024-02-01T10:00:00Z</updated>
    <published>2024-01-31T08:00:00+02:00</published>
    <summary>Summary text</summary>
    <link rel="alternate" href="https://atom.example/ep1"/>
    <link rel="enclosure" href="https://atom.example/ep1.m4a" type="audio/mp4" length="42"/>
  </entry>
</feed>"#;

    #[test]
    fn parse_feed_reads_rss_channel() {
        let feed = parse_feed(SAMPLE_RSS.as_bytes()).unwrap();

        assert_eq!(feed.title.as_deref(), Some("Test Podcast"));
        assert_eq!(feed.description, "A test podcast");
        assert_eq!(feed.entries.len(), 2);

        let ep1 = &feed.entries[0];
        assert_eq!(ep1.title, "Episode 1");
        assert_eq!(ep1.description, "First episode");
        assert_eq!(
            ep1.enclosures,
            vec![EntryEnclosure {
                url: "https://example.com/ep1.mp3".to_string(),
                length: Some(1234567),
                mime_type: Some("audio/mpeg".to_string()),
            }]
        );
        let published = ep1.published.unwrap();
        assert_eq!((published.year(), published.month(), published.day()), (2024, 1, 1));
        assert_eq!(
            (published.hour(), published.minute(), published.second()),
            (12, 30, 15)
        );

        let ep2 = &feed.entries[1];
        assert!(ep2.enclosures.is_empty());
        assert_eq!(ep2.link.as_deref(), Some("https://example.com/ep2"));
        assert!(ep2.published.is_none());
    }

    #[test]
    fn parse_feed_falls_back_to_atom() {
        let feed = parse_feed(SAMPLE_ATOM.as_bytes()).unwrap();

        assert_eq!(feed.title.as_deref(), Some("Atom Cast"));
        assert_eq!(feed.description, "Talk in Atom");

        let entry = &feed.entries[0];
        assert_eq!(entry.description, "Summary text");
        assert_eq!(entry.link.as_deref(), Some("https://atom.example/ep1"));
        assert_eq!(entry.enclosures[0].url, "https://atom.example/ep1.m4a");
        assert_eq!(entry.enclosures[0].length, Some(42));
        assert_eq!(entry.published.unwrap().hour(), 6);
    }

    #[test]
    fn parse_feed_reports_missing_title() {
        let untitled = r#"<rss version="2.0"><channel><title></title><description>x</description></channel></rss>"#;
        let feed = parse_feed(untitled.as_bytes()).unwrap();
        assert!(feed.title.is_none());
    }

    #[test]
    fn parse_feed_rejects_html() {
        let result = parse_feed(b"<html><body>nope</body></html>");
        assert!(matches!(result, Err(FeedError::Unparseable { .. })));
    }

    #[test]
    fn parse_date_accepts_relaxed_formats() {
        assert!(parse_date("Tue, 02 Jan 2024 10:00:00 GMT").is_some());
        assert!(parse_date("2024-01-02T10:00:00+00:00").is_some());
        assert!(parse_date("2024-01-02 10:00:00 +0000").is_some());
        assert!(parse_date("yesterday").is_none());
    }

    #[tokio::test]
    async fn http_feed_source_fetches_and_parses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SAMPLE_RSS))
            .mount(&server)
            .await;

        let source = HttpFeedSource::new(reqwest::Client::new());
        let feed = source
            .fetch(&format!("{}/feed.xml", server.uri()))
            .await
            .unwrap();

        assert_eq!(feed.title.as_deref(), Some("Test Podcast"));
        assert_eq!(feed.entries.len(), 2);
    }

    #[tokio::test]
    async fn http_feed_source_rejects_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let source = HttpFeedSource::new(reqwest::Client::new());
        let result = source.fetch(&format!("{}/missing", server.uri())).await;

        assert!(matches!(result, Err(FeedError::HttpStatus { status: 404, .. })));
    }
}
