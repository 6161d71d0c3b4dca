use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rss::{ChannelBuilder, EnclosureBuilder, GuidBuilder, ItemBuilder};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::audio::AudioLinkFinder;
use super::models::{FeedEntry, RewrittenItem};
use super::source::{FeedError, FeedSource};
use crate::link::{self, FEED_TAG, LinkCodec};

/// Browsers probe this path on their own; it is never a feed name.
const FAVICON: &str = "favicon.ico";

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("favicon probe is not a feed")]
    FaviconProbe,

    #[error("'{0}' does not resolve to a valid feed URL")]
    InvalidUrl(String),

    #[error("upstream feed unavailable: {0}")]
    Upstream(#[from] FeedError),

    #[error("{0} is not a feed (no title)")]
    MissingTitle(String),

    #[error("failed to serialize rewritten feed: {0}")]
    Serialize(#[from] rss::Error),
}

/// Turn a feed identifier into the URL to fetch.
///
/// Known short names map to their configured URL verbatim; anything else is
/// treated as a possibly mangled URL and repaired with [`link::fixup`].
pub fn resolve_identifier(
    identifier: &str,
    podcasts: &HashMap<String, String>,
) -> Result<String, RewriteError> {
    if identifier == FAVICON {
        return Err(RewriteError::FaviconProbe);
    }

    let url = match podcasts.get(identifier) {
        Some(known) => {
            debug!(identifier, url = %known, "Resolved known podcast");
            known.clone()
        }
        None => link::fixup(identifier),
    };

    if !link::is_valid_url(&url) {
        return Err(RewriteError::InvalidUrl(url));
    }

    Ok(url)
}

/// Map each entry to a rewritten item, dropping entries without audio.
pub fn rewrite_entries(
    podcast_title: &str,
    entries: &[FeedEntry],
    finder: &dyn AudioLinkFinder,
    codec: &LinkCodec,
) -> Vec<RewrittenItem> {
    entries
        .iter()
        .filter_map(|entry| {
            let Some(audio_url) = finder.find_audio_link(entry) else {
                debug!(title = %entry.title, "Skipping entry without audio link");
                return None;
            };

            let link = codec.encode(podcast_title, &entry.title, &audio_url);

            Some(RewrittenItem {
                title: entry.title.clone(),
                link,
                description: entry.description.clone(),
                enclosure_length: entry
                    .enclosures
                    .first()
                    .and_then(|enclosure| enclosure.length)
                    .unwrap_or(0),
                pub_date: entry.published,
            })
        })
        .collect()
}

/// Assemble the RSS 2.0 channel served to subscribers.
pub fn build_channel(
    feed_title: &str,
    description: &str,
    site_root: &str,
    items: &[RewrittenItem],
    built_at: DateTime<Utc>,
) -> rss::Channel {
    let items = items
        .iter()
        .map(|item| {
            ItemBuilder::default()
                .title(Some(item.title.clone()))
                .link(Some(item.link.clone()))
                .description(Some(item.description.clone()))
                .guid(Some(
                    GuidBuilder::default()
                        .value(item.link.clone())
                        .permalink(true)
                        .build(),
                ))
                .enclosure(Some(
                    EnclosureBuilder::default()
                        .url(item.link.clone())
                        .length(item.enclosure_length.to_string())
                        .mime_type(RewrittenItem::ENCLOSURE_MIME.to_string())
                        .build(),
                ))
                .pub_date(item.pub_date.as_ref().map(rss_date))
                .build()
        })
        .collect::<Vec<_>>();

    ChannelBuilder::default()
        .title(format!("{FEED_TAG}{feed_title}"))
        .link(site_root.to_string())
        .description(description.to_string())
        .last_build_date(Some(rss_date(&built_at)))
        .generator(Some(format!("podly {}", env!("CARGO_PKG_VERSION"))))
        .items(items)
        .build()
}

/// RFC 822 date with a zero-padded day and a literal `GMT` zone.
fn rss_date(date: &DateTime<Utc>) -> String {
    date.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Fetches an upstream feed and re-serializes it with rewritten links.
pub struct FeedRewriter<'a> {
    source: &'a dyn FeedSource,
    finder: &'a dyn AudioLinkFinder,
    codec: LinkCodec,
}

impl<'a> FeedRewriter<'a> {
    pub fn new(
        source: &'a dyn FeedSource,
        finder: &'a dyn AudioLinkFinder,
        codec: LinkCodec,
    ) -> Self {
        Self {
            source,
            finder,
            codec,
        }
    }

    /// Root URL of this service as advertised in the feed `<link>`.
    pub fn site_root(&self) -> String {
        format!("{}/", self.codec.base().unwrap_or_default())
    }

    /// Fetch `url` and return the rewritten feed as UTF-8 XML.
    pub async fn fetch_and_rewrite(&self, url: &str) -> Result<Vec<u8>, RewriteError> {
        let feed = self.source.fetch(url).await?;

        let Some(title) = feed.title.as_deref() else {
            warn!(url, "Upstream document has no feed title");
            return Err(RewriteError::MissingTitle(url.to_string()));
        };

        let items = rewrite_entries(title, &feed.entries, self.finder, &self.codec);
        info!(
            url,
            entries = feed.entries.len(),
            items = items.len(),
            "Rewrote feed"
        );

        let channel = build_channel(
            title,
            &feed.description,
            &self.site_root(),
            &items,
            Utc::now(),
        );

        Ok(channel.write_to(Vec::new())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{EnclosureAudioFinder, EntryEnclosure, ParsedFeed};
    use async_trait::async_trait;
    use chrono::TimeZone;

    struct StaticFeed(ParsedFeed);

    #[async_trait]
    impl FeedSource for StaticFeed {
        async fn fetch(&self, _url: &str) -> Result<ParsedFeed, FeedError> {
            Ok(self.0.clone())
        }
    }

    fn audio_entry(title: &str, url: &str, length: Option<u64>) -> FeedEntry {
        FeedEntry {
            title: title.to_string(),
            description: format!("About {title}"),
            link: None,
            enclosures: vec![EntryEnclosure {
                url: url.to_string(),
                length,
                mime_type: Some("audio/mpeg".to_string()),
            }],
            published: Some(Utc.with_ymd_and_hms(2024, 3, 4, 5, 6, 7).unwrap()),
        }
    }

    fn known() -> HashMap<String, String> {
        HashMap::from([("mypod".to_string(), "https://feed.example/rss".to_string())])
    }

    #[test]
    fn resolve_rejects_favicon() {
        let podcasts = HashMap::from([("favicon.ico".to_string(), "https://x.example".to_string())]);
        assert!(matches!(
            resolve_identifier("favicon.ico", &podcasts),
            Err(RewriteError::FaviconProbe)
        ));
    }

    #[test]
    fn resolve_uses_known_podcast() {
        assert_eq!(
            resolve_identifier("mypod", &known()).unwrap(),
            "https://feed.example/rss"
        );
    }

    #[test]
    fn resolve_fixes_raw_urls() {
        assert_eq!(
            resolve_identifier("https:/feeds.example/show.xml", &known()).unwrap(),
            "https://feeds.example/show.xml"
        );
        assert_eq!(
            resolve_identifier("feeds.example/show.xml", &known()).unwrap(),
            "https://feeds.example/show.xml"
        );
    }

    #[test]
    fn resolve_rejects_invalid_urls() {
        assert!(matches!(
            resolve_identifier("https://", &known()),
            Err(RewriteError::InvalidUrl(_))
        ));
    }

    #[test]
    fn rewrite_entries_drops_entries_without_audio() {
        let entries = vec![
            audio_entry("Ep One!", "https://cdn.example/ep1.mp3", Some(1000)),
            FeedEntry {
                title: "Blog post".to_string(),
                ..Default::default()
            },
            audio_entry("Ep Two", "https://cdn.example/ep2.mp3", None),
        ];

        let codec = LinkCodec::new(Some("https://podly.example"));
        let items = rewrite_entries("My Pod", &entries, &EnclosureAudioFinder, &codec);

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Ep One!");
        assert_eq!(items[0].description, "About Ep One!");
        assert_eq!(items[0].enclosure_length, 1000);
        assert_eq!(items[1].enclosure_length, 0);
        assert!(items[0].link.starts_with("https://podly.example/download/Ep%20One.mp3?"));

        let params = LinkCodec::decode(&items[0].link).unwrap();
        assert_eq!(params.podcast_title, "[podly] My Pod");
        assert_eq!(params.episode_url, "https://cdn.example/ep1.mp3");
    }

    #[test]
    fn build_channel_tags_title_and_fixes_mime() {
        let built_at = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let items = vec![RewrittenItem {
            title: "Ep".to_string(),
            link: "https://podly.example/download/Ep.mp3?x".to_string(),
            description: "d".to_string(),
            enclosure_length: 5,
            pub_date: Some(Utc.with_ymd_and_hms(2024, 3, 4, 5, 6, 7).unwrap()),
        }];

        let channel = build_channel("Show", "About", "https://podly.example/", &items, built_at);

        assert_eq!(channel.title(), "[podly] Show");
        assert_eq!(channel.link(), "https://podly.example/");
        assert_eq!(channel.description(), "About");
        assert_eq!(channel.last_build_date(), Some("Wed, 01 May 2024 00:00:00 GMT"));

        let item = &channel.items()[0];
        assert_eq!(item.guid().unwrap().value(), items[0].link);
        let enclosure = item.enclosure().unwrap();
        assert_eq!(enclosure.url(), items[0].link);
        assert_eq!(enclosure.length(), "5");
        assert_eq!(enclosure.mime_type(), "audio/mp3");
        assert_eq!(item.pub_date(), Some("Mon, 04 Mar 2024 05:06:07 GMT"));
    }

    #[tokio::test]
    async fn fetch_and_rewrite_serializes_rss() {
        let source = StaticFeed(ParsedFeed {
            title: Some("Daily & More".to_string()),
            description: "News".to_string(),
            entries: vec![audio_entry("Ep One!", "https://cdn.example/ep1.mp3", Some(1000))],
        });
        let rewriter = FeedRewriter::new(
            &source,
            &EnclosureAudioFinder,
            LinkCodec::new(Some("http://localhost:5001")),
        );

        let xml = rewriter.fetch_and_rewrite("https://feed.example/rss").await.unwrap();
        let channel = rss::Channel::read_from(&xml[..]).unwrap();

        assert_eq!(channel.title(), "[podly] Daily & More");
        assert_eq!(channel.link(), "http://localhost:5001/");
        assert_eq!(channel.items().len(), 1);
        let params =
            LinkCodec::decode(channel.items()[0].enclosure().unwrap().url()).unwrap();
        assert_eq!(params.podcast_title, "[podly] Daily  More");
        assert_eq!(params.episode_url, "https://cdn.example/ep1.mp3");
    }

    #[tokio::test]
    async fn fetch_and_rewrite_requires_title() {
        let source = StaticFeed(ParsedFeed::default());
        let rewriter = FeedRewriter::new(&source, &EnclosureAudioFinder, LinkCodec::new(None));

        let result = rewriter.fetch_and_rewrite("https://feed.example/rss").await;
        assert!(matches!(result, Err(RewriteError::MissingTitle(_))));
    }

    #[test]
    fn rss_date_pads_single_digit_days() {
        let date = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(rss_date(&date), "Tue, 02 Jan 2024 03:04:05 GMT");
    }
}
