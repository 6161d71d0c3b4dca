use chrono::{DateTime, Utc};

/// Upstream feed normalized from RSS or Atom.
#[derive(Debug, Clone, Default)]
pub struct ParsedFeed {
    /// `None` when the document has no usable title, which is how a
    /// non-feed resource shows up after parsing.
    pub title: Option<String>,
    pub description: String,
    pub entries: Vec<FeedEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct FeedEntry {
    pub title: String,
    pub description: String,
    pub link: Option<String>,
    pub enclosures: Vec<EntryEnclosure>,
    pub published: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryEnclosure {
    pub url: String,
    pub length: Option<u64>,
    pub mime_type: Option<String>,
}

/// One item of the rewritten feed. Lives for a single response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenItem {
    pub title: String,
    /// Rewritten download link; also used as guid and enclosure URL.
    pub link: String,
    pub description: String,
    pub enclosure_length: u64,
    pub pub_date: Option<DateTime<Utc>>,
}

impl RewrittenItem {
    pub const ENCLOSURE_MIME: &'static str = "audio/mp3";
}
