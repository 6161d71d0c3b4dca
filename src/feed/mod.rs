//! Feed fetching, audio-link discovery and feed rewriting.

mod audio;
mod models;
mod rewrite;
mod source;

pub use audio::{AudioLinkFinder, EnclosureAudioFinder};
pub use models::{EntryEnclosure, FeedEntry, ParsedFeed, RewrittenItem};
pub use rewrite::{
    FeedRewriter, RewriteError, build_channel, resolve_identifier, rewrite_entries,
};
pub use source::{FeedError, FeedSource, HttpFeedSource, parse_feed};
