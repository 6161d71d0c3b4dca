use url::Url;

use super::models::FeedEntry;

const AUDIO_EXTENSIONS: [&str; 8] = ["mp3", "m4a", "aac", "ogg", "oga", "opus", "wav", "flac"];

/// Picks the playable audio URL out of a feed entry.
pub trait AudioLinkFinder: Send + Sync {
    fn find_audio_link(&self, entry: &FeedEntry) -> Option<String>;
}

/// Prefers enclosures typed as audio, then enclosures or entry links whose
/// path carries an audio file extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnclosureAudioFinder;

impl AudioLinkFinder for EnclosureAudioFinder {
    fn find_audio_link(&self, entry: &FeedEntry) -> Option<String> {
        let typed = entry.enclosures.iter().find(|enclosure| {
            is_present(&enclosure.url)
                && enclosure
                    .mime_type
                    .as_deref()
                    .is_some_and(|mime| mime.trim().to_ascii_lowercase().starts_with("audio/"))
        });

        typed
            .or_else(|| {
                entry.enclosures.iter().find(|enclosure| {
                    is_present(&enclosure.url) && has_audio_extension(&enclosure.url)
                })
            })
            .map(|enclosure| enclosure.url.clone())
            .or_else(|| {
                entry
                    .link
                    .as_deref()
                    .filter(|link| is_present(link) && has_audio_extension(link))
                    .map(String::from)
            })
    }
}

fn is_present(url: &str) -> bool {
    !url.trim().is_empty()
}

fn has_audio_extension(candidate: &str) -> bool {
    let path = match Url::parse(candidate) {
        Ok(url) => url.path().to_string(),
        Err(_) => candidate
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };

    path.rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .is_some_and(|ext| AUDIO_EXTENSIONS.contains(&ext.as_str()))
}
