//! Track tag lookup using Lofty, for the host's status line.

use std::path::Path;

use anyhow::Result;
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::probe::Probe;
use lofty::tag::Accessor;

/// Human-facing description of the bound track.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackInfo {
    pub title: Option<String>,
    pub artist: Option<String>,
    /// Total track length in seconds.
    pub duration_secs: u64,
}

impl TrackInfo {
    /// "Artist - Title", falling back to whatever is known, then to `fallback`.
    pub fn label(&self, fallback: &str) -> String {
        match (&self.artist, &self.title) {
            (Some(artist), Some(title)) => format!("{} - {}", artist, title),
            (None, Some(title)) => title.clone(),
            _ => fallback.to_string(),
        }
    }
}

/// Read tags and duration for `path`. Safe to call from a background thread.
pub fn load_track_info(path: &Path) -> Result<TrackInfo> {
    let tagged_file = Probe::open(path)?.read()?;

    let tag = tagged_file
        .primary_tag()
        .or_else(|| tagged_file.first_tag());

    Ok(TrackInfo {
        title: tag.and_then(|t| t.title().map(|s| s.into_owned())),
        artist: tag.and_then(|t| t.artist().map(|s| s.into_owned())),
        duration_secs: tagged_file.properties().duration().as_secs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_prefers_artist_and_title() {
        let info = TrackInfo {
            title: Some("Nightcall".into()),
            artist: Some("Kavinsky".into()),
            duration_secs: 258,
        };
        assert_eq!(info.label("file.mp3"), "Kavinsky - Nightcall");
    }

    #[test]
    fn test_label_falls_back() {
        assert_eq!(TrackInfo::default().label("file.mp3"), "file.mp3");
    }
}
