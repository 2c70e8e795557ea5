//! Embedded tag access via lofty.

use std::path::Path;

use anyhow::{Context, Result};
use lofty::config::WriteOptions;
use lofty::file::TaggedFileExt;
use lofty::probe::Probe;
use lofty::tag::{Accessor, ItemKey, Tag, TagExt};

use crate::metadata::ResolvedTags;

/// Tags read from an audio file. `None` means the field is missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbeddedTags {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub album_artist: Option<String>,
    pub date: Option<String>,
    pub track_number: Option<String>,
    pub genre: Option<String>,
}

pub fn read(path: &Path) -> Result<EmbeddedTags> {
    let tagged_file = Probe::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?
        .read()
        .with_context(|| format!("failed to read tags from {}", path.display()))?;

    let Some(tag) = tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) else {
        return Ok(EmbeddedTags::default());
    };

    Ok(EmbeddedTags {
        title: tag.title().map(|s| s.to_string()),
        artist: tag.artist().map(|s| s.to_string()),
        album: tag.album().map(|s| s.to_string()),
        album_artist: tag.get_string(&ItemKey::AlbumArtist).map(str::to_string),
        date: tag
            .get_string(&ItemKey::RecordingDate)
            .map(str::to_string)
            .or_else(|| tag.year().map(|y| y.to_string())),
        track_number: tag.track().map(|n| n.to_string()),
        genre: tag.genre().map(|s| s.to_string()),
    })
}

/// Applies a resolved tag plan to a copied lossy file.
///
/// Unset fields are left untouched; an explicit empty override removes the
/// tag from the file.
pub fn apply(path: &Path, plan: &ResolvedTags) -> Result<()> {
    let mut tagged_file = Probe::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?
        .read()
        .with_context(|| format!("failed to read tags from {}", path.display()))?;

    let tag_type = tagged_file.primary_tag_type();
    let tag = match tagged_file.tag_mut(tag_type) {
        Some(tag) => tag,
        None => {
            tagged_file.insert_tag(Tag::new(tag_type));
            tagged_file.tag_mut(tag_type).expect("just inserted tag")
        }
    };

    if let Some(title) = &plan.title {
        if title.is_empty() {
            tag.remove_title();
        } else {
            tag.set_title(title.clone());
        }
    }
    if let Some(artist) = &plan.artist {
        if artist.is_empty() {
            tag.remove_artist();
        } else {
            tag.set_artist(artist.clone());
        }
    }
    if let Some(album) = &plan.album {
        if album.is_empty() {
            tag.remove_album();
        } else {
            tag.set_album(album.clone());
        }
    }
    if let Some(album_artist) = &plan.album_artist {
        if album_artist.is_empty() {
            tag.remove_key(&ItemKey::AlbumArtist);
        } else {
            tag.insert_text(ItemKey::AlbumArtist, album_artist.clone());
        }
    }
    if let Some(date) = &plan.date {
        if date.is_empty() {
            tag.remove_key(&ItemKey::RecordingDate);
            tag.remove_year();
        } else {
            tag.insert_text(ItemKey::RecordingDate, date.clone());
        }
    }
    if let Some(track_number) = &plan.track_number {
        if track_number.is_empty() {
            tag.remove_track();
        } else if let Ok(number) = track_number.parse::<u32>() {
            tag.set_track(number);
        } else {
            tag.insert_text(ItemKey::TrackNumber, track_number.clone());
        }
    }

    tag.save_to_path(path, WriteOptions::default())
        .with_context(|| format!("failed to write tags to {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn read_non_audio_file_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "just text, not music").unwrap();

        assert!(read(file.path()).is_err());
    }

    #[test]
    fn read_missing_file_returns_error() {
        assert!(read(Path::new("does_not_exist.flac")).is_err());
    }

    #[test]
    fn apply_to_non_audio_file_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not an audio file").unwrap();

        let plan = ResolvedTags {
            filename: "x.mp3".to_string(),
            title: Some("T".to_string()),
            ..Default::default()
        };

        assert!(apply(file.path(), &plan).is_err());
    }
}
