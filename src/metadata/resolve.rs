//! Merges album-scope defaults and file-scope overrides into one tag plan
//! per source file.

use std::collections::HashMap;

use unicode_normalization::UnicodeNormalization;

use crate::metadata::{
    document::{OverrideDocument, fields},
    error::MetadataError,
};

/// Final tag plan for one output file.
///
/// `None` means no override anywhere in the chain: downstream leaves the
/// file's embedded value untouched. `Some("")` is an explicit erase and is
/// observably different from `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedTags {
    pub filename: String,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album_artist: Option<String>,
    pub album: Option<String>,
    pub date: Option<String>,
    pub track_number: Option<String>,
}

impl ResolvedTags {
    /// True when no field carries an override.
    pub fn is_noop(&self) -> bool {
        self.title.is_none()
            && self.artist.is_none()
            && self.album_artist.is_none()
            && self.album.is_none()
            && self.date.is_none()
            && self.track_number.is_none()
    }
}

/// Unicode-normalized filename comparison. A metadata.txt written on a
/// filesystem that decomposes names (NFD, e.g. macOS) must still match a
/// listing that keeps them composed (NFC), and vice versa.
fn filename_eq(a: &str, b: &str) -> bool {
    a == b || a.nfc().eq(b.nfc())
}

/// Computes one [`ResolvedTags`] per source filename, in caller order.
///
/// Referential integrity runs before anything is resolved: every filename
/// named by a `file:` section must be present in `source_filenames`, so a
/// typo'd section aborts the directory before any encode side effect.
pub fn resolve(
    doc: &OverrideDocument,
    source_filenames: &[String],
) -> Result<Vec<ResolvedTags>, MetadataError> {
    for entry in &doc.file_entries {
        if !source_filenames.iter().any(|f| filename_eq(f, &entry.filename)) {
            return Err(MetadataError::UnknownOverrideFile {
                filename: entry.filename.clone(),
            });
        }
    }

    source_filenames
        .iter()
        .map(|filename| resolve_one(doc, filename))
        .collect()
}

fn resolve_one(doc: &OverrideDocument, filename: &str) -> Result<ResolvedTags, MetadataError> {
    // Duplicate `file:` sections for the same name merge in document
    // order, last write wins, mirroring the parser's own duplicate policy.
    let mut file_fields: HashMap<&str, &str> = HashMap::new();
    for entry in doc.file_entries.iter().filter(|e| filename_eq(&e.filename, filename)) {
        for (name, value) in &entry.fields {
            file_fields.insert(name.as_str(), value.as_str());
        }
    }
    let file_field = |name: &str| file_fields.get(name).map(|v| v.to_string());
    let album_field = |name: &str| doc.album_field(name).map(str::to_string);

    // Album and track titles are different namespaces: the album-scope
    // `title` becomes the ALBUM tag and never flows into a track title.
    let title = file_field(fields::TITLE);
    let album = album_field(fields::TITLE);

    // The album-scope artist is both the album artist and the default
    // track artist; a file-scope artist replaces only the latter.
    let album_artist = album_field(fields::ARTIST);
    let artist = file_field(fields::ARTIST).or_else(|| album_field(fields::ARTIST));

    let date = file_field(fields::DATE).or_else(|| album_field(fields::DATE));
    if let Some(date) = date.as_deref()
        && !date.is_empty()
        && !is_valid_date_shape(date)
    {
        return Err(MetadataError::InvalidDateShape {
            filename: filename.to_string(),
            value: date.to_string(),
        });
    }

    let track_number = file_field(fields::TRACK_NUMBER);

    Ok(ResolvedTags {
        filename: filename.to_string(),
        title,
        artist,
        album_artist,
        album,
        date,
        track_number,
    })
}

/// Accepts `YYYY`, `YYYY-MM` (month 01-12) and `YYYY-MM-DD` (day 01-31).
/// No calendar validity check beyond the digit ranges.
pub fn is_valid_date_shape(value: &str) -> bool {
    if !value.is_ascii() {
        return false;
    }
    let year_ok = |s: &str| s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit());
    let part_ok = |s: &str, lo: u8, hi: u8| {
        s.len() == 2
            && s.bytes().all(|b| b.is_ascii_digit())
            && matches!(s.parse::<u8>(), Ok(n) if n >= lo && n <= hi)
    };

    match value.len() {
        4 => year_ok(value),
        7 => year_ok(&value[..4]) && value.as_bytes()[4] == b'-' && part_ok(&value[5..], 1, 12),
        10 => {
            year_ok(&value[..4])
                && value.as_bytes()[4] == b'-'
                && part_ok(&value[5..7], 1, 12)
                && value.as_bytes()[7] == b'-'
                && part_ok(&value[8..], 1, 31)
        }
        _ => false,
    }
}
