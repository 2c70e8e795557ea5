//! Line grammar for per-directory metadata.txt override files.
//!
//! A document has an album region (everything before the first `file:`
//! line) and any number of file regions, each opened by `file: <name>:`.
//! The parser has no opinion about which field names are legal in which
//! scope; that belongs to the resolver.

use std::collections::HashMap;

use crate::metadata::error::MetadataError;

/// Field names recognized by the resolver. The parser retains unknown
/// names as-is.
pub mod fields {
    pub const TITLE: &str = "title";
    pub const ARTIST: &str = "artist";
    pub const DATE: &str = "date";
    pub const TRACK_NUMBER: &str = "track number";
    pub const COVER: &str = "cover";
}

/// Parsed representation of one metadata.txt source.
///
/// `file_entries` keeps the order the sections appeared in; duplicate
/// sections for the same filename stay separate and are merged by the
/// resolver, last write wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideDocument {
    pub album_fields: HashMap<String, String>,
    pub file_entries: Vec<FileOverride>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOverride {
    pub filename: String,
    pub fields: HashMap<String, String>,
}

impl OverrideDocument {
    pub fn album_field(&self, name: &str) -> Option<&str> {
        self.album_fields.get(name).map(String::as_str)
    }
}

/// Parses override text into a document.
///
/// Blank lines and full-line `#` comments are skipped and never close a
/// `file:` section. Every other line must be a `file: <name>:` header or a
/// `field: value` pair split on the first colon; anything else is a
/// [`MetadataError::MalformedLine`] with its 1-based line number.
pub fn parse(text: &str) -> Result<OverrideDocument, MetadataError> {
    let mut doc = OverrideDocument::default();

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        // A file section header is `file:` plus a name with one trailing
        // colon. `file: x` without the trailing colon falls through and
        // parses as an ordinary field named "file".
        if let Some(rest) = line.strip_prefix("file:")
            && let Some(name) = rest.strip_suffix(':')
        {
            doc.file_entries.push(FileOverride {
                filename: name.trim().to_string(),
                fields: HashMap::new(),
            });
            continue;
        }

        let Some((name, value)) = line.split_once(':') else {
            return Err(MetadataError::MalformedLine {
                line: idx + 1,
                text: line.to_string(),
            });
        };

        // Field names keep internal spaces ("track number") and case; an
        // empty remainder is an explicit empty value, not an absent field.
        let name = name.trim().to_string();
        let value = value.trim().to_string();

        match doc.file_entries.last_mut() {
            Some(entry) => entry.fields.insert(name, value),
            None => doc.album_fields.insert(name, value),
        };
    }

    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_album_fields_only() -> anyhow::Result<()> {
        let doc = parse("title: Some Album\nartist: Some Artist\ndate: 2023\n")?;

        assert_eq!(doc.album_field(fields::TITLE), Some("Some Album"));
        assert_eq!(doc.album_field(fields::ARTIST), Some("Some Artist"));
        assert_eq!(doc.album_field(fields::DATE), Some("2023"));
        assert!(doc.file_entries.is_empty());

        Ok(())
    }

    #[test]
    fn parse_file_sections_in_order() -> anyhow::Result<()> {
        let text = "artist: A\n\
                    file: 01.flac:\n\
                    title: One\n\
                    track number: 01\n\
                    file: 02.flac:\n\
                    title: Two\n";
        let doc = parse(text)?;

        assert_eq!(doc.file_entries.len(), 2);
        assert_eq!(doc.file_entries[0].filename, "01.flac");
        assert_eq!(doc.file_entries[0].fields["title"], "One");
        assert_eq!(doc.file_entries[0].fields["track number"], "01");
        assert_eq!(doc.file_entries[1].filename, "02.flac");
        assert_eq!(doc.file_entries[1].fields["title"], "Two");

        Ok(())
    }

    #[test]
    fn comments_and_blanks_do_not_close_a_section() -> anyhow::Result<()> {
        let text = "file: a.flac:\n\
                    title: X\n\
                    \n\
                    # still inside the section\n\
                    track number: 03\n";
        let doc = parse(text)?;

        assert_eq!(doc.file_entries.len(), 1);
        assert_eq!(doc.file_entries[0].fields["track number"], "03");

        Ok(())
    }

    #[test]
    fn empty_value_is_kept_as_empty_string() -> anyhow::Result<()> {
        let doc = parse("title:\nartist: A\n")?;

        assert_eq!(doc.album_field(fields::TITLE), Some(""));
        assert_eq!(doc.album_field(fields::ARTIST), Some("A"));

        Ok(())
    }

    #[test]
    fn value_splits_on_first_colon_only() -> anyhow::Result<()> {
        let doc = parse("title: Part 1: The Beginning\n")?;

        assert_eq!(doc.album_field(fields::TITLE), Some("Part 1: The Beginning"));

        Ok(())
    }

    #[test]
    fn field_names_are_case_sensitive() -> anyhow::Result<()> {
        let doc = parse("Title: upper\ntitle: lower\n")?;

        assert_eq!(doc.album_field("Title"), Some("upper"));
        assert_eq!(doc.album_field("title"), Some("lower"));

        Ok(())
    }

    #[test]
    fn duplicate_field_in_scope_last_write_wins() -> anyhow::Result<()> {
        let doc = parse("artist: First\nartist: Second\n")?;

        assert_eq!(doc.album_field(fields::ARTIST), Some("Second"));

        Ok(())
    }

    #[test]
    fn duplicate_file_sections_stay_separate() -> anyhow::Result<()> {
        let text = "file: a.flac:\ntitle: X\nfile: a.flac:\ntitle: Y\n";
        let doc = parse(text)?;

        assert_eq!(doc.file_entries.len(), 2);
        assert_eq!(doc.file_entries[0].fields["title"], "X");
        assert_eq!(doc.file_entries[1].fields["title"], "Y");

        Ok(())
    }

    #[test]
    fn line_without_colon_is_malformed() {
        let err = parse("title: ok\njust some words\n").unwrap_err();

        assert_eq!(
            err,
            MetadataError::MalformedLine {
                line: 2,
                text: "just some words".to_string(),
            }
        );
    }

    #[test]
    fn unknown_field_names_are_retained() -> anyhow::Result<()> {
        let doc = parse("conductor: Someone\n")?;

        assert_eq!(doc.album_field("conductor"), Some("Someone"));

        Ok(())
    }

    #[test]
    fn reparse_yields_equal_document() -> anyhow::Result<()> {
        let text = "title: A\n\nfile: x.flac:\ntitle: T\ntrack number: 01\n";

        assert_eq!(parse(text)?, parse(text)?);

        Ok(())
    }
}
