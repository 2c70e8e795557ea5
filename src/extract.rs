//! metadata.txt template generation from embedded tags.
//!
//! Walks a collection, finds every album directory and writes a
//! pre-filled override file next to the audio, so the overrides can be
//! reviewed and edited by hand before an export.

use std::fs;
use std::path::Path;

use anyhow::{Context, bail};

use crate::discovery::{self, OVERRIDE_FILENAME};
use crate::tags::{self, EmbeddedTags};

#[derive(Debug, Default)]
pub struct ExtractReport {
    /// metadata.txt files written.
    pub processed: usize,
    /// directories kept because metadata.txt already existed.
    pub skipped: usize,
}

/// Writes a metadata.txt into every album directory under `root`.
pub fn extract_tree(
    root: &Path,
    force: bool,
    template_only: bool,
) -> anyhow::Result<ExtractReport> {
    let dirs = discovery::album_dirs(root)?;
    if dirs.is_empty() {
        bail!("No audio files found under {}", root.display());
    }

    let mut report = ExtractReport::default();
    for dir in dirs {
        if extract_directory(&dir, force, template_only)? {
            report.processed += 1;
        } else {
            report.skipped += 1;
        }
    }
    Ok(report)
}

/// Writes one directory's template. Returns false when an existing
/// metadata.txt was kept.
pub fn extract_directory(dir: &Path, force: bool, template_only: bool) -> anyhow::Result<bool> {
    let target = dir.join(OVERRIDE_FILENAME);
    if target.exists() && !force {
        log::info!("keeping existing {}", target.display());
        return Ok(false);
    }

    let audio_files = discovery::audio_files_in(dir)?;
    let cover = discovery::find_cover_art(&discovery::files_in(dir)?).map(str::to_string);

    let seeds: Vec<(String, EmbeddedTags)> = audio_files
        .into_iter()
        .map(|name| {
            let embedded = if template_only {
                EmbeddedTags::default()
            } else {
                tags::read(&dir.join(&name)).unwrap_or_else(|err| {
                    log::debug!("no readable tags in {name}: {err:#}");
                    EmbeddedTags::default()
                })
            };
            (name, embedded)
        })
        .collect();

    let text = render_template(&seeds, cover.as_deref());
    fs::write(&target, text).with_context(|| format!("failed to write {}", target.display()))?;
    Ok(true)
}

/// Renders the override template: a commented header, the album block
/// seeded from the first file's tags, then one `file:` section per track.
fn render_template(files: &[(String, EmbeddedTags)], cover: Option<&str>) -> String {
    let first = files.first().map(|(_, embedded)| embedded);
    let album_title = first.and_then(|t| t.album.as_deref()).unwrap_or("");
    let album_artist = first
        .and_then(|t| t.album_artist.as_deref().or(t.artist.as_deref()))
        .unwrap_or("");
    let album_date = first.and_then(|t| t.date.as_deref()).unwrap_or("");

    let mut out = String::new();
    out.push_str("# This file contains metadata overrides for this album.\n");
    out.push_str("# An empty value erases the tag; delete a line to keep the\n");
    out.push_str("# file's embedded value.\n");
    out.push('\n');
    out.push_str("# Album metadata\n");
    push_field(&mut out, "title", album_title);
    push_field(&mut out, "artist", album_artist);
    push_field(&mut out, "date", album_date);
    push_field(&mut out, "cover", cover.unwrap_or(""));

    for (name, embedded) in files {
        out.push('\n');
        out.push_str(&format!("file: {name}:\n"));
        push_field(&mut out, "title", embedded.title.as_deref().unwrap_or(""));
        push_field(
            &mut out,
            "track number",
            embedded.track_number.as_deref().unwrap_or(""),
        );
    }

    out
}

fn push_field(out: &mut String, name: &str, value: &str) {
    // A tag value spanning lines would break the one-line field grammar
    // on re-parse, so embedded line breaks flatten to single spaces.
    let value = if value.contains(['\n', '\r']) {
        value.split(['\n', '\r']).filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" ")
    } else {
        value.to_string()
    };
    let value = value.trim();
    if value.is_empty() {
        out.push_str(&format!("{name}:\n"));
    } else {
        out.push_str(&format!("{name}: {value}\n"));
    }
}
