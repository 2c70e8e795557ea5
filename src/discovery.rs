//! Module to scan source collection directories in the file system

use std::path::{Path, PathBuf};

use anyhow::Context;
use walkdir::WalkDir;

/// Per-directory override file consumed by `export` and written by
/// `extract-metadata`.
pub const OVERRIDE_FILENAME: &str = "metadata.txt";

pub const LOSSLESS_EXTENSIONS: &[&str] = &["flac", "wav"];
pub const LOSSY_EXTENSIONS: &[&str] = &["mp3", "ogg", "aac", "m4a", "opus"];

const COVER_PREFIXES: &[&str] = &["cover", "folder", "front", "album"];
const COVER_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp"];

/// How a source file reaches the destination: lossless files are
/// transcoded to Opus, lossy files are copied byte for byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioKind {
    Lossless,
    Lossy,
}

pub fn audio_kind(path: &Path) -> Option<AudioKind> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    if LOSSLESS_EXTENSIONS.contains(&ext.as_str()) {
        Some(AudioKind::Lossless)
    } else if LOSSY_EXTENSIONS.contains(&ext.as_str()) {
        Some(AudioKind::Lossy)
    } else {
        None
    }
}

pub fn is_audio_file(path: &Path) -> bool {
    audio_kind(path).is_some()
}

/// Lists the audio filenames directly inside `dir`, sorted. Non-UTF-8
/// names are skipped with a warning.
pub fn audio_files_in(dir: &Path) -> anyhow::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() || !is_audio_file(&path) {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(name) => log::warn!("skipping non-UTF-8 filename {name:?}"),
        }
    }
    names.sort();
    Ok(names)
}

/// Lists every filename directly inside `dir`, for cover art detection.
pub fn files_in(dir: &Path) -> anyhow::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory {}", dir.display()))?
    {
        let entry = entry?;
        if !entry.path().is_file() {
            continue;
        }
        if let Ok(name) = entry.file_name().into_string() {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// Recursively finds every directory under `root` (including `root`
/// itself) that directly contains at least one audio file, sorted.
pub fn album_dirs(root: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if !root.is_dir() {
        anyhow::bail!("{} is not a directory", root.display());
    }

    let mut dirs = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                log::warn!("error while scanning {}, skipping an entry: {err}", root.display());
                continue;
            }
        };
        if entry.file_type().is_dir() && directly_contains_audio(entry.path())? {
            dirs.push(entry.path().to_path_buf());
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn directly_contains_audio(dir: &Path) -> anyhow::Result<bool> {
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() && is_audio_file(&path) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Picks the cover art among `files` by conventional name: prefixes in
/// priority order, any of the known image extensions, case-insensitive.
pub fn find_cover_art<'a>(files: &'a [String]) -> Option<&'a str> {
    for prefix in COVER_PREFIXES {
        for name in files {
            let lower = name.to_lowercase();
            if lower.starts_with(prefix)
                && COVER_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
            {
                return Some(name.as_str());
            }
        }
    }
    None
}
