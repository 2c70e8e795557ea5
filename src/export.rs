//! Per-directory export: transcode lossless files to Opus, copy lossy
//! files verbatim, carry the cover art over, then run ReplayGain over the
//! destination.
//!
//! Transcoding and loudness tagging are delegated to the external
//! `opusenc` and `rsgain` binaries; this module only builds their command
//! lines and moves bytes.

use std::fs;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, bail};

use crate::config::Config;
use crate::discovery::{self, AudioKind, OVERRIDE_FILENAME};
use crate::metadata::{self, OverrideDocument, ResolvedTags, document::fields};
use crate::tags::{self, EmbeddedTags};

#[derive(Debug, Default)]
pub struct DirectoryReport {
    pub processed: usize,
    pub skipped: usize,
    pub cover_copied: bool,
}

/// Lossless inputs become `.opus`; lossy inputs keep their extension.
pub fn output_filename(input: &str, kind: AudioKind) -> String {
    match kind {
        AudioKind::Lossless => Path::new(input)
            .with_extension("opus")
            .to_string_lossy()
            .into_owned(),
        AudioKind::Lossy => input.to_string(),
    }
}

/// Builds the opusenc invocation for one file.
///
/// `--discard-comments` drops the source tags, so every surviving field is
/// passed back explicitly: the resolved override when set, the embedded
/// value otherwise. Empty values are passed to nothing, which is exactly
/// the explicit-erase semantics.
pub fn build_opusenc_command(
    input: &Path,
    output: &Path,
    quality: &str,
    plan: &ResolvedTags,
    base: &EmbeddedTags,
) -> Vec<String> {
    let mut argv = vec![
        "opusenc".to_string(),
        "--bitrate".to_string(),
        quality.to_string(),
        "--discard-comments".to_string(),
    ];

    let effective = |over: &Option<String>, fallback: &Option<String>| {
        over.clone().or_else(|| fallback.clone()).filter(|v| !v.is_empty())
    };
    let mut push = |flag: &str, value: Option<String>| {
        if let Some(value) = value {
            argv.push(flag.to_string());
            argv.push(value);
        }
    };

    push("--title", effective(&plan.title, &base.title));
    push("--artist", effective(&plan.artist, &base.artist));
    push("--album", effective(&plan.album, &base.album));
    push("--date", effective(&plan.date, &base.date));
    push(
        "--tracknumber",
        effective(&plan.track_number, &base.track_number),
    );
    push(
        "--comment",
        effective(&plan.album_artist, &base.album_artist).map(|v| format!("ALBUMARTIST={v}")),
    );
    // No override path exists for genre; it only survives from the source.
    push(
        "--comment",
        base.genre
            .clone()
            .filter(|v| !v.is_empty())
            .map(|v| format!("GENRE={v}")),
    );

    argv.push(input.to_string_lossy().into_owned());
    argv.push(output.to_string_lossy().into_owned());
    argv
}

pub fn build_rsgain_command(directory: &Path) -> Vec<String> {
    vec![
        "rsgain".to_string(),
        "easy".to_string(),
        directory.to_string_lossy().into_owned(),
    ]
}

/// Fails early when opusenc or rsgain is not installed, before any
/// destination directory is touched.
pub fn check_external_tools() -> anyhow::Result<()> {
    for bin in ["opusenc", "rsgain"] {
        Command::new(bin)
            .arg("--version")
            .output()
            .with_context(|| format!("{bin} not found in PATH"))?;
    }
    Ok(())
}

fn run_tool(argv: &[String]) -> anyhow::Result<()> {
    let [bin, args @ ..] = argv else {
        bail!("empty command line");
    };
    let output = Command::new(bin)
        .args(args)
        .output()
        .with_context(|| format!("failed to run {bin}"))?;
    if !output.status.success() {
        bail!(
            "{bin} failed ({}): {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(())
}

/// Reads and parses the directory's metadata.txt; an absent file is an
/// empty document, every file receives an all-unset plan.
pub fn read_override_document(dir: &Path) -> anyhow::Result<OverrideDocument> {
    let path = dir.join(OVERRIDE_FILENAME);
    match fs::read_to_string(&path) {
        Ok(text) => {
            Ok(metadata::parse(&text).with_context(|| format!("in {}", path.display()))?)
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(OverrideDocument::default()),
        Err(err) => Err(err).with_context(|| format!("failed to read {}", path.display())),
    }
}

/// Exports one album directory. The tag plan is fully resolved before any
/// file is written, so a metadata error leaves the destination untouched.
pub fn process_directory(
    source_dir: &Path,
    dest_dir: &Path,
    cfg: &Config,
    force: bool,
) -> anyhow::Result<DirectoryReport> {
    let audio_files = discovery::audio_files_in(source_dir)?;
    let doc = read_override_document(source_dir)?;
    let plans = metadata::resolve(&doc, &audio_files)?;

    fs::create_dir_all(dest_dir)
        .with_context(|| format!("failed to create {}", dest_dir.display()))?;

    let mut report = DirectoryReport::default();
    for plan in &plans {
        let Some(kind) = discovery::audio_kind(Path::new(&plan.filename)) else {
            continue;
        };
        let source_path = source_dir.join(&plan.filename);
        let dest_path = dest_dir.join(output_filename(&plan.filename, kind));

        if dest_path.exists() && !force {
            log::debug!("skipping existing {}", dest_path.display());
            report.skipped += 1;
            continue;
        }

        match kind {
            AudioKind::Lossless => {
                let base = tags::read(&source_path).unwrap_or_else(|err| {
                    log::debug!("no readable tags in {}: {err:#}", source_path.display());
                    EmbeddedTags::default()
                });
                let argv =
                    build_opusenc_command(&source_path, &dest_path, &cfg.opus_quality, plan, &base);
                run_tool(&argv)
                    .with_context(|| format!("failed to transcode {}", source_path.display()))?;
            }
            AudioKind::Lossy => {
                fs::copy(&source_path, &dest_path).with_context(|| {
                    format!(
                        "failed to copy {} to {}",
                        source_path.display(),
                        dest_path.display()
                    )
                })?;
                if !plan.is_noop() {
                    tags::apply(&dest_path, plan)?;
                }
            }
        }
        report.processed += 1;
    }

    report.cover_copied = copy_cover(source_dir, dest_dir, &doc, force)?;

    if report.processed > 0 {
        run_tool(&build_rsgain_command(dest_dir))
            .with_context(|| format!("ReplayGain failed for {}", dest_dir.display()))?;
    }

    Ok(report)
}

/// Copies the album cover to the destination as `cover.<ext>`. The
/// album-scope `cover` field wins over the conventional filenames; a named
/// cover that is missing on disk is reported but not fatal.
fn copy_cover(
    source_dir: &Path,
    dest_dir: &Path,
    doc: &OverrideDocument,
    force: bool,
) -> anyhow::Result<bool> {
    let cover = match doc.album_field(fields::COVER).filter(|v| !v.is_empty()) {
        Some(name) => {
            if source_dir.join(name).is_file() {
                Some(name.to_string())
            } else {
                log::warn!(
                    "cover {:?} named in {} does not exist",
                    name,
                    source_dir.join(OVERRIDE_FILENAME).display()
                );
                None
            }
        }
        None => discovery::find_cover_art(&discovery::files_in(source_dir)?).map(str::to_string),
    };
    let Some(cover) = cover else {
        return Ok(false);
    };

    let ext = Path::new(&cover)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_else(|| "jpg".to_string());
    let dest_path = dest_dir.join(format!("cover.{ext}"));
    if dest_path.exists() && !force {
        return Ok(false);
    }

    fs::copy(source_dir.join(&cover), &dest_path)
        .with_context(|| format!("failed to copy cover {cover}"))?;
    Ok(true)
}
