//! Environment-variable configuration.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};

pub const SOURCE_ROOT_VAR: &str = "MUSIC_SOURCE_ROOT";
pub const DEST_ROOT_VAR: &str = "MUSIC_DEST_ROOT";
pub const OPUS_QUALITY_VAR: &str = "OPUS_QUALITY";

/// Default opusenc bitrate in kbit/s.
pub const DEFAULT_OPUS_QUALITY: &str = "128";

#[derive(Debug, Clone)]
pub struct Config {
    pub source_root: PathBuf,
    pub dest_root: PathBuf,
    pub opus_quality: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Config> {
        Self::from_vars(
            env::var(SOURCE_ROOT_VAR).ok(),
            env::var(DEST_ROOT_VAR).ok(),
            env::var(OPUS_QUALITY_VAR).ok(),
        )
    }

    fn from_vars(
        source_root: Option<String>,
        dest_root: Option<String>,
        opus_quality: Option<String>,
    ) -> anyhow::Result<Config> {
        let Some(source_root) = source_root.filter(|v| !v.is_empty()) else {
            bail!("{SOURCE_ROOT_VAR} environment variable not set");
        };
        let Some(dest_root) = dest_root.filter(|v| !v.is_empty()) else {
            bail!("{DEST_ROOT_VAR} environment variable not set");
        };
        let opus_quality = opus_quality
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_OPUS_QUALITY.to_string());

        // Roots are absolutized once so destination mapping can rely on
        // plain prefix stripping.
        let source_root = std::path::absolute(PathBuf::from(source_root))
            .with_context(|| format!("failed to resolve {SOURCE_ROOT_VAR}"))?;
        let dest_root = std::path::absolute(PathBuf::from(dest_root))
            .with_context(|| format!("failed to resolve {DEST_ROOT_VAR}"))?;

        Ok(Config {
            source_root,
            dest_root,
            opus_quality,
        })
    }

    /// Maps a source directory to its destination: the path relative to the
    /// source root, appended to the destination root. Fails when the
    /// directory is not under the source root.
    pub fn resolve_destination(&self, source_dir: &Path) -> anyhow::Result<PathBuf> {
        match source_dir.strip_prefix(&self.source_root) {
            Ok(relative) => Ok(self.dest_root.join(relative)),
            Err(_) => bail!(
                "{} is not under {SOURCE_ROOT_VAR} ({})",
                source_dir.display(),
                self.source_root.display()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(source: &str, dest: &str) -> Config {
        Config {
            source_root: PathBuf::from(source),
            dest_root: PathBuf::from(dest),
            opus_quality: DEFAULT_OPUS_QUALITY.to_string(),
        }
    }

    #[test]
    fn missing_source_root_is_an_error() {
        let err = Config::from_vars(None, Some("/dest".to_string()), None).unwrap_err();
        assert!(err.to_string().contains(SOURCE_ROOT_VAR));

        let err =
            Config::from_vars(Some(String::new()), Some("/dest".to_string()), None).unwrap_err();
        assert!(err.to_string().contains(SOURCE_ROOT_VAR));
    }

    #[test]
    fn missing_dest_root_is_an_error() {
        let err = Config::from_vars(Some("/source".to_string()), None, None).unwrap_err();
        assert!(err.to_string().contains(DEST_ROOT_VAR));
    }

    #[test]
    fn opus_quality_defaults_when_unset() -> anyhow::Result<()> {
        let cfg = Config::from_vars(Some("/s".to_string()), Some("/d".to_string()), None)?;
        assert_eq!(cfg.opus_quality, "128");

        let cfg = Config::from_vars(
            Some("/s".to_string()),
            Some("/d".to_string()),
            Some("192".to_string()),
        )?;
        assert_eq!(cfg.opus_quality, "192");

        Ok(())
    }

    #[test]
    fn resolve_destination_nested() -> anyhow::Result<()> {
        let cfg = config("/music/source", "/music/dest");

        let dest = cfg.resolve_destination(Path::new("/music/source/Artist/Album"))?;
        assert_eq!(dest, PathBuf::from("/music/dest/Artist/Album"));

        Ok(())
    }

    #[test]
    fn resolve_destination_exact_root() -> anyhow::Result<()> {
        let cfg = config("/music/source", "/music/dest");

        let dest = cfg.resolve_destination(Path::new("/music/source"))?;
        assert_eq!(dest, PathBuf::from("/music/dest"));

        Ok(())
    }

    #[test]
    fn resolve_destination_outside_root_fails() {
        let cfg = config("/music/source", "/music/dest");

        let err = cfg
            .resolve_destination(Path::new("/elsewhere/Album"))
            .unwrap_err();
        assert!(err.to_string().contains(SOURCE_ROOT_VAR));
    }
}
