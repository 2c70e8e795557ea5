use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::{discovery, export, extract};

#[derive(Parser, Debug)]
#[command(name = "music-librarian")]
#[command(version)]
#[command(about = "Opinionated music collection exporter")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Transcode or copy source directories into the destination collection
    Export {
        /// Directories under MUSIC_SOURCE_ROOT to export
        #[arg(required = true)]
        source_directories: Vec<PathBuf>,
        /// Overwrite existing files in destination
        #[arg(short, long)]
        force: bool,
    },
    /// Generate metadata.txt files from embedded tags
    ExtractMetadata {
        /// Directories to scan for album folders
        #[arg(required = true)]
        source_directories: Vec<PathBuf>,
        /// Overwrite existing metadata.txt files
        #[arg(short, long)]
        force: bool,
        /// Emit empty fields instead of values read from embedded tags
        #[arg(long)]
        template_only: bool,
    },
}

/// Entrypoint for CLI
pub fn run() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Export {
            source_directories,
            force,
        } => export_command(source_directories, *force),
        Commands::ExtractMetadata {
            source_directories,
            force,
            template_only,
        } => extract_command(source_directories, *force, *template_only),
    };

    match result {
        Ok(0) => ExitCode::SUCCESS,
        Ok(failed) => {
            eprintln!("Error: {failed} directories failed");
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn export_command(source_directories: &[PathBuf], force: bool) -> anyhow::Result<usize> {
    let cfg = Config::from_env()?;
    export::check_external_tools()?;

    // Every requested directory is validated against the source root
    // before anything is written anywhere.
    let mut roots = Vec::new();
    for dir in source_directories {
        let dir = std::path::absolute(dir)
            .with_context(|| format!("failed to resolve {}", dir.display()))?;
        cfg.resolve_destination(&dir)?;
        roots.push(dir);
    }

    println!("Source root: {}", cfg.source_root.display());
    println!("Destination root: {}", cfg.dest_root.display());

    let mut failed = 0;
    for root in &roots {
        for album_dir in discovery::album_dirs(root)? {
            let dest_dir = cfg.resolve_destination(&album_dir)?;
            match export::process_directory(&album_dir, &dest_dir, &cfg, force) {
                Ok(report) => {
                    println!(
                        "{}: {} processed, {} skipped{}",
                        album_dir.display(),
                        report.processed,
                        report.skipped,
                        if report.cover_copied { ", cover copied" } else { "" }
                    );
                }
                Err(err) => {
                    eprintln!("Error: {}: {err:#}", album_dir.display());
                    failed += 1;
                }
            }
        }
    }
    Ok(failed)
}

fn extract_command(
    source_directories: &[PathBuf],
    force: bool,
    template_only: bool,
) -> anyhow::Result<usize> {
    let mut failed = 0;
    for dir in source_directories {
        match extract::extract_tree(dir, force, template_only) {
            Ok(report) => {
                println!(
                    "{}: {} written, {} kept",
                    dir.display(),
                    report.processed,
                    report.skipped
                );
            }
            Err(err) => {
                eprintln!("Error: {}: {err:#}", dir.display());
                failed += 1;
            }
        }
    }
    Ok(failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn export_requires_a_source_directory() {
        let err = Cli::try_parse_from(["music-librarian", "export"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn export_parses_force_flag_and_directories() {
        let cli =
            Cli::try_parse_from(["music-librarian", "export", "--force", "a", "b"]).unwrap();
        match cli.command {
            Commands::Export {
                source_directories,
                force,
            } => {
                assert!(force);
                assert_eq!(
                    source_directories,
                    vec![PathBuf::from("a"), PathBuf::from("b")]
                );
            }
            _ => panic!("expected export subcommand"),
        }
    }

    #[test]
    fn extract_metadata_parses_flags() {
        let cli = Cli::try_parse_from([
            "music-librarian",
            "extract-metadata",
            "--template-only",
            "dir",
        ])
        .unwrap();
        match cli.command {
            Commands::ExtractMetadata {
                source_directories,
                force,
                template_only,
            } => {
                assert!(!force);
                assert!(template_only);
                assert_eq!(source_directories, vec![PathBuf::from("dir")]);
            }
            _ => panic!("expected extract-metadata subcommand"),
        }
    }
}
