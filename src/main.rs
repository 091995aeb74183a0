use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use clap::Parser;
use code_writer::{config, normalize::normalize_text};
use walkdir::WalkDir;

const DEFAULT_EXTENSIONS: &str = "js,jsx,ts,tsx,mjs,cjs";

#[derive(Debug, Parser)]
#[command(author, version, about = "Newline and indentation normalizer for source files")]
struct Cli {
    /// Files or directories to normalize.
    #[arg(value_name = "FILES", required = true)]
    paths: Vec<PathBuf>,

    /// Overwrite files in place.
    #[arg(short = 'i', long = "in-place")]
    in_place: bool,

    /// Only check if files are already normalized.
    #[arg(long = "check", conflicts_with = "in_place")]
    check: bool,

    /// Path to a code-writer.toml configuration file.
    #[arg(long = "config", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Comma-separated extensions to pick up when traversing directories.
    #[arg(long = "ext", value_name = "EXTS", default_value = DEFAULT_EXTENSIONS)]
    extensions: String,

    /// Indentation offset added to every line: a level count or literal whitespace.
    #[arg(long = "base-indent", value_name = "VALUE")]
    base_indent: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = config::load_config(cli.config.as_deref())?;
    if cli.base_indent.is_some() {
        config.base_indent = cli.base_indent.clone();
    }

    let extensions = parse_extensions(&cli.extensions);
    let files = collect_files(&cli.paths, &extensions)?;
    if files.is_empty() {
        bail!("no matching files found to normalize");
    }

    if !cli.check && !cli.in_place && files.len() > 1 {
        bail!("normalizing multiple files requires --in-place or --check");
    }

    let mut failed_paths = Vec::new();

    for path in files {
        let original = read_input(&path)?;
        let normalized = normalize_text(&original, &config)
            .with_context(|| format!("failed to normalize {}", path.display()))?;

        if cli.check {
            if normalized != original {
                failed_paths.push(path.clone());
            }
            continue;
        }

        if cli.in_place {
            if normalized != original {
                fs::write(&path, normalized)?;
            }
        } else {
            io::stdout().write_all(normalized.as_bytes())?;
        }
    }

    if !failed_paths.is_empty() {
        for path in &failed_paths {
            eprintln!("needs normalizing: {}", path.display());
        }
        if cli.check {
            std::process::exit(1);
        }
    }

    Ok(())
}

fn parse_extensions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect()
}

fn collect_files(paths: &[PathBuf], extensions: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        let metadata = fs::metadata(path).with_context(|| format!("failed to read metadata for {}", path.display()))?;
        if metadata.is_dir() {
            for entry in WalkDir::new(path) {
                let entry = entry.with_context(|| format!("failed to traverse {}", path.display()))?;
                if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
                    files.push(entry.path().to_path_buf());
                }
            }
        } else if metadata.is_file() {
            files.push(path.clone());
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => extensions.iter().any(|want| want == &ext.to_ascii_lowercase()),
        None => false,
    }
}

fn read_input(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let mut text = String::from_utf8(bytes).with_context(|| format!("{} is not valid UTF-8", path.display()))?;
    if text.starts_with('\u{feff}') {
        text.drain(..1);
    }
    Ok(text)
}
