//! CLI tool to format Snakemake workflow files.

use std::fs;
use std::io::{self, Read as _, Write as _};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use similar::TextDiff;
use snakefmt_rs::{Config, Error, FileFilter, PythonFormatter, format_str};
use walkdir::WalkDir;

/// Lines of unchanged context around a diff hunk.
const DIFF_CONTEXT: usize = 3;

#[derive(Debug, Parser)]
#[command(name = "snakefmt", version, about = "Format Snakemake workflow files")]
struct Cli {
    /// Files or directories to format; `-` reads stdin and writes stdout.
    #[arg(required = true)]
    src: Vec<PathBuf>,

    /// Don't write files back; exit with 1 if any would change.
    #[arg(long)]
    check: bool,

    /// Print a diff instead of writing files back.
    #[arg(long)]
    diff: bool,

    /// Line length handed to black.
    #[arg(short = 'l', long)]
    line_length: Option<usize>,

    /// Read settings from this pyproject.toml instead of searching for one.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Leave embedded Python as written.
    #[arg(long)]
    no_black: bool,

    /// Regex of file names to format when walking directories.
    #[arg(long)]
    include: Option<String>,

    /// Regex of paths to skip when walking directories.
    #[arg(long)]
    exclude: Option<String>,

    /// More log output; repeat for more.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Unchanged,
    Changed,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };
    let filter = match config.file_filter() {
        Ok(filter) => filter,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };
    let python = config.python_formatter();

    let mut changed = 0;
    let mut unchanged = 0;
    let mut failed = 0;

    for src in &cli.src {
        let results: Vec<(String, Result<Outcome, Error>)> = if src.as_os_str() == "-" {
            vec![("-".to_string(), format_stdin(&cli, python.as_ref()))]
        } else {
            collect_files(src, &filter)
                .into_iter()
                .map(|path| {
                    let result = format_file(&path, &cli, python.as_ref());
                    (path.display().to_string(), result)
                })
                .collect()
        };

        for (name, result) in results {
            match result {
                Ok(Outcome::Changed) => changed += 1,
                Ok(Outcome::Unchanged) => unchanged += 1,
                Err(e) => {
                    eprintln!("{name}: {e}");
                    failed += 1;
                }
            }
        }
    }

    tracing::info!(changed, unchanged, failed, "done");
    if cli.check || cli.verbose > 0 {
        eprintln!(
            "{changed} file(s) {}, {unchanged} file(s) unchanged, {failed} file(s) failed",
            if cli.check || cli.diff {
                "would be changed"
            } else {
                "changed"
            }
        );
    }

    if failed > 0 || (cli.check && changed > 0) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config, Error> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => {
            let start = cli
                .src
                .iter()
                .find(|src| src.as_os_str() != "-")
                .cloned()
                .unwrap_or_else(|| PathBuf::from("."));
            Config::discover_and_load(&start)?
        }
    };

    if let Some(line_length) = cli.line_length {
        config.line_length = line_length;
    }
    if cli.no_black {
        config.skip_black = true;
    }
    if let Some(include) = &cli.include {
        config.include.clone_from(include);
    }
    if let Some(exclude) = &cli.exclude {
        config.exclude = Some(exclude.clone());
    }
    Ok(config)
}

/// Files named on the command line are always formatted; directories
/// are walked and filtered.
fn collect_files(src: &Path, filter: &FileFilter) -> Vec<PathBuf> {
    if !src.is_dir() {
        return vec![src.to_path_buf()];
    }

    let mut files: Vec<PathBuf> = WalkDir::new(src)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("skipping: {e}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && filter.accepts(entry.path()))
        .map(walkdir::DirEntry::into_path)
        .collect();
    files.sort();
    tracing::debug!(dir = %src.display(), count = files.len(), "collected files");
    files
}

fn format_file(path: &Path, cli: &Cli, python: &dyn PythonFormatter) -> Result<Outcome, Error> {
    let content = fs::read_to_string(path)?;
    let formatted = format_str(&content, python)?;
    if formatted == content {
        tracing::debug!(path = %path.display(), "unchanged");
        return Ok(Outcome::Unchanged);
    }

    let name = path.display().to_string();
    if cli.diff {
        print!("{}", unified_diff(&name, &content, &formatted));
    }
    if cli.check {
        eprintln!("would reformat {name}");
    } else if !cli.diff {
        fs::write(path, &formatted)?;
        eprintln!("reformatted {name}");
    }
    Ok(Outcome::Changed)
}

fn format_stdin(cli: &Cli, python: &dyn PythonFormatter) -> Result<Outcome, Error> {
    let mut content = String::new();
    io::stdin().read_to_string(&mut content)?;
    let formatted = format_str(&content, python)?;
    let outcome = if formatted == content {
        Outcome::Unchanged
    } else {
        Outcome::Changed
    };

    let mut stdout = io::stdout().lock();
    if cli.diff {
        stdout.write_all(unified_diff("-", &content, &formatted).as_bytes())?;
    } else if !cli.check {
        stdout.write_all(formatted.as_bytes())?;
    }
    Ok(outcome)
}

/// Unified diff of `old` against `new`, empty when they are equal.
fn unified_diff(name: &str, old: &str, new: &str) -> String {
    if old == new {
        return String::new();
    }
    TextDiff::from_lines(old, new)
        .unified_diff()
        .context_radius(DIFF_CONTEXT)
        .header(name, name)
        .to_string()
}
