//! Settings read from the `[tool.snakefmt]` table of a `pyproject.toml`.
//!
//! The file is found by searching from the formatted path up through its
//! parent directories. Command-line flags override anything set here.

use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Deserialize;

use crate::python::{Black, Passthrough, PythonFormatter};

/// File searched for in parent directories.
pub const CONFIG_FILE_NAME: &str = "pyproject.toml";

/// Default pattern for files picked up when walking a directory.
pub const DEFAULT_INCLUDE: &str = r"(\.smk$|^Snakefile)";

/// Errors from loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid TOML in {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid regex '{pattern}': {source}")]
    Regex {
        pattern: String,
        source: regex::Error,
    },
}

/// Formatter settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Line length passed to black.
    #[serde(alias = "line-length")]
    pub line_length: usize,
    #[serde(alias = "black-command")]
    pub black_command: String,
    /// Leave embedded Python untouched.
    #[serde(alias = "skip-black")]
    pub skip_black: bool,
    /// Regex matched against file names when walking directories.
    pub include: String,
    /// Regex matched against full paths; matches are skipped.
    pub exclude: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            line_length: 88,
            black_command: "black".to_string(),
            skip_black: false,
            include: DEFAULT_INCLUDE.to_string(),
            exclude: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct PyProject {
    #[serde(default)]
    tool: Tool,
}

#[derive(Debug, Default, Deserialize)]
struct Tool {
    snakefmt: Option<Config>,
}

impl Config {
    /// Parse the `[tool.snakefmt]` table of a `pyproject.toml`.
    /// A file without that table yields the defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        let project: PyProject = toml::from_str(text)?;
        Ok(project.tool.snakefmt.unwrap_or_default())
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), ?config, "loaded config");
        Ok(config)
    }

    /// Nearest `pyproject.toml` at or above `start`.
    #[must_use]
    pub fn discover(start: &Path) -> Option<PathBuf> {
        let dir = if start.is_dir() {
            start.to_path_buf()
        } else {
            match start.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => std::env::current_dir().ok()?,
            }
        };
        let dir = dir.canonicalize().unwrap_or(dir);

        dir.ancestors()
            .map(|ancestor| ancestor.join(CONFIG_FILE_NAME))
            .find(|candidate| candidate.is_file())
    }

    /// Config from the nearest `pyproject.toml`, or the defaults.
    pub fn discover_and_load(start: &Path) -> Result<Self, ConfigError> {
        Self::discover(start).map_or_else(|| Ok(Self::default()), |path| Self::load(&path))
    }

    /// The Python formatter these settings call for.
    #[must_use]
    pub fn python_formatter(&self) -> Box<dyn PythonFormatter> {
        if self.skip_black {
            Box::new(Passthrough)
        } else {
            Box::new(Black::new(self.black_command.clone(), self.line_length))
        }
    }

    pub fn file_filter(&self) -> Result<FileFilter, ConfigError> {
        Ok(FileFilter {
            include: compile(&self.include)?,
            exclude: self.exclude.as_deref().map(compile).transpose()?,
        })
    }
}

fn compile(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|source| ConfigError::Regex {
        pattern: pattern.to_string(),
        source,
    })
}

/// Decides which files found in a directory walk are formatted.
#[derive(Debug, Clone)]
pub struct FileFilter {
    include: Regex,
    exclude: Option<Regex>,
}

impl FileFilter {
    #[must_use]
    pub fn accepts(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            return false;
        };
        if !self.include.is_match(name) {
            return false;
        }
        let full = path.to_string_lossy();
        !self
            .exclude
            .as_ref()
            .is_some_and(|exclude| exclude.is_match(&full))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.line_length, 88);
        assert_eq!(config.black_command, "black");
        assert!(!config.skip_black);
        assert_eq!(config.include, DEFAULT_INCLUDE);
    }

    #[test]
    fn reads_tool_table() {
        let config = Config::from_toml_str(
            "[tool.black]\nline-length = 100\n\n[tool.snakefmt]\nline_length = 120\nexclude = 'old/'\n",
        )
        .expect("should parse");
        assert_eq!(config.line_length, 120);
        assert_eq!(config.exclude.as_deref(), Some("old/"));
        assert_eq!(config.black_command, "black");
    }

    #[test]
    fn kebab_case_keys() {
        let config = Config::from_toml_str("[tool.snakefmt]\nline-length = 79\nskip-black = true\n")
            .expect("should parse");
        assert_eq!(config.line_length, 79);
        assert!(config.skip_black);
    }

    #[test]
    fn missing_table_is_default() {
        let config = Config::from_toml_str("[project]\nname = 'x'\n").expect("should parse");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn invalid_toml() {
        assert!(Config::from_toml_str("[tool.snakefmt\n").is_err());
    }

    #[test]
    fn filter_include_exclude() {
        let config = Config {
            exclude: Some("legacy".to_string()),
            ..Config::default()
        };
        let filter = config.file_filter().expect("valid patterns");
        assert!(filter.accepts(Path::new("workflow/Snakefile")));
        assert!(filter.accepts(Path::new("rules/align.smk")));
        assert!(!filter.accepts(Path::new("scripts/plot.py")));
        assert!(!filter.accepts(Path::new("legacy/old.smk")));
    }

    #[test]
    fn invalid_pattern() {
        let config = Config {
            include: "(".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            config.file_filter().unwrap_err(),
            ConfigError::Regex { .. }
        ));
    }

    #[test]
    fn discovers_parent_pyproject() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        let nested = root.join("workflow").join("rules");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(
            root.join(CONFIG_FILE_NAME),
            "[tool.snakefmt]\nline_length = 100\n",
        )
        .unwrap();

        let found = Config::discover(&nested).expect("should find pyproject.toml");
        assert_eq!(found.file_name().unwrap(), CONFIG_FILE_NAME);
        let config = Config::discover_and_load(&nested.join("a.smk")).unwrap();
        assert_eq!(config.line_length, 100);
    }
}
