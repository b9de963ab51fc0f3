//! Index and search configuration.
//!
//! Configuration is read from TOML; every section and key is optional:
//! - `[search]` defaults for queries issued without explicit options
//! - `[worker]` queue sizing and cancellation granularity
//! - `[index]` file-level heuristics

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{IndexError, Result};
use crate::metadata::DEFAULT_RETRY_STORM_THRESHOLD;
use crate::query::{DEFAULT_CANCEL_CHECK_INTERVAL, PREVIEW_CHARS, TIMELINE_LIMIT};
use crate::types::{MAX_CONTEXT_LINES, SearchOptions};

/// Default search behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SearchConfig {
    /// Context lines on each side of a hit.
    pub context_lines: usize,
    /// Result cap before clamping.
    pub max_results: usize,
    /// Match case exactly.
    pub case_sensitive: bool,
    /// Treat queries as regular expressions.
    pub regex: bool,
    /// Maximum timeline entries returned.
    pub timeline_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            context_lines: 2,
            max_results: 500,
            case_sensitive: false,
            regex: false,
            timeline_limit: TIMELINE_LIMIT,
        }
    }
}

impl SearchConfig {
    /// Preview length of every result. Not configurable.
    pub const PREVIEW_CHARS: usize = PREVIEW_CHARS;

    /// Builds search options from these defaults.
    #[must_use]
    pub fn options(&self) -> SearchOptions {
        SearchOptions::default()
            .with_regex(self.regex)
            .with_case_sensitive(self.case_sensitive)
            .with_context_lines(self.context_lines)
            .with_max_results(self.max_results)
    }
}

/// Index worker settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WorkerConfig {
    /// Pending requests buffered before senders wait.
    pub queue_capacity: usize,
    /// Lines scanned between checks for a newer search.
    pub cancel_check_interval: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 64,
            cancel_check_interval: DEFAULT_CANCEL_CHECK_INTERVAL,
        }
    }
}

/// Indexing heuristics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IndexConfig {
    /// Retry lines in one file that make it a retry storm.
    pub retry_storm_threshold: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            retry_storm_threshold: DEFAULT_RETRY_STORM_THRESHOLD,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrawlConfig {
    /// Search defaults.
    #[serde(default)]
    pub search: SearchConfig,
    /// Worker settings.
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Indexing heuristics.
    #[serde(default)]
    pub index: IndexConfig,
}

impl TrawlConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            IndexError::Config(format!(
                "failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or fails validation.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| IndexError::Config(format!("invalid TOML: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any value is out of range.
    pub fn validate(&self) -> Result<()> {
        if self.search.context_lines > MAX_CONTEXT_LINES {
            return Err(IndexError::Config(format!(
                "search.context_lines cannot exceed {MAX_CONTEXT_LINES}"
            )));
        }

        if self.search.max_results == 0 {
            return Err(IndexError::Config(
                "search.max_results must be greater than 0".to_string(),
            ));
        }

        if self.worker.queue_capacity == 0 {
            return Err(IndexError::Config(
                "worker.queue_capacity must be greater than 0".to_string(),
            ));
        }

        if self.worker.cancel_check_interval == 0 {
            return Err(IndexError::Config(
                "worker.cancel_check_interval must be greater than 0".to_string(),
            ));
        }

        if self.index.retry_storm_threshold == 0 {
            return Err(IndexError::Config(
                "index.retry_storm_threshold must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("failed to write temp file");
        file
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = TrawlConfig::from_toml("").expect("should parse empty config");
        assert_eq!(config, TrawlConfig::default());
        assert_eq!(config.search.context_lines, 2);
        assert_eq!(config.search.max_results, 500);
        assert_eq!(config.search.timeline_limit, 500);
        assert_eq!(config.worker.queue_capacity, 64);
        assert_eq!(config.worker.cancel_check_interval, 1024);
        assert_eq!(config.index.retry_storm_threshold, 20);
        assert_eq!(SearchConfig::PREVIEW_CHARS, 160);
    }

    #[test]
    fn full_config() {
        let toml = r"
            [search]
            context_lines = 4
            max_results = 100
            case_sensitive = true
            regex = true
            timeline_limit = 50

            [worker]
            queue_capacity = 8
            cancel_check_interval = 256

            [index]
            retry_storm_threshold = 5
        ";

        let config = TrawlConfig::from_toml(toml).expect("should parse full config");
        assert_eq!(config.search.context_lines, 4);
        assert!(config.search.case_sensitive);
        assert!(config.search.regex);
        assert_eq!(config.search.timeline_limit, 50);
        assert_eq!(config.worker.queue_capacity, 8);
        assert_eq!(config.worker.cancel_check_interval, 256);
        assert_eq!(config.index.retry_storm_threshold, 5);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config = TrawlConfig::from_toml("[search]\nregex = true\n").expect("parse");
        assert!(config.search.regex);
        assert_eq!(config.search.max_results, 500);
    }

    #[test]
    fn options_from_search_defaults() {
        let mut config = TrawlConfig::default();
        config.search.context_lines = 5;
        config.search.regex = true;

        let options = config.search.options();
        assert_eq!(options.context_lines, 5);
        assert!(options.regex);
        assert!(!options.case_sensitive);
        assert!(!options.filters.is_active());
    }

    #[test]
    fn load_from_file() {
        let file = create_temp_config("[worker]\nqueue_capacity = 3\n");
        let config = TrawlConfig::from_file(file.path()).expect("should load from file");
        assert_eq!(config.worker.queue_capacity, 3);
    }

    #[test]
    fn file_not_found() {
        let err = TrawlConfig::from_file("/nonexistent/path/trawl.toml").expect_err("missing file");
        assert!(matches!(err, IndexError::Config(_)));
    }

    #[test]
    fn invalid_toml_rejected() {
        let err = TrawlConfig::from_toml("[search\n").expect_err("bad toml");
        assert!(err.to_string().contains("invalid TOML"));
    }

    #[test]
    fn zero_values_rejected() {
        for (toml, needle) in [
            ("[worker]\nqueue_capacity = 0", "queue_capacity"),
            ("[worker]\ncancel_check_interval = 0", "cancel_check_interval"),
            ("[index]\nretry_storm_threshold = 0", "retry_storm_threshold"),
            ("[search]\nmax_results = 0", "max_results"),
        ] {
            let err = TrawlConfig::from_toml(toml).expect_err(needle);
            assert!(err.to_string().contains(needle), "{err}");
        }
    }

    #[test]
    fn context_above_clamp_rejected() {
        let err = TrawlConfig::from_toml("[search]\ncontext_lines = 9").expect_err("too many");
        assert!(err.to_string().contains("context_lines"));
    }
}
