//! Core types for indexing and search.
//!
//! This module provides:
//! - [`LogLevel`] - Severity levels recognized in log lines
//! - [`AnomalyTag`] - Heuristic failure-pattern labels
//! - [`LineMetadata`] - Everything derived from one line
//! - [`SearchFilters`] - Structured line filters
//! - [`SearchOptions`] - Query mode, context, limits and filters

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Most context lines returned on each side of a hit.
pub const MAX_CONTEXT_LINES: usize = 8;

/// Lower bound applied to `max_results`.
pub const MIN_RESULTS: usize = 20;

/// Upper bound applied to `max_results`.
pub const MAX_RESULTS: usize = 3000;

/// Log severity levels, ordered from most to least verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// Most verbose, detailed debugging information
    Trace = 0,
    /// Debugging information
    Debug = 1,
    /// General information
    Info = 2,
    /// Warning conditions
    Warn = 3,
    /// Error conditions
    Error = 4,
    /// Unrecoverable failures
    Fatal = 5,
}

impl LogLevel {
    /// All levels, in severity order.
    pub const ALL: [Self; 6] = [
        Self::Trace,
        Self::Debug,
        Self::Info,
        Self::Warn,
        Self::Error,
        Self::Fatal,
    ];

    /// Returns the normalized uppercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown log level: {s}"))
    }
}

/// Heuristic label for a known failure pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyTag {
    /// Timeouts and exceeded deadlines
    Timeout,
    /// Refused connections
    ConnRefused,
    /// Retries and backoff
    Retry,
    /// Open circuit breakers
    CircuitBreaker,
    /// Out-of-memory conditions
    Oom,
    /// Rate limiting
    Throttling,
    /// Unavailable services
    Unavailable,
    /// File-level: many retry lines in one file
    RetryStorm,
}

impl AnomalyTag {
    /// Returns the wire name of the tag.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::ConnRefused => "conn_refused",
            Self::Retry => "retry",
            Self::CircuitBreaker => "circuit_breaker",
            Self::Oom => "oom",
            Self::Throttling => "throttling",
            Self::Unavailable => "unavailable",
            Self::RetryStorm => "retry_storm",
        }
    }
}

impl fmt::Display for AnomalyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata derived from a single log line.
///
/// Every field is optional; a line that matches no pattern yields the default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineMetadata {
    /// Event time in epoch milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// Distributed trace identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    /// Span identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span_id: Option<String>,
    /// Pod name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod: Option<String>,
    /// Container name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
    /// Namespace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Severity level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<LogLevel>,
    /// Anomaly tags
    #[serde(default)]
    pub tags: BTreeSet<AnomalyTag>,
}

impl LineMetadata {
    /// Returns true if the line can be placed on a timeline.
    #[must_use]
    pub const fn has_timeline_identity(&self) -> bool {
        self.timestamp.is_some() || self.trace_id.is_some() || self.span_id.is_some()
    }
}

/// Structured filters applied to every candidate line.
///
/// Blank strings count as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    /// Pod substring (case-insensitive)
    #[serde(default)]
    pub pod: Option<String>,
    /// Container substring (case-insensitive)
    #[serde(default)]
    pub container: Option<String>,
    /// Namespace substring (case-insensitive)
    #[serde(default)]
    pub namespace: Option<String>,
    /// Exact level name (case-insensitive)
    #[serde(default)]
    pub level: Option<String>,
    /// Inclusive lower bound, epoch milliseconds
    #[serde(default)]
    pub time_from: Option<i64>,
    /// Inclusive upper bound, epoch milliseconds
    #[serde(default)]
    pub time_to: Option<i64>,
}

fn is_set(value: Option<&String>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

impl SearchFilters {
    /// Creates an empty filter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if at least one filter is set.
    #[must_use]
    pub fn is_active(&self) -> bool {
        is_set(self.pod.as_ref())
            || is_set(self.container.as_ref())
            || is_set(self.namespace.as_ref())
            || is_set(self.level.as_ref())
            || self.time_from.is_some()
            || self.time_to.is_some()
    }

    /// Adds a pod filter.
    #[must_use]
    pub fn with_pod(mut self, pod: impl Into<String>) -> Self {
        self.pod = Some(pod.into());
        self
    }

    /// Adds a container filter.
    #[must_use]
    pub fn with_container(mut self, container: impl Into<String>) -> Self {
        self.container = Some(container.into());
        self
    }

    /// Adds a namespace filter.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Adds a level filter.
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    /// Adds an inclusive time window in epoch milliseconds.
    #[must_use]
    pub const fn with_time_range(mut self, from: Option<i64>, to: Option<i64>) -> Self {
        self.time_from = from;
        self.time_to = to;
        self
    }
}

/// How a query is evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOptions {
    /// Treat the query as a regular expression
    #[serde(default)]
    pub regex: bool,
    /// Match case exactly
    #[serde(default)]
    pub case_sensitive: bool,
    /// Lines of context on each side, clamped to `0..=8`
    #[serde(default = "default_context_lines")]
    pub context_lines: usize,
    /// Result cap, clamped to `20..=3000`
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Structured filters
    #[serde(default)]
    pub filters: SearchFilters,
}

const fn default_context_lines() -> usize {
    2
}

const fn default_max_results() -> usize {
    500
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            regex: false,
            case_sensitive: false,
            context_lines: default_context_lines(),
            max_results: default_max_results(),
            filters: SearchFilters::default(),
        }
    }
}

impl SearchOptions {
    /// Context line count after clamping.
    #[must_use]
    pub fn effective_context_lines(&self) -> usize {
        self.context_lines.min(MAX_CONTEXT_LINES)
    }

    /// Result cap after clamping.
    #[must_use]
    pub fn effective_max_results(&self) -> usize {
        self.max_results.clamp(MIN_RESULTS, MAX_RESULTS)
    }

    /// Sets regex mode.
    #[must_use]
    pub const fn with_regex(mut self, regex: bool) -> Self {
        self.regex = regex;
        self
    }

    /// Sets case sensitivity.
    #[must_use]
    pub const fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Sets the number of context lines.
    #[must_use]
    pub const fn with_context_lines(mut self, lines: usize) -> Self {
        self.context_lines = lines;
        self
    }

    /// Sets the result cap.
    #[must_use]
    pub const fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    /// Sets the structured filters.
    #[must_use]
    pub fn with_filters(mut self, filters: SearchFilters) -> Self {
        self.filters = filters;
        self
    }
}
