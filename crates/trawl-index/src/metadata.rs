//! Heuristic metadata extraction from log lines.
//!
//! This module provides:
//! - [`MetadataExtractor`] - Per-line and per-file extraction
//! - [`FIELD_RULES`] - Canonical field → key aliases, tried in order
//! - [`TAG_RULES`] - Anomaly tag → lowercase needles
//!
//! Nothing here fails: a pattern that does not match leaves the field unset.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{AnomalyTag, LineMetadata, LogLevel};

/// Default number of `retry` lines that makes a file a retry storm.
pub const DEFAULT_RETRY_STORM_THRESHOLD: usize = 20;

// ============================================================================
// Declarative rules
// ============================================================================

/// A correlation or topology field extracted from `key=value` pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CorrelationField {
    /// Distributed trace id
    TraceId,
    /// Span id
    SpanId,
    /// Pod name
    Pod,
    /// Container name
    Container,
    /// Namespace
    Namespace,
}

/// How a key is written in a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyForm {
    /// `key=value`, value running to the next whitespace or quote
    KeyValue,
    /// `"key":"value"`
    JsonString,
}

impl KeyForm {
    fn pattern(self, alias: &str) -> String {
        let key = regex::escape(alias);
        match self {
            Self::KeyValue => format!(r#"(?i)(?:^|[^A-Za-z0-9_.\-]){key}=["']?([^\s"']+)"#),
            Self::JsonString => format!(r#"(?i)"{key}"\s*:\s*"([^"]+)""#),
        }
    }
}

/// Ordered aliases for one canonical field.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    /// Field being extracted
    pub field: CorrelationField,
    /// Key spellings, first match wins
    pub aliases: &'static [&'static str],
}

/// Extraction table for every canonical field.
pub const FIELD_RULES: &[FieldRule] = &[
    FieldRule {
        field: CorrelationField::TraceId,
        aliases: &["traceId", "trace_id", "trace-id", "trace"],
    },
    FieldRule {
        field: CorrelationField::SpanId,
        aliases: &["spanId", "span_id", "span-id", "span"],
    },
    FieldRule {
        field: CorrelationField::Pod,
        aliases: &["pod", "pod_name", "podName", "k8s.pod.name"],
    },
    FieldRule {
        field: CorrelationField::Container,
        aliases: &["container", "container_name", "containerName", "k8s.container.name"],
    },
    FieldRule {
        field: CorrelationField::Namespace,
        aliases: &["namespace", "ns", "k8s.namespace.name"],
    },
];

/// Key forms tried for every alias, in order.
pub const KEY_FORMS: &[KeyForm] = &[KeyForm::KeyValue, KeyForm::JsonString];

/// Lowercase substrings that signal one anomaly tag.
#[derive(Debug, Clone, Copy)]
pub struct TagRule {
    /// Tag applied on match
    pub tag: AnomalyTag,
    /// Any of these substrings triggers the tag
    pub needles: &'static [&'static str],
}

/// Anomaly heuristics, matched against the lowercased line.
pub const TAG_RULES: &[TagRule] = &[
    TagRule {
        tag: AnomalyTag::Timeout,
        needles: &["timeout", "timed out", "deadline exceeded", "超时"],
    },
    TagRule {
        tag: AnomalyTag::ConnRefused,
        needles: &["connection refused", "conn refused", "econnrefused"],
    },
    TagRule {
        tag: AnomalyTag::Retry,
        needles: &["retry", "retries", "backoff", "重试"],
    },
    TagRule {
        tag: AnomalyTag::CircuitBreaker,
        needles: &[
            "circuit breaker",
            "circuit_breaker",
            "circuitbreaker",
            "circuit open",
            "breaker open",
            "熔断",
        ],
    },
    TagRule {
        tag: AnomalyTag::Oom,
        needles: &["out of memory", "outofmemory", "oomkilled", "oom-kill", "oom_kill", "oom killer"],
    },
    TagRule {
        tag: AnomalyTag::Throttling,
        needles: &["throttl", "rate limit", "ratelimit", "rate-limit", "too many requests"],
    },
    TagRule {
        tag: AnomalyTag::Unavailable,
        needles: &["unavailable", "no healthy upstream"],
    },
];

// ============================================================================
// Compiled patterns
// ============================================================================

static ISO_TIMESTAMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{4}-\d{2}-\d{2})T(\d{2}:\d{2}:\d{2})(\.\d+)?(Z|[+-]\d{2}:\d{2})?")
        .unwrap_or_else(|_| unreachable!())
});

static ACCESS_LOG_TIMESTAMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[(\d{1,2})/([A-Za-z]{3})/(\d{4}):(\d{2}):(\d{2}):(\d{2}) ([+-])(\d{2})(\d{2})\]")
        .unwrap_or_else(|_| unreachable!())
});

static LEVEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(TRACE|DEBUG|INFO|WARN|ERROR|FATAL)\b").unwrap_or_else(|_| unreachable!())
});

static FIELD_PATTERNS: Lazy<Vec<(CorrelationField, Vec<Regex>)>> = Lazy::new(|| {
    FIELD_RULES
        .iter()
        .map(|rule| {
            let patterns = rule
                .aliases
                .iter()
                .flat_map(|alias| KEY_FORMS.iter().map(move |form| form.pattern(alias)))
                .map(|pattern| Regex::new(&pattern).unwrap_or_else(|_| unreachable!()))
                .collect();
            (rule.field, patterns)
        })
        .collect()
});

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

// ============================================================================
// Line-level extraction
// ============================================================================

/// Parses the first recognizable timestamp in a line to epoch milliseconds.
///
/// ISO-8601 is tried first anywhere in the line, then the access-log bracket
/// form `[12/Feb/2026:09:14:23 +0000]`. ISO values without an offset are
/// read as UTC.
#[must_use]
pub fn parse_timestamp(line: &str) -> Option<i64> {
    parse_iso(line).or_else(|| parse_access_log(line))
}

fn parse_iso(line: &str) -> Option<i64> {
    let caps = ISO_TIMESTAMP.captures(line)?;
    let date = caps.get(1)?.as_str();
    let time = caps.get(2)?.as_str();
    let fraction = caps.get(3).map_or("", |m| m.as_str());

    match caps.get(4) {
        Some(offset) => {
            let iso = format!("{date}T{time}{fraction}{}", offset.as_str());
            DateTime::parse_from_rfc3339(&iso)
                .ok()
                .map(|dt| dt.timestamp_millis())
        }
        None => {
            let iso = format!("{date}T{time}{fraction}");
            NaiveDateTime::parse_from_str(&iso, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.and_utc().timestamp_millis())
        }
    }
}

fn parse_access_log(line: &str) -> Option<i64> {
    let caps = ACCESS_LOG_TIMESTAMP.captures(line)?;
    let day: u32 = caps.get(1)?.as_str().parse().ok()?;
    let month_name = caps.get(2)?.as_str();
    let month = MONTHS
        .iter()
        .position(|m| m.eq_ignore_ascii_case(month_name))?
        + 1;
    let year = caps.get(3)?.as_str();
    let (hour, minute, second) = (caps.get(4)?.as_str(), caps.get(5)?.as_str(), caps.get(6)?.as_str());
    let (sign, offset_h, offset_m) = (caps.get(7)?.as_str(), caps.get(8)?.as_str(), caps.get(9)?.as_str());

    let iso = format!("{year}-{month:02}-{day:02}T{hour}:{minute}:{second}{sign}{offset_h}:{offset_m}");
    DateTime::parse_from_rfc3339(&iso)
        .ok()
        .map(|dt| dt.timestamp_millis())
}

/// Finds the first whole-word level token, case-insensitively.
#[must_use]
pub fn parse_level(line: &str) -> Option<LogLevel> {
    LEVEL
        .captures(line)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Extracts one correlation field using its alias list.
#[must_use]
pub fn extract_field(line: &str, field: CorrelationField) -> Option<String> {
    let (_, patterns) = FIELD_PATTERNS.iter().find(|(f, _)| *f == field)?;
    patterns.iter().find_map(|pattern| {
        pattern
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    })
}

/// Applies the anomaly heuristics to one line.
#[must_use]
pub fn anomaly_tags(line: &str) -> BTreeSet<AnomalyTag> {
    let lower = line.to_lowercase();
    TAG_RULES
        .iter()
        .filter(|rule| rule.needles.iter().any(|needle| lower.contains(needle)))
        .map(|rule| rule.tag)
        .collect()
}

// ============================================================================
// Extractor
// ============================================================================

/// Lines and metadata of one parsed file.
#[derive(Debug, Clone, Default)]
pub struct ParsedText {
    /// Lines without terminators
    pub lines: Vec<String>,
    /// Metadata for each line, same length as `lines`
    pub metadata: Vec<LineMetadata>,
    /// Union of line tags plus file-level tags
    pub file_tags: BTreeSet<AnomalyTag>,
}

/// Extracts line metadata and file-level aggregates.
#[derive(Debug, Clone)]
pub struct MetadataExtractor {
    retry_storm_threshold: usize,
}

impl Default for MetadataExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataExtractor {
    /// Creates an extractor with the default retry-storm threshold.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            retry_storm_threshold: DEFAULT_RETRY_STORM_THRESHOLD,
        }
    }

    /// Creates an extractor with a custom retry-storm threshold.
    #[must_use]
    pub const fn with_retry_storm_threshold(threshold: usize) -> Self {
        Self {
            retry_storm_threshold: threshold,
        }
    }

    /// Returns the retry-storm threshold.
    #[must_use]
    pub const fn retry_storm_threshold(&self) -> usize {
        self.retry_storm_threshold
    }

    /// Extracts metadata from one line.
    #[must_use]
    pub fn extract_line(&self, line: &str) -> LineMetadata {
        LineMetadata {
            timestamp: parse_timestamp(line),
            trace_id: extract_field(line, CorrelationField::TraceId),
            span_id: extract_field(line, CorrelationField::SpanId),
            pod: extract_field(line, CorrelationField::Pod),
            container: extract_field(line, CorrelationField::Container),
            namespace: extract_field(line, CorrelationField::Namespace),
            level: parse_level(line),
            tags: anomaly_tags(line),
        }
    }

    /// Splits `text` into lines and extracts metadata for each.
    #[must_use]
    pub fn extract_text(&self, text: &str) -> ParsedText {
        let lines: Vec<String> = text.lines().map(str::to_string).collect();
        let metadata: Vec<LineMetadata> = lines.iter().map(|l| self.extract_line(l)).collect();

        let mut file_tags: BTreeSet<AnomalyTag> = metadata
            .iter()
            .flat_map(|m| m.tags.iter().copied())
            .collect();
        let retry_lines = metadata
            .iter()
            .filter(|m| m.tags.contains(&AnomalyTag::Retry))
            .count();
        if retry_lines >= self.retry_storm_threshold {
            file_tags.insert(AnomalyTag::RetryStorm);
        }

        ParsedText {
            lines,
            metadata,
            file_tags,
        }
    }
}
