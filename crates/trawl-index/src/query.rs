//! Query execution over a workspace index.
//!
//! This module provides:
//! - [`QueryEngine`] - Scans a [`WorkspaceIndex`] for qualifying lines
//! - [`SearchResponse`] - Results, aggregations and timeline
//!
//! A line qualifies when it matches the query (or the query is empty) and
//! every active filter accepts its metadata.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::TrawlConfig;
use crate::error::IndexError;
use crate::index::{IndexedFile, WorkspaceIndex};
use crate::protocol::SearchRequest;
use crate::types::{LineMetadata, LogLevel, SearchFilters};

/// Characters kept in a result preview before the ellipsis.
pub const PREVIEW_CHARS: usize = 160;

/// Default cap on timeline entries.
pub const TIMELINE_LIMIT: usize = 500;

/// Default number of lines scanned between cancellation checks.
pub const DEFAULT_CANCEL_CHECK_INTERVAL: usize = 1024;

const ELLIPSIS: char = '…';

// ============================================================================
// Response types
// ============================================================================

/// One qualifying line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// `fileKey:lineIndex`, with a zero-based line index
    pub id: String,
    /// File the line belongs to
    pub file_key: String,
    /// Imported root of the file
    pub root_id: String,
    /// Display name of the root
    pub source_name: String,
    /// Path inside the root
    pub file_path: String,
    /// One-based line number
    pub line: usize,
    /// Trimmed line, truncated to [`PREVIEW_CHARS`]
    pub preview: String,
    /// Lines before the hit, oldest first
    pub before: Vec<String>,
    /// Lines after the hit
    pub after: Vec<String>,
    /// Metadata of the line, tags included
    pub metadata: LineMetadata,
}

/// A qualifying line with a timestamp or trace identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    /// Same id as the matching [`SearchResult`]
    pub id: String,
    /// File the line belongs to
    pub file_key: String,
    /// Imported root of the file
    pub root_id: String,
    /// Display name of the root
    pub source_name: String,
    /// Path inside the root
    pub file_path: String,
    /// One-based line number
    pub line: usize,
    /// Event time in epoch milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// Trace identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    /// Span identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span_id: Option<String>,
    /// Level of the line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<LogLevel>,
    /// Same preview as the matching result
    pub preview: String,
}

/// Count buckets over qualifying lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchAggregation {
    /// Level name → count
    pub by_level: BTreeMap<String, usize>,
    /// Pod → count
    pub by_pod: BTreeMap<String, usize>,
    /// Namespace → count
    pub by_namespace: BTreeMap<String, usize>,
    /// File key → count
    pub by_file: BTreeMap<String, usize>,
    /// Tag name → count
    pub by_tag: BTreeMap<String, usize>,
}

impl SearchAggregation {
    fn record(&mut self, file: &IndexedFile, meta: &LineMetadata) {
        if let Some(level) = meta.level {
            *self.by_level.entry(level.as_str().to_string()).or_default() += 1;
        }
        if let Some(pod) = &meta.pod {
            *self.by_pod.entry(pod.clone()).or_default() += 1;
        }
        if let Some(ns) = &meta.namespace {
            *self.by_namespace.entry(ns.clone()).or_default() += 1;
        }
        *self.by_file.entry(file.file_key.clone()).or_default() += 1;
        for tag in &meta.tags {
            *self.by_tag.entry(tag.as_str().to_string()).or_default() += 1;
        }
    }
}

/// Answer to a [`SearchRequest`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    /// Echo of the request id
    pub request_id: u64,
    /// Echo of the query
    pub query: String,
    /// Qualifying lines, in file-key then line order
    pub results: Vec<SearchResult>,
    /// Keys of files with at least one result, in first-hit order
    pub matched_files: Vec<String>,
    /// Count buckets
    pub aggregations: SearchAggregation,
    /// Chronological events
    pub timeline: Vec<TimelineEvent>,
    /// Files in the workspace at search time
    pub total_indexed_files: usize,
    /// Set when the query could not be evaluated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Set when a newer search replaced this one mid-scan
    #[serde(default)]
    pub superseded: bool,
}

impl SearchResponse {
    fn empty(request: &SearchRequest, total_indexed_files: usize) -> Self {
        Self {
            request_id: request.request_id,
            query: request.query.clone(),
            total_indexed_files,
            ..Self::default()
        }
    }

    /// Counts results per file key.
    #[must_use]
    pub fn hits_per_file(&self) -> HashMap<String, usize> {
        let mut hits = HashMap::new();
        for result in &self.results {
            *hits.entry(result.file_key.clone()).or_default() += 1;
        }
        hits
    }
}

// ============================================================================
// Matching
// ============================================================================

enum Matcher {
    /// Query folded to lowercase unless case-sensitive
    Plain { needle: String, case_sensitive: bool },
    Regex(Regex),
}

impl Matcher {
    fn build(query: &str, regex: bool, case_sensitive: bool) -> Result<Self, IndexError> {
        if regex {
            RegexBuilder::new(query)
                .case_insensitive(!case_sensitive)
                .build()
                .map(Self::Regex)
                .map_err(|e| IndexError::InvalidRegex(e.to_string()))
        } else {
            let needle = if case_sensitive {
                query.to_string()
            } else {
                query.to_lowercase()
            };
            Ok(Self::Plain {
                needle,
                case_sensitive,
            })
        }
    }

    /// Coarse whole-file check. Never rejects a file containing a matching line.
    fn may_match_file(&self, file: &IndexedFile) -> bool {
        match self {
            Self::Plain {
                needle,
                case_sensitive: true,
            } => file.raw_text().contains(needle.as_str()),
            Self::Plain { needle, .. } => file
                .folded_lines
                .iter()
                .any(|line| line.contains(needle.as_str())),
            Self::Regex(_) => true,
        }
    }

    fn is_match(&self, file: &IndexedFile, index: usize) -> bool {
        match self {
            Self::Plain {
                needle,
                case_sensitive: true,
            } => file.lines[index].contains(needle.as_str()),
            Self::Plain { needle, .. } => file.folded_lines[index].contains(needle.as_str()),
            Self::Regex(re) => re.is_match(&file.lines[index]),
        }
    }
}

/// Filters with blank values dropped and strings folded once.
struct CompiledFilters {
    pod: Option<String>,
    container: Option<String>,
    namespace: Option<String>,
    level: Option<String>,
    time_from: Option<i64>,
    time_to: Option<i64>,
}

fn fold(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_lowercase)
}

fn contains_folded(value: Option<&String>, needle: Option<&String>) -> bool {
    match needle {
        None => true,
        Some(needle) => value.is_some_and(|v| v.to_lowercase().contains(needle.as_str())),
    }
}

impl CompiledFilters {
    fn new(filters: &SearchFilters) -> Self {
        Self {
            pod: fold(filters.pod.as_ref()),
            container: fold(filters.container.as_ref()),
            namespace: fold(filters.namespace.as_ref()),
            level: fold(filters.level.as_ref()),
            time_from: filters.time_from,
            time_to: filters.time_to,
        }
    }

    fn matches(&self, meta: &LineMetadata) -> bool {
        if let Some(level) = &self.level {
            if !meta.level.is_some_and(|l| l.as_str().eq_ignore_ascii_case(level)) {
                return false;
            }
        }
        if !contains_folded(meta.pod.as_ref(), self.pod.as_ref())
            || !contains_folded(meta.container.as_ref(), self.container.as_ref())
            || !contains_folded(meta.namespace.as_ref(), self.namespace.as_ref())
        {
            return false;
        }
        if self.time_from.is_some() || self.time_to.is_some() {
            let Some(ts) = meta.timestamp else {
                return false;
            };
            if self.time_from.is_some_and(|from| ts < from) || self.time_to.is_some_and(|to| ts > to) {
                return false;
            }
        }
        true
    }
}

/// Builds the preview of a line.
#[must_use]
pub fn preview(line: &str) -> String {
    let trimmed = line.trim();
    match trimmed.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => {
            let mut out = trimmed[..cut].to_string();
            out.push(ELLIPSIS);
            out
        }
        None => trimmed.to_string(),
    }
}

/// Orders timeline events: timestamped first ascending, then by id.
#[must_use]
pub fn timeline_order(a: &TimelineEvent, b: &TimelineEvent) -> Ordering {
    match (a.timestamp, b.timestamp) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.id.cmp(&b.id)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.id.cmp(&b.id),
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Executes searches against a [`WorkspaceIndex`].
#[derive(Debug, Clone)]
pub struct QueryEngine {
    timeline_limit: usize,
    cancel_check_interval: usize,
}

impl Default for QueryEngine {
    fn default() -> Self {
        Self {
            timeline_limit: TIMELINE_LIMIT,
            cancel_check_interval: DEFAULT_CANCEL_CHECK_INTERVAL,
        }
    }
}

impl QueryEngine {
    /// Creates an engine with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine from configuration.
    #[must_use]
    pub fn from_config(config: &TrawlConfig) -> Self {
        Self {
            timeline_limit: config.search.timeline_limit,
            cancel_check_interval: config.worker.cancel_check_interval.max(1),
        }
    }

    /// Runs `request` against `index`.
    ///
    /// `superseded` is polled before the scan and every
    /// `cancel_check_interval` scanned lines. When it returns true the scan
    /// stops and an empty response marked `superseded` is returned.
    pub fn search(
        &self,
        index: &WorkspaceIndex,
        request: &SearchRequest,
        superseded: &dyn Fn() -> bool,
    ) -> SearchResponse {
        let started = Instant::now();
        let options = &request.options;
        let query = request.query.trim();
        let total = index.len();

        if query.is_empty() && !options.filters.is_active() {
            return SearchResponse::empty(request, total);
        }
        if superseded() {
            debug!(request_id = request.request_id, "search superseded before scan");
            return SearchResponse {
                superseded: true,
                ..SearchResponse::empty(request, total)
            };
        }

        let matcher = if query.is_empty() {
            None
        } else {
            match Matcher::build(query, options.regex, options.case_sensitive) {
                Ok(m) => Some(m),
                Err(err) => {
                    debug!(request_id = request.request_id, error = %err, "query rejected");
                    return SearchResponse {
                        error: Some(err.to_string()),
                        ..SearchResponse::empty(request, total)
                    };
                }
            }
        };
        let filters = CompiledFilters::new(&options.filters);
        let context = options.effective_context_lines();
        let max_results = options.effective_max_results();

        let mut response = SearchResponse::empty(request, total);
        let mut scanned = 0usize;

        'files: for file in index.iter() {
            if matcher.as_ref().is_some_and(|m| !m.may_match_file(file)) {
                continue;
            }

            for i in 0..file.line_count() {
                scanned += 1;
                if scanned % self.cancel_check_interval == 0 && superseded() {
                    debug!(request_id = request.request_id, scanned, "search superseded");
                    return SearchResponse {
                        superseded: true,
                        ..SearchResponse::empty(request, total)
                    };
                }

                if matcher.as_ref().is_some_and(|m| !m.is_match(file, i)) {
                    continue;
                }
                let meta = &file.line_metadata[i];
                if !filters.matches(meta) {
                    continue;
                }

                Self::collect(&mut response, file, i, context);
                if response.results.len() >= max_results {
                    break 'files;
                }
            }
        }

        response.timeline.sort_by(timeline_order);
        response.timeline.truncate(self.timeline_limit);

        info!(
            request_id = request.request_id,
            results = response.results.len(),
            files = response.matched_files.len(),
            scanned,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "search complete"
        );
        response
    }

    fn collect(response: &mut SearchResponse, file: &IndexedFile, i: usize, context: usize) {
        let meta = &file.line_metadata[i];
        let id = format!("{}:{i}", file.file_key);
        let text = preview(&file.lines[i]);

        response.aggregations.record(file, meta);
        if response.matched_files.last() != Some(&file.file_key) {
            response.matched_files.push(file.file_key.clone());
        }

        if meta.has_timeline_identity() {
            response.timeline.push(TimelineEvent {
                id: id.clone(),
                file_key: file.file_key.clone(),
                root_id: file.root_id.clone(),
                source_name: file.source_name.clone(),
                file_path: file.file_path.clone(),
                line: i + 1,
                timestamp: meta.timestamp,
                trace_id: meta.trace_id.clone(),
                span_id: meta.span_id.clone(),
                level: meta.level,
                preview: text.clone(),
            });
        }

        let start = i.saturating_sub(context);
        let end = (i + 1 + context).min(file.line_count());
        response.results.push(SearchResult {
            id,
            file_key: file.file_key.clone(),
            root_id: file.root_id.clone(),
            source_name: file.source_name.clone(),
            file_path: file.file_path.clone(),
            line: i + 1,
            preview: text,
            before: file.lines[start..i].to_vec(),
            after: file.lines[i + 1..end].to_vec(),
            metadata: meta.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{DeltaFile, IndexDeltaRequest};
    use crate::types::{AnomalyTag, MAX_RESULTS, SearchOptions};
    use proptest::prelude::*;
    use std::cell::Cell;
    use test_case::test_case;

    const FILE_A: &str = "\
2026-02-12T09:14:20.000Z INFO [checkout] pod=checkout-7f9 namespace=prod request accepted
2026-02-12T09:14:23.220Z ERROR [checkout] traceId=alpha-trace-0001 code=PAYMENT_TIMEOUT message=\"payment gateway timeout after 3000ms\"
2026-02-12T09:14:24.000Z WARN [checkout] pod=checkout-7f9 namespace=prod retry scheduled
";

    const FILE_B: &str = "\
2026-02-12T09:14:21.000Z INFO [inventory] pod=inventory-1 namespace=prod stock ok
2026-02-12T09:14:22.000Z DEBUG [inventory] pod=inventory-1 namespace=staging cache warm
";

    fn workspace(files: &[(&str, &str)]) -> WorkspaceIndex {
        let mut delta = IndexDeltaRequest::new("ws");
        for (key, text) in files {
            delta = delta.with_file(DeltaFile::new(*key, "1", "root", "bundle.zip", format!("{key}.log"), *text));
        }
        let mut index = WorkspaceIndex::default();
        index.apply_delta(&delta);
        index
    }

    fn run(index: &WorkspaceIndex, query: &str, options: SearchOptions) -> SearchResponse {
        let request = SearchRequest::new(1, "ws", query).with_options(options);
        QueryEngine::new().search(index, &request, &|| false)
    }

    // ===========================================
    // Scenarios
    // ===========================================

    #[test]
    fn token_in_one_file() {
        let index = workspace(&[("a", FILE_A), ("b", FILE_B)]);
        let resp = run(&index, "payment_timeout", SearchOptions::default());

        assert_eq!(resp.results.len(), 1);
        assert_eq!(resp.matched_files, vec!["a"]);
        assert!(resp.aggregations.by_level.get("ERROR").copied().unwrap_or(0) >= 1);
        assert_eq!(resp.total_indexed_files, 2);
        assert!(resp.error.is_none());

        let hit = &resp.results[0];
        assert_eq!(hit.id, "a:1");
        assert_eq!(hit.line, 2);
        assert_eq!(hit.before.len(), 1);
        assert_eq!(hit.after.len(), 1);
        assert!(hit.metadata.tags.contains(&AnomalyTag::Timeout));
        assert_eq!(resp.aggregations.by_file.get("a"), Some(&1));
        assert_eq!(resp.aggregations.by_tag.get("timeout"), Some(&1));
    }

    #[test]
    fn max_results_caps_mid_file() {
        let text: String = (0..100).map(|i| format!("INFO tick {i}\n")).collect();
        let index = workspace(&[("a", &text), ("b", &text)]);

        let resp = run(&index, "tick", SearchOptions::default().with_max_results(20));
        assert_eq!(resp.results.len(), 20);
        assert_eq!(resp.matched_files, vec!["a"]);
        assert_eq!(resp.aggregations.by_level.get("INFO"), Some(&20));
    }

    #[test]
    fn max_results_clamped_up_to_minimum() {
        let text: String = (0..50).map(|i| format!("tick {i}\n")).collect();
        let index = workspace(&[("a", &text)]);
        let resp = run(&index, "tick", SearchOptions::default().with_max_results(1));
        assert_eq!(resp.results.len(), 20);
    }

    // ===========================================
    // Query modes
    // ===========================================

    #[test]
    fn empty_query_without_filters_is_noop() {
        let index = workspace(&[("a", FILE_A)]);
        let resp = run(&index, "   ", SearchOptions::default());
        assert!(resp.results.is_empty());
        assert!(resp.timeline.is_empty());
        assert_eq!(resp.total_indexed_files, 1);
    }

    #[test]
    fn empty_query_with_filter_scans() {
        let index = workspace(&[("a", FILE_A), ("b", FILE_B)]);
        let opts = SearchOptions::default().with_filters(SearchFilters::new().with_level("info"));
        let resp = run(&index, "", opts);
        assert_eq!(resp.results.len(), 2);
        assert_eq!(resp.matched_files, vec!["a", "b"]);
    }

    #[test]
    fn case_sensitive_plain() {
        let index = workspace(&[("a", FILE_A)]);
        let resp = run(&index, "payment_timeout", SearchOptions::default().with_case_sensitive(true));
        assert!(resp.results.is_empty());
        let resp = run(&index, "PAYMENT_TIMEOUT", SearchOptions::default().with_case_sensitive(true));
        assert_eq!(resp.results.len(), 1);
    }

    #[test]
    fn regex_mode() {
        let index = workspace(&[("a", FILE_A), ("b", FILE_B)]);
        let resp = run(&index, r"pod=\w+-\d$|stock", SearchOptions::default().with_regex(true));
        assert_eq!(resp.results.len(), 1);
        let resp = run(&index, r"^2026.*(warn|debug)", SearchOptions::default().with_regex(true));
        assert_eq!(resp.results.len(), 2);
    }

    #[test]
    fn invalid_regex_reports_error() {
        let index = workspace(&[("a", FILE_A)]);
        let resp = run(&index, "(unclosed", SearchOptions::default().with_regex(true));
        assert!(resp.results.is_empty());
        assert!(resp.error.as_deref().is_some_and(|e| e.starts_with("invalid regex")));
    }

    // ===========================================
    // Filters
    // ===========================================

    #[test_case(SearchFilters::new().with_pod("CHECKOUT"), 2 ; "pod substring folded")]
    #[test_case(SearchFilters::new().with_namespace("staging"), 1 ; "namespace")]
    #[test_case(SearchFilters::new().with_container("envoy"), 0 ; "missing field fails")]
    #[test_case(SearchFilters::new().with_level("warn"), 1 ; "level exact")]
    #[test_case(SearchFilters::new().with_level("WAR"), 0 ; "level not substring")]
    #[test_case(SearchFilters::new().with_pod("  "), 5 ; "blank filter ignored")]
    fn filter_cases(filters: SearchFilters, expected: usize) {
        let index = workspace(&[("a", FILE_A), ("b", FILE_B)]);
        let resp = run(&index, "2026", SearchOptions::default().with_filters(filters));
        assert_eq!(resp.results.len(), expected);
    }

    #[test]
    fn time_range_is_inclusive() {
        let index = workspace(&[("a", FILE_A), ("b", FILE_B), ("c", "no timestamp INFO\n")]);
        let from = crate::metadata::parse_timestamp("2026-02-12T09:14:21.000Z");
        let to = crate::metadata::parse_timestamp("2026-02-12T09:14:23.220Z");
        let opts = SearchOptions::default().with_filters(SearchFilters::new().with_time_range(from, to));

        let resp = run(&index, "", opts);
        let ids: Vec<&str> = resp.results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a:1", "b:0", "b:1"]);
    }

    #[test]
    fn filters_apply_with_query() {
        let index = workspace(&[("a", FILE_A)]);
        let opts = SearchOptions::default().with_filters(SearchFilters::new().with_level("error"));
        assert_eq!(run(&index, "checkout", opts.clone()).results.len(), 1);
        assert_eq!(run(&index, "accepted", opts).results.len(), 0);
    }

    // ===========================================
    // Results
    // ===========================================

    #[test]
    fn context_clamped_to_file_bounds() {
        let index = workspace(&[("a", "one\ntwo\nthree\nfour\n")]);
        let resp = run(&index, "one", SearchOptions::default().with_context_lines(3));
        assert!(resp.results[0].before.is_empty());
        assert_eq!(resp.results[0].after, vec!["two", "three", "four"]);

        let resp = run(&index, "three", SearchOptions::default().with_context_lines(0));
        assert!(resp.results[0].before.is_empty());
        assert!(resp.results[0].after.is_empty());
    }

    #[test]
    fn preview_truncates_with_ellipsis() {
        let long = format!("   {}   ", "x".repeat(200));
        let p = preview(&long);
        assert_eq!(p.chars().count(), PREVIEW_CHARS + 1);
        assert!(p.ends_with(ELLIPSIS));
        assert_eq!(preview("  short  "), "short");
        assert_eq!(preview(&"é".repeat(PREVIEW_CHARS)), "é".repeat(PREVIEW_CHARS));
    }

    #[test]
    fn by_file_separates_roots_with_same_path() {
        let mut delta = IndexDeltaRequest::new("ws");
        for root in ["root-1", "root-2"] {
            delta = delta.with_file(DeltaFile::new(
                format!("{root}/logs/app.log"),
                "1",
                root,
                format!("{root}.zip"),
                "logs/app.log",
                "ERROR boom\n",
            ));
        }
        let mut index = WorkspaceIndex::default();
        index.apply_delta(&delta);

        let resp = run(&index, "boom", SearchOptions::default());
        assert_eq!(resp.matched_files, vec!["root-1/logs/app.log", "root-2/logs/app.log"]);
        assert_eq!(resp.aggregations.by_file.len(), 2);
        assert_eq!(resp.aggregations.by_file.get("root-1/logs/app.log"), Some(&1));
        assert_eq!(resp.aggregations.by_file.get("root-2/logs/app.log"), Some(&1));
    }

    #[test]
    fn hits_per_file_counts_results() {
        let index = workspace(&[("a", FILE_A), ("b", FILE_B)]);
        let resp = run(&index, "prod", SearchOptions::default());
        let hits = resp.hits_per_file();
        assert_eq!(hits.get("a"), Some(&2));
        assert_eq!(hits.get("b"), Some(&1));
    }

    // ===========================================
    // Timeline
    // ===========================================

    #[test]
    fn timeline_sorted_and_untimed_last() {
        let index = workspace(&[
            ("a", FILE_A),
            ("b", FILE_B),
            ("c", "span_id=s1 untimed event\n"),
        ]);
        let resp = run(&index, "e", SearchOptions::default());

        let ids: Vec<&str> = resp.timeline.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a:0", "b:0", "b:1", "a:1", "a:2", "c:0"]);
        assert_eq!(resp.timeline[3].trace_id.as_deref(), Some("alpha-trace-0001"));
    }

    #[test]
    fn timeline_capped() {
        let text: String = (0..700)
            .map(|i| format!("2026-02-12T09:{:02}:{:02}Z INFO event {i}\n", i / 60 % 60, i % 60))
            .collect();
        let index = workspace(&[("a", &text)]);
        let resp = run(&index, "event", SearchOptions::default().with_max_results(3000));
        assert_eq!(resp.results.len(), 700);
        assert_eq!(resp.timeline.len(), TIMELINE_LIMIT);
    }

    // ===========================================
    // Cancellation
    // ===========================================

    #[test]
    fn superseded_scan_stops_early() {
        let text: String = (0..5000).map(|i| format!("tick {i}\n")).collect();
        let index = workspace(&[("a", &text)]);
        let polls = Cell::new(0);
        let request = SearchRequest::new(9, "ws", "tick")
            .with_options(SearchOptions::default().with_max_results(MAX_RESULTS));

        // the pre-scan poll passes, the first in-scan poll cancels
        let resp = QueryEngine::new().search(&index, &request, &|| {
            polls.set(polls.get() + 1);
            polls.get() > 1
        });

        assert!(resp.superseded);
        assert!(resp.results.is_empty());
        assert_eq!(resp.request_id, 9);
        assert_eq!(polls.get(), 2);
    }

    #[test]
    fn superseded_before_scan() {
        let index = workspace(&[("a", FILE_A)]);
        let resp = QueryEngine::new().search(&index, &SearchRequest::new(3, "ws", "boom"), &|| true);
        assert!(resp.superseded);
        assert_eq!(resp.total_indexed_files, 1);
    }

    fn event(id: &str, timestamp: Option<i64>) -> TimelineEvent {
        TimelineEvent {
            id: id.to_string(),
            file_key: String::new(),
            root_id: String::new(),
            source_name: String::new(),
            file_path: String::new(),
            line: 1,
            timestamp,
            trace_id: None,
            span_id: None,
            level: None,
            preview: String::new(),
        }
    }

    proptest! {
        #[test]
        fn timeline_order_invariant(entries in proptest::collection::vec((proptest::option::of(0i64..1000), "[a-c]{1,3}"), 0..40)) {
            let mut events: Vec<TimelineEvent> = entries
                .iter()
                .map(|(ts, id)| event(id, *ts))
                .collect();
            events.sort_by(timeline_order);

            let first_untimed = events.iter().position(|e| e.timestamp.is_none()).unwrap_or(events.len());
            prop_assert!(events[first_untimed..].iter().all(|e| e.timestamp.is_none()));
            for pair in events[..first_untimed].windows(2) {
                prop_assert!(pair[0].timestamp <= pair[1].timestamp);
            }
            for pair in events.windows(2) {
                if pair[0].timestamp == pair[1].timestamp {
                    prop_assert!(pair[0].id <= pair[1].id);
                }
            }
        }
    }
}
