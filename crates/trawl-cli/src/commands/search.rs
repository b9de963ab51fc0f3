//! Search command implementation.
//!
//! Imports each archive as one root of a throwaway workspace, indexes its
//! text files on the index worker and prints the response.

use std::io::Write;

use chrono::{DateTime, SecondsFormat};
use serde::Serialize;
use tracing::debug;
use trawl_index::{
    IndexStatusResponse, IndexWorker, SearchFilters, SearchOptions, SearchRequest,
    SearchResponse, TrawlConfig,
};

use crate::cli::SearchArgs;
use crate::error::CliError;
use crate::import::{FailedImport, build_delta, import_roots};
use crate::output::{OutputFormat, TableDisplay};

/// Workspace id used for every CLI search.
pub const WORKSPACE_ID: &str = "cli";

const TIMELINE_SHOWN: usize = 20;

/// Handler for the search command.
pub struct SearchCommand<'a> {
    config: &'a TrawlConfig,
}

impl<'a> SearchCommand<'a> {
    /// Creates a new search command handler.
    #[must_use]
    pub const fn new(config: &'a TrawlConfig) -> Self {
        Self { config }
    }

    /// Executes the search command.
    ///
    /// # Errors
    ///
    /// Returns error if an archive cannot be loaded, an argument is invalid
    /// or the query is rejected.
    pub async fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        args: &SearchArgs,
    ) -> Result<(), CliError> {
        let options = self.options(args)?;
        let imported = import_roots(&args.archives)?;
        let roots = &imported.roots;

        let handle = IndexWorker::spawn(self.config)?;
        let status = handle.apply_delta(build_delta(WORKSPACE_ID, roots)).await?;
        debug!(indexed = status.indexed_files, "workspace indexed");

        let request = SearchRequest::new(1, WORKSPACE_ID, args.query.clone()).with_options(options);
        let response = handle.search(request).await?;

        if let Some(error) = &response.error {
            return Err(CliError::InvalidArgument(error.clone()));
        }

        let report = SearchReport {
            archives: roots.iter().map(|r| r.source_name.clone()).collect(),
            skipped: imported.failures,
            status,
            response,
        };
        format.write(out, &report)
    }

    /// Merges configured defaults with command-line overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if `--from` or `--to` is not RFC 3339.
    pub fn options(&self, args: &SearchArgs) -> Result<SearchOptions, CliError> {
        let defaults = &self.config.search;
        let filters = SearchFilters {
            pod: args.pod.clone(),
            container: args.container.clone(),
            namespace: args.namespace.clone(),
            level: args.level.clone(),
            time_from: parse_time("--from", args.from.as_deref())?,
            time_to: parse_time("--to", args.to.as_deref())?,
        };

        Ok(defaults
            .options()
            .with_regex(defaults.regex || args.regex)
            .with_case_sensitive(defaults.case_sensitive || args.case_sensitive)
            .with_context_lines(args.context.unwrap_or(defaults.context_lines))
            .with_max_results(args.max.unwrap_or(defaults.max_results))
            .with_filters(filters))
    }
}

fn parse_time(flag: &str, value: Option<&str>) -> Result<Option<i64>, CliError> {
    value
        .map(|v| {
            DateTime::parse_from_rfc3339(v)
                .map(|dt| dt.timestamp_millis())
                .map_err(|e| CliError::InvalidArgument(format!("{flag} {v}: {e}")))
        })
        .transpose()
}

fn format_millis(ts: i64) -> String {
    DateTime::from_timestamp_millis(ts)
        .map_or_else(|| ts.to_string(), |dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Search result for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchReport {
    /// Archive names, one per root.
    pub archives: Vec<String>,
    /// Archives that could not be imported.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<FailedImport>,
    /// Indexing outcome.
    pub status: IndexStatusResponse,
    /// Search outcome.
    pub response: SearchResponse,
}

impl TableDisplay for SearchReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        let response = &self.response;

        for hit in &response.results {
            writeln!(writer, "{}:{} [{}]", hit.file_path, hit.line, hit.source_name)?;
            for line in &hit.before {
                writeln!(writer, "    {line}")?;
            }
            writeln!(writer, "  > {}", hit.preview)?;
            for line in &hit.after {
                writeln!(writer, "    {line}")?;
            }
        }

        writeln!(writer)?;
        writeln!(
            writer,
            "{} results in {} of {} files",
            response.results.len(),
            response.matched_files.len(),
            response.total_indexed_files
        )?;

        let buckets = [
            ("Levels", &response.aggregations.by_level),
            ("Tags", &response.aggregations.by_tag),
            ("Pods", &response.aggregations.by_pod),
            ("Namespaces", &response.aggregations.by_namespace),
        ];
        for (title, counts) in buckets {
            if counts.is_empty() {
                continue;
            }
            let joined: Vec<String> = counts.iter().map(|(k, v)| format!("{k}={v}")).collect();
            writeln!(writer, "{title}: {}", joined.join(" "))?;
        }

        if !response.timeline.is_empty() {
            writeln!(writer)?;
            writeln!(writer, "Timeline")?;
            for event in response.timeline.iter().take(TIMELINE_SHOWN) {
                let when = event.timestamp.map_or_else(|| "-".to_string(), format_millis);
                writeln!(writer, "  {when}  {}:{}  {}", event.file_path, event.line, event.preview)?;
            }
            if response.timeline.len() > TIMELINE_SHOWN {
                writeln!(writer, "  ... {} more", response.timeline.len() - TIMELINE_SHOWN)?;
            }
        }

        for failed in &self.skipped {
            writeln!(writer, "Skipped {}: {}", failed.source_name, failed.error)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    use crate::cli::{Cli, Commands};

    fn args(argv: &[&str]) -> SearchArgs {
        let mut full = vec!["trawl", "search", "bundle.zip"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Commands::Search(args) => args,
            Commands::Extract(_) => unreachable!("expected search"),
        }
    }

    #[test]
    fn options_use_config_defaults() {
        let mut config = TrawlConfig::default();
        config.search.context_lines = 5;
        config.search.case_sensitive = true;

        let options = SearchCommand::new(&config).options(&args(&[])).expect("options");
        assert_eq!(options.context_lines, 5);
        assert!(options.case_sensitive);
        assert_eq!(options.max_results, 500);
        assert!(!options.filters.is_active());
    }

    #[test]
    fn flags_override_defaults() {
        let config = TrawlConfig::default();
        let options = SearchCommand::new(&config)
            .options(&args(&["-C", "0", "--max", "40", "--regex", "--level", "warn"]))
            .expect("options");
        assert_eq!(options.context_lines, 0);
        assert_eq!(options.max_results, 40);
        assert!(options.regex);
        assert_eq!(options.filters.level.as_deref(), Some("warn"));
    }

    #[test]
    fn time_flags_parse_rfc3339() {
        let config = TrawlConfig::default();
        let options = SearchCommand::new(&config)
            .options(&args(&["--from", "2026-02-12T09:14:23.220Z", "--to", "2026-02-12T11:14:23+02:00"]))
            .expect("options");
        let from = options.filters.time_from.expect("from");
        let to = options.filters.time_to.expect("to");
        assert_eq!(to - from, -220);
        assert_eq!(format_millis(from), "2026-02-12T09:14:23.220Z");
    }

    #[test]
    fn bad_time_flag_rejected() {
        let config = TrawlConfig::default();
        let err = SearchCommand::new(&config)
            .options(&args(&["--from", "yesterday"]))
            .expect_err("bad time");
        assert!(err.to_string().contains("--from yesterday"));
    }
}
