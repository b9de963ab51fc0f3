//! Per-workspace file indices.
//!
//! This module provides:
//! - [`IndexedFile`] - One parsed file with per-line metadata
//! - [`WorkspaceIndex`] - `file_key → IndexedFile` for one workspace
//! - [`IndexStore`] - All workspaces owned by one worker
//!
//! Files are parsed completely before they are inserted, so a delta that
//! stops part-way never leaves a half-indexed entry behind.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::TrawlConfig;
use crate::error::{IndexError, Result};
use crate::metadata::MetadataExtractor;
use crate::protocol::{DeltaFile, IndexDeltaRequest, IndexStatusResponse, SearchRequest};
use crate::query::{QueryEngine, SearchResponse};
use crate::types::{AnomalyTag, LineMetadata};

/// A fully parsed file.
#[derive(Debug, Clone)]
pub struct IndexedFile {
    /// Stable identity within the workspace
    pub file_key: String,
    /// Change-detection token it was parsed from
    pub signature: String,
    /// Imported root it belongs to
    pub root_id: String,
    /// Display name of that root
    pub source_name: String,
    /// Path inside the root
    pub file_path: String,
    /// Lines without terminators
    pub lines: Vec<String>,
    /// Lowercased lines, parallel to `lines`
    pub folded_lines: Vec<String>,
    /// Metadata per line, parallel to `lines`
    pub line_metadata: Vec<LineMetadata>,
    /// Union of line tags plus file-level tags
    pub anomaly_tags: BTreeSet<AnomalyTag>,
    raw_text: String,
}

impl IndexedFile {
    /// Parses `text` into an indexed file.
    #[must_use]
    pub fn parse(file: &DeltaFile, text: &str, extractor: &MetadataExtractor) -> Self {
        let parsed = extractor.extract_text(text);
        let folded_lines = parsed.lines.iter().map(|l| l.to_lowercase()).collect();
        Self {
            file_key: file.file_key.clone(),
            signature: file.signature.clone(),
            root_id: file.root_id.clone(),
            source_name: file.source_name.clone(),
            file_path: file.file_path.clone(),
            lines: parsed.lines,
            folded_lines,
            line_metadata: parsed.metadata,
            anomaly_tags: parsed.file_tags,
            raw_text: text.to_string(),
        }
    }

    /// Returns the text the file was parsed from.
    #[must_use]
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    /// Returns the number of lines.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

/// Index of one workspace.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceIndex {
    files: BTreeMap<String, IndexedFile>,
    extractor: MetadataExtractor,
    parse_count: u64,
}

impl WorkspaceIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new(extractor: MetadataExtractor) -> Self {
        Self {
            files: BTreeMap::new(),
            extractor,
            parse_count: 0,
        }
    }

    /// Applies an incremental update.
    ///
    /// Order: optional clear, removals, then adds. Files whose signature is
    /// unchanged are not re-parsed. Unreadable files keep their prior state.
    pub fn apply_delta(&mut self, request: &IndexDeltaRequest) -> IndexStatusResponse {
        let started = Instant::now();

        if request.replace {
            self.files.clear();
        }
        for key in &request.removed_file_keys {
            self.files.remove(key);
        }

        let mut changed = 0;
        for file in &request.files {
            if self
                .files
                .get(&file.file_key)
                .is_some_and(|existing| existing.signature == file.signature)
            {
                continue;
            }
            let Some(text) = file.text.as_deref() else {
                warn!(
                    workspace_id = %request.workspace_id,
                    file_key = %file.file_key,
                    path = %file.file_path,
                    "file unreadable, skipping"
                );
                continue;
            };

            let indexed = IndexedFile::parse(file, text, &self.extractor);
            debug!(file_key = %file.file_key, lines = indexed.line_count(), "file parsed");
            self.files.insert(file.file_key.clone(), indexed);
            self.parse_count += 1;
            changed += 1;
        }

        info!(
            workspace_id = %request.workspace_id,
            changed,
            indexed = self.files.len(),
            total = request.total_files,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "index delta applied"
        );

        IndexStatusResponse {
            workspace_id: request.workspace_id.clone(),
            indexed_files: self.files.len(),
            changed_files: changed,
            total_files: request.total_files,
        }
    }

    /// Gets a file by key.
    #[must_use]
    pub fn get(&self, file_key: &str) -> Option<&IndexedFile> {
        self.files.get(file_key)
    }

    /// Iterates files in key order.
    pub fn iter(&self) -> impl Iterator<Item = &IndexedFile> {
        self.files.values()
    }

    /// Returns the number of indexed files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns true if no file is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total number of full file parses since creation.
    #[must_use]
    pub const fn parse_count(&self) -> u64 {
        self.parse_count
    }
}

/// Every workspace index owned by one worker.
#[derive(Debug, Default)]
pub struct IndexStore {
    workspaces: HashMap<String, WorkspaceIndex>,
    extractor: MetadataExtractor,
    engine: QueryEngine,
}

impl IndexStore {
    /// Creates an empty store with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store from configuration.
    #[must_use]
    pub fn from_config(config: &TrawlConfig) -> Self {
        Self {
            workspaces: HashMap::new(),
            extractor: MetadataExtractor::with_retry_storm_threshold(config.index.retry_storm_threshold),
            engine: QueryEngine::from_config(config),
        }
    }

    /// Applies a delta, creating the workspace on first use.
    pub fn apply_delta(&mut self, request: &IndexDeltaRequest) -> IndexStatusResponse {
        let extractor = &self.extractor;
        self.workspaces
            .entry(request.workspace_id.clone())
            .or_insert_with(|| WorkspaceIndex::new(extractor.clone()))
            .apply_delta(request)
    }

    /// Searches a workspace. An unknown workspace searches as empty.
    ///
    /// `superseded` is polled during the scan; once it returns true the
    /// scan stops and the response is marked superseded.
    pub fn search(&self, request: &SearchRequest, superseded: &dyn Fn() -> bool) -> SearchResponse {
        match self.workspaces.get(&request.workspace_id) {
            Some(index) => self.engine.search(index, request, superseded),
            None => self.engine.search(&WorkspaceIndex::default(), request, superseded),
        }
    }

    /// Removes a workspace. Returns true if it existed.
    pub fn drop_workspace(&mut self, workspace_id: &str) -> bool {
        let existed = self.workspaces.remove(workspace_id).is_some();
        if existed {
            info!(workspace_id, "workspace dropped");
        }
        existed
    }

    /// Gets a workspace index.
    #[must_use]
    pub fn workspace(&self, workspace_id: &str) -> Option<&WorkspaceIndex> {
        self.workspaces.get(workspace_id)
    }

    /// Total parses performed for a workspace.
    ///
    /// # Errors
    ///
    /// Returns an error if the workspace has never received a delta.
    pub fn parse_count(&self, workspace_id: &str) -> Result<u64> {
        self.workspaces
            .get(workspace_id)
            .map(WorkspaceIndex::parse_count)
            .ok_or_else(|| IndexError::UnknownWorkspace(workspace_id.to_string()))
    }

    /// Returns the number of workspaces.
    #[must_use]
    pub fn workspace_count(&self) -> usize {
        self.workspaces.len()
    }
}
