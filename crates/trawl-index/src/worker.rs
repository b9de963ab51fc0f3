//! Dedicated indexing thread and its async handle.
//!
//! All workspace state lives on one OS thread. Callers talk to it through an
//! [`IndexHandle`], which sends commands over a bounded channel and awaits a
//! oneshot reply, so indexing and scanning never run on the caller's task.
//!
//! The handle records the most recent search id issued per workspace. A scan
//! whose id is no longer the latest stops at its next cancellation check.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::config::TrawlConfig;
use crate::error::{IndexError, Result};
use crate::index::IndexStore;
use crate::protocol::{IndexDeltaRequest, IndexStatusResponse, SearchRequest};
use crate::query::SearchResponse;

const THREAD_NAME: &str = "trawl-index";

type LatestSearches = Arc<RwLock<HashMap<String, u64>>>;

/// Commands accepted by the worker.
enum Command {
    ApplyDelta {
        request: IndexDeltaRequest,
        reply: oneshot::Sender<IndexStatusResponse>,
    },
    Search {
        request: SearchRequest,
        reply: oneshot::Sender<SearchResponse>,
    },
    DropWorkspace {
        workspace_id: String,
        reply: oneshot::Sender<bool>,
    },
    ParseCount {
        workspace_id: String,
        reply: oneshot::Sender<Result<u64>>,
    },
}

/// Spawns the index worker thread.
pub struct IndexWorker;

impl IndexWorker {
    /// Starts a worker and returns a handle to it.
    ///
    /// The thread exits once every handle has been dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the thread
    /// cannot be spawned.
    pub fn spawn(config: &TrawlConfig) -> Result<IndexHandle> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.worker.queue_capacity);
        let latest: LatestSearches = Arc::new(RwLock::new(HashMap::new()));
        let store = IndexStore::from_config(config);

        let worker_latest = Arc::clone(&latest);
        std::thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || run(store, rx, &worker_latest))?;

        info!(
            queue_capacity = config.worker.queue_capacity,
            cancel_check_interval = config.worker.cancel_check_interval,
            "index worker started"
        );
        Ok(IndexHandle { tx, latest })
    }
}

fn run(mut store: IndexStore, mut rx: mpsc::Receiver<Command>, latest: &LatestSearches) {
    while let Some(command) = rx.blocking_recv() {
        match command {
            Command::ApplyDelta { request, reply } => {
                let status = store.apply_delta(&request);
                let _ = reply.send(status);
            }
            Command::Search { request, reply } => {
                let superseded = || is_superseded(latest, &request.workspace_id, request.request_id);
                let response = store.search(&request, &superseded);
                let _ = reply.send(response);
            }
            Command::DropWorkspace {
                workspace_id,
                reply,
            } => {
                let _ = reply.send(store.drop_workspace(&workspace_id));
            }
            Command::ParseCount {
                workspace_id,
                reply,
            } => {
                let _ = reply.send(store.parse_count(&workspace_id));
            }
        }
    }
    debug!("index worker stopped");
}

fn is_superseded(latest: &LatestSearches, workspace_id: &str, request_id: u64) -> bool {
    latest
        .read()
        .get(workspace_id)
        .is_some_and(|&newest| newest != request_id)
}

/// Cloneable handle to a running index worker.
#[derive(Clone)]
pub struct IndexHandle {
    tx: mpsc::Sender<Command>,
    latest: LatestSearches,
}

impl IndexHandle {
    async fn call<T>(
        tx: &mpsc::Sender<Command>,
        command: Command,
        reply: oneshot::Receiver<T>,
    ) -> Result<T> {
        tx.send(command).await.map_err(|_| IndexError::WorkerClosed)?;
        reply.await.map_err(|_| IndexError::WorkerClosed)
    }

    /// Applies an index delta.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker has stopped.
    pub async fn apply_delta(&self, request: IndexDeltaRequest) -> Result<IndexStatusResponse> {
        let (reply, rx) = oneshot::channel();
        Self::call(&self.tx, Command::ApplyDelta { request, reply }, rx).await
    }

    /// Issues a search.
    ///
    /// The request becomes the latest for its workspace as soon as this is
    /// called, before the returned future is polled. Any earlier search for
    /// the same workspace still queued or scanning comes back superseded.
    ///
    /// # Errors
    ///
    /// The future fails if the worker has stopped.
    pub fn search(&self, request: SearchRequest) -> impl Future<Output = Result<SearchResponse>> + use<> {
        self.latest
            .write()
            .insert(request.workspace_id.clone(), request.request_id);
        debug!(
            workspace_id = %request.workspace_id,
            request_id = request.request_id,
            "search issued"
        );

        let tx = self.tx.clone();
        async move {
            let (reply, rx) = oneshot::channel();
            Self::call(&tx, Command::Search { request, reply }, rx).await
        }
    }

    /// Removes a workspace and forgets its latest search.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker has stopped.
    pub async fn drop_workspace(&self, workspace_id: impl Into<String>) -> Result<bool> {
        let workspace_id = workspace_id.into();
        self.latest.write().remove(&workspace_id);
        let (reply, rx) = oneshot::channel();
        Self::call(&self.tx, Command::DropWorkspace { workspace_id, reply }, rx).await
    }

    /// Returns the number of full file parses for a workspace.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker has stopped or the workspace is unknown.
    pub async fn parse_count(&self, workspace_id: impl Into<String>) -> Result<u64> {
        let (reply, rx) = oneshot::channel();
        let workspace_id = workspace_id.into();
        Self::call(&self.tx, Command::ParseCount { workspace_id, reply }, rx).await?
    }

    /// Returns true if `request_id` is the latest search issued for the workspace.
    #[must_use]
    pub fn is_latest(&self, workspace_id: &str, request_id: u64) -> bool {
        self.latest.read().get(workspace_id) == Some(&request_id)
    }
}
