// ─── Fetch Pool ───
// Bounded worker pool shared by every installer. Scheduling returns a handle
// immediately; the coordinator awaits handles from all sections together.

use std::sync::Arc;

use futures_util::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::client::{ArtifactStore, FetchOutcome, FetchRequest};
use crate::core::error::{InstallError, InstallStage, LauncherError, LauncherResult};
use crate::core::progress::SharedProgress;

#[derive(Debug, Clone)]
pub struct FetchPool {
    store: Arc<ArtifactStore>,
    permits: Arc<Semaphore>,
    size: usize,
}

impl FetchPool {
    pub fn new(store: Arc<ArtifactStore>, size: usize) -> Self {
        let size = size.max(1);
        Self {
            store,
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    pub fn store(&self) -> &Arc<ArtifactStore> {
        &self.store
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Queue one fetch. At most `size` fetches hold a permit at a time.
    pub fn schedule(
        &self,
        stage: InstallStage,
        artifact: impl Into<String>,
        request: FetchRequest,
        progress: SharedProgress,
    ) -> PendingFetch {
        let store = Arc::clone(&self.store);
        let permits = Arc::clone(&self.permits);

        let handle = tokio::spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|_| LauncherError::Other("fetch pool closed".into()))?;
            store
                .fetch(&request, Some(progress.as_ref()))
                .await
                .map_err(LauncherError::from)
        });

        PendingFetch {
            stage,
            artifact: artifact.into(),
            handle,
        }
    }
}

/// A fetch that has been issued but not awaited.
#[derive(Debug)]
pub struct PendingFetch {
    pub stage: InstallStage,
    pub artifact: String,
    handle: JoinHandle<LauncherResult<FetchOutcome>>,
}

impl PendingFetch {
    pub async fn wait(self) -> Result<FetchOutcome, InstallError> {
        let PendingFetch {
            stage,
            artifact,
            handle,
        } = self;

        match handle.await {
            Ok(Ok(outcome)) => Ok(outcome),
            Ok(Err(cause)) => Err(InstallError::new(stage, artifact, cause)),
            Err(join) => Err(InstallError::new(stage, artifact, join)),
        }
    }
}

/// Tally of a completed phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchSummary {
    pub downloaded: usize,
    pub reused: usize,
    pub bytes: u64,
}

impl FetchSummary {
    fn record(&mut self, outcome: FetchOutcome) {
        match outcome {
            FetchOutcome::AlreadyValid => self.reused += 1,
            FetchOutcome::Downloaded { bytes } => {
                self.downloaded += 1;
                self.bytes += bytes;
            }
        }
    }
}

/// Await every handle. The first failure is returned; fetches still in
/// flight are detached and finish (or fail) on their own.
pub async fn await_all(pending: Vec<PendingFetch>) -> Result<FetchSummary, InstallError> {
    let total = pending.len();
    let mut in_flight: FuturesUnordered<_> = pending.into_iter().map(PendingFetch::wait).collect();
    let mut summary = FetchSummary::default();

    while let Some(result) = in_flight.next().await {
        match result {
            Ok(outcome) => summary.record(outcome),
            Err(err) => {
                warn!(
                    "Fetch failed ({} of {} done): {}",
                    summary.downloaded + summary.reused,
                    total,
                    err
                );
                return Err(err);
            }
        }
    }

    debug!(
        "Fetched {} artifacts ({} reused, {} bytes transferred)",
        summary.downloaded, summary.reused, summary.bytes
    );
    Ok(summary)
}
