pub mod client;
pub mod pool;

pub use client::{sha1_file, ArtifactStore, FetchOutcome, FetchRequest, CHUNK_SIZE};
pub use pool::{await_all, FetchPool, FetchSummary, PendingFetch};
