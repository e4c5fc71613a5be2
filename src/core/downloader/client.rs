use std::io::Write;
use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use reqwest::Client;
use sha1::{Digest, Sha1};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, warn};

use crate::core::error::{FetchError, IntegrityError};
use crate::core::progress::ProgressSink;

/// Read/write granularity for downloads and hashing.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// A single artifact to materialise on disk.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: String,
    pub dest: PathBuf,
    /// SHA-1 of the final on-disk content.
    pub sha1: Option<String>,
    /// Transfer size credited to progress when the file is already valid.
    /// Falls back to the on-disk length.
    pub size: Option<u64>,
    /// Body is an LZMA stream to be decoded while writing.
    pub lzma: bool,
    /// Add the owner execute bit once written.
    pub executable: bool,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>, dest: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            dest: dest.into(),
            sha1: None,
            size: None,
            lzma: false,
            executable: false,
        }
    }

    pub fn sha1(mut self, sha1: impl Into<String>) -> Self {
        self.sha1 = Some(sha1.into());
        self
    }

    pub fn size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn lzma(mut self, lzma: bool) -> Self {
        self.lzma = lzma;
        self
    }

    pub fn executable(mut self, executable: bool) -> Self {
        self.executable = executable;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Destination already matched the expected hash; no request was made.
    AlreadyValid,
    /// Body was streamed; `bytes` counts transferred (pre-decompression) bytes.
    Downloaded { bytes: u64 },
}

/// Content-addressed fetcher. Holds nothing but the HTTP client, so any
/// number of fetches may run concurrently as long as destinations differ.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    client: Client,
}

impl ArtifactStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Fetch `request.url` into `request.dest`.
    ///
    /// An existing destination whose SHA-1 matches is kept without touching
    /// the network; a mismatching one is deleted first. Never retries.
    pub async fn fetch(
        &self,
        request: &FetchRequest,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<FetchOutcome, FetchError> {
        let url = request.url.as_str();
        let dest = request.dest.as_path();
        let io_err = |source: std::io::Error| FetchError::Io {
            url: url.to_string(),
            dest: dest.to_path_buf(),
            source,
        };

        if let Some(expected) = request.sha1.as_deref() {
            if let Ok(metadata) = tokio::fs::metadata(dest).await {
                if metadata.is_file() {
                    let actual = sha1_file(dest).await.map_err(io_err)?;
                    if actual.eq_ignore_ascii_case(expected) {
                        if let Some(progress) = progress {
                            progress.advance(request.size.unwrap_or(metadata.len()));
                        }
                        debug!("Already valid: {:?}", dest);
                        return Ok(FetchOutcome::AlreadyValid);
                    }

                    warn!(
                        "Stale file {:?}: expected {}, got {}; re-downloading",
                        dest, expected, actual
                    );
                    tokio::fs::remove_file(dest).await.map_err(io_err)?;
                }
            }
        }

        // Each fetch creates its own parent; nothing else orders writers.
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                dest: dest.to_path_buf(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                dest: dest.to_path_buf(),
                status: status.as_u16(),
            });
        }

        let mut sink = HashingWriter {
            file: tokio::fs::File::create(dest).await.map_err(io_err)?,
            hasher: Sha1::new(),
        };
        let mut decoder = request
            .lzma
            .then(|| lzma_rs::decompress::Stream::new(Vec::new()));
        let decompress_err = |message: String| FetchError::Decompress {
            url: url.to_string(),
            dest: dest.to_path_buf(),
            message,
        };

        let mut transferred = 0_u64;
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|source| FetchError::Transport {
                url: url.to_string(),
                dest: dest.to_path_buf(),
                source,
            })?;

            for piece in chunk.chunks(CHUNK_SIZE) {
                match decoder.as_mut() {
                    Some(decoder) => {
                        decoder
                            .write_all(piece)
                            .map_err(|e| decompress_err(e.to_string()))?;
                        let decoded = decoder
                            .get_output_mut()
                            .map(std::mem::take)
                            .unwrap_or_default();
                        sink.write(&decoded).await.map_err(io_err)?;
                    }
                    None => sink.write(piece).await.map_err(io_err)?,
                }

                transferred += piece.len() as u64;
                if let Some(progress) = progress {
                    progress.advance(piece.len() as u64);
                }
            }
        }

        if let Some(decoder) = decoder {
            let rest = decoder
                .finish()
                .map_err(|e| decompress_err(format!("{:?}", e)))?;
            sink.write(&rest).await.map_err(io_err)?;
        }

        // Handle is closed before hashing or chmod.
        let actual = sink.finish().await.map_err(io_err)?;

        if let Some(expected) = request.sha1.as_deref() {
            if !actual.eq_ignore_ascii_case(expected) {
                let _ = tokio::fs::remove_file(dest).await;
                return Err(FetchError::Integrity {
                    url: url.to_string(),
                    source: IntegrityError {
                        path: dest.to_path_buf(),
                        expected: expected.to_string(),
                        actual,
                    },
                });
            }
        }

        if request.executable {
            mark_executable(dest).await.map_err(io_err)?;
        }

        debug!("Downloaded: {} -> {:?} ({} bytes)", url, dest, transferred);
        Ok(FetchOutcome::Downloaded { bytes: transferred })
    }
}

/// File writer that hashes exactly what lands on disk.
struct HashingWriter {
    file: tokio::fs::File,
    hasher: Sha1,
}

impl HashingWriter {
    async fn write(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        self.hasher.update(bytes);
        self.file.write_all(bytes).await
    }

    async fn finish(mut self) -> std::io::Result<String> {
        self.file.flush().await?;
        drop(self.file);
        Ok(hex::encode(self.hasher.finalize()))
    }
}

/// Streaming SHA-1 of a file, in `CHUNK_SIZE` reads.
pub async fn sha1_file(path: &Path) -> std::io::Result<String> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Sha1::new();
    let mut buffer = vec![0_u8; CHUNK_SIZE];
    loop {
        let read = file.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(unix)]
async fn mark_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = tokio::fs::metadata(path).await?.permissions();
    perms.set_mode(perms.mode() | 0o100);
    tokio::fs::set_permissions(path, perms).await
}

#[cfg(not(unix))]
async fn mark_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
