//! # Digest Tree
//!
//! SHA-256 of every regular file below a directory, computed by a fail-fast
//! pipeline:
//!
//! ```text
//! walk (blocking thread) ──► stage "digest" (N workers) ──► drain ──► BTreeMap
//! ```
//!
//! The walk runs on Tokio's blocking pool and feeds the pipeline through a
//! small channel, so it stops as soon as the pipeline no longer reads from it.
//! Symlinks are not followed and anything that is not a regular file is
//! skipped. The first walk or read error cancels the whole digest.

use flow_framework::{FailurePolicy, Pipeline, PipelineConfig, PipelineError, StageFailure};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

const WALK_BUFFER: usize = 64;

#[derive(Debug, Error)]
pub enum DigestError {
    /// The root itself is missing or unreadable.
    #[error("Cannot open {path}: {source}")]
    Root {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Walk task failed: {0}")]
    Walker(#[from] JoinError),

    #[error(transparent)]
    Pipeline(PipelineError),
}

impl From<PipelineError> for DigestError {
    /// Unwraps the [`DigestError`] a failed stage carried, if any.
    fn from(error: PipelineError) -> Self {
        match error {
            PipelineError::StageTransformFailure(StageFailure { stage, source }) => {
                match source.downcast::<DigestError>() {
                    Ok(digest) => *digest,
                    Err(source) => Self::Pipeline(StageFailure { stage, source }.into()),
                }
            }
            other => Self::Pipeline(other),
        }
    }
}

/// Hex SHA-256 per file path, sorted by path.
pub type Digests = BTreeMap<PathBuf, String>;

/// Digests every regular file under `root` with `workers` parallel readers.
///
/// `config.failure_policy` is ignored: a digest with holes in it is not a
/// digest, so the pipeline always fails fast.
pub async fn digest_tree(
    root: impl AsRef<Path>,
    workers: usize,
    config: PipelineConfig,
) -> Result<Digests, DigestError> {
    let root = root.as_ref().to_path_buf();
    tokio::fs::metadata(&root)
        .await
        .map_err(|source| DigestError::Root {
            path: root.clone(),
            source,
        })?;

    let pipeline = Pipeline::new(
        "digest_tree",
        config.with_failure_policy(FailurePolicy::FailFast),
    );
    let (walked, walker) = walk(root.clone());
    let entries = pipeline.source_stream(walked);
    let digests = pipeline.try_stage_async("digest", entries, workers, digest_entry);

    let collected = pipeline.drain(digests).collect_ok().await;
    // The source task owns the walk's receiver, so once it exits the walker
    // sees a closed channel and stops.
    pipeline.join().await;
    walker.await?;

    let mut out = Digests::new();
    for (path, digest) in collected?.into_iter().flatten() {
        out.insert(path, digest);
    }
    info!(root = %root.display(), files = out.len(), workers, "Digested tree");
    Ok(out)
}

/// Walks `root` on the blocking pool. The walk ends early once the returned
/// stream is dropped; the handle resolves when the walking thread is done.
fn walk(
    root: PathBuf,
) -> (
    impl futures::Stream<Item = walkdir::Result<DirEntry>> + Send,
    JoinHandle<()>,
) {
    let (entries, receiver) = mpsc::channel(WALK_BUFFER);
    let walker = tokio::task::spawn_blocking(move || {
        for entry in WalkDir::new(root) {
            if entries.blocking_send(entry).is_err() {
                debug!("Walk abandoned");
                break;
            }
        }
    });
    let stream = futures::stream::unfold(receiver, |mut receiver| async move {
        let entry = receiver.recv().await?;
        Some((entry, receiver))
    });
    (stream, walker)
}

async fn digest_entry(
    entry: walkdir::Result<DirEntry>,
) -> Result<Option<(PathBuf, String)>, DigestError> {
    let entry = entry?;
    if !entry.file_type().is_file() {
        return Ok(None);
    }
    digest_file(entry.into_path()).await.map(Some)
}

/// Hex SHA-256 of one file's contents.
pub async fn digest_file(path: PathBuf) -> Result<(PathBuf, String), DigestError> {
    let data = match tokio::fs::read(&path).await {
        Ok(data) => data,
        Err(source) => return Err(DigestError::Read { path, source }),
    };
    let digest = hex::encode(Sha256::digest(&data));
    debug!(path = %path.display(), bytes = data.len(), "Digested file");
    Ok((path, digest))
}
