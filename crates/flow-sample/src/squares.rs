//! # Squaring Pipelines
//!
//! The smallest useful pipelines: a list of numbers goes in, their squares
//! come out.
//!
//! - [`square_all`] fans one square stage out over `workers` workers. With a
//!   single worker the output keeps the input order.
//! - [`square_fan_in`] splits one source between two single-worker square
//!   stages and merges them back together. Output order is unspecified.

use flow_framework::{Pipeline, PipelineConfig, PipelineError};
use tracing::info;

/// Squares every number with `workers` parallel workers.
///
/// # Errors
/// [`PipelineError::PipelineCancelled`] only if something cancels the
/// pipeline from outside; squaring itself cannot fail.
pub async fn square_all(
    numbers: Vec<u64>,
    workers: usize,
    config: PipelineConfig,
) -> Result<Vec<u64>, PipelineError> {
    let pipeline = Pipeline::new("square_all", config);
    let source = pipeline.source(numbers);
    let squares = pipeline.stage("square", source, workers, square);
    let out = pipeline.drain(squares).collect_ok().await?;
    pipeline.join().await;
    info!(count = out.len(), workers, "Squared numbers");
    Ok(out)
}

/// Two square stages sharing one source, merged into one output.
pub async fn square_fan_in(
    numbers: Vec<u64>,
    config: PipelineConfig,
) -> Result<Vec<u64>, PipelineError> {
    let pipeline = Pipeline::new("square_fan_in", config);
    let source = pipeline.source(numbers);
    let left = pipeline.stage("square-1", source.clone(), 1, square);
    let right = pipeline.stage("square-2", source, 1, square);
    let merged = pipeline.merge(vec![left, right]);
    let out = pipeline.drain(merged).collect_ok().await?;
    pipeline.join().await;
    info!(count = out.len(), "Squared numbers through two stages");
    Ok(out)
}

fn square(n: u64) -> u64 {
    n.saturating_mul(n)
}
