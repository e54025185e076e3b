//! Prometheus metrics for the dummy prover.
//!
//! Provides metric initialization and helper functions for recording per-block, per-proof and
//! event stream metrics.

use std::time::Duration;

use dummy_prover_types::ProofType;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

use crate::error::Error;

/// Initialize the Prometheus metrics exporter and register metric descriptions.
///
/// Returns a handle that can be used to render metrics for the `/metrics` endpoint.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    describe_metrics();
    Ok(handle)
}

fn describe_metrics() {
    describe_counter!(
        "dummy_prover_blocks_total",
        "Blocks processed, by outcome"
    );
    describe_histogram!(
        "dummy_prover_block_duration_seconds",
        "Time from block event to last proof submission in seconds"
    );
    describe_counter!(
        "dummy_prover_proofs_generated_total",
        "Proof generations, by proof type and outcome"
    );
    describe_counter!(
        "dummy_prover_proofs_submitted_total",
        "Proof submissions, by proof type and outcome"
    );
    describe_counter!(
        "dummy_prover_stream_events_total",
        "Block events received from the source beacon node"
    );
}

fn status<T, E>(result: &Result<T, E>) -> &'static str {
    if result.is_ok() { "success" } else { "error" }
}

/// Record the outcome of one block pipeline.
pub(crate) fn record_block(result: &Result<(), Error>, duration: Duration) {
    let status = match result {
        Ok(()) => "success",
        Err(error) if error.is_cancelled() => "cancelled",
        Err(error) if error.is_not_found() => "not_found",
        Err(_) => "error",
    };
    counter!("dummy_prover_blocks_total", "status" => status).increment(1);
    if result.is_ok() {
        histogram!("dummy_prover_block_duration_seconds").record(duration.as_secs_f64());
    }
}

/// Record a proof generation (including signing) result.
pub(crate) fn record_proof_generated<T, E>(proof_type: ProofType, result: &Result<T, E>) {
    counter!(
        "dummy_prover_proofs_generated_total",
        "proof_type" => proof_type.to_string(),
        "status" => status(result)
    )
    .increment(1);
}

/// Record a proof submission result.
pub(crate) fn record_proof_submitted<T, E>(proof_type: ProofType, result: &Result<T, E>) {
    counter!(
        "dummy_prover_proofs_submitted_total",
        "proof_type" => proof_type.to_string(),
        "status" => status(result)
    )
    .increment(1);
}

/// Record a block event delivered by the event stream.
pub(crate) fn record_stream_event() {
    counter!("dummy_prover_stream_events_total").increment(1);
}
