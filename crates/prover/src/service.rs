//! # Prover service
//!
//! [`ProverService`] subscribes to `block` events of the source beacon node and runs the
//! [`Prover`] pipeline for each event, one block at a time, in arrival order.
//!
//! A failed block is logged and skipped. A failed event stream ends the service with
//! [`Error::Stream`] so that the process can exit and be restarted by its supervisor.

use std::time::Instant;

use dummy_prover_client::{Error as ClientError, StreamMessage};
use dummy_prover_types::BlockNotification;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{
    error::{Error, Result},
    metrics,
    orchestrator::Prover,
};

/// Number of block events buffered between the event stream and the control loop.
pub const EVENT_BUFFER_CAPACITY: usize = 64;

pub struct ProverService {
    prover: Prover,
}

impl ProverService {
    pub fn new(prover: Prover) -> Self {
        Self { prover }
    }

    /// Main event loop. Returns `Ok(())` once `shutdown_token` is cancelled.
    pub async fn run(self, shutdown_token: CancellationToken) -> Result<()> {
        let source = self.prover.source();
        info!(name = %source.name(), url = %source.url(), "Connecting to block event stream");

        let mut events =
            source.subscribe_block_events(shutdown_token.clone(), EVENT_BUFFER_CAPACITY)?;

        loop {
            let message = tokio::select! {
                biased;

                _ = shutdown_token.cancelled() => break,
                message = events.recv() => message,
            };

            match message {
                Some(StreamMessage::Event(event)) => {
                    metrics::record_stream_event();
                    self.handle_block(event, &shutdown_token).await;
                }
                Some(StreamMessage::Failed(error)) => return Err(Error::Stream(error)),
                None if shutdown_token.is_cancelled() => break,
                None => return Err(Error::Stream(ClientError::StreamEnded)),
            }
        }

        info!("ProverService received shutdown signal");
        Ok(())
    }

    async fn handle_block(&self, event: BlockNotification, shutdown_token: &CancellationToken) {
        let started = Instant::now();
        let result = self.prover.handle_block(event, shutdown_token).await;
        metrics::record_block(&result, started.elapsed());

        match result {
            Ok(()) => info!(
                slot = event.slot,
                block_root = %event.block_root,
                proofs = self.prover.proofs_per_block().get(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Proved block"
            ),
            Err(e) if e.is_cancelled() => {
                info!(slot = event.slot, "Abandoned block on shutdown");
            }
            Err(e) if e.is_not_found() => {
                warn!(
                    slot = event.slot,
                    block_root = %event.block_root,
                    error = %e,
                    "Block not found"
                );
            }
            Err(e) => error!(
                slot = event.slot,
                block_root = %event.block_root,
                stage = ?e.stage(),
                proof_type = ?e.proof_type(),
                error = %e,
                "Failed to prove block"
            ),
        }
    }
}
