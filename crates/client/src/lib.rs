//! HTTP clients for beacon nodes and validator clients.
//!
//! - [`BeaconClient`] fetches blinded blocks, submits signed execution proofs and subscribes to
//!   the node's `block` event stream.
//! - [`ValidatorClient`] asks a validator client to sign an execution proof.
//!
//! Every operation takes a [`CancellationToken`](tokio_util::sync::CancellationToken) and
//! reports cancellation as [`Error::Cancelled`]. No operation retries.
//!
//! ## Example
//!
//! ```no_run
//! use dummy_prover_client::{BeaconClient, StreamMessage};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> dummy_prover_client::Result<()> {
//! let client = BeaconClient::new("source", "http://localhost:3500".parse()?)?;
//! let cancel = CancellationToken::new();
//!
//! let mut events = client.subscribe_block_events(cancel.clone(), 16)?;
//! while let Some(StreamMessage::Event(event)) = events.recv().await {
//!     let block = client.get_blinded_block(event.slot.into(), &cancel).await?;
//!     println!("slot {} hash {}", block.slot, block.block_hash());
//! }
//! # Ok(())
//! # }
//! ```

pub use beacon::{BeaconClient, DEFAULT_TIMEOUT};
pub use dummy_prover_types as types;
pub use error::{Error, Result};
pub use signer::ValidatorClient;
pub use sse::{
    BlockEventStream, MAX_LINE_BYTES, SseDecoder, SseFrame, StreamMessage, StreamState,
    subscribe_block_events,
};

mod beacon;
mod error;
mod http;
mod signer;
mod sse;
