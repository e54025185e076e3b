//! Dummy execution proof prover.
//!
//! Listens to `block` events of a beacon node and, for every block, produces a configurable
//! number of placeholder execution proofs, has them signed and submits them to a beacon node's
//! proof pool.
//!
//! ## Architecture
//!
//! ```text
//!   Source CL        Prover                    Signer        Target CL
//!   |                   |                        |               |
//!   |----block event--->|                        |               |
//!   |<--blinded block---|                        |               |
//!   |------block------->|                        |               |
//!   |                   |                        |               |
//!   |        (commitment root, N proofs)         |               |
//!   |                   |                        |               |
//!   |                   |--N sign requests------>|               |
//!   |                   |<-N signed proofs-------|               |
//!   |                   |                        |               |
//!   |             (simulated delay)              |               |
//!   |                   |                        |               |
//!   |                   |--N signed proofs---------------------->|
//! ```
//!
//! Generation, signing and hashing are pluggable through [`ProofGenerator`], [`Signer`] and
//! [`PayloadRequestHasher`].

pub use commitment::{
    NewPayloadRequestHeader, PayloadRequestHasher, PlaceholderHasher, commitment_root,
    kzg_commitment_to_versioned_hash,
};
pub use config::{Config, ProofsPerBlock};
pub use error::{Error, Result, Stage};
pub use generator::{PlaceholderProofGenerator, ProofGenerator, placeholder_proof_data};
pub use orchestrator::Prover;
pub use service::ProverService;
pub use signing::{Signer, ValidatorSigner, ZeroSigner};

pub mod commitment;
pub mod config;
pub mod error;
pub mod generator;
pub mod health;
pub mod metrics;
pub mod orchestrator;
pub mod service;
pub mod signing;
