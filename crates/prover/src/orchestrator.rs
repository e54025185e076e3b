//! # Proof orchestration
//!
//! [`Prover`] runs the per-block pipeline:
//!
//! 1. Fetch the blinded block by slot from the source node
//! 2. Compute the commitment root once
//! 3. Generate (and sign) one proof per proof type concurrently
//! 4. Wait the simulated generation latency once
//! 5. Submit every proof to the target node concurrently
//!
//! Tasks of a stage run to completion independently of each other. A stage fails with the first
//! error observed, but only after all its tasks have finished. Cancellation abandons the
//! pipeline at once.

use std::{sync::Arc, time::Duration};

use anyhow::anyhow;
use dummy_prover_client::{BeaconClient, ValidatorClient};
use dummy_prover_types::{
    B256, BlindedBlock, BlockId, BlockNotification, ProofType, SignedExecutionProof,
};
use tokio::task::{self, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{
    commitment::{PayloadRequestHasher, PlaceholderHasher, commitment_root},
    config::{Config, ProofsPerBlock},
    error::{Error, Result, Stage},
    generator::{PlaceholderProofGenerator, ProofGenerator},
    metrics,
    signing::{Signer, ValidatorSigner, ZeroSigner},
};

/// Generates and submits execution proofs for blocks.
///
/// Holds only fixed configuration; nothing is retained between blocks.
#[derive(Clone)]
pub struct Prover {
    source: BeaconClient,
    target: BeaconClient,
    proofs_per_block: ProofsPerBlock,
    proof_delay: Duration,
    generator: Arc<dyn ProofGenerator>,
    signer: Arc<dyn Signer>,
    hasher: Arc<dyn PayloadRequestHasher>,
}

impl Prover {
    /// Creates a prover with placeholder generation, hashing and zero signatures.
    pub fn new(
        source: BeaconClient,
        target: BeaconClient,
        proofs_per_block: ProofsPerBlock,
        proof_delay: Duration,
    ) -> Self {
        Self {
            source,
            target,
            proofs_per_block,
            proof_delay,
            generator: Arc::new(PlaceholderProofGenerator),
            signer: Arc::new(ZeroSigner),
            hasher: Arc::new(PlaceholderHasher),
        }
    }

    /// Builds a prover and its clients from a validated `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let client_error = |e: dummy_prover_client::Error| Error::Config(e.to_string());
        let target = BeaconClient::new("target", config.target_beacon_node.clone())
            .map_err(client_error)?;
        let source = BeaconClient::new("source", config.source_beacon_node().clone())
            .map_err(client_error)?;
        let prover = Self::new(
            source,
            target,
            ProofsPerBlock::new(config.proofs_per_block)?,
            config.proof_delay(),
        );

        Ok(match &config.validator_client {
            Some(url) => {
                let client = ValidatorClient::new("signer", url.clone()).map_err(client_error)?;
                prover.with_signer(Arc::new(ValidatorSigner::new(client)))
            }
            None => prover,
        })
    }

    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = signer;
        self
    }

    pub fn with_generator(mut self, generator: Arc<dyn ProofGenerator>) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_hasher(mut self, hasher: Arc<dyn PayloadRequestHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    pub fn source(&self) -> &BeaconClient {
        &self.source
    }

    pub fn target(&self) -> &BeaconClient {
        &self.target
    }

    pub fn proofs_per_block(&self) -> ProofsPerBlock {
        self.proofs_per_block
    }

    /// Runs the whole pipeline for one block event.
    ///
    /// Errors raised after `cancel` fired are reported as [`Error::Cancelled`].
    pub async fn handle_block(
        &self,
        event: BlockNotification,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.prove_block(event, cancel).await.map_err(|error| {
            if cancel.is_cancelled() {
                Error::Cancelled
            } else {
                error
            }
        })
    }

    async fn prove_block(
        &self,
        event: BlockNotification,
        cancel: &CancellationToken,
    ) -> Result<()> {
        // Fetched by slot, the event's root is only logged.
        let block_id = BlockId::Slot(event.slot);
        let block = self
            .source
            .get_blinded_block(block_id, cancel)
            .await
            .map_err(|source| Error::Fetch { block_id, source })?;
        let block = Arc::new(block);

        let root = commitment_root(&block, self.hasher.as_ref());
        debug!(
            slot = event.slot,
            block_root = %event.block_root,
            block_hash = %block.block_hash(),
            commitment_root = %root,
            "Computed commitment root"
        );

        let proofs = self.generate_proofs(&block, root, cancel).await?;

        if !self.proof_delay.is_zero() {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => return Err(Error::Cancelled),
                _ = tokio::time::sleep(self.proof_delay) => {}
            }
        }

        self.submit_proofs(proofs, cancel).await
    }

    /// Generates and signs one proof per proof type, ordered by proof type.
    async fn generate_proofs(
        &self,
        block: &Arc<BlindedBlock>,
        root: B256,
        cancel: &CancellationToken,
    ) -> Result<Vec<SignedExecutionProof>> {
        let mut tasks = JoinSet::new();
        let mut task_proof_types = Vec::new();

        for proof_type in self.proofs_per_block.proof_types() {
            let block = Arc::clone(block);
            let generator = Arc::clone(&self.generator);
            let signer = Arc::clone(&self.signer);
            let cancel = cancel.clone();

            let handle = tasks.spawn(async move {
                let result = generate_and_sign(
                    generator.as_ref(),
                    signer.as_ref(),
                    &block,
                    proof_type,
                    root,
                    &cancel,
                )
                .await;
                metrics::record_proof_generated(proof_type, &result);
                result.map(|proof| (proof_type, proof))
            });
            task_proof_types.push((handle.id(), proof_type));
        }

        let mut slots = vec![None; self.proofs_per_block.get() as usize];
        let generated = join_all(tasks, &task_proof_types, Stage::Generate, cancel).await?;
        for (proof_type, proof) in generated {
            slots[proof_type.index()] = Some(proof);
        }
        Ok(slots.into_iter().flatten().collect())
    }

    async fn submit_proofs(
        &self,
        proofs: Vec<SignedExecutionProof>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let mut tasks = JoinSet::new();
        let mut task_proof_types = Vec::new();

        for proof in proofs {
            let proof_type = proof.message.proof_type;
            let target = self.target.clone();
            let cancel = cancel.clone();

            let handle = tasks.spawn(async move {
                let result = target
                    .submit_execution_proof(&proof, &cancel)
                    .await
                    .map_err(|source| Error::Submit { proof_type, source });
                metrics::record_proof_submitted(proof_type, &result);
                result.map(|()| proof_type)
            });
            task_proof_types.push((handle.id(), proof_type));
        }

        let submitted = join_all(tasks, &task_proof_types, Stage::Submit, cancel).await?;
        info!(
            target = %self.target.name(),
            proofs = submitted.len(),
            "Submitted execution proofs"
        );
        Ok(())
    }
}

/// Produces the signed proof of one proof type.
///
/// The generator must return a proof for `proof_type` and the signer must sign the proof it was
/// given unchanged.
async fn generate_and_sign(
    generator: &dyn ProofGenerator,
    signer: &dyn Signer,
    block: &BlindedBlock,
    proof_type: ProofType,
    root: B256,
    cancel: &CancellationToken,
) -> Result<SignedExecutionProof> {
    let proof = generator
        .generate(block, proof_type, root)
        .await
        .map_err(|source| Error::Generate { proof_type, source })?;
    if proof.proof_type != proof_type {
        return Err(Error::Generate {
            proof_type,
            source: anyhow!("generator returned proof type {}", proof.proof_type),
        });
    }

    let signed = signer
        .sign(proof.clone(), cancel)
        .await
        .map_err(|source| Error::Sign { proof_type, source })?;
    if signed.message != proof {
        return Err(Error::Sign {
            proof_type,
            source: anyhow!(
                "signer altered the proof message (returned proof type {})",
                signed.message.proof_type
            ),
        });
    }
    Ok(signed)
}

/// Waits for every task in `tasks`, returning their outputs or the first error observed.
///
/// Returns [`Error::Cancelled`] as soon as `cancel` fires; dropping `tasks` aborts the rest.
async fn join_all<T: 'static>(
    mut tasks: JoinSet<Result<T>>,
    task_proof_types: &[(task::Id, ProofType)],
    stage: Stage,
    cancel: &CancellationToken,
) -> Result<Vec<T>> {
    let mut outputs = Vec::with_capacity(tasks.len());
    let mut first_error = None;

    loop {
        let joined = tokio::select! {
            biased;

            _ = cancel.cancelled() => return Err(Error::Cancelled),
            joined = tasks.join_next() => joined,
        };
        let Some(joined) = joined else {
            break;
        };

        let result = joined.unwrap_or_else(|join_error| {
            let proof_type = task_proof_types
                .iter()
                .find(|(id, _)| *id == join_error.id())
                .map(|(_, proof_type)| *proof_type);
            Err(Error::TaskAborted {
                stage,
                proof_type,
                reason: join_error.to_string(),
            })
        });

        match result {
            Ok(output) => outputs.push(output),
            Err(error) => {
                debug!(%stage, %error, "Proof task failed");
                first_error.get_or_insert(error);
            }
        }
    }

    match first_error {
        Some(error) => Err(error),
        None => Ok(outputs),
    }
}
