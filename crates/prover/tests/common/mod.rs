//! In-process mock of a beacon node and a validator client.

#![allow(dead_code)]

use std::{
    collections::HashSet,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use dummy_prover_types::{
    BlindedBlock, BlsSignature, ExecutionProof, SignedExecutionProof, SignerIdentity,
};
use futures::{StreamExt, stream};
use serde_json::json;
use tokio::net::TcpListener;
use url::Url;

pub const BLINDED_BLOCK: &str = include_str!("../../../types/testdata/blinded_block.json");
pub const BLOCK_SLOT: u64 = 12345;
pub const SIGNER_VALIDATOR_INDEX: u64 = 9;

pub fn fixture_block() -> BlindedBlock {
    BlindedBlock::from_response_json(BLINDED_BLOCK.as_bytes()).unwrap()
}

pub fn block_event(slot: u64) -> String {
    format!(
        "event: block\ndata: {{\"slot\":\"{slot}\",\"block\":\"0x{}\",\"execution_optimistic\":false}}\n\n",
        "11".repeat(32)
    )
}

#[derive(Default)]
pub struct MockNode {
    /// Raw SSE text served on the event stream.
    pub events: Vec<String>,
    /// Keep the event stream open after `events` were sent.
    pub keep_open: bool,
    /// Proof types whose submission is rejected with 400.
    pub reject_proof_types: HashSet<u8>,
    /// Proof types the validator client refuses to sign with 503.
    pub unsignable_proof_types: HashSet<u8>,
    pub block_requests: AtomicUsize,
    pub sign_requests: AtomicUsize,
    pub submitted: Mutex<Vec<SignedExecutionProof>>,
}

impl MockNode {
    pub fn submitted(&self) -> Vec<SignedExecutionProof> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn submitted_proof_types(&self) -> Vec<u8> {
        let mut types: Vec<u8> = self
            .submitted()
            .iter()
            .map(|proof| proof.message.proof_type.0)
            .collect();
        types.sort_unstable();
        types
    }

    /// Waits until `count` proofs have been submitted.
    pub async fn wait_for_submissions(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.submitted.lock().unwrap().len() < count {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("proofs were not submitted in time");
    }
}

async fn blinded_block(State(node): State<Arc<MockNode>>, Path(id): Path<String>) -> Response {
    node.block_requests.fetch_add(1, Ordering::SeqCst);
    if id == BLOCK_SLOT.to_string() {
        ([(header::CONTENT_TYPE, "application/json")], BLINDED_BLOCK).into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(json!({"code": 404, "message": "NOT_FOUND: beacon block"})),
        )
            .into_response()
    }
}

async fn submit_proof(
    State(node): State<Arc<MockNode>>,
    Json(proof): Json<SignedExecutionProof>,
) -> StatusCode {
    let rejected = node.reject_proof_types.contains(&proof.message.proof_type.0);
    node.submitted.lock().unwrap().push(proof);
    if rejected {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::OK
    }
}

#[derive(serde::Deserialize)]
struct SignRequest {
    data: ExecutionProof,
}

async fn sign_proof(
    State(node): State<Arc<MockNode>>,
    Json(request): Json<SignRequest>,
) -> Response {
    node.sign_requests.fetch_add(1, Ordering::SeqCst);
    if node
        .unsignable_proof_types
        .contains(&request.data.proof_type.0)
    {
        return (StatusCode::SERVICE_UNAVAILABLE, "keystore locked").into_response();
    }
    let signed = SignedExecutionProof {
        message: request.data,
        signer: SignerIdentity::ValidatorIndex {
            validator_index: SIGNER_VALIDATOR_INDEX,
        },
        signature: BlsSignature::repeat_byte(0x07),
    };
    Json(json!({ "data": signed })).into_response()
}

async fn events(State(node): State<Arc<MockNode>>) -> Response {
    let chunks = stream::iter(
        node.events
            .clone()
            .into_iter()
            .map(Ok::<_, std::io::Error>),
    );
    let body = if node.keep_open {
        Body::from_stream(chunks.chain(stream::pending()))
    } else {
        Body::from_stream(chunks)
    };
    ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
}

/// Serves `node` on an ephemeral local port.
pub async fn spawn(node: MockNode) -> (Url, Arc<MockNode>) {
    let node = Arc::new(node);
    let app = Router::new()
        .route("/eth/v1/beacon/blinded_blocks/{id}", get(blinded_block))
        .route("/eth/v1/prover/execution_proofs", post(submit_proof))
        .route("/eth/v2/validator/execution_proofs", post(sign_proof))
        .route("/eth/v1/events", get(events))
        .with_state(Arc::clone(&node));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    (Url::parse(&format!("http://{addr}")).unwrap(), node)
}
