//! HTTP API server for the TrustWeave node.
//!
//! Provides REST endpoints for identities, relationships, reputation,
//! proofs, roles, and the event log. Mutating endpoints name the calling
//! principal in the `x-caller` header. The header is not authenticated:
//! every role check trusts it, so the API must only be reachable by
//! trusted clients.

use axum::{
    extract::{FromRequestParts, Path, Query as QueryParams, State},
    http::{request::Parts, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::oneshot;

use trustweave_core::{Address, Domain, ErrorKind, Hash, LedgerError, Role};
use trustweave_ledger::LedgerStatus;

use crate::commands::{
    CommandError, EdgeDirection, Mutation, MutationResponse, NodeCommand, Query, StatusResponse,
};
use crate::state::NodeState;

/// Header naming the principal on whose behalf a mutation runs.
pub const CALLER_HEADER: &str = "x-caller";

// --- Request types ---

#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub metadata: String,
}

#[derive(Deserialize)]
pub struct RelationshipRequest {
    pub to: Address,
    pub weight: u64,
    pub relationship_hash: Hash,
}

#[derive(Deserialize)]
pub struct WeightRequest {
    pub weight: u64,
}

#[derive(Deserialize)]
pub struct ScoreRequest {
    pub score: u64,
}

#[derive(Deserialize)]
pub struct BatchReputationRequest {
    pub nodes: Vec<Address>,
    pub scores: Vec<u64>,
}

#[derive(Deserialize)]
pub struct DecayParametersRequest {
    pub rate: u64,
    pub period: u64,
}

#[derive(Deserialize)]
pub struct SubmitProofRequest {
    pub proof_hash: Hash,
    #[serde(default)]
    pub public_inputs: Vec<u64>,
}

#[derive(Deserialize)]
pub struct VerifyProofRequest {
    pub node_a: Address,
    pub node_b: Address,
    pub is_valid: bool,
}

#[derive(Deserialize)]
pub struct BatchVerifyRequest {
    pub proof_ids: Vec<Hash>,
    pub nodes_a: Vec<Address>,
    pub nodes_b: Vec<Address>,
    pub valids: Vec<bool>,
}

#[derive(Deserialize)]
pub struct ProofFormatRequest {
    /// Hex-encoded proof bytes.
    pub proof: String,
    #[serde(default)]
    pub public_inputs: Vec<u64>,
}

#[derive(Deserialize)]
pub struct RoleRequest {
    pub domain: Domain,
    pub role: Role,
    pub account: Address,
}

#[derive(Deserialize)]
pub struct EventsParams {
    #[serde(default)]
    pub since: u64,
    pub limit: Option<usize>,
}

#[derive(Deserialize)]
pub struct NodeEdgesParams {
    #[serde(default)]
    pub direction: EdgeDirection,
}

// --- Response types ---

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

type ApiResult<T> = Result<Json<T>, ApiError>;

fn error_response(status: StatusCode, kind: &str, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            kind: kind.to_string(),
        }),
    )
}

/// HTTP status for a ledger error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Unauthorized => StatusCode::FORBIDDEN,
        ErrorKind::AlreadyRegistered
        | ErrorKind::AlreadyVerified
        | ErrorKind::AlreadyInitialized
        | ErrorKind::NotActive => StatusCode::CONFLICT,
        _ => StatusCode::BAD_REQUEST,
    }
}

fn ledger_error(e: LedgerError) -> ApiError {
    let kind = e.kind();
    error_response(status_for(kind), &kind.to_string(), e.to_string())
}

fn command_error(e: CommandError) -> ApiError {
    match e {
        CommandError::Ledger(e) => ledger_error(e),
        CommandError::Storage(msg) => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Storage", msg)
        }
        CommandError::Internal(msg) => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal", msg)
        }
    }
}

fn parse<T>(raw: &str) -> Result<T, ApiError>
where
    T: std::str::FromStr<Err = LedgerError>,
{
    raw.parse().map_err(ledger_error)
}

/// The principal named by the `x-caller` header. Taken at face value.
pub struct Caller(pub Address);

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts.headers.get(CALLER_HEADER).ok_or_else(|| {
            error_response(
                StatusCode::BAD_REQUEST,
                "InvalidAddress",
                format!("missing {CALLER_HEADER} header"),
            )
        })?;
        let text = value.to_str().map_err(|_| {
            error_response(
                StatusCode::BAD_REQUEST,
                "InvalidEncoding",
                format!("{CALLER_HEADER} header is not ASCII"),
            )
        })?;
        Ok(Caller(parse(text)?))
    }
}

// --- Handlers ---

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
    })
}

async fn handle_status(State(state): State<Arc<NodeState>>) -> ApiResult<StatusResponse> {
    let Json(value) = query(&state, Query::Status).await?;
    let ledger: LedgerStatus = serde_json::from_value(value).map_err(|e| {
        error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal", e.to_string())
    })?;
    Ok(Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.uptime_secs(),
        ledger,
    }))
}

async fn handle_register(
    State(state): State<Arc<NodeState>>,
    Caller(caller): Caller,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<MutationResponse> {
    let mutation = Mutation::Register {
        metadata: req.metadata,
    };
    mutate(&state, caller, mutation).await
}

async fn handle_update_metadata(
    State(state): State<Arc<NodeState>>,
    Caller(caller): Caller,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<MutationResponse> {
    let mutation = Mutation::UpdateMetadata {
        metadata: req.metadata,
    };
    mutate(&state, caller, mutation).await
}

async fn handle_deactivate(
    State(state): State<Arc<NodeState>>,
    Caller(caller): Caller,
) -> ApiResult<MutationResponse> {
    mutate(&state, caller, Mutation::Deactivate).await
}

async fn handle_get_identity(
    State(state): State<Arc<NodeState>>,
    Path(address): Path<String>,
) -> ApiResult<serde_json::Value> {
    let address = parse(&address)?;
    query(&state, Query::Identity { address }).await
}

async fn handle_create_relationship(
    State(state): State<Arc<NodeState>>,
    Caller(caller): Caller,
    Json(req): Json<RelationshipRequest>,
) -> ApiResult<MutationResponse> {
    let mutation = Mutation::CreateRelationship {
        to: req.to,
        weight: req.weight,
        relationship_hash: req.relationship_hash,
    };
    mutate(&state, caller, mutation).await
}

async fn handle_update_edge_weight(
    State(state): State<Arc<NodeState>>,
    Caller(caller): Caller,
    Path(edge_id): Path<String>,
    Json(req): Json<WeightRequest>,
) -> ApiResult<MutationResponse> {
    let mutation = Mutation::UpdateEdgeWeight {
        edge_id: parse(&edge_id)?,
        new_weight: req.weight,
    };
    mutate(&state, caller, mutation).await
}

async fn handle_deactivate_edge(
    State(state): State<Arc<NodeState>>,
    Caller(caller): Caller,
    Path(edge_id): Path<String>,
) -> ApiResult<MutationResponse> {
    let mutation = Mutation::DeactivateEdge {
        edge_id: parse(&edge_id)?,
    };
    mutate(&state, caller, mutation).await
}

async fn handle_get_edge(
    State(state): State<Arc<NodeState>>,
    Path(edge_id): Path<String>,
) -> ApiResult<serde_json::Value> {
    let edge_id = parse(&edge_id)?;
    query(&state, Query::Edge { edge_id }).await
}

async fn handle_node_edges(
    State(state): State<Arc<NodeState>>,
    Path(address): Path<String>,
    QueryParams(params): QueryParams<NodeEdgesParams>,
) -> ApiResult<serde_json::Value> {
    let address = parse(&address)?;
    let direction = params.direction;
    query(&state, Query::NodeEdges { address, direction }).await
}

async fn handle_initialize_reputation(
    State(state): State<Arc<NodeState>>,
    Caller(caller): Caller,
    Path(node): Path<String>,
) -> ApiResult<MutationResponse> {
    let mutation = Mutation::InitializeReputation { node: parse(&node)? };
    mutate(&state, caller, mutation).await
}

async fn handle_update_reputation(
    State(state): State<Arc<NodeState>>,
    Caller(caller): Caller,
    Path(node): Path<String>,
    Json(req): Json<ScoreRequest>,
) -> ApiResult<MutationResponse> {
    let mutation = Mutation::UpdateReputation {
        node: parse(&node)?,
        score: req.score,
    };
    mutate(&state, caller, mutation).await
}

async fn handle_batch_update_reputation(
    State(state): State<Arc<NodeState>>,
    Caller(caller): Caller,
    Json(req): Json<BatchReputationRequest>,
) -> ApiResult<MutationResponse> {
    let mutation = Mutation::BatchUpdateReputation {
        nodes: req.nodes,
        scores: req.scores,
    };
    mutate(&state, caller, mutation).await
}

async fn handle_apply_decay(
    State(state): State<Arc<NodeState>>,
    Caller(caller): Caller,
    Path(node): Path<String>,
) -> ApiResult<MutationResponse> {
    let mutation = Mutation::ApplyDecay { node: parse(&node)? };
    mutate(&state, caller, mutation).await
}

async fn handle_get_reputation(
    State(state): State<Arc<NodeState>>,
    Path(node): Path<String>,
) -> ApiResult<serde_json::Value> {
    let node = parse(&node)?;
    query(&state, Query::Reputation { node }).await
}

async fn handle_update_decay_parameters(
    State(state): State<Arc<NodeState>>,
    Caller(caller): Caller,
    Json(req): Json<DecayParametersRequest>,
) -> ApiResult<MutationResponse> {
    let mutation = Mutation::UpdateDecayParameters {
        rate: req.rate,
        period: req.period,
    };
    mutate(&state, caller, mutation).await
}

async fn handle_submit_proof(
    State(state): State<Arc<NodeState>>,
    Caller(caller): Caller,
    Json(req): Json<SubmitProofRequest>,
) -> ApiResult<MutationResponse> {
    let mutation = Mutation::SubmitProof {
        proof_hash: req.proof_hash,
        public_inputs: req.public_inputs,
    };
    mutate(&state, caller, mutation).await
}

async fn handle_verify_proof(
    State(state): State<Arc<NodeState>>,
    Caller(caller): Caller,
    Path(proof_id): Path<String>,
    Json(req): Json<VerifyProofRequest>,
) -> ApiResult<MutationResponse> {
    let mutation = Mutation::VerifyProof {
        proof_id: parse(&proof_id)?,
        node_a: req.node_a,
        node_b: req.node_b,
        is_valid: req.is_valid,
    };
    mutate(&state, caller, mutation).await
}

async fn handle_batch_verify_proofs(
    State(state): State<Arc<NodeState>>,
    Caller(caller): Caller,
    Json(req): Json<BatchVerifyRequest>,
) -> ApiResult<MutationResponse> {
    let mutation = Mutation::BatchVerifyProofs {
        proof_ids: req.proof_ids,
        nodes_a: req.nodes_a,
        nodes_b: req.nodes_b,
        valids: req.valids,
    };
    mutate(&state, caller, mutation).await
}

async fn handle_get_proof(
    State(state): State<Arc<NodeState>>,
    Path(proof_id): Path<String>,
) -> ApiResult<serde_json::Value> {
    let proof_id = parse(&proof_id)?;
    query(&state, Query::Proof { proof_id }).await
}

async fn handle_get_connection(
    State(state): State<Arc<NodeState>>,
    Path((node_a, node_b)): Path<(String, String)>,
) -> ApiResult<serde_json::Value> {
    let q = Query::Connection {
        node_a: parse(&node_a)?,
        node_b: parse(&node_b)?,
    };
    query(&state, q).await
}

async fn handle_proof_format(
    State(state): State<Arc<NodeState>>,
    Json(req): Json<ProofFormatRequest>,
) -> ApiResult<serde_json::Value> {
    let digits = req.proof.strip_prefix("0x").unwrap_or(&req.proof);
    let proof = hex::decode(digits).map_err(|e| {
        error_response(
            StatusCode::BAD_REQUEST,
            "InvalidEncoding",
            format!("proof is not hex: {e}"),
        )
    })?;
    let q = Query::ProofFormat {
        proof,
        public_inputs: req.public_inputs,
    };
    query(&state, q).await
}

async fn handle_grant_role(
    State(state): State<Arc<NodeState>>,
    Caller(caller): Caller,
    Json(req): Json<RoleRequest>,
) -> ApiResult<MutationResponse> {
    let mutation = Mutation::GrantRole {
        domain: req.domain,
        role: req.role,
        account: req.account,
    };
    mutate(&state, caller, mutation).await
}

async fn handle_revoke_role(
    State(state): State<Arc<NodeState>>,
    Caller(caller): Caller,
    Json(req): Json<RoleRequest>,
) -> ApiResult<MutationResponse> {
    let mutation = Mutation::RevokeRole {
        domain: req.domain,
        role: req.role,
        account: req.account,
    };
    mutate(&state, caller, mutation).await
}

async fn handle_events(
    State(state): State<Arc<NodeState>>,
    QueryParams(params): QueryParams<EventsParams>,
) -> ApiResult<serde_json::Value> {
    let query_params = Query::EventsSince {
        after: params.since,
        limit: params.limit,
    };
    query(&state, query_params).await
}

async fn mutate(
    state: &Arc<NodeState>,
    caller: Address,
    mutation: Mutation,
) -> ApiResult<MutationResponse> {
    let (reply_tx, reply_rx) = oneshot::channel();
    let cmd = NodeCommand::Mutate {
        caller,
        mutation,
        reply: reply_tx,
    };
    send_command_and_await(state, cmd, reply_rx).await
}

async fn query(state: &Arc<NodeState>, query: Query) -> ApiResult<serde_json::Value> {
    let (reply_tx, reply_rx) = oneshot::channel();
    let cmd = NodeCommand::Query {
        query,
        reply: reply_tx,
    };
    send_command_and_await(state, cmd, reply_rx).await
}

/// Helper to send a command and await the reply.
async fn send_command_and_await<T: Serialize>(
    state: &Arc<NodeState>,
    cmd: NodeCommand,
    reply_rx: oneshot::Receiver<Result<T, CommandError>>,
) -> ApiResult<T> {
    state.command_tx.send(cmd).await.map_err(|_| {
        error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "Unavailable",
            "node event loop not running",
        )
    })?;

    match reply_rx.await {
        Ok(Ok(resp)) => Ok(Json(resp)),
        Ok(Err(e)) => Err(command_error(e)),
        Err(_) => Err(error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal",
            "event loop dropped the reply channel",
        )),
    }
}

// --- Server ---

pub fn build_router(state: Arc<NodeState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(handle_health))
        .route("/api/v1/status", get(handle_status))
        .route("/api/v1/identities", post(handle_register))
        .route("/api/v1/identities/metadata", put(handle_update_metadata))
        .route("/api/v1/identities/deactivate", post(handle_deactivate))
        .route("/api/v1/identities/{address}", get(handle_get_identity))
        .route("/api/v1/relationships", post(handle_create_relationship))
        .route("/api/v1/edges/{id}", get(handle_get_edge))
        .route("/api/v1/edges/{id}/weight", put(handle_update_edge_weight))
        .route("/api/v1/edges/{id}/deactivate", post(handle_deactivate_edge))
        .route("/api/v1/nodes/{address}/edges", get(handle_node_edges))
        .route(
            "/api/v1/reputation/decay-parameters",
            put(handle_update_decay_parameters),
        )
        .route("/api/v1/reputation/batch", post(handle_batch_update_reputation))
        .route(
            "/api/v1/reputation/{address}",
            get(handle_get_reputation).put(handle_update_reputation),
        )
        .route(
            "/api/v1/reputation/{address}/initialize",
            post(handle_initialize_reputation),
        )
        .route("/api/v1/reputation/{address}/decay", post(handle_apply_decay))
        .route("/api/v1/proofs", post(handle_submit_proof))
        .route("/api/v1/proofs/format", post(handle_proof_format))
        .route("/api/v1/proofs/batch-verify", post(handle_batch_verify_proofs))
        .route("/api/v1/proofs/{id}", get(handle_get_proof))
        .route("/api/v1/proofs/{id}/verify", post(handle_verify_proof))
        .route("/api/v1/connections/{a}/{b}", get(handle_get_connection))
        .route("/api/v1/roles/grant", post(handle_grant_role))
        .route("/api/v1/roles/revoke", post(handle_revoke_role))
        .route("/api/v1/events", get(handle_events))
        .with_state(state)
}

/// Serve the API on an already-bound listener.
pub async fn serve(listener: tokio::net::TcpListener, state: Arc<NodeState>) -> anyhow::Result<()> {
    let app = build_router(state);
    let listen_addr = listener.local_addr()?;
    tracing::info!(%listen_addr, "HTTP API server started");
    axum::serve(listener, app).await?;
    Ok(())
}
