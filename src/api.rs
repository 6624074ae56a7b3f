use std::net::SocketAddr;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::info;

use crate::errors::{ChainError, ChainResult};
use crate::node::{GovernanceSummary, NodeHandle};
use crate::types::{GovernanceAction, NodeRecord, Proposal, ProposalStatus, RoleRecord, VoteChoice};

#[derive(Clone)]
struct AppState {
    node: NodeHandle,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Deserialize)]
struct ActionRequest {
    caller: String,
    action: GovernanceAction,
    #[serde(default)]
    reason: String,
}

#[derive(Serialize)]
struct ActionResponse {
    proposal_id: Option<String>,
}

#[derive(Deserialize)]
struct VoteRequest {
    voter: String,
    proposal_id: u64,
    decision: VoteChoice,
    #[serde(default)]
    label: String,
}

#[derive(Serialize)]
struct VoteResponse {
    proposal_id: String,
    status: ProposalStatus,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    chain_id: String,
}

pub async fn serve(node: NodeHandle, addr: SocketAddr) -> ChainResult<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(?addr, "governance RPC server listening");
    axum::serve(listener, router(node))
        .await
        .map_err(|err| ChainError::Io(std::io::Error::new(std::io::ErrorKind::Other, err)))
}

/// Routes are split out of `serve` so tests can drive the router without a
/// socket.
pub fn router(node: NodeHandle) -> Router {
    let state = AppState { node };
    Router::new()
        .route("/health", get(health))
        .route("/status/governance", get(governance_status))
        .route("/governance/actions", post(submit_action))
        .route("/governance/votes", post(submit_vote))
        .route("/governance/roles/:address", get(role_info))
        .route("/governance/nodes/:account", get(node_info))
        .route("/governance/proposals/:id", get(proposal_info))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        chain_id: state.node.chain_id().to_string(),
    })
}

async fn governance_status(
    State(state): State<AppState>,
) -> Result<Json<GovernanceSummary>, (StatusCode, Json<ErrorResponse>)> {
    state
        .node
        .governance_summary()
        .map(Json)
        .map_err(to_http_error)
}

async fn submit_action(
    State(state): State<AppState>,
    Json(request): Json<ActionRequest>,
) -> Result<Json<ActionResponse>, (StatusCode, Json<ErrorResponse>)> {
    state
        .node
        .invoke_action(&request.caller, request.action, &request.reason)
        .map(|proposal_id| {
            Json(ActionResponse {
                proposal_id: proposal_id.map(|id| id.to_string()),
            })
        })
        .map_err(to_http_error)
}

async fn submit_vote(
    State(state): State<AppState>,
    Json(request): Json<VoteRequest>,
) -> Result<Json<VoteResponse>, (StatusCode, Json<ErrorResponse>)> {
    state
        .node
        .cast_vote(
            &request.voter,
            request.proposal_id,
            request.decision,
            &request.label,
        )
        .map(|status| {
            Json(VoteResponse {
                proposal_id: request.proposal_id.to_string(),
                status,
            })
        })
        .map_err(to_http_error)
}

async fn role_info(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<RoleRecord>, (StatusCode, Json<ErrorResponse>)> {
    state.node.get_role(&address).map(Json).map_err(to_http_error)
}

async fn node_info(
    State(state): State<AppState>,
    Path(account): Path<String>,
) -> Result<Json<NodeRecord>, (StatusCode, Json<ErrorResponse>)> {
    state.node.get_node(&account).map(Json).map_err(to_http_error)
}

async fn proposal_info(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Proposal>, (StatusCode, Json<ErrorResponse>)> {
    state.node.get_proposal(id).map(Json).map_err(to_http_error)
}

fn to_http_error(err: ChainError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match err {
        ChainError::NotFound(_) => StatusCode::NOT_FOUND,
        ChainError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        ChainError::SelfTargetForbidden(_) => StatusCode::FORBIDDEN,
        ChainError::IllegalTransition(_) | ChainError::ConflictInFlight(_) => StatusCode::CONFLICT,
        ChainError::ConstraintViolation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ChainError::Config(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}
