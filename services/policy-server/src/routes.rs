//! HTTP routes of the policy API.
//!
//! Every mutation returns as soon as the policy is stored. With `?wait=true`
//! the handler also waits (bounded by the engine's wait timeout) for the
//! reconciliation it scheduled and embeds the outcome.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use curfew_common::{
    AddAppRequest, GroupResponse, PolicyResponse, ReconcileReport, ReplacePolicyRequest,
    StatusResponse, TicketResponse,
};
use curfew_engine::PolicyService;
use curfew_engine::application::Change;
use serde::Deserialize;
use tracing::info;

use crate::error::ApiError;

/// `?wait=true` on any mutation.
#[derive(Debug, Default, Deserialize)]
pub struct WaitQuery {
    #[serde(default)]
    pub wait: bool,
}

/// Build the API router.
pub fn router(service: PolicyService) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/policy", axum::routing::put(replace_policy))
        .route("/policy/status", get(status))
        .route("/policy/reconciliation", get(last_reconciliation))
        .route("/policy/reconcile", post(reconcile))
        .route("/policy/reset", post(reset))
        .route("/policy/internet/restrict", post(restrict_internet))
        .route("/policy/internet/allow", post(allow_internet))
        .route("/policy/apps", post(add_app))
        .route("/policy/apps/{name}", axum::routing::delete(remove_app))
        .route("/policy/apps/{name}/restrict", post(restrict_app))
        .route("/policy/apps/{name}/allow", post(allow_app))
        .with_state(service)
}

/// Liveness probe.
async fn health() -> StatusCode {
    StatusCode::OK
}

async fn status(State(service): State<PolicyService>) -> Json<StatusResponse> {
    Json(service.status().await)
}

async fn last_reconciliation(
    State(service): State<PolicyService>,
) -> Result<Json<ReconcileReport>, ApiError> {
    service
        .last_report()
        .map(Json)
        .ok_or_else(|| ApiError::not_found("no reconciliation yet"))
}

async fn restrict_app(
    State(service): State<PolicyService>,
    Path(name): Path<String>,
    Query(q): Query<WaitQuery>,
) -> Result<Json<PolicyResponse>, ApiError> {
    let change = service.restrict(&name).await?;
    info!(app = %name, revision = change.policy.revision, "restrict requested");
    Ok(Json(respond(&service, change, q.wait).await))
}

async fn allow_app(
    State(service): State<PolicyService>,
    Path(name): Path<String>,
    Query(q): Query<WaitQuery>,
) -> Result<Json<PolicyResponse>, ApiError> {
    let change = service.allow(&name).await?;
    info!(app = %name, revision = change.policy.revision, "allow requested");
    Ok(Json(respond(&service, change, q.wait).await))
}

async fn restrict_internet(
    State(service): State<PolicyService>,
    Query(q): Query<WaitQuery>,
) -> Result<Json<PolicyResponse>, ApiError> {
    let change = service.set_internet_blocked(true).await?;
    Ok(Json(respond(&service, change, q.wait).await))
}

async fn allow_internet(
    State(service): State<PolicyService>,
    Query(q): Query<WaitQuery>,
) -> Result<Json<PolicyResponse>, ApiError> {
    let change = service.set_internet_blocked(false).await?;
    Ok(Json(respond(&service, change, q.wait).await))
}

async fn replace_policy(
    State(service): State<PolicyService>,
    Query(q): Query<WaitQuery>,
    Json(body): Json<ReplacePolicyRequest>,
) -> Result<Json<PolicyResponse>, ApiError> {
    let change = service
        .replace(&body.restricted, body.internet_blocked)
        .await?;
    Ok(Json(respond(&service, change, q.wait).await))
}

async fn reset(
    State(service): State<PolicyService>,
    Query(q): Query<WaitQuery>,
) -> Result<Json<PolicyResponse>, ApiError> {
    let change = service.reset().await?;
    Ok(Json(respond(&service, change, q.wait).await))
}

async fn add_app(
    State(service): State<PolicyService>,
    Query(q): Query<WaitQuery>,
    Json(body): Json<AddAppRequest>,
) -> Result<(StatusCode, Json<GroupResponse>), ApiError> {
    let update = service.add_app(&body.name, &body.domains).await?;
    let reconciliation = if q.wait {
        service.wait_for(update.ticket).await
    } else {
        None
    };
    Ok((
        StatusCode::CREATED,
        Json(GroupResponse {
            group: update.group,
            reconciliation,
        }),
    ))
}

async fn remove_app(
    State(service): State<PolicyService>,
    Path(name): Path<String>,
    Query(q): Query<WaitQuery>,
) -> Result<Json<PolicyResponse>, ApiError> {
    let update = service
        .remove_app(&name)
        .await
        .map_err(|e| ApiError::from_store(e, StatusCode::NOT_FOUND))?;
    let reconciliation = if q.wait {
        service.wait_for(update.ticket).await
    } else {
        None
    };
    Ok(Json(PolicyResponse {
        success: true,
        policy: service.policy().await,
        reconciliation,
    }))
}

async fn reconcile(State(service): State<PolicyService>, Query(q): Query<WaitQuery>) -> Response {
    let ticket = service.reconcile();
    if q.wait {
        Json(service.wait(ticket).await).into_response()
    } else {
        (StatusCode::ACCEPTED, Json(TicketResponse { ticket })).into_response()
    }
}

async fn respond(service: &PolicyService, change: Change, wait: bool) -> PolicyResponse {
    let reconciliation = if wait {
        service.wait_for(change.ticket).await
    } else {
        None
    };
    PolicyResponse {
        success: true,
        policy: change.policy,
        reconciliation,
    }
}
