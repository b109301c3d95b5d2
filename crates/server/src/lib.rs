use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use server_api::execute_operation;
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{OperationKind, OperationRequest, OperationResponse},
};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{error, warn};

mod app_state;
pub mod config;

pub use app_state::AppState;

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

pub fn build_router(state: Arc<AppState>, max_request_bytes: usize) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(
            "/services/:service/connectors/:connector/executeQuery",
            post(execute_query),
        )
        .route(
            "/services/:service/connectors/:connector/executeMutation",
            post(execute_mutation),
        )
        .layer(RequestBodyLimitLayer::new(max_request_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz(State(state): State<Arc<AppState>>) -> Result<&'static str, StatusCode> {
    state.api.storage.health_check().await.map_err(|error| {
        error!(%error, "health check failed");
        StatusCode::SERVICE_UNAVAILABLE
    })?;
    Ok("ok")
}

async fn execute_query(
    State(state): State<Arc<AppState>>,
    Path((service, connector)): Path<(String, String)>,
    body: Result<Json<OperationRequest>, JsonRejection>,
) -> ApiResult<OperationResponse<Value>> {
    let Json(req) = body.map_err(reject_body)?;
    execute(&state, OperationKind::Query, &service, &connector, req).await
}

async fn execute_mutation(
    State(state): State<Arc<AppState>>,
    Path((service, connector)): Path<(String, String)>,
    body: Result<Json<OperationRequest>, JsonRejection>,
) -> ApiResult<OperationResponse<Value>> {
    let Json(req) = body.map_err(reject_body)?;
    execute(&state, OperationKind::Mutation, &service, &connector, req).await
}

async fn execute(
    state: &AppState,
    kind: OperationKind,
    service: &str,
    connector: &str,
    req: OperationRequest,
) -> ApiResult<OperationResponse<Value>> {
    if service != state.connector.service || connector != state.connector.connector {
        return Err(reject(ApiError::not_found(format!(
            "no connector {connector} in service {service}"
        ))));
    }

    let operation = req.operation_name.clone();
    match execute_operation(&state.api, kind, req).await {
        Ok(data) => Ok(Json(OperationResponse { data })),
        Err(err) => {
            match err.code {
                ErrorCode::Internal => error!(%operation, error = %err.message, "operation failed"),
                _ => warn!(%operation, error = %err.message, "operation rejected"),
            }
            Err(reject(err))
        }
    }
}

// Keeps the rejection's status (400, 413, 415) but always answers with an `ApiError` body.
fn reject_body(rejection: JsonRejection) -> (StatusCode, Json<ApiError>) {
    warn!(status = %rejection.status(), error = %rejection.body_text(), "request body rejected");
    (
        rejection.status(),
        Json(ApiError::validation(rejection.body_text())),
    )
}

fn reject(err: ApiError) -> (StatusCode, Json<ApiError>) {
    (status_for(err.code), Json(err))
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
#[path = "tests/router_tests.rs"]
mod tests;
