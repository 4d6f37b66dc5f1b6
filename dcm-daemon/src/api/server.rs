//! HTTP server implementation

use crate::api::dto::{BasicResponse, DeleteRequest};
use crate::orchestrator::{ComposeOrchestrator, InsertRequest};
use anyhow::Context;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use dcm_core::DcmError;
use serde::de::DeserializeOwned;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, instrument, warn};

type ApiResponse = (StatusCode, Json<BasicResponse>);

/// Build the router for the compose manager API.
pub fn router(orchestrator: Arc<ComposeOrchestrator>) -> Router {
    let api = Router::new()
        .route("/services", get(list_services))
        .route("/services/:name", get(get_service))
        .route("/insert", post(insert))
        .route("/delete", delete(delete_service));

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .nest("/api", api)
        .with_state(orchestrator)
}

/// Serve the API on all interfaces until the task is aborted or fails.
pub async fn start_api_server(
    orchestrator: Arc<ComposeOrchestrator>,
    port: u16,
) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind HTTP API on {}", addr))?;

    info!(addr = %addr, compose = %orchestrator.compose_path().display(), "HTTP API listening");

    axum::serve(listener, router(orchestrator)).await.context("HTTP API server error")?;
    Ok(())
}

async fn index() -> Html<&'static str> {
    Html("<h1>Docker Compose Manager</h1>")
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy", "version": env!("CARGO_PKG_VERSION") }))
}

#[instrument(skip_all)]
async fn list_services(State(orchestrator): State<Arc<ComposeOrchestrator>>) -> ApiResponse {
    match orchestrator.list_services().await {
        Ok(names) => ok("Services listed", Some(serde_json::json!(names))),
        Err(e) => error_response(e),
    }
}

#[instrument(skip_all, fields(service = %name))]
async fn get_service(
    State(orchestrator): State<Arc<ComposeOrchestrator>>,
    Path(name): Path<String>,
) -> ApiResponse {
    let service = match orchestrator.get_service(&name).await {
        Ok(service) => service,
        Err(e) => return error_response(e),
    };
    match serde_json::to_value(service) {
        Ok(value) => ok("Service found", Some(value)),
        Err(e) => server_error(e.to_string()),
    }
}

#[instrument(skip_all)]
async fn insert(
    State(orchestrator): State<Arc<ComposeOrchestrator>>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> ApiResponse {
    let request: InsertRequest = match payload.map_err(|r| r.body_text()).and_then(decode_body) {
        Ok(request) => request,
        Err(reason) => return bad_request(reason),
    };
    if request.service.name.is_empty() {
        return bad_request("service name is required");
    }

    info!(service = %request.service.name, "HTTP: insert");
    match orchestrator.insert(request).await {
        Ok(()) => ok("Service added successfully", None),
        Err(e) => error_response(e),
    }
}

#[instrument(skip_all)]
async fn delete_service(
    State(orchestrator): State<Arc<ComposeOrchestrator>>,
    payload: Result<Json<DeleteRequest>, JsonRejection>,
) -> ApiResponse {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return bad_request(rejection.body_text()),
    };

    info!(service = %request.name, "HTTP: delete");
    match orchestrator.delete(&request.name).await {
        Ok(removed) => ok(
            "Service deleted successfully",
            Some(serde_json::json!({ "removed_volumes": removed })),
        ),
        Err(e) => error_response(e),
    }
}

/// Decode a JSON body with the same rules as a descriptor file. Numbers in
/// string fields (`"ports": [8080]`) are accepted and kept as text.
fn decode_body<T: DeserializeOwned>(Json(value): Json<serde_json::Value>) -> Result<T, String> {
    let yaml = serde_yaml::to_string(&value).map_err(|e| e.to_string())?;
    serde_yaml::from_str(&yaml).map_err(|e| format!("invalid request body: {}", e))
}

fn ok(message: &str, data: Option<serde_json::Value>) -> ApiResponse {
    (StatusCode::OK, Json(BasicResponse::ok(message, data)))
}

fn bad_request(message: impl Into<String>) -> ApiResponse {
    (StatusCode::BAD_REQUEST, Json(BasicResponse::error(message)))
}

fn server_error(message: String) -> ApiResponse {
    warn!(error = %message, "Request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, Json(BasicResponse::error(message)))
}

fn error_response(err: DcmError) -> ApiResponse {
    match err {
        DcmError::NotFound { .. } => {
            (StatusCode::NOT_FOUND, Json(BasicResponse::error(err.to_string())))
        }
        other => server_error(other.to_string()),
    }
}
