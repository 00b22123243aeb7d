//! HTTP routing, request validation and dispatch to the store service.
//!
//! # Responsibility
//! - Map each method on `/todos` to one store operation.
//! - Short-circuit structurally invalid requests with 400 before storage.
//! - Bound every storage call by the configured request timeout.

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use log::info;
use std::future::Future;
use std::time::{Duration, Instant};
use todo_core::{RepoResult, TodoService};

use crate::api::{
    decode_body, CreateTodoRequest, CreateTodoResponse, DeleteTodoRequest, HealthzResponse,
    ReadTodoParams, ReadTodoResponse, UpdateTodoRequest, UpdateTodoResponse,
};
use crate::error::ApiError;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    service: TodoService,
    request_timeout: Duration,
}

impl AppState {
    pub fn new(service: TodoService, request_timeout: Duration) -> Self {
        Self {
            service,
            request_timeout,
        }
    }

    /// Awaits a storage call, dropping (and thereby cancelling) it once the
    /// request timeout elapses.
    async fn within_deadline<T>(
        &self,
        call: impl Future<Output = RepoResult<T>>,
    ) -> Result<T, ApiError> {
        match tokio::time::timeout(self.request_timeout, call).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(ApiError::Timeout(self.request_timeout)),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(
            "/todos",
            get(read_todos)
                .post(create_todo)
                .put(update_todo)
                .delete(delete_todos),
        )
        .with_state(state)
}

async fn healthz() -> Json<HealthzResponse> {
    Json(HealthzResponse {
        message: "OK".to_string(),
    })
}

async fn create_todo(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<CreateTodoResponse>, ApiError> {
    let started_at = Instant::now();
    let req: CreateTodoRequest = decode_body(&body)?;
    req.validate()?;

    let todo = state
        .within_deadline(state.service.create_todo(req.subject, req.description))
        .await?;

    info!(
        "event=http_create module=handler status=ok id={} duration_ms={}",
        todo.id,
        started_at.elapsed().as_millis()
    );
    Ok(Json(CreateTodoResponse { todo }))
}

async fn read_todos(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<ReadTodoResponse>, ApiError> {
    let started_at = Instant::now();
    let params = match &query {
        Ok(Query(pairs)) => {
            ReadTodoParams::from_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        }
        Err(_) => ReadTodoParams::default(),
    };

    let todos = state
        .within_deadline(state.service.read_todos(params.prev_id, params.size))
        .await?;

    info!(
        "event=http_read module=handler status=ok prev_id={} size={} count={} duration_ms={}",
        params.prev_id,
        params.size,
        todos.len(),
        started_at.elapsed().as_millis()
    );
    Ok(Json(ReadTodoResponse { todos }))
}

async fn update_todo(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<UpdateTodoResponse>, ApiError> {
    let started_at = Instant::now();
    let req: UpdateTodoRequest = decode_body(&body)?;
    req.validate()?;

    let todo = state
        .within_deadline(
            state
                .service
                .update_todo(req.id, req.subject, req.description),
        )
        .await?;

    info!(
        "event=http_update module=handler status=ok id={} duration_ms={}",
        todo.id,
        started_at.elapsed().as_millis()
    );
    Ok(Json(UpdateTodoResponse { todo }))
}

async fn delete_todos(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let started_at = Instant::now();
    let req: DeleteTodoRequest = decode_body(&body)?;
    req.validate()?;

    let requested = req.ids.len();
    let removed = state
        .within_deadline(state.service.delete_todos(req.ids))
        .await
        .map_err(ApiError::for_delete)?;

    info!(
        "event=http_delete module=handler status=ok requested={} removed={} duration_ms={}",
        requested,
        removed,
        started_at.elapsed().as_millis()
    );
    Ok(StatusCode::OK)
}
