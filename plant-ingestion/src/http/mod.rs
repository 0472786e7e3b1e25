use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use crate::query::{AreaQuery, IdQuery, PlantQueryService, QueryError, QueryResponse, StateQuery};

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        let status = match &self {
            QueryError::InvalidArea(_) => StatusCode::BAD_REQUEST,
            QueryError::Store(e) => {
                tracing::error!(error = %e, "plant query failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub fn router(service: PlantQueryService) -> Router {
    Router::new()
        .route("/", get(hello))
        .route("/health", get(health))
        .route("/plants/by-state/:state", get(plants_by_state))
        .route("/plants/by-id/:plant_id", get(plant_by_id))
        .route("/plants/in-area", get(plants_in_area))
        .with_state(service)
}

/// Bind and serve until the process is stopped.
pub async fn serve(bind_addr: &str, service: PlantQueryService) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind HTTP listener on {bind_addr}: {e}"))?;
    tracing::info!(addr = %bind_addr, "serving plant queries");

    axum::serve(listener, router(service).into_make_service()).await?;
    Ok(())
}

async fn hello() -> &'static str {
    "Hello, World!!"
}

async fn health(State(service): State<PlantQueryService>) -> Result<Json<serde_json::Value>, QueryError> {
    let records = service.record_count().await?;
    Ok(Json(json!({ "status": "ok", "records": records })))
}

async fn plants_by_state(
    State(service): State<PlantQueryService>,
    Path(state): Path<String>,
) -> Result<Json<QueryResponse<StateQuery>>, QueryError> {
    // The store matches case-sensitively; codes are stored upper-case.
    let state = state.trim().to_ascii_uppercase();
    Ok(Json(service.by_state(StateQuery { state }).await?))
}

async fn plant_by_id(
    State(service): State<PlantQueryService>,
    Path(plant_id): Path<i64>,
) -> Result<Json<QueryResponse<IdQuery>>, QueryError> {
    Ok(Json(service.by_id(IdQuery { plant_id }).await?))
}

async fn plants_in_area(
    State(service): State<PlantQueryService>,
    Query(params): Query<AreaQuery>,
) -> Result<Json<QueryResponse<AreaQuery>>, QueryError> {
    Ok(Json(service.in_area(params).await?))
}
