//! HTTP routes: upload, per-upload views, health and metrics.

use std::sync::Arc;

use axum::debug_handler;
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use health_insights_core::InsightResult;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use crate::csv_input::read_table_from_bytes;
use crate::error::{ServerError, ServerResult};
use crate::processing::{Anomaly, TimeseriesPoint, TrendEntry, UploadRecord, UploadSummary, process_upload};
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub status: String,
    pub data_id: Uuid,
    pub summary: UploadSummary,
    pub ai_insights: InsightResult,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub data_id: Uuid,
    pub user_id: String,
    pub summary: UploadSummary,
    pub trends: Vec<TrendEntry>,
    pub anomalies: Vec<Anomaly>,
    pub timeseries: Vec<TimeseriesPoint>,
    pub ai_insights: InsightResult,
}

pub fn build_router(state: AppState, max_body_size: usize) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/metrics", get(metrics_endpoint))
        .route("/upload", post(upload))
        .route("/data/{id}/summary", get(get_summary))
        .route("/data/{id}/trends", get(get_trends))
        .route("/data/{id}/anomalies", get(get_anomalies))
        .route("/data/{id}/insights", get(get_insights))
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

#[debug_handler]
async fn root() -> impl IntoResponse {
    Json(serde_json::json!({ "message": "Health insights API", "status": "ok" }))
}

#[debug_handler]
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

#[debug_handler]
async fn metrics_endpoint(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4")],
            handle.render(),
        ),
        None => (
            StatusCode::NOT_FOUND,
            [("content-type", "text/plain")],
            "metrics recorder not installed".to_string(),
        ),
    }
}

#[debug_handler]
async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ServerResult<Json<UploadResponse>> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            let filename = field.file_name().map(str::to_string);
            let bytes = field.bytes().await?;
            upload = Some((filename, bytes));
            break;
        }
    }
    let (filename, bytes) =
        upload.ok_or_else(|| ServerError::BadRequest("missing multipart field `file`".into()))?;

    let table = read_table_from_bytes(&bytes)?;
    let record = process_upload(&state.engine, &table, filename).await?;
    let summary = record.summary.clone();
    let ai_insights = record.insights.clone();
    let data_id = state.store.put(record).await;
    info!(%data_id, "stored upload");

    Ok(Json(UploadResponse {
        status: "ok".into(),
        data_id,
        summary,
        ai_insights,
    }))
}

async fn load(state: &AppState, id: &str) -> ServerResult<(Uuid, Arc<UploadRecord>)> {
    let not_found = || ServerError::NotFound("Data ID not found".into());
    let data_id = Uuid::parse_str(id).map_err(|_| not_found())?;
    let record = state.store.get(&data_id).await.ok_or_else(not_found)?;
    Ok((data_id, record))
}

#[debug_handler]
async fn get_summary(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ServerResult<Json<SummaryResponse>> {
    let (data_id, record) = load(&state, &id).await?;
    Ok(Json(SummaryResponse {
        data_id,
        user_id: record.user_id.clone(),
        summary: record.summary.clone(),
        trends: record.trends.clone(),
        anomalies: record.anomalies.clone(),
        timeseries: record.timeseries.clone(),
        ai_insights: record.insights.clone(),
    }))
}

#[debug_handler]
async fn get_trends(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ServerResult<Json<Vec<TimeseriesPoint>>> {
    let (_, record) = load(&state, &id).await?;
    Ok(Json(record.timeseries.clone()))
}

#[debug_handler]
async fn get_anomalies(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ServerResult<Json<Vec<Anomaly>>> {
    let (_, record) = load(&state, &id).await?;
    Ok(Json(record.anomalies.clone()))
}

#[debug_handler]
async fn get_insights(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ServerResult<Json<InsightResult>> {
    let (_, record) = load(&state, &id).await?;
    Ok(Json(record.insights.clone()))
}
