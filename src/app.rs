use axum::{
    Json, Router,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use crate::batch;
use crate::config::{AppConfig, DashboardSettings};
use crate::edits::EditAccumulator;
use crate::error::ApiError;
use crate::record::{self, JobApplication};
use crate::sheets::{CellUpdate, GoogleSheetsClient, SheetsApi};

pub struct AppState {
    sheets: Arc<dyn SheetsApi>,
    dashboard: DashboardSettings,
}

impl AppState {
    pub fn new(sheets: Arc<dyn SheetsApi>, dashboard: DashboardSettings) -> Self {
        AppState { sheets, dashboard }
    }
}

#[derive(Deserialize)]
struct ReadQuery {
    #[serde(rename = "sheetId")]
    sheet_id: Option<String>,
    range: Option<String>,
}

#[derive(Serialize)]
struct ValuesResponse {
    values: Vec<Vec<String>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SingleUpdate {
    sheet_id: String,
    range: String,
    value: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BulkUpdate {
    sheet_id: String,
    updates: Vec<CellUpdate>,
}

#[derive(Deserialize)]
struct DashboardSave {
    edits: Map<String, Value>,
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RowsResponse {
    sheet_name: String,
    rows: Vec<JobApplication>,
}

#[derive(Serialize)]
struct SavedResponse {
    message: String,
    updated: usize,
}

/// Build the router around an already-constructed state.
pub fn router(state: Arc<AppState>, static_dir: &Path) -> Router {
    Router::new()
        .route("/", get(serve_dashboard))
        .route(
            "/api/sheets",
            get(read_values).post(write_value).fallback(method_not_allowed),
        )
        .route(
            "/api/bulk-update",
            post(bulk_update).fallback(method_not_allowed),
        )
        .route(
            "/api/dashboard/rows",
            get(dashboard_rows).fallback(method_not_allowed),
        )
        .route(
            "/api/dashboard/save",
            post(dashboard_save).fallback(method_not_allowed),
        )
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(state)
}

pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let sheets: Arc<dyn SheetsApi> = Arc::new(GoogleSheetsClient::new(&config.google));
    if config.google.client_email.is_none() || config.google.private_key.is_none() {
        log::warn!("Google service account credentials are not configured; requests will fail");
    }

    let state = Arc::new(AppState::new(sheets, config.dashboard.clone()));
    let app = router(state, &config.server.static_dir);

    let address = config.bind_address();
    let listener = TcpListener::bind(&address).await?;
    log::info!("Listening on http://{}", address);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn serve_dashboard() -> Html<&'static str> {
    Html(include_str!("./static/dashboard.html"))
}

async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(MessageResponse {
            message: "Method not allowed".to_string(),
        }),
    )
}

fn required(value: Option<String>, name: &str) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ApiError::Validation(format!("missing required parameter '{}'", name))),
    }
}

async fn read_values(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReadQuery>,
) -> Result<Json<ValuesResponse>, ApiError> {
    let sheet_id = required(params.sheet_id, "sheetId")?;
    let range = required(params.range, "range")?;

    log::info!("Reading {} from sheet {}", range, sheet_id);
    let values = state
        .sheets
        .get_values(&sheet_id, &range)
        .await
        .map_err(|e| {
            log::error!("Read of {} failed: {}", range, e);
            ApiError::RemoteRead(e.to_string())
        })?;

    Ok(Json(ValuesResponse { values }))
}

async fn write_value(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SingleUpdate>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(update) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;
    let sheet_id = required(Some(update.sheet_id), "sheetId")?;

    log::info!("Writing {} on sheet {}", update.range, sheet_id);
    state
        .sheets
        .update_value(&sheet_id, &update.range, &update.value)
        .await
        .map_err(|e| {
            log::error!("Write to {} failed: {}", update.range, e);
            ApiError::RemoteWrite(e.to_string())
        })?;

    Ok(Json(MessageResponse {
        message: "Updated successfully".to_string(),
    }))
}

async fn apply_batch(
    state: &AppState,
    sheet_id: &str,
    updates: Vec<CellUpdate>,
) -> Result<usize, ApiError> {
    log::info!("Applying {} cell update(s) to sheet {}", updates.len(), sheet_id);
    let report = batch::run_batch(state.sheets.as_ref(), sheet_id, updates).await;
    report
        .into_all_or_nothing()
        .map_err(|e| ApiError::RemoteWrite(e.to_string()))
}

async fn bulk_update(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BulkUpdate>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;
    let sheet_id = required(Some(request.sheet_id), "sheetId")?;

    apply_batch(&state, &sheet_id, request.updates).await?;

    Ok(Json(MessageResponse {
        message: "All updates completed successfully".to_string(),
    }))
}

async fn dashboard_rows(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RowsResponse>, ApiError> {
    let settings = &state.dashboard;
    let sheet_id = required(Some(settings.sheet_id.clone()), "dashboard.sheet_id")?;
    let range = settings.read_range();

    let values = state
        .sheets
        .get_values(&sheet_id, &range)
        .await
        .map_err(|e| {
            log::error!("Error fetching dashboard rows: {}", e);
            ApiError::RemoteRead(e.to_string())
        })?;

    Ok(Json(RowsResponse {
        sheet_name: settings.sheet_name.clone(),
        rows: record::records_from_values(&values),
    }))
}

async fn dashboard_save(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DashboardSave>, JsonRejection>,
) -> Result<Json<SavedResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;
    let settings = &state.dashboard;
    let sheet_id = required(Some(settings.sheet_id.clone()), "dashboard.sheet_id")?;

    let edits = EditAccumulator::from_json(&request.edits)
        .map_err(|e| ApiError::Validation(e.to_string()))?;
    let updates = edits
        .derive_updates(&settings.sheet_name)
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    if updates.is_empty() {
        return Ok(Json(SavedResponse {
            message: "No updates to save".to_string(),
            updated: 0,
        }));
    }

    let updated = apply_batch(&state, &sheet_id, updates).await?;
    Ok(Json(SavedResponse {
        message: "All updates completed successfully".to_string(),
        updated,
    }))
}
