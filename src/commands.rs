use serde::Serialize;
use serde_json::{json, Value};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tauri::{AppHandle, State};

use crate::app_state::AppState;
use crate::assistant::{assistant_reply_payload, QUICK_QUESTIONS};
use crate::auth_session::{AuthUser, PopupOutcome};
use crate::integrations::{ConnectRequest, Platform, TokioDelay};
use crate::sales_analytics::{dashboard_summary, product_details};
use crate::sheet_export::export_derived_csv_payload;
use crate::upload_pipeline::{self, resolve_source_path_text};

#[derive(Debug, Serialize)]
pub struct HealthPing {
    pub status: &'static str,
    pub unix_ts: u64,
    pub mode: &'static str,
    pub rows_loaded: usize,
}

#[derive(Debug, Serialize)]
pub struct AppMetadata {
    pub app_name: String,
    pub app_version: String,
    pub app_identifier: Option<String>,
    pub target_os: String,
    pub target_arch: String,
    pub debug: bool,
    pub max_upload_mib: u64,
}

fn now_unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[tauri::command]
pub fn health_ping(state: State<'_, AppState>) -> HealthPing {
    HealthPing {
        status: "ok",
        unix_ts: now_unix_ts(),
        mode: "desktop",
        rows_loaded: state.rows.row_count(),
    }
}

#[tauri::command]
pub fn app_metadata(app: AppHandle, state: State<'_, AppState>) -> AppMetadata {
    let package = app.package_info();
    let identifier = Some(app.config().identifier.clone()).filter(|s| !s.trim().is_empty());

    AppMetadata {
        app_name: package.name.clone(),
        app_version: package.version.to_string(),
        app_identifier: identifier,
        target_os: std::env::consts::OS.to_string(),
        target_arch: std::env::consts::ARCH.to_string(),
        debug: cfg!(debug_assertions),
        max_upload_mib: state.config.upload.limit_mib(),
    }
}

#[tauri::command]
pub fn upload_sheet_file(
    state: State<'_, AppState>,
    source_path: Option<String>,
) -> Result<Value, String> {
    let path = resolve_source_path_text(source_path)?;
    upload_pipeline::upload_sheet_at_path(&state.rows, &state.config.upload, Path::new(&path))
}

#[tauri::command]
pub fn upload_sheet_bytes(
    state: State<'_, AppState>,
    file_name: String,
    bytes: Vec<u8>,
) -> Result<Value, String> {
    upload_pipeline::upload_sheet_bytes(&state.rows, &state.config.upload, &file_name, &bytes)
}

#[tauri::command]
pub fn dashboard_summary_query(state: State<'_, AppState>) -> Result<Value, String> {
    Ok(dashboard_summary(&state.rows.snapshot()))
}

#[tauri::command]
pub fn product_details_query(state: State<'_, AppState>, index: usize) -> Result<Value, String> {
    Ok(product_details(&state.rows.snapshot(), index)?)
}

#[tauri::command]
pub fn assistant_ask(state: State<'_, AppState>, question: String) -> Result<Value, String> {
    assistant_reply_payload(&state.rows.snapshot(), &question, state.config.assistant.top_n)
}

#[tauri::command]
pub fn assistant_suggestions() -> Value {
    json!({ "questions": QUICK_QUESTIONS })
}

#[tauri::command]
pub fn export_derived_csv(state: State<'_, AppState>) -> Result<Value, String> {
    export_derived_csv_payload(&state.rows.snapshot())
}

#[tauri::command]
pub fn resolve_route_query(state: State<'_, AppState>, path: String) -> Value {
    state.route_payload(&path)
}

#[tauri::command]
pub fn auth_observe_user(state: State<'_, AppState>, user: Option<AuthUser>) -> Value {
    state.auth.observe(user);
    json!({ "auth": state.auth.state() })
}

#[tauri::command]
pub async fn auth_complete_sign_in(
    state: State<'_, AppState>,
    outcome: PopupOutcome,
) -> Result<Value, String> {
    let landing = state.auth.sign_in(&outcome).await?;
    Ok(json!({
        "auth": state.auth.state(),
        "landing": landing,
        "landing_path": landing.path(),
    }))
}

#[tauri::command]
pub fn auth_sign_out(state: State<'_, AppState>) -> Value {
    state.sign_out();
    json!({ "auth": state.auth.state(), "landing_path": "/login" })
}

#[tauri::command]
pub async fn integration_connect(
    state: State<'_, AppState>,
    request: ConnectRequest,
) -> Result<Value, String> {
    let status = state.integrations.connect(request, &TokioDelay).await?;
    serde_json::to_value(status).map_err(|e| format!("serialize integration status failed: {e}"))
}

#[tauri::command]
pub fn integration_disconnect(state: State<'_, AppState>, platform: String) -> Result<Value, String> {
    let platform = Platform::parse(&platform)?;
    let removed = state.integrations.disconnect(platform);
    Ok(json!({ "platform": platform, "disconnected": removed }))
}

#[tauri::command]
pub fn integration_status_query(state: State<'_, AppState>) -> Value {
    json!({ "integrations": state.integrations.status() })
}
