pub mod app_config;
pub mod app_error;
pub mod app_state;
pub mod assistant;
pub mod auth_session;
#[cfg(feature = "desktop")]
mod commands;
pub mod integrations;
pub mod navigation;
pub mod row_sanitizer;
pub mod row_store;
pub mod sales_analytics;
pub mod sheet_export;
pub mod sheet_ingest;
pub mod sheet_rows;
pub mod sheet_schema;
pub mod telemetry;
pub mod upload_pipeline;

pub use app_config::{load_config, AppConfig};
pub use app_error::AppError;
pub use app_state::AppState;
pub use assistant::{answer_question, assistant_reply_payload, QUICK_QUESTIONS};
pub use auth_session::{AuthSession, AuthState, AuthUser, IdentityProvider, PopupOutcome};
pub use integrations::{ConnectDelay, ConnectRequest, IntegrationHub, Platform, TokioDelay};
pub use navigation::{resolve_route, route_decision_payload, Route, RouteDecision};
pub use row_store::RowStore;
pub use sales_analytics::{compute_totals, dashboard_summary, derive_rows, product_details};
pub use sheet_export::export_derived_csv_payload;
pub use sheet_rows::{RowBatch, SheetRow};
pub use upload_pipeline::{upload_sheet, upload_sheet_at_path, upload_sheet_bytes, UploadReceipt};

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    telemetry::init_tracing(false);
    let config = load_config().unwrap_or_else(|err| {
        tracing::warn!("config load failed, using defaults: {err:#}");
        AppConfig::default()
    });

    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_opener::init())
        .manage(AppState::new(config))
        .invoke_handler(tauri::generate_handler![
            commands::health_ping,
            commands::app_metadata,
            commands::upload_sheet_file,
            commands::upload_sheet_bytes,
            commands::dashboard_summary_query,
            commands::product_details_query,
            commands::assistant_ask,
            commands::assistant_suggestions,
            commands::export_derived_csv,
            commands::resolve_route_query,
            commands::auth_observe_user,
            commands::auth_complete_sign_in,
            commands::auth_sign_out,
            commands::integration_connect,
            commands::integration_disconnect,
            commands::integration_status_query
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
