use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sheetpulse_tauri_lib::app_config::load_config;
use sheetpulse_tauri_lib::assistant::assistant_reply_payload;
use sheetpulse_tauri_lib::auth_session::{AuthState, AuthUser};
use sheetpulse_tauri_lib::navigation::route_decision_payload;
use sheetpulse_tauri_lib::row_store::RowStore;
use sheetpulse_tauri_lib::sales_analytics::{dashboard_summary, product_details};
use sheetpulse_tauri_lib::sheet_export::export_derived_csv_payload;
use sheetpulse_tauri_lib::sheet_ingest::read_upload_bytes;
use sheetpulse_tauri_lib::telemetry::init_tracing;
use sheetpulse_tauri_lib::upload_pipeline::upload_sheet;
use sheetpulse_tauri_lib::{AppConfig, AppError};
use std::env;
use std::io::{self, Read};
use std::path::Path;

#[derive(Debug, Deserialize)]
struct AdapterRequest {
    schema_version: u64,
    case: Option<AdapterCaseMeta>,
    endpoint: AdapterEndpoint,
    #[serde(default)]
    query: Value,
    #[serde(default)]
    dataset: AdapterDataset,
}

#[derive(Debug, Deserialize)]
struct AdapterCaseMeta {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AdapterEndpoint {
    path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AdapterDataset {
    file_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ProductQuery {
    index: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct AssistantQuery {
    question: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct NavigationQuery {
    path: Option<String>,
    user: Option<AuthUser>,
    #[serde(default)]
    initializing: bool,
}

#[derive(Debug, Serialize)]
struct AdapterErrorBody {
    category: String,
    message: String,
    #[serde(rename = "type")]
    error_type: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status")]
enum AdapterResponse {
    #[serde(rename = "success")]
    Success { payload: Value },
    #[serde(rename = "error")]
    Error { error: AdapterErrorBody },
}

#[derive(Debug)]
enum AdapterFailure {
    Protocol(String),
    UnsupportedEndpoint(String),
    Validation(String),
    App(AppError),
}

impl From<AppError> for AdapterFailure {
    fn from(err: AppError) -> Self {
        AdapterFailure::App(err)
    }
}

impl AdapterFailure {
    fn into_response(self) -> AdapterResponse {
        let (category, message, error_type) = match self {
            AdapterFailure::Protocol(m) => ("ADAPTER_PROTOCOL_ERROR".to_string(), m, "AdapterError"),
            AdapterFailure::UnsupportedEndpoint(m) => {
                ("UNSUPPORTED_ENDPOINT".to_string(), m, "AdapterError")
            }
            AdapterFailure::Validation(m) => ("VALIDATION_ERROR".to_string(), m, "AdapterError"),
            AdapterFailure::App(err) => (err.category().to_string(), err.to_string(), "AppError"),
        };
        AdapterResponse::Error {
            error: AdapterErrorBody {
                category,
                message,
                error_type: error_type.to_string(),
            },
        }
    }
}

fn parse_bool_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|arg| arg == flag)
}

fn read_stdin_json() -> Result<Value, AdapterFailure> {
    let mut raw = String::new();
    io::stdin()
        .read_to_string(&mut raw)
        .map_err(|e| AdapterFailure::Protocol(format!("read stdin failed: {e}")))?;
    if raw.trim().is_empty() {
        return Err(AdapterFailure::Protocol("empty stdin request".to_string()));
    }
    serde_json::from_str::<Value>(&raw)
        .map_err(|e| AdapterFailure::Protocol(format!("invalid JSON request: {e}")))
}

fn parse_query<T: for<'de> Deserialize<'de> + Default>(
    query: Value,
    endpoint: &str,
) -> Result<T, AdapterFailure> {
    if query.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(query)
        .map_err(|e| AdapterFailure::Protocol(format!("request.query invalid for {endpoint}: {e}")))
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

/// Loads the dataset file into `store` and returns the upload receipt.
fn load_dataset(store: &RowStore, config: &AppConfig, file_path: &str) -> Result<Value, AdapterFailure> {
    let path = Path::new(file_path);
    let bytes = read_upload_bytes(path, &config.upload)?;
    let receipt = upload_sheet(store, &config.upload, file_path, &bytes)?;
    serde_json::to_value(receipt)
        .map_err(|e| AdapterFailure::Protocol(format!("serialize upload receipt failed: {e}")))
}

fn dispatch(req: AdapterRequest, config: &AppConfig) -> Result<Value, AdapterFailure> {
    if req.schema_version != 1 {
        return Err(AdapterFailure::Protocol(format!(
            "unsupported schema_version: {}",
            req.schema_version
        )));
    }

    let path = non_empty(req.endpoint.path.as_deref())
        .ok_or_else(|| AdapterFailure::Protocol("request.endpoint.path missing".to_string()))?;
    let file_path = non_empty(req.dataset.file_path.as_deref());

    let store = RowStore::new();
    let receipt = match file_path {
        Some(file_path) => Some(load_dataset(&store, config, file_path)?),
        None if path == "/api/navigation/resolve" => None,
        None => {
            return Err(AdapterFailure::Protocol(
                "request.dataset.file_path missing".to_string(),
            ))
        }
    };
    let batch = store.snapshot();

    match path {
        "/api/upload/preview" => Ok(receipt.unwrap_or(Value::Null)),
        "/api/dashboard/summary" => Ok(dashboard_summary(&batch)),
        "/api/product/details" => {
            let q: ProductQuery = parse_query(req.query, path)?;
            let index = q
                .index
                .ok_or_else(|| AdapterFailure::Validation("index is required".to_string()))?;
            Ok(product_details(&batch, index)?)
        }
        "/api/assistant/ask" => {
            let q: AssistantQuery = parse_query(req.query, path)?;
            assistant_reply_payload(
                &batch,
                q.question.as_deref().unwrap_or_default(),
                config.assistant.top_n,
            )
            .map_err(AdapterFailure::Validation)
        }
        "/api/export/csv" => export_derived_csv_payload(&batch).map_err(AdapterFailure::Validation),
        "/api/navigation/resolve" => {
            let q: NavigationQuery = parse_query(req.query, path)?;
            let route = non_empty(q.path.as_deref())
                .ok_or_else(|| AdapterFailure::Validation("path is required".to_string()))?;
            let auth = match q.user {
                Some(user) => AuthState::SignedIn(user),
                None if q.initializing => AuthState::Initializing,
                None => AuthState::SignedOut,
            };
            Ok(route_decision_payload(route, &auth, batch.len()))
        }
        _ => Err(AdapterFailure::UnsupportedEndpoint(format!(
            "unsupported endpoint path: {path}"
        ))),
    }
}

fn main() {
    let args = env::args().skip(1).collect::<Vec<_>>();
    let pretty = parse_bool_flag(&args, "--pretty");
    let verbose = parse_bool_flag(&args, "--verbose");
    if verbose {
        init_tracing(true);
    }

    let config = load_config().unwrap_or_else(|err| {
        tracing::warn!("config load failed, using defaults: {err:#}");
        AppConfig::default()
    });

    let resp = match read_stdin_json()
        .and_then(|v| {
            serde_json::from_value::<AdapterRequest>(v)
                .map_err(|e| AdapterFailure::Protocol(format!("request root invalid: {e}")))
        })
        .and_then(|req| {
            if let Some(case_id) = req.case.as_ref().and_then(|c| c.id.as_deref()) {
                tracing::debug!(case = case_id, "adapter case");
            }
            tracing::debug!(
                endpoint = req.endpoint.path.as_deref().unwrap_or_default(),
                dataset = req.dataset.file_path.as_deref().unwrap_or_default(),
                "adapter request"
            );
            dispatch(req, &config)
        }) {
        Ok(payload) => AdapterResponse::Success { payload },
        Err(failure) => failure.into_response(),
    };

    let out = if pretty {
        serde_json::to_string_pretty(&resp)
    } else {
        serde_json::to_string(&resp)
    }
    .unwrap_or_else(|e| {
        json!({
            "status": "error",
            "error": {
                "category": "ADAPTER_PROTOCOL_ERROR",
                "message": format!("serialize response failed: {e}"),
                "type": "SerializeError",
            }
        })
        .to_string()
    });

    print!("{out}");
}
