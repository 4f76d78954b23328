use serde::Deserialize;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "sheetpulse.toml";
const CONFIG_PATH_ENV: &str = "SHEETPULSE_CONFIG";

pub const DEFAULT_MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;
pub const DEFAULT_MAX_INVALID_ROW_RATIO: f64 = 0.5;
pub const DEFAULT_CONNECT_DELAY_MS: u64 = 1500;
pub const DEFAULT_ASSISTANT_TOP_N: usize = 3;

const DEFAULT_CONFIG: &str = r#"
[upload]
max_file_bytes = 10485760
max_invalid_row_ratio = 0.5

[integrations]
connect_delay_ms = 1500

[assistant]
top_n = 3
"#;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub upload: UploadConfig,
    pub integrations: IntegrationConfig,
    pub assistant: AssistantConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct UploadConfig {
    pub max_file_bytes: u64,
    pub max_invalid_row_ratio: f64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct IntegrationConfig {
    pub connect_delay_ms: u64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AssistantConfig {
    pub top_n: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            upload: UploadConfig::default(),
            integrations: IntegrationConfig::default(),
            assistant: AssistantConfig::default(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            max_invalid_row_ratio: DEFAULT_MAX_INVALID_ROW_RATIO,
        }
    }
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            connect_delay_ms: DEFAULT_CONNECT_DELAY_MS,
        }
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_ASSISTANT_TOP_N,
        }
    }
}

impl UploadConfig {
    pub fn limit_mib(&self) -> u64 {
        self.max_file_bytes / (1024 * 1024)
    }
}

pub fn parse_config(contents: &str) -> anyhow::Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents)?;
    if !(0.0..=1.0).contains(&config.upload.max_invalid_row_ratio) {
        anyhow::bail!(
            "upload.max_invalid_row_ratio must be between 0 and 1, got {}",
            config.upload.max_invalid_row_ratio
        );
    }
    if config.upload.max_file_bytes == 0 {
        anyhow::bail!("upload.max_file_bytes must be positive");
    }
    Ok(config)
}

fn load_config_file(path: &Path) -> anyhow::Result<AppConfig> {
    tracing::info!("Loading config from: {}", path.display());
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

// exe dir first, then SHEETPULSE_CONFIG, then the embedded default
pub fn load_config() -> anyhow::Result<AppConfig> {
    if let Some(path) = exe_config_path() {
        if path.exists() {
            return load_config_file(&path);
        }
        tracing::debug!("{} not found at: {}", CONFIG_FILE_NAME, path.display());
    }

    if let Ok(raw) = std::env::var(CONFIG_PATH_ENV) {
        let raw = raw.trim();
        if !raw.is_empty() {
            return load_config_file(Path::new(raw));
        }
    }

    tracing::info!("Using default embedded configuration");
    parse_config(DEFAULT_CONFIG)
}

fn exe_config_path() -> Option<PathBuf> {
    let exe_path = std::env::current_exe().ok()?;
    exe_path.parent().map(|dir| dir.join(CONFIG_FILE_NAME))
}
