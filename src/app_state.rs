use serde_json::Value;
use std::time::Duration;

use crate::app_config::AppConfig;
use crate::auth_session::AuthSession;
use crate::integrations::IntegrationHub;
use crate::navigation::route_decision_payload;
use crate::row_store::RowStore;

/// Everything one session shares between commands.
#[derive(Debug)]
pub struct AppState {
    pub config: AppConfig,
    pub rows: RowStore,
    pub auth: AuthSession,
    pub integrations: IntegrationHub,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let delay = Duration::from_millis(config.integrations.connect_delay_ms);
        Self {
            config,
            rows: RowStore::new(),
            auth: AuthSession::new(),
            integrations: IntegrationHub::new(delay),
        }
    }

    /// Drops the user and the rows uploaded under them.
    pub fn sign_out(&self) {
        self.auth.sign_out();
        self.rows.clear();
    }

    pub fn route_payload(&self, path: &str) -> Value {
        route_decision_payload(path, &self.auth.state(), self.rows.row_count())
    }
}
