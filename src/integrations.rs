use chrono::{SecondsFormat, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::app_error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Amazon,
    Shopify,
}

impl Platform {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "amazon" => Ok(Platform::Amazon),
            "shopify" => Ok(Platform::Shopify),
            other => Err(AppError::InvalidIntegrationForm(format!(
                "unknown platform: {other}"
            ))),
        }
    }
}

/// Form payload of a "connect" action, tagged by platform.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "platform", rename_all = "snake_case")]
pub enum ConnectRequest {
    Amazon {
        email: Option<String>,
        store: Option<String>,
    },
    Shopify {
        #[serde(rename = "storeUrl", alias = "store_url")]
        store_url: Option<String>,
        #[serde(rename = "apiKey", alias = "api_key")]
        api_key: Option<String>,
    },
}

fn required_field(raw: &Option<String>, field: &str) -> Result<String, AppError> {
    let value = raw.as_deref().unwrap_or_default().trim().to_string();
    if value.is_empty() {
        return Err(AppError::InvalidIntegrationForm(format!("{field} is required")));
    }
    Ok(value)
}

impl ConnectRequest {
    pub fn platform(&self) -> Platform {
        match self {
            ConnectRequest::Amazon { .. } => Platform::Amazon,
            ConnectRequest::Shopify { .. } => Platform::Shopify,
        }
    }

    /// Validates the form and returns the label shown for the connected account.
    pub fn account_label(&self) -> Result<String, AppError> {
        match self {
            ConnectRequest::Amazon { email, store } => {
                let email = required_field(email, "email")?;
                if !email.contains('@') {
                    return Err(AppError::InvalidIntegrationForm(
                        "email must be a valid address".to_string(),
                    ));
                }
                let store = required_field(store, "store")?;
                Ok(format!("{store} ({email})"))
            }
            ConnectRequest::Shopify { store_url, api_key } => {
                let store_url = required_field(store_url, "storeUrl")?;
                required_field(api_key, "apiKey")?;
                Ok(store_url)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MockStoreMetrics {
    pub orders: u32,
    pub revenue: f64,
    pub conversion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntegrationStatus {
    pub platform: Platform,
    pub connected: bool,
    pub account_label: String,
    pub connected_at: String,
    pub metrics: MockStoreMetrics,
}

/// Stand-in for network latency in the mock connect flow.
pub trait ConnectDelay {
    fn wait(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioDelay;

impl ConnectDelay for TokioDelay {
    fn wait(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl ConnectDelay for NoDelay {
    fn wait(&self, _duration: Duration) -> impl Future<Output = ()> + Send {
        std::future::ready(())
    }
}

#[derive(Debug)]
pub struct IntegrationHub {
    connections: Mutex<BTreeMap<Platform, IntegrationStatus>>,
    rng: Mutex<StdRng>,
    delay: Duration,
}

impl IntegrationHub {
    pub fn new(delay: Duration) -> Self {
        Self::with_rng(delay, StdRng::from_entropy())
    }

    pub fn with_seed(delay: Duration, seed: u64) -> Self {
        Self::with_rng(delay, StdRng::seed_from_u64(seed))
    }

    fn with_rng(delay: Duration, rng: StdRng) -> Self {
        Self {
            connections: Mutex::new(BTreeMap::new()),
            rng: Mutex::new(rng),
            delay,
        }
    }

    fn mock_metrics(&self, platform: Platform) -> MockStoreMetrics {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let (orders_range, ticket_range) = match platform {
            Platform::Amazon => (120..900_u32, 350.0..2400.0),
            Platform::Shopify => (40..400_u32, 500.0..3200.0),
        };
        let orders = rng.gen_range(orders_range);
        let avg_ticket: f64 = rng.gen_range(ticket_range);
        let conversion: f64 = rng.gen_range(0.8..4.5);
        MockStoreMetrics {
            orders,
            revenue: (orders as f64 * avg_ticket).round(),
            conversion_rate: (conversion * 100.0).round() / 100.0,
        }
    }

    /// Simulated connect: validate, wait, then flip the connected flag.
    pub async fn connect<D: ConnectDelay>(
        &self,
        request: ConnectRequest,
        delay: &D,
    ) -> Result<IntegrationStatus, AppError> {
        let platform = request.platform();
        let account_label = request.account_label()?;
        tracing::debug!(?platform, "connecting mock integration");

        delay.wait(self.delay).await;

        let status = IntegrationStatus {
            platform,
            connected: true,
            account_label,
            connected_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            metrics: self.mock_metrics(platform),
        };
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(platform, status.clone());
        tracing::info!(?platform, account = %status.account_label, "mock integration connected");
        Ok(status)
    }

    pub fn disconnect(&self, platform: Platform) -> bool {
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&platform)
            .is_some()
    }

    pub fn is_connected(&self, platform: Platform) -> bool {
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&platform)
    }

    pub fn status(&self) -> Vec<IntegrationStatus> {
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[derive(Default)]
    struct RecordingDelay {
        waited_ms: AtomicU64,
    }

    impl ConnectDelay for RecordingDelay {
        fn wait(&self, duration: Duration) -> impl Future<Output = ()> + Send {
            self.waited_ms
                .fetch_add(duration.as_millis() as u64, Ordering::SeqCst);
            std::future::ready(())
        }
    }

    fn amazon(email: &str, store: &str) -> ConnectRequest {
        ConnectRequest::Amazon {
            email: Some(email.to_string()),
            store: Some(store.to_string()),
        }
    }

    #[tokio::test]
    async fn connect_waits_the_configured_delay_then_flips_the_flag() {
        let hub = IntegrationHub::with_seed(Duration::from_millis(1500), 7);
        let delay = RecordingDelay::default();
        assert!(!hub.is_connected(Platform::Amazon));

        let status = hub
            .connect(amazon(" seller@example.com ", "Acme"), &delay)
            .await
            .expect("connect");

        assert_eq!(delay.waited_ms.load(Ordering::SeqCst), 1500);
        assert!(status.connected);
        assert_eq!(status.account_label, "Acme (seller@example.com)");
        assert!(hub.is_connected(Platform::Amazon));
        assert!(!hub.is_connected(Platform::Shopify));
    }

    #[tokio::test]
    async fn invalid_forms_never_connect() {
        let hub = IntegrationHub::with_seed(Duration::ZERO, 1);
        let err = hub
            .connect(amazon("not-an-email", "Acme"), &NoDelay)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidIntegrationForm(_)));

        let err = hub
            .connect(
                ConnectRequest::Shopify {
                    store_url: Some("shop.example.com".to_string()),
                    api_key: Some("   ".to_string()),
                },
                &NoDelay,
            )
            .await
            .unwrap_err();
        assert_eq!(
            err,
            AppError::InvalidIntegrationForm("apiKey is required".to_string())
        );
        assert!(hub.status().is_empty());
    }

    #[tokio::test]
    async fn seeded_metrics_are_reproducible_and_in_range() {
        let a = IntegrationHub::with_seed(Duration::ZERO, 42);
        let b = IntegrationHub::with_seed(Duration::ZERO, 42);
        let req = ConnectRequest::Shopify {
            store_url: Some("shop.example.com".to_string()),
            api_key: Some("key".to_string()),
        };
        let sa = a.connect(req.clone(), &NoDelay).await.expect("connect a");
        let sb = b.connect(req, &NoDelay).await.expect("connect b");
        assert_eq!(sa.metrics, sb.metrics);
        assert!((40..400).contains(&sa.metrics.orders));
        assert!(sa.metrics.conversion_rate >= 0.8 && sa.metrics.conversion_rate <= 4.5);
    }

    #[tokio::test]
    async fn reconnect_and_disconnect() {
        let hub = IntegrationHub::with_seed(Duration::ZERO, 3);
        hub.connect(amazon("a@example.com", "First"), &NoDelay)
            .await
            .expect("first");
        hub.connect(amazon("a@example.com", "Second"), &NoDelay)
            .await
            .expect("second");
        let status = hub.status();
        assert_eq!(status.len(), 1);
        assert_eq!(status[0].account_label, "Second (a@example.com)");
        assert!(hub.disconnect(Platform::Amazon));
        assert!(!hub.disconnect(Platform::Amazon));
    }

    #[test]
    fn request_json_is_tagged_by_platform() {
        let req: ConnectRequest = serde_json::from_value(serde_json::json!({
            "platform": "shopify",
            "storeUrl": "shop.example.com",
            "apiKey": "dummy",
        }))
        .expect("parse request");
        assert_eq!(req.platform(), Platform::Shopify);
        assert_eq!(Platform::parse(" Amazon ").expect("parse"), Platform::Amazon);
        assert!(Platform::parse("ebay").is_err());
    }
}
