use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::{PoisonError, RwLock};

use crate::app_error::AppError;
use crate::navigation::Route;

/// User object handed back by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "photoURL", default)]
    pub photo_url: String,
    pub creation_time: String,
    pub last_sign_in_time: String,
}

impl AuthUser {
    /// First sign-in: the provider reports identical creation and last-sign-in stamps.
    pub fn is_new_user(&self) -> bool {
        self.creation_time == self.last_sign_in_time
    }

    pub fn landing_route(&self) -> Route {
        if self.is_new_user() {
            Route::Upload
        } else {
            Route::Dashboard
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "user", rename_all = "snake_case")]
pub enum AuthState {
    Initializing,
    SignedOut,
    SignedIn(AuthUser),
}

/// External popup sign-in. The protocol itself lives outside this crate.
pub trait IdentityProvider {
    fn sign_in_with_popup(&self) -> impl Future<Output = Result<AuthUser, String>> + Send;
}

/// Popup result reported back by the webview, which runs the provider SDK.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum PopupOutcome {
    Completed(AuthUser),
    Failed(String),
}

impl IdentityProvider for PopupOutcome {
    fn sign_in_with_popup(&self) -> impl Future<Output = Result<AuthUser, String>> + Send {
        std::future::ready(match self {
            PopupOutcome::Completed(user) => Ok(user.clone()),
            PopupOutcome::Failed(message) => Err(message.clone()),
        })
    }
}

#[derive(Debug)]
pub struct AuthSession {
    state: RwLock<AuthState>,
}

impl Default for AuthSession {
    fn default() -> Self {
        Self {
            state: RwLock::new(AuthState::Initializing),
        }
    }
}

impl AuthSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> AuthState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        match self.state() {
            AuthState::SignedIn(user) => Some(user),
            _ => None,
        }
    }

    fn set_state(&self, next: AuthState) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = next;
    }

    /// Auth-state callback from the provider; ends the initializing phase.
    pub fn observe(&self, user: Option<AuthUser>) {
        self.set_state(match user {
            Some(user) => AuthState::SignedIn(user),
            None => AuthState::SignedOut,
        });
    }

    /// Records a completed sign-in and returns where the user should land.
    pub fn complete_sign_in(&self, user: AuthUser) -> Route {
        let landing = user.landing_route();
        tracing::info!(
            email = %user.email,
            new_user = user.is_new_user(),
            landing = %landing.path(),
            "signed in"
        );
        self.set_state(AuthState::SignedIn(user));
        landing
    }

    pub async fn sign_in<P: IdentityProvider>(&self, provider: &P) -> Result<Route, AppError> {
        match provider.sign_in_with_popup().await {
            Ok(user) => Ok(self.complete_sign_in(user)),
            Err(message) => {
                tracing::warn!("sign-in failed: {message}");
                Err(AppError::AuthFailure(message))
            }
        }
    }

    pub fn sign_out(&self) {
        tracing::info!("signed out");
        self.set_state(AuthState::SignedOut);
    }
}
