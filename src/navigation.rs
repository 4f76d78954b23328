use serde::Serialize;
use serde_json::{json, Value};

use crate::auth_session::AuthState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "page", content = "index", rename_all = "snake_case")]
pub enum Route {
    Login,
    Upload,
    Dashboard,
    Product(usize),
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::Upload => "/upload".to_string(),
            Route::Dashboard => "/dashboard".to_string(),
            Route::Product(index) => format!("/product/{index}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "route", rename_all = "snake_case")]
pub enum RouteDecision {
    Render(Route),
    Redirect(Route),
    /// Auth state not known yet; show the loading screen.
    Pending,
}

enum PathMatch<'a> {
    Login,
    Upload,
    Dashboard,
    Product(&'a str),
    Unknown,
}

fn match_path(path: &str) -> PathMatch<'_> {
    let path = path.split(['?', '#']).next().unwrap_or_default().trim();
    let path = path.trim_end_matches('/');
    let segments = path
        .trim_start_matches('/')
        .split('/')
        .collect::<Vec<_>>();
    match segments.as_slice() {
        ["login"] => PathMatch::Login,
        ["upload"] => PathMatch::Upload,
        ["dashboard"] => PathMatch::Dashboard,
        ["product", id] if !id.is_empty() => PathMatch::Product(*id),
        _ => PathMatch::Unknown,
    }
}

/// Decides what to show for `path` given the auth state and the number of loaded rows.
pub fn resolve_route(path: &str, auth: &AuthState, row_count: usize) -> RouteDecision {
    let matched = match_path(path);
    match matched {
        PathMatch::Login => return RouteDecision::Render(Route::Login),
        PathMatch::Unknown => return RouteDecision::Redirect(Route::Dashboard),
        _ => {}
    }

    match auth {
        AuthState::Initializing => return RouteDecision::Pending,
        AuthState::SignedOut => return RouteDecision::Redirect(Route::Login),
        AuthState::SignedIn(_) => {}
    }

    match matched {
        PathMatch::Upload => RouteDecision::Render(Route::Upload),
        PathMatch::Dashboard => RouteDecision::Render(Route::Dashboard),
        PathMatch::Product(raw) => match raw.parse::<usize>() {
            Ok(index) if index < row_count => RouteDecision::Render(Route::Product(index)),
            _ => RouteDecision::Redirect(Route::Dashboard),
        },
        PathMatch::Login | PathMatch::Unknown => RouteDecision::Redirect(Route::Dashboard),
    }
}

pub fn route_decision_payload(path: &str, auth: &AuthState, row_count: usize) -> Value {
    let decision = resolve_route(path, auth, row_count);
    let target = match decision {
        RouteDecision::Render(route) | RouteDecision::Redirect(route) => Some(route.path()),
        RouteDecision::Pending => None,
    };
    json!({
        "requested": path,
        "decision": decision,
        "target_path": target,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth_session::AuthUser;

    fn signed_in() -> AuthState {
        AuthState::SignedIn(AuthUser {
            uid: "u1".to_string(),
            display_name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            photo_url: String::new(),
            creation_time: "t0".to_string(),
            last_sign_in_time: "t1".to_string(),
        })
    }

    #[test]
    fn out_of_range_product_redirects_to_dashboard() {
        assert_eq!(
            resolve_route("/product/5", &signed_in(), 3),
            RouteDecision::Redirect(Route::Dashboard)
        );
        assert_eq!(
            resolve_route("/product/2", &signed_in(), 3),
            RouteDecision::Render(Route::Product(2))
        );
    }

    #[test]
    fn malformed_product_index_redirects_to_dashboard() {
        for path in ["/product/abc", "/product/-1", "/product/1.5", "/product/"] {
            assert_eq!(
                resolve_route(path, &signed_in(), 3),
                RouteDecision::Redirect(Route::Dashboard),
                "path {path}"
            );
        }
        assert_eq!(
            resolve_route("/product/0", &signed_in(), 0),
            RouteDecision::Redirect(Route::Dashboard)
        );
    }

    #[test]
    fn protected_routes_need_a_user() {
        for path in ["/upload", "/dashboard", "/product/0"] {
            assert_eq!(
                resolve_route(path, &AuthState::SignedOut, 3),
                RouteDecision::Redirect(Route::Login)
            );
            assert_eq!(
                resolve_route(path, &AuthState::Initializing, 3),
                RouteDecision::Pending
            );
        }
        assert_eq!(
            resolve_route("/login", &AuthState::SignedOut, 0),
            RouteDecision::Render(Route::Login)
        );
    }

    #[test]
    fn unknown_paths_fall_back_to_dashboard() {
        assert_eq!(
            resolve_route("/", &signed_in(), 0),
            RouteDecision::Redirect(Route::Dashboard)
        );
        assert_eq!(
            resolve_route("/reports/2024", &AuthState::SignedOut, 0),
            RouteDecision::Redirect(Route::Dashboard)
        );
        assert_eq!(
            resolve_route("/dashboard/?tab=Profit", &signed_in(), 0),
            RouteDecision::Render(Route::Dashboard)
        );
    }

    #[test]
    fn payload_names_the_target_path() {
        let payload = route_decision_payload("/product/1", &signed_in(), 2);
        assert_eq!(payload["target_path"], "/product/1");
        assert_eq!(payload["decision"]["action"], "render");
        assert_eq!(payload["decision"]["route"]["page"], "product");
        assert_eq!(payload["decision"]["route"]["index"], 1);
    }
}
