use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::headers::authorization::Basic;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use subtle::ConstantTimeEq;

use crate::config::BasicAuthConfig;
use crate::ServiceState;

/// Rejects requests whose basic credentials do not match the configured pair.
pub async fn require_basic_auth(
    State(state): State<ServiceState>,
    credentials: Option<TypedHeader<Authorization<Basic>>>,
    request: Request,
    next: Next,
) -> Response {
    let authorized = credentials
        .map(|TypedHeader(Authorization(basic))| {
            credentials_match(state.credentials(), basic.username(), basic.password())
        })
        .unwrap_or(false);

    if !authorized {
        tracing::info!(path = %request.uri().path(), "rejected unauthenticated request");
        return unauthorized();
    }
    next.run(request).await
}

fn credentials_match(expected: &BasicAuthConfig, username: &str, password: &str) -> bool {
    let username = constant_time_eq(username, &expected.username);
    let password = constant_time_eq(password, &expected.password);
    username & password
}

/// Slices of different lengths compare unequal without inspecting content.
fn constant_time_eq(provided: &str, expected: &str) -> bool {
    provided.as_bytes().ct_eq(expected.as_bytes()).into()
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Basic")],
        Json(serde_json::json!({"message": "Unauthorized; authentication required"})),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expected() -> BasicAuthConfig {
        BasicAuthConfig {
            username: "egress".into(),
            password: "secret".into(),
        }
    }

    #[test]
    fn test_credentials_match() {
        assert!(credentials_match(&expected(), "egress", "secret"));
        assert!(!credentials_match(&expected(), "egress", "wrong"));
        assert!(!credentials_match(&expected(), "other", "secret"));
        assert!(!credentials_match(&expected(), "egress", "secret-but-longer"));
        assert!(!credentials_match(&expected(), "", ""));
    }

    #[test]
    fn test_constant_time_eq_lengths() {
        assert!(constant_time_eq("secret", "secret"));
        assert!(constant_time_eq("", ""));
        assert!(!constant_time_eq("secre", "secret"));
        assert!(!constant_time_eq("secrets", "secret"));
        assert!(!constant_time_eq("", "secret"));
    }

    #[test]
    fn test_unauthorized_response() {
        let response = unauthorized();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Basic");
    }
}
