pub mod health;
pub use self::health::health;

pub mod recover;
pub mod register;
pub mod session;
pub mod types;

// common functions for the handlers
use axum::{
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use tracing::error;

use super::AppState;
use session::{session_cookie, RequestSession};

/// Response headers for a request's session; sets the cookie when the
/// session was just opened.
pub(crate) fn session_headers(state: &AppState, session: &RequestSession) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if session.fresh {
        match session_cookie(
            &session.id,
            state.session_ttl_seconds(),
            state.secure_cookies(),
        ) {
            Ok(cookie) => {
                headers.insert(SET_COOKIE, cookie);
            }
            Err(err) => error!("Failed to build session cookie: {err}"),
        }
    }
    headers
}

/// Log a collaborator fault and hide it behind a generic 500.
pub(crate) fn internal_error(err: &anyhow::Error) -> Response {
    error!("Request failed: {err:#}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "success": false, "error": "Internal server error" })),
    )
        .into_response()
}
