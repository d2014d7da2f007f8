use axum::{
    extract::{Extension, Form, Query},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::instrument;

use super::{
    internal_error, session::resolve_session, session_headers,
    types::{RegistrationForm, RegistrationResponse},
};
use crate::{
    api::AppState,
    registrar::{FieldMap, RegistrationOutcome, RequestKind},
};

#[utoipa::path(
    get,
    path= "/register",
    responses (
        (status = 200, description = "Registration form with any preset fields", body = RegistrationResponse),
        (status = 403, description = "Already logged in or registration disabled", body = RegistrationResponse),
        (status = 500, description = "Internal server error")
    ),
    tag= "register"
)]
// axum handler for the registration form
#[instrument(skip_all)]
pub async fn register_form(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    Query(raw): Query<FieldMap>,
) -> Response {
    handle(headers, state.0, RequestKind::Display, raw).await
}

#[utoipa::path(
    post,
    path= "/register",
    request_body(content = RegistrationForm, content_type = "application/x-www-form-urlencoded"),
    responses (
        (status = 201, description = "Account registered and session elevated", body = RegistrationResponse),
        (status = 200, description = "Registration failed validation", body = RegistrationResponse),
        (status = 403, description = "Already logged in or registration disabled", body = RegistrationResponse),
        (status = 500, description = "Internal server error")
    ),
    tag= "register"
)]
// axum handler for registration submissions
#[instrument(skip_all)]
pub async fn register_submit(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    Query(mut raw): Query<FieldMap>,
    form: Option<Form<FieldMap>>,
) -> Response {
    if let Some(Form(body)) = form {
        raw.extend(body);
    }
    handle(headers, state.0, RequestKind::Submit, raw).await
}

async fn handle(
    headers: HeaderMap,
    state: Arc<AppState>,
    kind: RequestKind,
    raw: FieldMap,
) -> Response {
    // Saving hashes the password; keep it off the async workers.
    let worker = state.clone();
    let result = tokio::task::spawn_blocking(move || {
        let session = resolve_session(worker.sessions(), &headers)?;
        let outcome = worker
            .registration()
            .register(kind, &raw, &session.id, &FieldMap::new())?;
        anyhow::Ok((session, outcome))
    })
    .await
    .map_err(anyhow::Error::from)
    .and_then(|result| result);

    let (session, outcome) = match result {
        Ok(pair) => pair,
        Err(err) => return internal_error(&err),
    };

    let status = match outcome {
        RegistrationOutcome::Complete { .. } => StatusCode::CREATED,
        RegistrationOutcome::Denied(_) => StatusCode::FORBIDDEN,
        RegistrationOutcome::Form { .. } => StatusCode::OK,
    };

    (
        status,
        session_headers(&state, &session),
        Json(RegistrationResponse::from(&outcome)),
    )
        .into_response()
}
