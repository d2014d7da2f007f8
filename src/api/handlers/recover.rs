use axum::{
    extract::{Extension, Form, Query},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::instrument;

use super::{
    internal_error,
    types::{RecoveryRequest, RecoveryResponse},
};
use crate::{
    api::AppState,
    registrar::{FieldMap, RequestKind},
};

#[utoipa::path(
    get,
    path= "/register/recover",
    responses (
        (status = 200, description = "Password recovery form", body = RecoveryResponse)
    ),
    tag= "recover"
)]
// axum handler for the recovery form
#[instrument(skip_all)]
pub async fn recover_form(state: Extension<Arc<AppState>>) -> Response {
    handle(&state, RequestKind::Display, "")
}

#[utoipa::path(
    post,
    path= "/register/recover",
    request_body(content = RecoveryRequest, content_type = "application/x-www-form-urlencoded"),
    responses (
        (status = 200, description = "Recovery email sent, or the reason it was not", body = RecoveryResponse),
        (status = 500, description = "Internal server error")
    ),
    tag= "recover"
)]
// axum handler for recovery submissions
#[instrument(skip_all)]
pub async fn recover_submit(
    state: Extension<Arc<AppState>>,
    Query(mut raw): Query<FieldMap>,
    form: Option<Form<FieldMap>>,
) -> Response {
    if let Some(Form(body)) = form {
        raw.extend(body);
    }
    let identifier = raw.get("username").map_or("", String::as_str);
    handle(&state, RequestKind::Submit, identifier)
}

fn handle(state: &AppState, kind: RequestKind, identifier: &str) -> Response {
    match state.recovery().request_recovery(kind, identifier) {
        Ok(outcome) => (StatusCode::OK, Json(RecoveryResponse::from(outcome))).into_response(),
        Err(err) => internal_error(&err),
    }
}
