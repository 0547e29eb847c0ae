//! Form submissions: appends the raw body to the form sheet and redirects to the
//! success page.

use crate::endpoint::{AppState, Endpoint, FailurePolicy, Outcome};
use crate::metrics_defs::FORM_REQUESTS;
use crate::responses;
use crate::rows::{FormSubmissionRow, timestamp};
use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, Method, Uri},
    response::Response,
};
use http_body_util::LengthLimitError;
use shared::counter;
use std::error::Error;

pub async fn handle(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let destination = &state.form;
    let success = || responses::redirect(responses::success_url(destination.apex_domain()));

    // Request shape is only checked, and the body only read, when submissions are
    // actually being stored.
    let body = if destination.is_enabled() {
        if method != Method::POST {
            counter!(FORM_REQUESTS, "outcome" => "invalid").increment(1);
            return responses::invalid_method();
        }
        match read_body(body, state.form_body_limit).await {
            Ok(body) if !body.is_empty() => body,
            Ok(_) => {
                counter!(FORM_REQUESTS, "outcome" => "invalid").increment(1);
                return responses::invalid_method();
            }
            Err(response) => {
                counter!(FORM_REQUESTS, "outcome" => "unreadable").increment(1);
                return response;
            }
        }
    } else {
        Bytes::new()
    };

    let received_at = timestamp(chrono::Utc::now());
    let body = String::from_utf8_lossy(&body);

    let outcome = destination
        .record(Endpoint::Form, &headers, &uri, || {
            FormSubmissionRow::new(received_at, &body, &headers).into()
        })
        .await;

    counter!(FORM_REQUESTS, "outcome" => outcome.as_str()).increment(1);

    match outcome {
        Outcome::Rejected(_) => responses::teapot(),
        Outcome::Failed(err) if Endpoint::Form.failure_policy() == FailurePolicy::FailClosed => {
            responses::write_failed(&err)
        }
        _ => success(),
    }
}

async fn read_body(body: Body, limit: usize) -> Result<Bytes, Response> {
    axum::body::to_bytes(body, limit).await.map_err(|err| {
        if err.source().is_some_and(|source| source.is::<LengthLimitError>()) {
            tracing::info!(limit, "form body over limit");
            responses::payload_too_large()
        } else {
            tracing::debug!(error = %err, "could not read form body");
            responses::invalid_method()
        }
    })
}
