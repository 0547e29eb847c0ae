//! Pageview beacon: records one analytics row and always answers with a pixel.

use crate::endpoint::{AppState, Endpoint, FailurePolicy, Outcome};
use crate::extract::PageView;
use crate::metrics_defs::BEACON_REQUESTS;
use crate::responses;
use crate::rows::{AnalyticsRow, timestamp};
use axum::{
    extract::State,
    http::{HeaderMap, Uri},
    response::Response,
};
use shared::counter;

pub async fn handle(State(state): State<AppState>, uri: Uri, headers: HeaderMap) -> Response {
    let received_at = timestamp(chrono::Utc::now());

    let outcome = state
        .beacon
        .record(Endpoint::Beacon, &headers, &uri, || {
            AnalyticsRow::new(received_at, PageView::from_query(uri.query()), &headers).into()
        })
        .await;

    counter!(BEACON_REQUESTS, "outcome" => outcome.as_str()).increment(1);

    match outcome {
        Outcome::Rejected(_) => responses::teapot(),
        Outcome::Failed(err) if Endpoint::Beacon.failure_policy() == FailurePolicy::FailClosed => {
            responses::write_failed(&err)
        }
        _ => responses::pixel(),
    }
}
