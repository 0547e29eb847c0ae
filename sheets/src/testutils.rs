//! In-process stand-in for the Sheets v4 endpoints used by [`SpreadsheetClient`].
//!
//! [`SpreadsheetClient`]: crate::SpreadsheetClient

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::get,
};
use indexmap::IndexMap;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use url::Url;

pub const MOCK_TOKEN: &str = "mock-token";

#[derive(Default)]
struct MockState {
    title: String,
    sheets: IndexMap<String, Vec<String>>,
    appended: Vec<(String, Vec<String>)>,
    fail_appends_with: Option<StatusCode>,
    requests: usize,
}

#[derive(Clone, Default)]
pub struct MockSheets {
    state: Arc<Mutex<MockState>>,
}

impl MockSheets {
    pub fn new(title: &str) -> Self {
        let mock = MockSheets::default();
        mock.state.lock().unwrap().title = title.to_string();
        mock
    }

    pub fn with_sheet(self, title: &str, header: &[&str]) -> Self {
        self.state.lock().unwrap().sheets.insert(
            title.to_string(),
            header.iter().map(|h| h.to_string()).collect(),
        );
        self
    }

    pub fn fail_appends_with(&self, status: StatusCode) {
        self.state.lock().unwrap().fail_appends_with = Some(status);
    }

    /// `(sheet title, values)` for every append received so far.
    pub fn appended(&self) -> Vec<(String, Vec<String>)> {
        self.state.lock().unwrap().appended.clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.lock().unwrap().requests
    }

    /// Serves the mock on an ephemeral port and returns its base URL.
    pub async fn spawn(&self) -> Url {
        let app = Router::new()
            .route("/v4/spreadsheets/{id}", get(document))
            .route(
                "/v4/spreadsheets/{id}/values/{range}",
                get(header_row).post(append),
            )
            .with_state(self.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Url::parse(&format!("http://{addr}")).unwrap()
    }

    fn authorize(&self, headers: &HeaderMap) -> Result<(), Response> {
        self.state.lock().unwrap().requests += 1;

        let expected = format!("Bearer {MOCK_TOKEN}");
        match headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
            Some(value) if value == expected => Ok(()),
            _ => Err(api_error(
                StatusCode::UNAUTHORIZED,
                "Request had invalid authentication credentials.",
            )),
        }
    }
}

fn api_error(status: StatusCode, message: &str) -> Response {
    let body = json!({
        "error": { "code": status.as_u16(), "message": message, "status": "ERROR" }
    });
    (status, Json(body)).into_response()
}

/// `'Title'!1:1` or `'Title':append` -> `Title`
fn title_from_range(range: &str) -> String {
    let range = range.strip_suffix(":append").unwrap_or(range);
    let range = range.split_once('!').map(|(t, _)| t).unwrap_or(range);
    range
        .trim_start_matches('\'')
        .trim_end_matches('\'')
        .replace("''", "'")
}

async fn document(
    State(mock): State<MockSheets>,
    Path(_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = mock.authorize(&headers) {
        return response;
    }

    let state = mock.state.lock().unwrap();
    let sheets: Vec<Value> = state
        .sheets
        .keys()
        .enumerate()
        .map(|(index, title)| {
            json!({ "properties": { "sheetId": index * 1000, "title": title, "index": index } })
        })
        .collect();

    Json(json!({ "properties": { "title": state.title }, "sheets": sheets })).into_response()
}

async fn header_row(
    State(mock): State<MockSheets>,
    Path((_id, range)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = mock.authorize(&headers) {
        return response;
    }

    let title = title_from_range(&range);
    let state = mock.state.lock().unwrap();
    match state.sheets.get(&title) {
        Some(header) if header.is_empty() => Json(json!({ "range": range })).into_response(),
        Some(header) => Json(json!({ "range": range, "values": [header] })).into_response(),
        None => api_error(
            StatusCode::BAD_REQUEST,
            &format!("Unable to parse range: {range}"),
        ),
    }
}

async fn append(
    State(mock): State<MockSheets>,
    Path((_id, range)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(response) = mock.authorize(&headers) {
        return response;
    }

    let mut state = mock.state.lock().unwrap();
    if let Some(status) = state.fail_appends_with {
        return api_error(status, "append rejected");
    }

    let values: Vec<String> = body["values"][0]
        .as_array()
        .map(|cells| {
            cells
                .iter()
                .map(|c| c.as_str().unwrap_or_default().to_string())
                .collect()
        })
        .unwrap_or_default();
    state.appended.push((title_from_range(&range), values));

    Json(json!({ "spreadsheetId": "mock", "updates": { "updatedRows": 1 } })).into_response()
}
