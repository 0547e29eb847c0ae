use crate::config::Config;
use crate::endpoint::{AppState, Destination, Endpoint};
use crate::settings::{Configuration, MissingSettings, SpreadsheetSettings};
use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Response, StatusCode};
use http_body_util::BodyExt;
use sheets::{Row, RowAppender, ServiceAccountKey, SheetsError};
use std::sync::{Arc, Mutex};

pub const APEX: &str = "example.com";

/// Complete settings for `endpoint` with the apex domain [`APEX`].
pub fn complete(endpoint: Endpoint) -> Configuration {
    Configuration::Complete(SpreadsheetSettings {
        credentials: ServiceAccountKey::new("svc@example.iam.gserviceaccount.com", "key"),
        spreadsheet_id: "doc-1".into(),
        sheet_title: match endpoint {
            Endpoint::Beacon => "Analytics".into(),
            Endpoint::Form => "Forms".into(),
        },
        apex_domain: APEX.into(),
    })
}

/// Settings where everything but the apex domain is missing.
pub fn incomplete(endpoint: Endpoint, apex_domain: Option<&str>) -> Configuration {
    let required = endpoint.required_settings();
    Configuration::Incomplete(MissingSettings {
        required,
        missing: required.to_vec(),
        apex_domain: apex_domain.map(str::to_string),
    })
}

/// Router where `endpoint` writes through `appender` and the other endpoint is disabled.
pub fn router_for(endpoint: Endpoint, configuration: Configuration, appender: &RecordingAppender) -> Router {
    let active = Destination::with_appender(configuration, |_| appender.shared());
    let (beacon, form) = match endpoint {
        Endpoint::Beacon => (active, Destination::with_appender(incomplete(Endpoint::Form, None), |_| appender.shared())),
        Endpoint::Form => (Destination::with_appender(incomplete(Endpoint::Beacon, None), |_| appender.shared()), active),
    };
    let config = Config::default();
    let state = AppState {
        beacon,
        form,
        form_body_limit: config.form_body_limit,
    };
    crate::router(&config, state)
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[derive(Clone, Copy)]
enum Failure {
    Api(StatusCode),
    SheetNotFound,
}

/// Keeps every row it is handed; can be told to fail every append.
#[derive(Clone, Default)]
pub struct RecordingAppender {
    rows: Arc<Mutex<Vec<(String, Row)>>>,
    failure: Option<Failure>,
}

impl RecordingAppender {
    /// Fails like the spreadsheet API answering with `status`.
    pub fn failing_with_status(status: StatusCode) -> Self {
        RecordingAppender {
            failure: Some(Failure::Api(status)),
            ..Default::default()
        }
    }

    /// Fails with an error that carries no HTTP status.
    pub fn failing_without_status() -> Self {
        RecordingAppender {
            failure: Some(Failure::SheetNotFound),
            ..Default::default()
        }
    }

    pub fn shared(&self) -> Arc<dyn RowAppender> {
        Arc::new(self.clone())
    }

    pub fn calls(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn rows(&self) -> Vec<(String, Row)> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl RowAppender for RecordingAppender {
    async fn add_row(&self, sheet_title: &str, row: &Row) -> Result<(), SheetsError> {
        self.rows
            .lock()
            .unwrap()
            .push((sheet_title.to_string(), row.clone()));

        match self.failure {
            Some(Failure::Api(status)) => Err(SheetsError::Api {
                status,
                message: "append rejected".into(),
            }),
            Some(Failure::SheetNotFound) => Err(SheetsError::SheetNotFound(sheet_title.into())),
            None => Ok(()),
        }
    }
}
