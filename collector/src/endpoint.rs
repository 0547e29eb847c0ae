use crate::config::Config;
use crate::referer::{self, RefererError};
use crate::settings::{
    APEX_DOMAIN, Configuration, GOOGLE_PRIVATE_KEY, GOOGLE_SERVICE_ACCOUNT_EMAIL, MissingSettings,
    SPREADSHEET_ID, SPREADSHEET_SHEET_FORM_TITLE, SPREADSHEET_SHEET_TITLE, SpreadsheetSettings,
};
use axum::http::{HeaderMap, Uri};
use sheets::{Row, RowAppender, ServiceAccountTokenSource, SheetsError, SpreadsheetClient};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endpoint {
    Beacon,
    Form,
}

/// What a handler does with its response when the row could not be written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log the failure and answer as if the write succeeded.
    FailOpen,
    /// Surface the failure to the client.
    FailClosed,
}

impl Endpoint {
    pub const fn name(&self) -> &'static str {
        match self {
            Endpoint::Beacon => "beacon",
            Endpoint::Form => "form",
        }
    }

    pub const fn sheet_title_setting(&self) -> &'static str {
        match self {
            Endpoint::Beacon => SPREADSHEET_SHEET_TITLE,
            Endpoint::Form => SPREADSHEET_SHEET_FORM_TITLE,
        }
    }

    pub const fn required_settings(&self) -> [&'static str; 5] {
        [
            GOOGLE_SERVICE_ACCOUNT_EMAIL,
            GOOGLE_PRIVATE_KEY,
            SPREADSHEET_ID,
            self.sheet_title_setting(),
            APEX_DOMAIN,
        ]
    }

    /// Pageview telemetry must never break the host page; a form submitter has to
    /// learn that the submission was lost so they can retry.
    pub const fn failure_policy(&self) -> FailurePolicy {
        match self {
            Endpoint::Beacon => FailurePolicy::FailOpen,
            Endpoint::Form => FailurePolicy::FailClosed,
        }
    }
}

/// Result of running a request through the write path.
#[derive(Debug)]
pub enum Outcome {
    Recorded,
    /// Configuration is incomplete; nothing was attempted.
    Skipped,
    Rejected(RefererError),
    Failed(SheetsError),
}

impl Outcome {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Outcome::Recorded => "recorded",
            Outcome::Skipped => "skipped",
            Outcome::Rejected(_) => "rejected",
            Outcome::Failed(_) => "failed",
        }
    }
}

/// Where an endpoint writes its rows, decided once at startup.
#[derive(Clone)]
pub enum Destination {
    Sheet {
        apex_domain: String,
        sheet_title: String,
        appender: Arc<dyn RowAppender>,
    },
    Disabled(MissingSettings),
}

impl Destination {
    /// Builds a spreadsheet client for a complete configuration.
    pub fn new(configuration: Configuration, config: &Config) -> Self {
        Self::with_appender(configuration, |settings| {
            let tokens = ServiceAccountTokenSource::new(
                settings.credentials.clone(),
                config.token_url.clone(),
            );
            let client: Arc<dyn RowAppender> = Arc::new(SpreadsheetClient::new(
                config.sheets_api_url.clone(),
                settings.spreadsheet_id.clone(),
                Arc::new(tokens),
            ));
            client
        })
    }

    pub fn with_appender<F>(configuration: Configuration, make_appender: F) -> Self
    where
        F: FnOnce(&SpreadsheetSettings) -> Arc<dyn RowAppender>,
    {
        match configuration {
            Configuration::Complete(settings) => Destination::Sheet {
                appender: make_appender(&settings),
                apex_domain: settings.apex_domain,
                sheet_title: settings.sheet_title,
            },
            Configuration::Incomplete(missing) => Destination::Disabled(missing),
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Destination::Sheet { .. })
    }

    pub fn apex_domain(&self) -> Option<&str> {
        match self {
            Destination::Sheet { apex_domain, .. } => Some(apex_domain.as_str()),
            Destination::Disabled(missing) => missing.apex_domain.as_deref(),
        }
    }

    /// Checks the referer and appends the row produced by `build_row`.
    ///
    /// The row is only built once the request has been accepted.
    pub async fn record<F>(
        &self,
        endpoint: Endpoint,
        headers: &HeaderMap,
        uri: &Uri,
        build_row: F,
    ) -> Outcome
    where
        F: FnOnce() -> Row,
    {
        let (apex_domain, sheet_title, appender) = match self {
            Destination::Sheet {
                apex_domain,
                sheet_title,
                appender,
            } => (apex_domain, sheet_title, appender),
            Destination::Disabled(missing) => {
                tracing::warn!(
                    endpoint = endpoint.name(),
                    required = %missing,
                    missing = ?missing.missing,
                    "spreadsheet configuration incomplete, skipping write"
                );
                return Outcome::Skipped;
            }
        };

        if let Err(err) = referer::validate(headers, uri, apex_domain) {
            match &err {
                RefererError::Malformed(_) => {
                    tracing::debug!(endpoint = endpoint.name(), error = %err, "rejecting request")
                }
                RefererError::Mismatch { .. } => {
                    tracing::info!(endpoint = endpoint.name(), error = %err, "rejecting request")
                }
            }
            return Outcome::Rejected(err);
        }

        let row = build_row();
        match appender.add_row(sheet_title, &row).await {
            Ok(()) => Outcome::Recorded,
            Err(err) => {
                tracing::error!(
                    endpoint = endpoint.name(),
                    sheet = %sheet_title,
                    error = %err,
                    "failed to append row"
                );
                Outcome::Failed(err)
            }
        }
    }
}

/// Shared state of the collector router.
#[derive(Clone)]
pub struct AppState {
    pub beacon: Destination,
    pub form: Destination,
    pub form_body_limit: usize,
}

impl AppState {
    /// Reads both endpoints' settings from the environment.
    pub fn from_env(config: &Config) -> Self {
        AppState {
            beacon: Destination::new(Configuration::from_env(Endpoint::Beacon), config),
            form: Destination::new(Configuration::from_env(Endpoint::Form), config),
            form_body_limit: config.form_body_limit,
        }
    }
}
