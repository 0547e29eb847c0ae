//! Spreadsheet settings read from the process environment.
//!
//! Each endpoint needs the service account identity, the spreadsheet, its own
//! sheet title and the apex domain. Settings are read once at startup; a value
//! that is unset or empty counts as missing, and any missing value turns the
//! endpoint's write path off without affecting its responses.

use crate::endpoint::Endpoint;
use sheets::ServiceAccountKey;
use std::fmt;

pub const GOOGLE_SERVICE_ACCOUNT_EMAIL: &str = "GOOGLE_SERVICE_ACCOUNT_EMAIL";
pub const GOOGLE_PRIVATE_KEY: &str = "GOOGLE_PRIVATE_KEY";
pub const SPREADSHEET_ID: &str = "SPREADSHEET_ID";
pub const SPREADSHEET_SHEET_TITLE: &str = "SPREADSHEET_SHEET_TITLE";
pub const SPREADSHEET_SHEET_FORM_TITLE: &str = "SPREADSHEET_SHEET_FORM_TITLE";
pub const APEX_DOMAIN: &str = "APEX_DOMAIN";

/// Everything an endpoint needs to append rows.
#[derive(Clone, Debug, PartialEq)]
pub struct SpreadsheetSettings {
    pub credentials: ServiceAccountKey,
    pub spreadsheet_id: String,
    pub sheet_title: String,
    pub apex_domain: String,
}

/// Which required variables were absent for an endpoint.
#[derive(Clone, Debug, PartialEq)]
pub struct MissingSettings {
    pub required: [&'static str; 5],
    pub missing: Vec<&'static str>,
    /// Kept even when the rest is incomplete; the form endpoint still needs it to redirect.
    pub apex_domain: Option<String>,
}

impl fmt::Display for MissingSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.required.join(" && "))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Configuration {
    Complete(SpreadsheetSettings),
    Incomplete(MissingSettings),
}

impl Configuration {
    pub fn from_env(endpoint: Endpoint) -> Self {
        Self::load(endpoint, |name| std::env::var(name).ok())
    }

    /// Resolves the settings for `endpoint` through `lookup`.
    pub fn load<F>(endpoint: Endpoint, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = endpoint.required_settings();
        let present = |name: &str| lookup(name).filter(|value| !value.is_empty());

        let missing: Vec<&'static str> = required
            .iter()
            .copied()
            .filter(|name| present(name).is_none())
            .collect();

        match (
            present(GOOGLE_SERVICE_ACCOUNT_EMAIL),
            present(GOOGLE_PRIVATE_KEY),
            present(SPREADSHEET_ID),
            present(endpoint.sheet_title_setting()),
            present(APEX_DOMAIN),
        ) {
            (
                Some(client_email),
                Some(private_key),
                Some(spreadsheet_id),
                Some(sheet_title),
                Some(apex_domain),
            ) => Configuration::Complete(SpreadsheetSettings {
                credentials: ServiceAccountKey::new(client_email, &private_key),
                spreadsheet_id,
                sheet_title,
                apex_domain,
            }),
            (.., apex_domain) => Configuration::Incomplete(MissingSettings {
                required,
                missing,
                apex_domain,
            }),
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Configuration::Complete(_))
    }
}
