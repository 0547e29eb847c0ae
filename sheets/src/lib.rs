//! Minimal client for appending rows to a spreadsheet through the Google Sheets v4 REST API,
//! authenticated with a service account.

pub mod auth;
pub mod client;
pub mod errors;
pub mod metrics_defs;
pub mod row;
#[cfg(any(test, feature = "testutils"))]
pub mod testutils;

pub use auth::{ServiceAccountKey, ServiceAccountTokenSource, StaticTokenSource, TokenSource};
pub use client::{RowAppender, SpreadsheetClient};
pub use errors::SheetsError;
pub use row::Row;

pub const DEFAULT_API_URL: &str = "https://sheets.googleapis.com";
pub const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
