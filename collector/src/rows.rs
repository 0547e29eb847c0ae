use crate::extract::{ClientInfo, PageView, parse_form_body, serialize_headers};
use axum::http::HeaderMap;
use chrono::{DateTime, SecondsFormat, Utc};
use sheets::Row;

/// `2024-05-01T12:00:00.000Z`
pub fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// One pageview.
#[derive(Clone, Debug, PartialEq)]
pub struct AnalyticsRow {
    pub timestamp: String,
    pub page: Option<String>,
    pub hash: Option<String>,
    pub params: Option<String>,
    pub ua: Option<String>,
    pub locale: Option<String>,
    pub country: Option<String>,
    pub headers: String,
}

impl AnalyticsRow {
    pub fn new(timestamp: String, view: PageView, headers: &HeaderMap) -> Self {
        let client = ClientInfo::from_headers(headers);
        AnalyticsRow {
            timestamp,
            params: view.params(),
            page: view.pathname,
            hash: view.hash,
            ua: client.ua,
            locale: client.locale,
            country: client.country,
            headers: serialize_headers(headers),
        }
    }
}

impl From<AnalyticsRow> for Row {
    fn from(r: AnalyticsRow) -> Self {
        let mut row = Row::new();
        row.set("timestamp", Some(r.timestamp))
            .set("page", r.page)
            .set("hash", r.hash)
            .set("params", r.params)
            .set("ua", r.ua)
            .set("locale", r.locale)
            .set("country", r.country)
            .set("headers", Some(r.headers));
        row
    }
}

/// One form submission. `form_data` is the body exactly as received.
#[derive(Clone, Debug, PartialEq)]
pub struct FormSubmissionRow {
    pub timestamp: String,
    pub form_name: Option<String>,
    pub form_data: String,
    pub country: Option<String>,
    pub locale: Option<String>,
    pub ua: Option<String>,
}

impl FormSubmissionRow {
    pub fn new(timestamp: String, body: &str, headers: &HeaderMap) -> Self {
        let client = ClientInfo::from_headers(headers);
        FormSubmissionRow {
            timestamp,
            form_name: parse_form_body(body).shift_remove("form-name"),
            form_data: body.to_string(),
            country: client.country,
            locale: client.locale,
            ua: client.ua,
        }
    }
}

impl From<FormSubmissionRow> for Row {
    fn from(r: FormSubmissionRow) -> Self {
        let mut row = Row::new();
        row.set("timestamp", Some(r.timestamp))
            .set("formName", r.form_name)
            .set("formData", Some(r.form_data))
            .set("country", r.country)
            .set("locale", r.locale)
            .set("ua", r.ua);
        row
    }
}
