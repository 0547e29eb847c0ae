//! Field extraction from beacon query strings, form bodies and request headers.

use axum::http::HeaderMap;
use indexmap::IndexMap;
use percent_encoding::percent_decode_str;
use serde_json::{Map, Value};

pub const USER_AGENT: &str = "user-agent";
pub const X_LANGUAGE: &str = "x-language";
pub const X_COUNTRY: &str = "x-country";

/// Location of the page that fired the beacon, as sent in the pixel URL's query
/// string (`?pathname=...&search=...&hash=...`).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PageView {
    pub pathname: Option<String>,
    pub search: Option<String>,
    pub hash: Option<String>,
}

impl PageView {
    /// Standard query-string decoding; for repeated keys the last one wins.
    pub fn from_query(query: Option<&str>) -> Self {
        let mut view = PageView::default();

        for (key, value) in form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
            let slot = match key.as_ref() {
                "pathname" => &mut view.pathname,
                "search" => &mut view.search,
                "hash" => &mut view.hash,
                _ => continue,
            };
            *slot = Some(value.into_owned());
        }

        view
    }

    /// The search component as a JSON string literal, e.g. `"?utm_source=x"`.
    pub fn params(&self) -> Option<String> {
        self.search
            .as_ref()
            .map(|search| Value::String(search.clone()).to_string())
    }
}

/// Client details every row records.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClientInfo {
    pub ua: Option<String>,
    pub locale: Option<String>,
    pub country: Option<String>,
}

impl ClientInfo {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        ClientInfo {
            ua: header_value(headers, USER_AGENT),
            locale: header_value(headers, X_LANGUAGE),
            country: header_value(headers, X_COUNTRY),
        }
    }
}

/// Header value as text; bytes that aren't UTF-8 are replaced rather than dropped.
pub fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
}

/// The full header map as a JSON object. Repeated headers are joined with `", "`.
pub fn serialize_headers(headers: &HeaderMap) -> String {
    let mut map = Map::new();

    for name in headers.keys() {
        let joined = headers
            .get_all(name)
            .iter()
            .map(|value| String::from_utf8_lossy(value.as_bytes()))
            .collect::<Vec<_>>()
            .join(", ");
        map.insert(name.as_str().to_string(), Value::String(joined));
    }

    Value::Object(map).to_string()
}

/// Parses an `application/x-www-form-urlencoded` body.
///
/// Pairs split on the first `=`; values are percent-decoded (a `+` stays a `+`),
/// keys are kept verbatim. Empty segments are skipped. A repeated key keeps its
/// first position and takes the last value.
pub fn parse_form_body(body: &str) -> IndexMap<String, String> {
    body.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (
                key.to_string(),
                percent_decode_str(value).decode_utf8_lossy().into_owned(),
            )
        })
        .collect()
}
