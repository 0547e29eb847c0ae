//! Referer-based origin check shared by both endpoints.

use axum::http::{HeaderMap, Uri};
use axum::http::header::{HOST, REFERER};
use thiserror::Error;
use url::Url;

#[derive(Error, Debug, PartialEq)]
pub enum RefererError {
    #[error("referer domain {actual:?} does not match {expected:?}")]
    Mismatch { expected: String, actual: String },

    #[error("malformed referer: {0}")]
    Malformed(String),
}

fn header_str<'a>(headers: &'a HeaderMap, name: &axum::http::HeaderName) -> Result<Option<&'a str>, RefererError> {
    headers
        .get(name)
        .map(|value| {
            value
                .to_str()
                .map_err(|_| RefererError::Malformed(format!("non-visible characters in {name}")))
        })
        .transpose()
}

/// Domain the request claims to come from: the referer host (with its port when it
/// isn't the scheme default) minus one leading `www.` label. Without a referer the
/// request's own `Host` is used, or the URI authority for HTTP/2 requests that
/// carry no `Host` header.
pub fn referer_domain(headers: &HeaderMap, uri: &Uri) -> Result<String, RefererError> {
    let referer = match header_str(headers, &REFERER)? {
        Some(referer) => referer.to_string(),
        None => {
            let host = match header_str(headers, &HOST)? {
                Some(host) => host,
                None => uri.authority().map(|authority| authority.as_str()).unwrap_or_default(),
            };
            format!("https://{host}")
        }
    };

    let url = Url::parse(&referer).map_err(|e| RefererError::Malformed(format!("{referer}: {e}")))?;
    let host = url
        .host_str()
        .ok_or_else(|| RefererError::Malformed(format!("{referer}: no host")))?;

    let host = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };

    Ok(match host.strip_prefix("www.") {
        Some(apex) => apex.to_string(),
        None => host,
    })
}

/// Accepts the request only when its referer domain is exactly `apex_domain`.
pub fn validate(headers: &HeaderMap, uri: &Uri, apex_domain: &str) -> Result<(), RefererError> {
    let actual = referer_domain(headers, uri)?;
    if actual != apex_domain {
        return Err(RefererError::Mismatch {
            expected: apex_domain.to_string(),
            actual,
        });
    }
    Ok(())
}
