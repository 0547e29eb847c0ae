use axum::{
    Json,
    http::{
        StatusCode,
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, CONTENT_TYPE,
            LOCATION,
        },
    },
    response::{IntoResponse, Response},
};
use serde_json::json;
use sheets::SheetsError;

/// 1x1 transparent GIF.
pub const TRANSPARENT_GIF: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00,
    0xff, 0xff, 0xff, 0x21, 0xf9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x2c, 0x00, 0x00, 0x00, 0x00,
    0x01, 0x00, 0x01, 0x00, 0x00, 0x02, 0x01, 0x44, 0x00, 0x3b,
];

pub const SUCCESS_PAGE: &str = "success.html";

pub fn pixel() -> Response {
    ([(CONTENT_TYPE, "image/gif")], TRANSPARENT_GIF).into_response()
}

pub fn teapot() -> Response {
    (
        StatusCode::IM_A_TEAPOT,
        Json(json!({ "status": "I'm a teapot" })),
    )
        .into_response()
}

pub fn invalid_method() -> Response {
    (
        StatusCode::BAD_REQUEST,
        [
            (ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
        ],
        Json(json!({ "status": "invalid-method" })),
    )
        .into_response()
}

pub fn payload_too_large() -> Response {
    (
        StatusCode::PAYLOAD_TOO_LARGE,
        Json(json!({ "status": "payload-too-large" })),
    )
        .into_response()
}

/// `https://{apex}/success.html`, or the relative page when no apex domain is known.
pub fn success_url(apex_domain: Option<&str>) -> String {
    match apex_domain {
        Some(apex) => format!("https://{apex}/{SUCCESS_PAGE}"),
        None => format!("/{SUCCESS_PAGE}"),
    }
}

pub fn redirect(location: String) -> Response {
    (
        StatusCode::FOUND,
        [(LOCATION, location), (CACHE_CONTROL, "no-cache".to_string())],
        Json(json!({})),
    )
        .into_response()
}

/// Reports a failed write, using the status the spreadsheet API gave when there is one.
pub fn write_failed(err: &SheetsError) -> Response {
    let status = err.status().unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;

    #[test]
    fn test_gif_bytes() {
        assert_eq!(
            STANDARD.encode(TRANSPARENT_GIF),
            "R0lGODlhAQABAIAAAAAAAP///yH5BAEAAAAALAAAAAABAAEAAAIBRAA7"
        );
        assert!(TRANSPARENT_GIF.starts_with(b"GIF89a"));
        // logical screen width and height, little endian
        assert_eq!(&TRANSPARENT_GIF[6..10], &[1, 0, 1, 0]);
    }

    #[test]
    fn test_success_url() {
        assert_eq!(
            success_url(Some("example.com")),
            "https://example.com/success.html"
        );
        assert_eq!(success_url(None), "/success.html");
    }

    #[test]
    fn test_write_failed_status() {
        let response = write_failed(&SheetsError::SheetNotFound("Forms".into()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = write_failed(&SheetsError::Api {
            status: StatusCode::FORBIDDEN,
            message: "denied".into(),
        });
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = write_failed(&SheetsError::Auth("invalid_grant: Invalid JWT".into()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_redirect_headers() {
        let response = redirect(success_url(Some("example.com")));
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers()[LOCATION],
            "https://example.com/success.html"
        );
        assert_eq!(response.headers()[CACHE_CONTROL], "no-cache");
    }
}
