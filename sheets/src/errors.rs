use http::StatusCode;

#[derive(thiserror::Error, Debug)]
pub enum SheetsError {
    #[error("invalid service account key: {0}")]
    InvalidKey(#[from] jsonwebtoken::errors::Error),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("spreadsheet api error ({status}): {message}")]
    Api { status: StatusCode, message: String },

    #[error("no sheet titled {0:?} in spreadsheet")]
    SheetNotFound(String),

    #[error("sheet {0:?} has no header row")]
    MissingHeaderRow(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl SheetsError {
    /// The HTTP status the failure carries, if the remote side reported one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            SheetsError::Api { status, .. } => Some(*status),
            SheetsError::Http(e) => e.status(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status() {
        let err = SheetsError::Api {
            status: StatusCode::FORBIDDEN,
            message: "The caller does not have permission".into(),
        };
        assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));
        assert_eq!(
            err.to_string(),
            "spreadsheet api error (403 Forbidden): The caller does not have permission"
        );

        assert_eq!(SheetsError::SheetNotFound("Forms".into()).status(), None);
        assert_eq!(SheetsError::Auth("invalid_grant".into()).status(), None);
    }
}
