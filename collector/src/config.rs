use serde::Deserialize;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Listener and admin listener cannot share an address")]
    ListenerConflict,

    #[error("Route path must start with '/': {0}")]
    InvalidPath(String),

    #[error("Beacon and form endpoints cannot share a path: {0}")]
    DuplicatePath(String),
}

/// Collector service configuration.
///
/// Spreadsheet credentials are read from the environment instead, see
/// [`crate::settings`].
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Listener for the beacon and form endpoints
    #[serde(default)]
    pub listener: Listener,
    /// Listener for health and readiness probes
    #[serde(default = "default_admin_listener")]
    pub admin_listener: Listener,
    /// Path answering pixel requests
    #[serde(default = "default_beacon_path")]
    pub beacon_path: String,
    /// Path accepting form submissions
    #[serde(default = "default_form_path")]
    pub form_path: String,
    /// Base URL of the Sheets REST API
    #[serde(default = "default_sheets_api_url")]
    pub sheets_api_url: Url,
    /// OAuth2 token endpoint used for the service account grant
    #[serde(default = "default_token_url")]
    pub token_url: Url,
    /// Largest form body read, in bytes. Only enforced while form writes are enabled.
    #[serde(default = "default_form_body_limit")]
    pub form_body_limit: usize,
}

fn default_admin_listener() -> Listener {
    Listener {
        host: "127.0.0.1".into(),
        port: 3001,
    }
}

fn default_beacon_path() -> String {
    "/doorbell".into()
}

fn default_form_path() -> String {
    "/form".into()
}

fn default_sheets_api_url() -> Url {
    Url::parse(sheets::DEFAULT_API_URL).expect("default api url is valid")
}

fn default_token_url() -> Url {
    Url::parse(sheets::DEFAULT_TOKEN_URL).expect("default token url is valid")
}

fn default_form_body_limit() -> usize {
    1024 * 1024
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listener: Listener::default(),
            admin_listener: default_admin_listener(),
            beacon_path: default_beacon_path(),
            form_path: default_form_path(),
            sheets_api_url: default_sheets_api_url(),
            token_url: default_token_url(),
            form_body_limit: default_form_body_limit(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;

        if self.listener == self.admin_listener {
            return Err(ValidationError::ListenerConflict);
        }

        for path in [&self.beacon_path, &self.form_path] {
            if !path.starts_with('/') {
                return Err(ValidationError::InvalidPath(path.clone()));
            }
        }

        if self.beacon_path == self.form_path {
            return Err(ValidationError::DuplicatePath(self.form_path.clone()));
        }

        Ok(())
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Default for Listener {
    fn default() -> Self {
        Listener {
            host: "0.0.0.0".into(),
            port: 3000,
        }
    }
}

impl Listener {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}
