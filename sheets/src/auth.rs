use crate::SPREADSHEETS_SCOPE;
use crate::errors::SheetsError;
use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use url::Url;

const TOKEN_LIFETIME_SECS: u64 = 3600;
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Service account identity used to sign token requests.
#[derive(Clone, PartialEq)]
pub struct ServiceAccountKey {
    pub client_email: String,
    private_key: String,
}

impl ServiceAccountKey {
    /// Builds a key from the raw environment values. The private key usually arrives
    /// as a single line with literal `\n` sequences, which are turned into newlines here.
    pub fn new(client_email: impl Into<String>, private_key: &str) -> Self {
        ServiceAccountKey {
            client_email: client_email.into(),
            private_key: private_key.replace("\\n", "\n"),
        }
    }

    pub fn private_key_pem(&self) -> &str {
        &self.private_key
    }
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"***")
            .finish()
    }
}

/// Source of OAuth2 bearer tokens for the Sheets API.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String, SheetsError>;
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Exchanges a signed JWT assertion for an access token (OAuth2 JWT bearer grant).
///
/// Every call performs a fresh exchange; tokens are not cached between requests.
pub struct ServiceAccountTokenSource {
    client: reqwest::Client,
    key: ServiceAccountKey,
    token_url: Url,
}

impl ServiceAccountTokenSource {
    pub fn new(key: ServiceAccountKey, token_url: Url) -> Self {
        ServiceAccountTokenSource {
            client: reqwest::Client::new(),
            key,
            token_url,
        }
    }

    fn assertion(&self, now: u64) -> Result<String, SheetsError> {
        let encoding_key = EncodingKey::from_rsa_pem(self.key.private_key_pem().as_bytes())?;
        let claims = Claims {
            iss: &self.key.client_email,
            scope: SPREADSHEETS_SCOPE,
            aud: self.token_url.as_str(),
            iat: now,
            exp: now + TOKEN_LIFETIME_SECS,
        };

        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::RS256),
            &claims,
            &encoding_key,
        )?)
    }
}

#[async_trait]
impl TokenSource for ServiceAccountTokenSource {
    async fn access_token(&self) -> Result<String, SheetsError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let assertion = self.assertion(now)?;

        let response = self
            .client
            .post(self.token_url.clone())
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(TokenErrorResponse {
                    error,
                    error_description: Some(description),
                }) => format!("{error}: {description}"),
                Ok(TokenErrorResponse { error, .. }) => error,
                Err(_) => format!("token endpoint returned {status}"),
            };
            return Err(SheetsError::Auth(message));
        }

        let token = response.json::<TokenResponse>().await?;
        tracing::debug!(client_email = %self.key.client_email, "obtained access token");
        Ok(token.access_token)
    }
}

/// Hands out a fixed token. Useful when the token is minted elsewhere, and in tests.
pub struct StaticTokenSource(pub String);

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn access_token(&self) -> Result<String, SheetsError> {
        Ok(self.0.clone())
    }
}
