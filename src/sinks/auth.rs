//! Bearer tokens for the Cloud Logging API
//!
//! Providers, in order of preference:
//! - a caller-supplied static token
//! - the service-account key in the credentials file, exchanged for an
//!   access token with a signed JWT assertion
//! - the GCE / Cloud Run metadata server

use crate::core::credentials::read_credentials_file;
use crate::core::{LoggerError, Result};
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use parking_lot::Mutex;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};

/// Token endpoint of the GCE / Cloud Run metadata server
pub const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// OAuth token endpoint used when the key file names none
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Scope requested for service-account tokens
pub const LOGGING_WRITE_SCOPE: &str = "https://www.googleapis.com/auth/logging.write";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Refresh this long before the server-reported expiry
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

pub enum TokenSource {
    /// Caller-supplied token, used as is
    Static(String),
    /// Token minted from a service-account key and cached until near expiry
    ServiceAccount(ServiceAccountTokens),
    /// Token fetched from the metadata server and cached until near expiry
    Metadata(MetadataTokens),
}

impl TokenSource {
    /// Pick the token provider for a sink
    ///
    /// A static token wins; otherwise a `service_account` credentials file
    /// supplies the key; otherwise the metadata server at `metadata_url`.
    ///
    /// # Errors
    ///
    /// Returns an error when the credentials file is unreadable, or names a
    /// service account without a usable key.
    pub fn select(
        access_token: Option<&str>,
        credentials_file: Option<&Path>,
        metadata_url: &str,
    ) -> Result<Self> {
        if let Some(token) = access_token {
            return Ok(TokenSource::Static(token.to_string()));
        }
        if let Some(path) = credentials_file {
            if let Some(account) = ServiceAccountTokens::from_file(path)? {
                return Ok(TokenSource::ServiceAccount(account));
            }
        }
        Ok(TokenSource::Metadata(MetadataTokens::new(metadata_url)))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TokenSource::Static(_) => "static",
            TokenSource::ServiceAccount(_) => "service_account",
            TokenSource::Metadata(_) => "metadata",
        }
    }

    pub fn token(&self, client: &Client) -> Result<String> {
        match self {
            TokenSource::Static(token) => Ok(token.clone()),
            TokenSource::ServiceAccount(tokens) => tokens.token(client),
            TokenSource::Metadata(tokens) => tokens.token(client),
        }
    }

    /// Fail early when the provider depends on an environment that is absent
    ///
    /// Only the metadata server is contacted; static tokens and parsed
    /// service-account keys are accepted as they are.
    pub fn verify(&self, client: &Client) -> Result<()> {
        match self {
            TokenSource::Metadata(tokens) => tokens.token(client).map(|_| ()).map_err(|e| {
                LoggerError::auth(format!(
                    "no credentials key and metadata server unavailable: {}",
                    e
                ))
            }),
            TokenSource::Static(_) | TokenSource::ServiceAccount(_) => Ok(()),
        }
    }
}

impl fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenSource::Static(_) => f.write_str("TokenSource::Static(..)"),
            TokenSource::ServiceAccount(tokens) => {
                write!(f, "TokenSource::ServiceAccount({})", tokens.client_email)
            }
            TokenSource::Metadata(tokens) => write!(f, "TokenSource::Metadata({})", tokens.url),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    refresh_at: Instant,
}

impl CachedToken {
    fn from_response(response: TokenResponse, now: Instant) -> Self {
        let lifetime = Duration::from_secs(response.expires_in).saturating_sub(EXPIRY_MARGIN);
        Self {
            value: response.access_token,
            refresh_at: now + lifetime,
        }
    }

    fn is_fresh(&self, now: Instant) -> bool {
        now < self.refresh_at
    }
}

#[derive(Default)]
struct TokenCache {
    cached: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    fn get_or_fetch<F>(&self, fetch: F) -> Result<String>
    where
        F: FnOnce() -> Result<TokenResponse>,
    {
        let mut cached = self.cached.lock();
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(Instant::now())) {
            return Ok(token.value.clone());
        }

        let token = CachedToken::from_response(fetch()?, Instant::now());
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }
}

pub struct MetadataTokens {
    url: String,
    cache: TokenCache,
}

impl MetadataTokens {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            cache: TokenCache::default(),
        }
    }

    fn token(&self, client: &Client) -> Result<String> {
        self.cache.get_or_fetch(|| {
            Ok(client
                .get(&self.url)
                .header("Metadata-Flavor", "Google")
                .send()?
                .error_for_status()?
                .json()?)
        })
    }
}

/// Fields of a credentials file relevant to service-account auth
#[derive(Debug, Deserialize)]
struct KeyFile {
    #[serde(rename = "type")]
    kind: Option<String>,
    client_email: Option<String>,
    private_key: Option<String>,
    private_key_id: Option<String>,
    token_uri: Option<String>,
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

/// Access tokens minted from a service-account key
pub struct ServiceAccountTokens {
    client_email: String,
    token_uri: String,
    key_id: Option<String>,
    key: EncodingKey,
    cache: TokenCache,
}

impl ServiceAccountTokens {
    /// Load the key from a credentials file
    ///
    /// Returns `Ok(None)` when the file does not describe a service account.
    pub fn from_file(path: &Path) -> Result<Option<Self>> {
        let file: KeyFile = read_credentials_file(path)?;
        if file.kind.as_deref() != Some("service_account") {
            return Ok(None);
        }

        let client_email = non_empty(file.client_email)
            .ok_or_else(|| missing_field(path, "client_email"))?;
        let private_key =
            non_empty(file.private_key).ok_or_else(|| missing_field(path, "private_key"))?;
        let key = EncodingKey::from_rsa_pem(private_key.as_bytes())?;

        Ok(Some(Self {
            client_email,
            token_uri: non_empty(file.token_uri).unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string()),
            key_id: non_empty(file.private_key_id),
            key,
            cache: TokenCache::default(),
        }))
    }

    pub fn client_email(&self) -> &str {
        &self.client_email
    }

    pub fn token_uri(&self) -> &str {
        &self.token_uri
    }

    /// Signed RS256 assertion issued at `issued_at` (unix seconds)
    fn assertion(&self, issued_at: i64) -> Result<String> {
        let claims = AssertionClaims {
            iss: &self.client_email,
            scope: LOGGING_WRITE_SCOPE,
            aud: &self.token_uri,
            iat: issued_at,
            exp: issued_at + ASSERTION_LIFETIME_SECS,
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key_id.clone();
        Ok(jsonwebtoken::encode(&header, &claims, &self.key)?)
    }

    fn token(&self, client: &Client) -> Result<String> {
        self.cache.get_or_fetch(|| {
            let assertion = self.assertion(Utc::now().timestamp())?;
            Ok(client
                .post(&self.token_uri)
                .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
                .send()?
                .error_for_status()?
                .json()?)
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn missing_field(path: &Path, field: &str) -> LoggerError {
    LoggerError::config(
        "service account",
        format!("{} has no {}", path.display(), field),
    )
}
