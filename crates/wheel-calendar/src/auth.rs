//! OAuth credentials for read-only calendar access.
//!
//! Credentials come from two files: the installed-app client secret issued by
//! the calendar provider, and a cached token file written after the user
//! first grants access. Expired tokens are refreshed and written back. A
//! cached token that cannot be used at startup (unreadable, expired without
//! a refresh token, or refused by the token endpoint) is replaced by asking
//! the user to grant access again.

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{CalendarError, Result};

/// OAuth scope for reading calendars.
pub const CALENDAR_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/calendar.readonly";

/// Tokens this close to expiry are refreshed early.
const EXPIRY_SKEW_SECS: i64 = 60;

/// Redirect used when the client secret lists none.
const FALLBACK_REDIRECT_URI: &str = "http://localhost";

/// Supplies bearer tokens for calendar requests.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Returns a currently valid access token.
    async fn access_token(&self) -> Result<String>;
}

/// An OAuth client secret.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecret {
    /// Client identifier.
    pub client_id: String,
    /// Client secret.
    pub client_secret: String,
    /// Consent page endpoint.
    pub auth_uri: String,
    /// Token endpoint.
    pub token_uri: String,
    /// Registered redirect URIs.
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

#[derive(Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

impl ClientSecret {
    /// Reads a client secret file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|source| CalendarError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&data)
    }

    /// Parses the JSON layout issued by the provider console.
    pub fn from_json(data: &str) -> Result<Self> {
        let file: ClientSecretFile = serde_json::from_str(data)?;
        file.installed.or(file.web).ok_or_else(|| {
            CalendarError::Credentials(
                "client secret has neither an \"installed\" nor a \"web\" section".to_string(),
            )
        })
    }

    fn redirect_uri(&self) -> &str {
        self.redirect_uris
            .first()
            .map(String::as_str)
            .unwrap_or(FALLBACK_REDIRECT_URI)
    }

    /// Builds the consent page URL requesting offline access to `scope`.
    pub fn consent_url(&self, scope: &str) -> Result<Url> {
        let mut url = Url::parse(&self.auth_uri)?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", self.redirect_uri())
            .append_pair("response_type", "code")
            .append_pair("scope", scope)
            .append_pair("access_type", "offline")
            .append_pair("state", "state-token");
        Ok(url)
    }
}

/// A cached OAuth token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Bearer token.
    #[serde(alias = "token")]
    pub access_token: String,
    /// Token type, normally "Bearer".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    /// Long-lived refresh token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// When the access token stops working.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

impl Token {
    /// True when the token expires within the refresh skew of `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry
            .is_some_and(|expiry| expiry - Duration::seconds(EXPIRY_SKEW_SECS) <= now)
    }

    /// Reads a cached token; a missing file yields `None`.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(CalendarError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Ok(Some(serde_json::from_str(&data)?))
    }

    /// Writes the token through a temporary file and rename.
    pub fn save(&self, path: &Path) -> Result<()> {
        let io_err = |source| CalendarError::Io {
            path: path.to_path_buf(),
            source,
        };
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let json = serde_json::to_string_pretty(self)?;
        let mut temp_file = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
        temp_file.write_all(json.as_bytes()).map_err(io_err)?;
        temp_file.flush().map_err(io_err)?;
        temp_file.persist(path).map_err(|e| io_err(e.error))?;
        Ok(())
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl TokenResponse {
    fn into_token(self, now: DateTime<Utc>, previous_refresh: Option<String>) -> Token {
        Token {
            access_token: self.access_token,
            token_type: self.token_type,
            // Refresh responses omit the refresh token; keep the old one.
            refresh_token: self.refresh_token.or(previous_refresh),
            expiry: self.expires_in.map(|secs| now + Duration::seconds(secs)),
        }
    }
}

/// Access tokens backed by a client secret and a cached token file.
pub struct FileTokenProvider {
    secret: ClientSecret,
    token_path: PathBuf,
    http: reqwest::Client,
    token: Mutex<Option<Token>>,
}

impl FileTokenProvider {
    /// Creates a provider with an already loaded token (or none).
    pub fn new(
        secret: ClientSecret,
        token_path: impl Into<PathBuf>,
        token: Option<Token>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            secret,
            token_path: token_path.into(),
            http,
            token: Mutex::new(token),
        }
    }

    /// Loads the client secret and any cached token from disk.
    pub fn load(
        credentials_path: &Path,
        token_path: &Path,
        http: reqwest::Client,
    ) -> Result<Self> {
        let secret = ClientSecret::from_file(credentials_path)?;
        let token = match Token::load(token_path) {
            Ok(token) => token,
            Err(CalendarError::Json(e)) => {
                warn!(
                    path = %token_path.display(),
                    error = %e,
                    "ignoring unreadable calendar token"
                );
                None
            }
            Err(e) => return Err(e),
        };
        debug!(
            credentials = %credentials_path.display(),
            token = %token_path.display(),
            cached = token.is_some(),
            "loaded calendar credentials"
        );
        Ok(Self::new(secret, token_path, token, http))
    }

    /// Ensures a usable token exists, asking the user to grant access if none is cached.
    ///
    /// Reads the authorization code from stdin. Intended to run once at startup.
    pub async fn authorize(&self) -> Result<()> {
        self.authorize_with(BufReader::new(tokio::io::stdin())).await
    }

    /// Like [`authorize`](Self::authorize), reading the authorization code from `input`.
    pub async fn authorize_with<R>(&self, mut input: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        match self.access_token().await {
            Ok(_) => return Ok(()),
            Err(e) if needs_consent(&e) => {
                if self.token.lock().await.is_some() {
                    warn!(error = %e, "cached calendar token is unusable, requesting access again");
                }
            }
            Err(e) => return Err(e),
        }

        let url = self.secret.consent_url(CALENDAR_READONLY_SCOPE)?;
        println!(
            "Go to the following link in your browser then type the authorization code:\n{}",
            url
        );

        let mut code = String::new();
        input.read_line(&mut code).await.map_err(|e| {
            CalendarError::Credentials(format!("unable to read authorization code: {}", e))
        })?;
        let code = code.trim();
        if code.is_empty() {
            return Err(CalendarError::Credentials(
                "no authorization code entered".to_string(),
            ));
        }

        let token = self.exchange_code(code).await?;
        info!(path = %self.token_path.display(), "saving calendar token");
        token.save(&self.token_path)?;
        *self.token.lock().await = Some(token);
        Ok(())
    }

    async fn exchange_code(&self, code: &str) -> Result<Token> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.secret.client_id.as_str()),
            ("client_secret", self.secret.client_secret.as_str()),
            ("redirect_uri", self.secret.redirect_uri()),
        ];
        let response = self.request_token(&params).await?;
        Ok(response.into_token(Utc::now(), None))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Token> {
        debug!("refreshing calendar access token");
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.secret.client_id.as_str()),
            ("client_secret", self.secret.client_secret.as_str()),
        ];
        let response = self.request_token(&params).await?;
        Ok(response.into_token(Utc::now(), Some(refresh_token.to_string())))
    }

    async fn request_token(&self, params: &[(&str, &str)]) -> Result<TokenResponse> {
        let response = self
            .http
            .post(&self.secret.token_uri)
            .form(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CalendarError::Authorization(format!(
                "token endpoint returned {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }
}

/// Errors that a fresh grant from the user can cure.
fn needs_consent(error: &CalendarError) -> bool {
    matches!(
        error,
        CalendarError::Credentials(_) | CalendarError::Authorization(_)
    )
}

#[async_trait]
impl AccessTokenProvider for FileTokenProvider {
    async fn access_token(&self) -> Result<String> {
        let mut guard = self.token.lock().await;
        let token = guard.as_ref().ok_or_else(|| {
            CalendarError::Credentials("no cached token; authorization required".to_string())
        })?;

        if !token.is_expired(Utc::now()) {
            return Ok(token.access_token.clone());
        }

        let refresh_token = token.refresh_token.clone().ok_or_else(|| {
            CalendarError::Credentials("token expired and has no refresh token".to_string())
        })?;
        let refreshed = self.refresh(&refresh_token).await?;
        refreshed.save(&self.token_path)?;
        let access_token = refreshed.access_token.clone();
        *guard = Some(refreshed);
        Ok(access_token)
    }
}
