use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use log::{debug, error, info};
use tokio::sync::Mutex;

use crate::azure::models::TokenResponse;
use crate::config::ExporterConfig;
use crate::error::{ExporterError, Result};

/// How long before expiry a token is refreshed
pub const REFRESH_MARGIN_MINUTES: i64 = 10;

/// A bearer token together with the audience it was issued for
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Bearer value
    pub value: String,
    /// Resource the token was issued for; also the management base URL
    pub audience: String,
    /// Expiry instant (UTC)
    pub expires_at: DateTime<Utc>,
}

impl Token {
    /// Instant from which the token must be refreshed before use
    pub fn refresh_at(&self) -> DateTime<Utc> {
        self.expires_at - Duration::minutes(REFRESH_MARGIN_MINUTES)
    }

    /// Whether the token is inside the refresh margin at `now`
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        now >= self.refresh_at()
    }
}

impl TryFrom<TokenResponse> for Token {
    type Error = ExporterError;

    fn try_from(response: TokenResponse) -> Result<Self> {
        let seconds: i64 = response.expires_on.trim().parse().map_err(|e| {
            ExporterError::Auth(format!("expires_on '{}' is not an integer: {}", response.expires_on, e))
        })?;

        let expires_at = Utc
            .timestamp_opt(seconds, 0)
            .single()
            .ok_or_else(|| ExporterError::Auth(format!("expires_on {} is out of range", seconds)))?;

        Ok(Self {
            value: response.access_token,
            audience: response.resource,
            expires_at,
        })
    }
}

/// Performs one authentication exchange
#[async_trait]
pub trait TokenExchange: Send + Sync + 'static {
    async fn exchange(&self) -> Result<Token>;
}

/// OAuth2 client-credentials grant against the identity authority
pub struct ClientCredentials {
    client: reqwest::Client,
    token_url: String,
    resource: String,
    client_id: String,
    client_secret: String,
}

impl ClientCredentials {
    pub fn new(
        authority_host: &str,
        tenant_id: &str,
        resource: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            token_url: format!("{}/{}/oauth2/token", authority_host.trim_end_matches('/'), tenant_id),
            resource: resource.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    pub fn from_config(config: &ExporterConfig) -> Self {
        Self::new(
            &config.authority_host,
            &config.credentials.tenant_id,
            config.management_resource.clone(),
            config.credentials.client_id.clone(),
            config.credentials.client_secret.clone(),
        )
    }
}

#[async_trait]
impl TokenExchange for ClientCredentials {
    async fn exchange(&self) -> Result<Token> {
        let form = [
            ("grant_type", "client_credentials"),
            ("resource", self.resource.as_str()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];

        let response = self
            .client
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| ExporterError::Auth(format!("Error authenticating against Azure API: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExporterError::Auth(format!(
                "Token endpoint {} returned status {}",
                self.token_url, status
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ExporterError::Auth(format!("Error reading token response: {}", e)))?;

        let parsed: TokenResponse = serde_json::from_slice(&body)
            .map_err(|e| ExporterError::Auth(format!("Malformed token response: {}", e)))?;

        Token::try_from(parsed)
    }
}

/// Shared holder of the current token.
///
/// The lock is held across the exchange, so at most one refresh runs at a
/// time and callers queued behind it see the refreshed token.
pub struct TokenCache {
    exchange: Box<dyn TokenExchange>,
    current: Mutex<Option<Token>>,
}

impl TokenCache {
    /// Create an empty cache; the first `acquire` performs the exchange
    pub fn new(exchange: impl TokenExchange) -> Self {
        Self {
            exchange: Box::new(exchange),
            current: Mutex::new(None),
        }
    }

    /// Create a cache seeded with an existing token
    #[cfg(test)]
    pub fn with_token(exchange: impl TokenExchange, token: Token) -> Self {
        Self {
            exchange: Box::new(exchange),
            current: Mutex::new(Some(token)),
        }
    }

    /// Return a token valid for at least the refresh margin, refreshing if needed.
    ///
    /// A failed refresh leaves the held token untouched.
    pub async fn acquire(&self) -> Result<Token> {
        let mut current = self.current.lock().await;

        if let Some(token) = current.as_ref() {
            if !token.needs_refresh(Utc::now()) {
                return Ok(token.clone());
            }
            debug!("Access token expires at {}, refreshing", token.expires_at);
        }

        match self.exchange.exchange().await {
            Ok(fresh) => {
                info!("Acquired access token valid until {}", fresh.expires_at);
                *current = Some(fresh.clone());
                Ok(fresh)
            }
            Err(e) => {
                error!("Failed to refresh access token: {}", e);
                Err(match e {
                    auth @ ExporterError::Auth(_) => auth,
                    other => ExporterError::Auth(other.to_string()),
                })
            }
        }
    }

    /// Snapshot of the held token without refreshing
    #[cfg(test)]
    pub async fn peek(&self) -> Option<Token> {
        self.current.lock().await.clone()
    }
}
