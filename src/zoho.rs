use std::time::{Duration, Instant};

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::config::Config;

const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(3600);
/// Tokens are treated as expired this long before the provider's own
/// expiry, so a token handed out near the deadline is never used stale.
const EXPIRY_MARGIN: Duration = Duration::from_secs(300);

#[derive(Debug, Error)]
pub enum ZohoError {
    #[error("no Zoho refresh token configured")]
    NotConfigured,
    #[error("request to Zoho failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Zoho token refresh rejected with status {status}")]
    TokenRejected { status: StatusCode, body: String },
    #[error("Zoho ticket creation rejected with status {status}")]
    TicketRejected { status: StatusCode, body: String },
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: String,
    #[serde(default)]
    pub ticket_number: Option<String>,
}

/// Zoho Desk client: exchanges the long-lived refresh token for short-lived
/// access tokens, caches the current one, and creates support tickets.
pub struct ZohoDesk {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    refresh_token: String,
    org_id: String,
    accounts_url: String,
    desk_url: String,
    token: Mutex<Option<CachedToken>>,
}

impl ZohoDesk {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_id: config.zoho_client_id.clone(),
            client_secret: config.zoho_client_secret.clone(),
            refresh_token: config.zoho_refresh_token.clone(),
            org_id: config.zoho_org_id.clone(),
            accounts_url: config.zoho_accounts_url.clone(),
            desk_url: config.zoho_desk_url.clone(),
            token: Mutex::new(None),
        }
    }

    /// Returns the cached access token while it is still valid, refreshing
    /// it otherwise. Holds the token lock for the duration, so concurrent
    /// callers never trigger duplicate refreshes.
    pub async fn get_access_token(&self) -> Result<String, ZohoError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.access_token.clone());
            }
        }
        self.refresh_locked(&mut cached).await
    }

    /// Forces a refresh regardless of the cached token's expiry.
    pub async fn refresh_access_token(&self) -> Result<String, ZohoError> {
        let mut cached = self.token.lock().await;
        self.refresh_locked(&mut cached).await
    }

    async fn refresh_locked(
        &self,
        cached: &mut Option<CachedToken>,
    ) -> Result<String, ZohoError> {
        if self.refresh_token.is_empty() {
            error!("No Zoho refresh token configured");
            return Err(ZohoError::NotConfigured);
        }

        let response = self
            .http
            .post(format!("{}/oauth/v2/token", self.accounts_url))
            .form(&[
                ("refresh_token", self.refresh_token.as_str()),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Failed to refresh Zoho token: {} {}", status, body);
            return Err(ZohoError::TokenRejected { status, body });
        }

        let token: TokenResponse = response.json().await?;
        let ttl = token
            .expires_in
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TOKEN_TTL);
        *cached = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at: Instant::now() + ttl.saturating_sub(EXPIRY_MARGIN),
        });
        info!("Refreshed Zoho access token");
        Ok(token.access_token)
    }

    /// Creates a ticket in Zoho Desk. A 401 means the cached token was
    /// rejected despite looking valid locally (revoked, clock skew); in
    /// that case the token is refreshed and the POST retried exactly once.
    pub async fn create_ticket(&self, payload: &serde_json::Value) -> Result<Ticket, ZohoError> {
        let token = self.get_access_token().await?;
        let mut response = self.post_ticket(payload, &token).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            let token = self.refresh_access_token().await?;
            response = self.post_ticket(payload, &token).await?;
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Failed to create Zoho ticket: {} {}", status, body);
            return Err(ZohoError::TicketRejected { status, body });
        }

        Ok(response.json().await?)
    }

    async fn post_ticket(
        &self,
        payload: &serde_json::Value,
        token: &str,
    ) -> Result<reqwest::Response, ZohoError> {
        let response = self
            .http
            .post(format!("{}/tickets", self.desk_url))
            .header("Authorization", format!("Zoho-oauthtoken {token}"))
            .header("orgId", &self.org_id)
            .json(payload)
            .send()
            .await?;
        Ok(response)
    }
}
