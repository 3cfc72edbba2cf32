//! HTTP client for the rig management API.
//!
//! Endpoints (relative to each rig's base URL):
//! - `GET  /api/v1/status/`  reports per-service liveness
//! - `GET  /api/v1/wallet/`  returns balances and the transaction feed
//! - `POST /api/v1/restart/` restarts a named service (superuser)
//!
//! Auth: `Authorization: Token {token}`. Every call is bounded by the
//! configured timeout; a timeout or connection failure surfaces as
//! `ApiError::Transport` so the scheduler can treat the rig as
//! unreachable without aborting its tick.

use chrono::{DateTime, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{RigApi, ServiceReport, WalletReport};
use crate::types::{ApiError, Rig, Transaction};

// ---------------------------------------------------------------------------
// API response types (rig JSON → Rust)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct StatusPayload {
    services: Vec<ServiceReport>,
}

#[derive(Debug, Deserialize)]
struct WalletPayload {
    #[serde(default)]
    transactions: Vec<RawTransaction>,
}

/// Transaction shape as the rig API reports it, with the token nested.
#[derive(Debug, Deserialize)]
struct RawTransaction {
    hash: String,
    token: RawToken,
    value: Decimal,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    source: String,
}

#[derive(Debug, Deserialize)]
struct RawToken {
    name: String,
    symbol: String,
}

impl From<RawTransaction> for Transaction {
    fn from(raw: RawTransaction) -> Self {
        Transaction {
            hash: raw.hash,
            token_name: raw.token.name,
            token_symbol: raw.token.symbol,
            value: raw.value,
            timestamp: raw.timestamp,
            source: raw.source,
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Rig management API client backed by `reqwest`.
pub struct HttpRigApi {
    http: Client,
}

impl HttpRigApi {
    /// Build a client with connect/read bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, anyhow::Error> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("rigwatch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        rig: &Rig,
        path: &str,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", rig.endpoint.trim_end_matches('/'), path);
        debug!(url = %url, rig = %rig.name, "rig API request");

        let resp = self
            .http
            .get(&url)
            .header("Authorization", format!("Token {}", rig.token))
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                endpoint: rig.endpoint.clone(),
                source,
            })?;

        if !resp.status().is_success() {
            return Err(ApiError::Status {
                endpoint: rig.endpoint.clone(),
                status: resp.status(),
            });
        }

        // Buffer the body so a decode failure can be classified as a
        // malformed (not transport) error.
        let body = resp.text().await.map_err(|source| ApiError::Transport {
            endpoint: rig.endpoint.clone(),
            source,
        })?;

        serde_json::from_str(&body).map_err(|e| ApiError::Malformed {
            endpoint: rig.endpoint.clone(),
            message: e.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl RigApi for HttpRigApi {
    async fn service_status(&self, rig: &Rig) -> Result<Vec<ServiceReport>, ApiError> {
        let payload: StatusPayload = self.get_json(rig, "/api/v1/status/").await?;
        Ok(payload.services)
    }

    async fn wallet(&self, rig: &Rig) -> Result<WalletReport, ApiError> {
        let payload: WalletPayload = self.get_json(rig, "/api/v1/wallet/").await?;
        Ok(WalletReport {
            transactions: payload.transactions.into_iter().map(Into::into).collect(),
        })
    }

    async fn restart(&self, rig: &Rig, service: &str) -> Result<(), ApiError> {
        let url = format!("{}/api/v1/restart/", rig.endpoint.trim_end_matches('/'));
        debug!(url = %url, rig = %rig.name, service, "rig restart request");

        let resp = self
            .http
            .post(&url)
            .header("Authorization", format!("Token {}", rig.token))
            .json(&serde_json::json!({ "name": service }))
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                endpoint: rig.endpoint.clone(),
                source,
            })?;

        if !resp.status().is_success() {
            return Err(ApiError::Status {
                endpoint: rig.endpoint.clone(),
                status: resp.status(),
            });
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
