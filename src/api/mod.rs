//! Rig management API integration.
//!
//! Defines the `RigApi` trait consumed by the monitor and provides the
//! HTTP implementation in `client`. The trait exists so the scheduler
//! can be exercised against a deterministic in-memory API in tests.

pub mod client;

use async_trait::async_trait;
use serde::Deserialize;

use crate::types::{ApiError, Rig, Transaction};

/// A service entry from the rig status endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceReport {
    pub name: String,
    /// "active" or "inactive" per the API contract. Anything else is
    /// treated as inactive, matching how the rig reports stopped units.
    pub status: String,
}

impl ServiceReport {
    pub fn is_active(&self) -> bool {
        self.status == "active"
    }
}

/// The wallet endpoint payload as consumed by the monitor: the
/// transaction feed, newest first.
#[derive(Debug, Clone)]
pub struct WalletReport {
    pub transactions: Vec<Transaction>,
}

/// Abstraction over the rig management API.
///
/// Queries must be idempotent and side-effect-free; `restart` is the
/// one write operation and requires a superuser credential.
#[async_trait]
pub trait RigApi: Send + Sync {
    /// Fetch the current status of every service on this rig.
    async fn service_status(&self, rig: &Rig) -> Result<Vec<ServiceReport>, ApiError>;

    /// Fetch the wallet transaction feed for this rig's account,
    /// newest first. May be empty.
    async fn wallet(&self, rig: &Rig) -> Result<WalletReport, ApiError>;

    /// Ask the rig to restart a named service.
    async fn restart(&self, rig: &Rig, service: &str) -> Result<(), ApiError>;
}
