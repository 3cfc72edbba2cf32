//! Shared types for the RIGWATCH daemon.
//!
//! These types form the data model used across all modules. The
//! monitor, api, notify, and storage modules depend on them without
//! circular references.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Rigs and identities
// ---------------------------------------------------------------------------

/// One configured rig: a management API endpoint plus the credential
/// and chat it belongs to. Produced externally (by the setup flow) and
/// read from the rig file on every tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rig {
    /// Human-readable name, shown in alerts.
    pub name: String,
    /// Base URL of the rig management API.
    pub endpoint: String,
    /// API token, sent as `Authorization: Token {token}`.
    pub token: String,
    /// Whether the credential may restart services.
    #[serde(default)]
    pub superuser: bool,
    /// Telegram chat that owns this rig and receives its alerts.
    pub chat_id: i64,
}

impl fmt::Display for Rig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.endpoint)
    }
}

/// Identity of one monitored service: which chat watches it, on which
/// endpoint, and the service name reported by the rig API. Equality is
/// by value; this is the registry key, immutable once observed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceKey {
    pub chat_id: i64,
    pub endpoint: String,
    pub service: String,
}

impl ServiceKey {
    pub fn new(chat_id: i64, endpoint: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            chat_id,
            endpoint: endpoint.into(),
            service: service.into(),
        }
    }

    /// Whether this key belongs to the given rig.
    pub fn belongs_to(&self, rig: &Rig) -> bool {
        self.chat_id == rig.chat_id && self.endpoint == rig.endpoint
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.endpoint, self.service)
    }
}

// ---------------------------------------------------------------------------
// Poll outcomes and service state
// ---------------------------------------------------------------------------

/// Recorded state of one monitored service. Fresh machines start
/// `Inactive` so the first successful poll of a running service
/// produces an "active" edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceState {
    Inactive,
    Active,
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceState::Inactive => write!(f, "inactive"),
            ServiceState::Active => write!(f, "active"),
        }
    }
}

/// Result of polling one service in one tick.
///
/// `Unreachable` means the poll itself failed (transport error or
/// timeout). It drives the state machine exactly like `Inactive`, but
/// the alert text differs so the operator knows the rig could not be
/// reached rather than reporting a clean stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Active,
    Inactive,
    Unreachable,
}

/// An edge-triggered state change worth telling the operator about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEdge {
    /// Inactive → Active.
    Activated,
    /// Active → Inactive on a clean "inactive" report.
    Stopped,
    /// Active → Inactive because the poll failed.
    Unreachable,
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

/// One wallet transaction as reported by the rig API. Read-only,
/// externally supplied; the feed returns these newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub hash: String,
    pub token_name: String,
    pub token_symbol: String,
    pub value: Decimal,
    pub timestamp: DateTime<Utc>,
    pub source: String,
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} ({})",
            self.hash, self.value, self.token_symbol, self.timestamp
        )
    }
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// An outgoing alert. Fire-and-forget: no delivery acknowledgement is
/// tracked anywhere in the daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub chat_id: i64,
    pub text: String,
}

impl Notification {
    pub fn new(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tick reports
// ---------------------------------------------------------------------------

/// Summary of one status tick, for structured logging.
#[derive(Debug, Clone, Default)]
pub struct StatusTickReport {
    pub rigs_polled: usize,
    pub rigs_failed: usize,
    pub services_seen: usize,
    pub edges: usize,
    pub evicted: usize,
}

/// Summary of one wallet tick.
#[derive(Debug, Clone, Default)]
pub struct WalletTickReport {
    pub chats_synced: usize,
    pub chats_failed: usize,
    pub transactions_notified: usize,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors surfaced by the rig management API client.
///
/// The scheduler maps these at the per-resource boundary: `Transport`
/// and `Status` become `PollOutcome::Unreachable`; `Malformed` means
/// "status unknown this cycle" and causes no transition at all.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("transport error calling {endpoint}: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("rig API {endpoint} returned HTTP {status}")]
    Status {
        endpoint: String,
        status: reqwest::StatusCode,
    },

    #[error("malformed response from {endpoint}: {message}")]
    Malformed { endpoint: String, message: String },
}

impl ApiError {
    /// Whether the failure is one where the rig simply could not be
    /// reached or answered with an error (as opposed to answering
    /// successfully with garbage).
    pub fn is_unreachable(&self) -> bool {
        matches!(self, ApiError::Transport { .. } | ApiError::Status { .. })
    }
}

/// Errors from the durable store (rig list and cursor file).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
