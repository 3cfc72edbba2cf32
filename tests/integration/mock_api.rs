//! In-memory collaborators for integration testing.
//!
//! Deterministic implementations of `RigApi`, `Notifier`, and `Store`,
//! scripted from test code. No network or disk involved.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rigwatch::api::{RigApi, ServiceReport, WalletReport};
use rigwatch::notify::Notifier;
use rigwatch::storage::Store;
use rigwatch::types::{ApiError, Notification, Rig, StoreError, Transaction};

// ---------------------------------------------------------------------------
// Mock rig API
// ---------------------------------------------------------------------------

/// Per-endpoint scripted behaviour for the rig API.
#[derive(Default)]
pub struct MockRigApi {
    /// Service lists keyed by endpoint.
    services: Mutex<HashMap<String, Vec<(String, String)>>>,
    /// Transaction feeds keyed by endpoint, newest first.
    feeds: Mutex<HashMap<String, Vec<Transaction>>>,
    /// Endpoints that answer HTTP 503 (unreachable path).
    unreachable: Mutex<HashMap<String, bool>>,
    /// Endpoints that answer 200 with garbage (malformed path).
    malformed: Mutex<HashMap<String, bool>>,
}

impl MockRigApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_services(&self, endpoint: &str, services: &[(&str, &str)]) {
        self.services.lock().unwrap().insert(
            endpoint.to_string(),
            services
                .iter()
                .map(|(n, s)| (n.to_string(), s.to_string()))
                .collect(),
        );
    }

    pub fn set_feed(&self, endpoint: &str, feed: Vec<Transaction>) {
        self.feeds.lock().unwrap().insert(endpoint.to_string(), feed);
    }

    pub fn set_unreachable(&self, endpoint: &str, value: bool) {
        self.unreachable
            .lock()
            .unwrap()
            .insert(endpoint.to_string(), value);
    }

    pub fn set_malformed(&self, endpoint: &str, value: bool) {
        self.malformed
            .lock()
            .unwrap()
            .insert(endpoint.to_string(), value);
    }

    fn check(&self, rig: &Rig) -> Result<(), ApiError> {
        if *self
            .unreachable
            .lock()
            .unwrap()
            .get(&rig.endpoint)
            .unwrap_or(&false)
        {
            return Err(ApiError::Status {
                endpoint: rig.endpoint.clone(),
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
            });
        }
        if *self
            .malformed
            .lock()
            .unwrap()
            .get(&rig.endpoint)
            .unwrap_or(&false)
        {
            return Err(ApiError::Malformed {
                endpoint: rig.endpoint.clone(),
                message: "missing field `services`".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RigApi for MockRigApi {
    async fn service_status(&self, rig: &Rig) -> Result<Vec<ServiceReport>, ApiError> {
        self.check(rig)?;
        Ok(self
            .services
            .lock()
            .unwrap()
            .get(&rig.endpoint)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(|(name, status)| ServiceReport { name, status })
            .collect())
    }

    async fn wallet(&self, rig: &Rig) -> Result<WalletReport, ApiError> {
        self.check(rig)?;
        Ok(WalletReport {
            transactions: self
                .feeds
                .lock()
                .unwrap()
                .get(&rig.endpoint)
                .cloned()
                .unwrap_or_default(),
        })
    }

    async fn restart(&self, rig: &Rig, _service: &str) -> Result<(), ApiError> {
        self.check(rig)
    }
}

// ---------------------------------------------------------------------------
// Mock notifier
// ---------------------------------------------------------------------------

/// Collects everything the monitor tries to send.
#[derive(Default)]
pub struct MockNotifier {
    sent: Mutex<Vec<Notification>>,
    fail: Mutex<bool>,
}

impl MockNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }

    pub fn set_fail(&self, value: bool) {
        *self.fail.lock().unwrap() = value;
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn send(&self, notification: &Notification) -> anyhow::Result<()> {
        if *self.fail.lock().unwrap() {
            anyhow::bail!("simulated delivery failure");
        }
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Mock store
// ---------------------------------------------------------------------------

/// In-memory store with controllable persistence failures.
#[derive(Default)]
pub struct MemStore {
    rigs: Mutex<Vec<Rig>>,
    cursors: Mutex<HashMap<i64, String>>,
    fail_persist: Mutex<bool>,
}

impl MemStore {
    pub fn new(rigs: Vec<Rig>) -> Arc<Self> {
        Arc::new(Self {
            rigs: Mutex::new(rigs),
            ..Default::default()
        })
    }

    pub fn set_rigs(&self, rigs: Vec<Rig>) {
        *self.rigs.lock().unwrap() = rigs;
    }

    pub fn set_fail_persist(&self, value: bool) {
        *self.fail_persist.lock().unwrap() = value;
    }

    pub fn cursor_of(&self, chat_id: i64) -> Option<String> {
        self.cursors.lock().unwrap().get(&chat_id).cloned()
    }

    /// Seed a persisted cursor, as if written by a previous run.
    pub fn seed_cursor(&self, chat_id: i64, hash: &str) {
        self.cursors
            .lock()
            .unwrap()
            .insert(chat_id, hash.to_string());
    }
}

impl Store for MemStore {
    fn rigs(&self) -> Result<Vec<Rig>, StoreError> {
        Ok(self.rigs.lock().unwrap().clone())
    }

    fn cursor(&self, chat_id: i64) -> Result<Option<String>, StoreError> {
        Ok(self.cursors.lock().unwrap().get(&chat_id).cloned())
    }

    fn set_cursor(&self, chat_id: i64, hash: &str) -> Result<(), StoreError> {
        if *self.fail_persist.lock().unwrap() {
            return Err(StoreError::Io {
                path: "memstore".into(),
                source: std::io::Error::other("simulated persistence failure"),
            });
        }
        self.cursors
            .lock()
            .unwrap()
            .insert(chat_id, hash.to_string());
        Ok(())
    }
}

/// Store whose rig list read always panics, counting the attempts.
/// Simulates a programming error escaping a tick.
#[derive(Default)]
pub struct PanickingStore {
    calls: AtomicUsize,
}

impl PanickingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Store for PanickingStore {
    fn rigs(&self) -> Result<Vec<Rig>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        panic!("simulated programming error while loading the rig list");
    }

    fn cursor(&self, _chat_id: i64) -> Result<Option<String>, StoreError> {
        Ok(None)
    }

    fn set_cursor(&self, _chat_id: i64, _hash: &str) -> Result<(), StoreError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Shared fixtures
// ---------------------------------------------------------------------------

pub fn rig(name: &str, chat_id: i64) -> Rig {
    Rig {
        name: name.into(),
        endpoint: format!("https://{name}"),
        token: "test-token".into(),
        superuser: true,
        chat_id,
    }
}

pub fn tx(hash: &str) -> Transaction {
    use rust_decimal_macros::dec;
    Transaction {
        hash: hash.into(),
        // Token name carries the hash so alert texts are tellable
        // apart in assertions.
        token_name: format!("Token-{hash}"),
        token_symbol: "ETH".into(),
        value: dec!(0.05),
        timestamp: chrono::Utc::now(),
        source: "nanopool".into(),
    }
}
