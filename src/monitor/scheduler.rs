//! Periodic poll scheduler.
//!
//! Two independently timed tasks drive the whole daemon:
//! - the status tick polls every configured rig for service liveness
//!   and turns the results into edge-triggered alerts;
//! - the wallet tick syncs each chat's transaction feed against its
//!   persisted cursor.
//!
//! Within a tick, resources are processed sequentially, and a failure
//! on one resource never prevents processing of the next. Each loop
//! re-arms only after its tick completes, so a task never overlaps
//! itself; the two tasks do overlap each other, which the registry's
//! lock covers.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::api::RigApi;
use crate::monitor::{cursor, StatusRegistry};
use crate::notify::{self, Notifier};
use crate::storage::Store;
use crate::types::{
    Notification, PollOutcome, Rig, ServiceKey, StatusEdge, StatusTickReport, WalletTickReport,
};

pub struct Monitor {
    api: Arc<dyn RigApi>,
    notifier: Arc<dyn Notifier>,
    store: Arc<dyn Store>,
    registry: StatusRegistry,
}

impl Monitor {
    pub fn new(api: Arc<dyn RigApi>, notifier: Arc<dyn Notifier>, store: Arc<dyn Store>) -> Self {
        Self {
            api,
            notifier,
            store,
            registry: StatusRegistry::new(),
        }
    }

    pub fn registry(&self) -> &StatusRegistry {
        &self.registry
    }

    // -- Status tick -----------------------------------------------------

    /// One pass over every configured rig: poll its services, feed the
    /// outcomes to the registry, and alert on each edge.
    pub async fn status_tick(&self) -> Result<StatusTickReport> {
        let rigs = self.store.rigs().context("failed to load rig list")?;
        let mut report = StatusTickReport {
            evicted: self.registry.remove_missing(&rigs),
            ..Default::default()
        };

        for rig in &rigs {
            report.rigs_polled += 1;
            match self.api.service_status(rig).await {
                Ok(services) => {
                    report.services_seen += services.len();
                    for svc in &services {
                        let outcome = if svc.is_active() {
                            PollOutcome::Active
                        } else {
                            PollOutcome::Inactive
                        };
                        let key = ServiceKey::new(rig.chat_id, &rig.endpoint, &svc.name);
                        if let Some(edge) = self.registry.observe(&key, outcome) {
                            report.edges += 1;
                            self.alert_edge(rig, &svc.name, edge).await;
                        }
                    }
                }
                Err(e) if e.is_unreachable() => {
                    report.rigs_failed += 1;
                    warn!(rig = %rig.name, error = %e, "rig unreachable this tick");
                    for (key, edge) in self.registry.mark_rig_unreachable(rig) {
                        report.edges += 1;
                        self.alert_edge(rig, &key.service, edge).await;
                    }
                }
                Err(e) => {
                    // Malformed payload: status unknown this cycle. No
                    // transition, no alert, just diagnostics.
                    report.rigs_failed += 1;
                    warn!(rig = %rig.name, error = %e, "unusable status payload, skipping rig");
                }
            }
        }

        Ok(report)
    }

    async fn alert_edge(&self, rig: &Rig, service: &str, edge: StatusEdge) {
        let text = notify::status_text(&rig.name, service, edge);
        let notification = Notification::new(rig.chat_id, text);
        if let Err(e) = self.notifier.send(&notification).await {
            warn!(chat_id = rig.chat_id, error = %e, "status alert delivery failed");
        }
    }

    // -- Wallet tick -----------------------------------------------------

    /// One pass over every chat: fetch the transaction feed through one
    /// of the chat's rigs, advance the cursor, and alert on each fresh
    /// transaction. Alerts go out before the cursor is persisted, so a
    /// crash in between re-delivers rather than drops.
    pub async fn wallet_tick(&self) -> Result<WalletTickReport> {
        let rigs = self.store.rigs().context("failed to load rig list")?;
        let mut report = WalletTickReport::default();

        for (chat_id, rig) in chats(&rigs) {
            match self.sync_chat(chat_id, rig).await {
                Ok(notified) => {
                    report.chats_synced += 1;
                    report.transactions_notified += notified;
                }
                Err(e) => {
                    report.chats_failed += 1;
                    warn!(chat_id, rig = %rig.name, error = %e, "wallet sync failed for chat");
                }
            }
        }

        Ok(report)
    }

    async fn sync_chat(&self, chat_id: i64, rig: &Rig) -> Result<usize> {
        let wallet = self.api.wallet(rig).await.context("wallet query failed")?;
        let last_seen = self
            .store
            .cursor(chat_id)
            .context("failed to load cursor")?;

        let advance = cursor::advance(last_seen.as_deref(), &wallet.transactions);
        debug!(
            chat_id,
            fresh = advance.fresh.len(),
            cursor = ?advance.cursor,
            "wallet feed advanced"
        );

        for tx in &advance.fresh {
            let notification = Notification::new(chat_id, notify::transaction_text(tx));
            if let Err(e) = self.notifier.send(&notification).await {
                warn!(chat_id, hash = %tx.hash, error = %e, "transaction alert delivery failed");
            }
        }

        if let Some(new_cursor) = advance.cursor {
            self.store
                .set_cursor(chat_id, &new_cursor)
                .context("failed to persist cursor")?;
        }

        Ok(advance.fresh.len())
    }

    // -- Restart ---------------------------------------------------------

    /// Ask a rig to restart one of its services. Requires a superuser
    /// credential; the next status tick observes the resulting state
    /// change and alerts on it like any other edge.
    pub async fn restart_service(&self, rig: &Rig, service: &str) -> Result<()> {
        if !rig.superuser {
            anyhow::bail!("rig {} credential is not superuser, refusing restart", rig.name);
        }
        self.api
            .restart(rig, service)
            .await
            .with_context(|| format!("restart of {service} on {} failed", rig.name))?;
        info!(rig = %rig.name, service, "service restart requested");
        Ok(())
    }

    // -- Loops -----------------------------------------------------------

    /// Run the status loop forever. Each tick runs in its own task so
    /// that a failed or panicking tick is logged and the loop still
    /// resumes on the next interval.
    pub async fn run_status_loop(self: Arc<Self>, period: Duration) {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let this = Arc::clone(&self);
            match tokio::spawn(async move { this.status_tick().await }).await {
                Ok(Ok(report)) => info!(
                    rigs = report.rigs_polled,
                    failed = report.rigs_failed,
                    services = report.services_seen,
                    edges = report.edges,
                    evicted = report.evicted,
                    "status tick complete"
                ),
                Ok(Err(e)) => error!(error = %e, "status tick failed, continuing"),
                // The tick's own task absorbed the unwind.
                Err(e) => error!(error = %e, "status tick panicked, continuing"),
            }
        }
    }

    /// Run the wallet loop forever, same failure policy as the status
    /// loop.
    pub async fn run_wallet_loop(self: Arc<Self>, period: Duration) {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let this = Arc::clone(&self);
            match tokio::spawn(async move { this.wallet_tick().await }).await {
                Ok(Ok(report)) => info!(
                    chats = report.chats_synced,
                    failed = report.chats_failed,
                    transactions = report.transactions_notified,
                    "wallet tick complete"
                ),
                Ok(Err(e)) => error!(error = %e, "wallet tick failed, continuing"),
                Err(e) => error!(error = %e, "wallet tick panicked, continuing"),
            }
        }
    }
}

/// One representative rig per chat, in stable chat order. The feed is
/// account-level, so any of the chat's rigs answers for it.
fn chats(rigs: &[Rig]) -> Vec<(i64, &Rig)> {
    let mut by_chat: BTreeMap<i64, &Rig> = BTreeMap::new();
    for rig in rigs {
        by_chat.entry(rig.chat_id).or_insert(rig);
    }
    by_chat.into_iter().collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
