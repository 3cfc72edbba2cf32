//! Alert delivery.
//!
//! The `Notifier` trait is the daemon's only outbound channel. Sends
//! are best-effort and fire-and-forget: a delivery failure is logged
//! by the caller and never changes monitoring state.

pub mod telegram;

use async_trait::async_trait;

use crate::types::{Notification, StatusEdge, Transaction};

/// Outbound notification sink.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> anyhow::Result<()>;
}

// ---------------------------------------------------------------------------
// Message formatting
// ---------------------------------------------------------------------------

/// Render the alert text for a status edge on `service` of rig `rig`.
pub fn status_text(rig: &str, service: &str, edge: StatusEdge) -> String {
    match edge {
        StatusEdge::Activated => {
            format!("Service `{service}` on `{rig}` is active and running now")
        }
        StatusEdge::Stopped => {
            format!("Service `{service}` on `{rig}` stops working and is now inactive")
        }
        StatusEdge::Unreachable => format!("Cannot access `{service}` on `{rig}`"),
    }
}

/// Render the alert text for a completed wallet transaction.
pub fn transaction_text(tx: &Transaction) -> String {
    format!(
        "*Transaction completed*\n \
         - Token: `{}`\n \
         - Value: `{} {}`\n \
         - Date: `{}`",
        tx.token_name,
        tx.value,
        tx.token_symbol,
        tx.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
