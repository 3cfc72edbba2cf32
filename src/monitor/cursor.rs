//! Incremental replay of the wallet transaction feed.
//!
//! The feed collaborator returns transactions newest first. Each chat
//! carries a cursor: the hash of the newest transaction already seen.
//! Advancing collects the prefix of the feed strictly newer than the
//! cursor, so each transaction is alerted on at most once per cursor
//! position, and the cursor only ever moves forward to the head of the
//! feed.
//!
//! Fresh transactions are reported newest first, in feed order. If the
//! cursor hash has rotated out of the returned feed window, the scan
//! consumes the whole feed and every entry counts as new.

use crate::types::Transaction;

/// Result of one cursor advance.
#[derive(Debug, Clone, PartialEq)]
pub struct Advance {
    /// Transactions not seen before, newest first. Empty on the very
    /// first sync: initialising the cursor must not replay the entire
    /// wallet history as alerts.
    pub fresh: Vec<Transaction>,
    /// Cursor to persist, or `None` when the feed gave us nothing to
    /// move to (empty feed, or head unchanged).
    pub cursor: Option<String>,
}

/// Compute which feed entries are new relative to `cursor` and where
/// the cursor moves. Pure: persistence and alert delivery are the
/// caller's job.
pub fn advance(cursor: Option<&str>, feed: &[Transaction]) -> Advance {
    let head = match feed.first() {
        Some(tx) => tx.hash.clone(),
        // Empty feed: nothing new, cursor stays where it was.
        None => {
            return Advance {
                fresh: Vec::new(),
                cursor: None,
            }
        }
    };

    match cursor {
        // First sync for this chat: set the watermark, alert nothing.
        None => Advance {
            fresh: Vec::new(),
            cursor: Some(head),
        },
        Some(last_seen) => {
            let fresh: Vec<Transaction> = feed
                .iter()
                .take_while(|tx| tx.hash != last_seen)
                .cloned()
                .collect();
            let cursor = if head == last_seen { None } else { Some(head) };
            Advance { fresh, cursor }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
