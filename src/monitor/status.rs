//! Per-service status machine.
//!
//! A two-state machine (Inactive/Active) driven by poll outcomes. The
//! transition function is pure: it returns the next state plus the
//! edge to alert on, if any. Same-state repeats never produce an edge:
//! a steady rig stays silent between real changes, and a known-down
//! rig does not repeat its failure alert.

use crate::types::{PollOutcome, ServiceState, StatusEdge};

/// Advance one machine by one observation.
///
/// Transition table:
/// - Inactive + Active       → Active, alert "activated"
/// - Active   + Active       → Active, silent
/// - Active   + Inactive     → Inactive, alert "stopped"
/// - Active   + Unreachable  → Inactive, alert "unreachable"
/// - Inactive + Inactive/Unreachable → Inactive, silent
pub fn step(state: ServiceState, outcome: PollOutcome) -> (ServiceState, Option<StatusEdge>) {
    match (state, outcome) {
        (ServiceState::Inactive, PollOutcome::Active) => {
            (ServiceState::Active, Some(StatusEdge::Activated))
        }
        (ServiceState::Active, PollOutcome::Active) => (ServiceState::Active, None),
        (ServiceState::Active, PollOutcome::Inactive) => {
            (ServiceState::Inactive, Some(StatusEdge::Stopped))
        }
        (ServiceState::Active, PollOutcome::Unreachable) => {
            (ServiceState::Inactive, Some(StatusEdge::Unreachable))
        }
        (ServiceState::Inactive, PollOutcome::Inactive | PollOutcome::Unreachable) => {
            (ServiceState::Inactive, None)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
