//! Concurrency-safe registry of status machines.
//!
//! The single shared mutable structure in the daemon. Both scheduled
//! tasks run against it, possibly overlapping, so every access happens
//! under one mutex. Lookup-or-create is the only way a machine comes
//! into existence; a given `ServiceKey` therefore never has two
//! machines.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::monitor::status;
use crate::types::{PollOutcome, Rig, ServiceKey, ServiceState, StatusEdge};

/// Registry of one status machine per monitored service.
#[derive(Default)]
pub struct StatusRegistry {
    inner: Mutex<HashMap<ServiceKey, ServiceState>>,
}

impl StatusRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one poll outcome to the machine for `key`, creating it in
    /// the Inactive state if this is the first observation. Returns
    /// the edge to alert on, if the observed state differs from the
    /// recorded one.
    pub fn observe(&self, key: &ServiceKey, outcome: PollOutcome) -> Option<StatusEdge> {
        let mut map = self.lock();
        let state = map.entry(key.clone()).or_insert(ServiceState::Inactive);
        let (next, edge) = status::step(*state, outcome);
        *state = next;
        edge
    }

    /// Mark every already-known service of `rig` unreachable, in one
    /// critical section. Used when a rig-level poll fails and no
    /// per-service payload exists: machines the rig has previously
    /// reported go down, nothing new is created.
    pub fn mark_rig_unreachable(&self, rig: &Rig) -> Vec<(ServiceKey, StatusEdge)> {
        let mut map = self.lock();
        let mut edges = Vec::new();
        for (key, state) in map.iter_mut() {
            if key.belongs_to(rig) {
                let (next, edge) = status::step(*state, PollOutcome::Unreachable);
                *state = next;
                if let Some(e) = edge {
                    edges.push((key.clone(), e));
                }
            }
        }
        edges
    }

    /// Evict machines belonging to rigs no longer in the upstream rig
    /// list. Returns how many were removed. Called at the top of every
    /// status tick, before any polling.
    pub fn remove_missing(&self, current: &[Rig]) -> usize {
        let mut map = self.lock();
        let before = map.len();
        map.retain(|key, _| current.iter().any(|rig| key.belongs_to(rig)));
        before - map.len()
    }

    /// Current state of one machine, if it exists.
    pub fn state_of(&self, key: &ServiceKey) -> Option<ServiceState> {
        self.lock().get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<ServiceKey, ServiceState>> {
        // Poisoning only happens if a panic escaped a critical
        // section, which is a programming error; the map itself is
        // still structurally sound.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
