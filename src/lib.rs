//! rigwatch: mining-rig service monitor.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod api;
pub mod config;
pub mod monitor;
pub mod notify;
pub mod storage;
pub mod types;
