//! Status monitoring and incremental notification engine.
//!
//! - `status` holds the per-service two-state machine
//! - `registry` is the shared, lock-guarded machine table
//! - `cursor` implements incremental transaction-feed replay
//! - `scheduler` runs the periodic ticks that drive everything

pub mod cursor;
pub mod registry;
pub mod scheduler;
pub mod status;

pub use registry::StatusRegistry;
pub use scheduler::Monitor;
