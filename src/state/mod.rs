//! Event lifecycle state module
//!
//! This module owns the event status machine and its operation guards

pub mod machine;

// Re-export commonly used state components
pub use machine::{can_transition, ensure_allowed, ensure_transition, LifecycleAction};
