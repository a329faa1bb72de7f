//! Core services composed over ports.

pub mod lifecycle;

pub use lifecycle::{LifecycleError, LifecycleManager};
