//! Port definitions (trait abstractions) for external systems.
//!
//! Ports use only domain types. Implementations live in adapter crates
//! (`narrator-runtime` for the supervisor) or in the services module
//! (the lifecycle manager implements [`ServerReadiness`]).

pub mod readiness;
pub mod settings_source;
pub mod supervisor;

pub use readiness::ServerReadiness;
pub use settings_source::{SettingsSource, SharedSettings};
pub use supervisor::{ServerSupervisor, SupervisorError};
