//! OS-level runtime for the narrator: dependency probes, setup, and the
//! KittenTTS / OpenTTS server processes.
//!
//! [`ProcessSupervisor`] implements the core's
//! [`ServerSupervisor`](narrator_core::ServerSupervisor) port; the
//! [`LifecycleManager`](narrator_core::LifecycleManager) drives it.

#![deny(unsafe_code)]

pub mod paths;
pub mod process;
mod supervisor;

pub use paths::KittenTtsPaths;
pub use supervisor::ProcessSupervisor;
