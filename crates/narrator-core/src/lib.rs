//! Core domain for the move narrator.
//!
//! Pure types and logic only: narration units, the SAN translator, provider
//! identities and settings, dependency-check types, the ports adapters
//! implement, and the local server lifecycle manager.

#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod ports;
pub mod services;
pub mod settings;
pub mod translator;

pub use domain::{
    ClipPath, DependencyCheck, DependencyProbe, DependencyReport, Generation, LocalServer,
    NarrationEvent, NarrationSequence, NarrationUnit, ProviderConfig, ProviderId, ServerState,
    StartOptions, UnitContent, UnitMode, UnknownProvider,
};
pub use ports::{ServerReadiness, ServerSupervisor, SettingsSource, SharedSettings, SupervisorError};
pub use services::{LifecycleError, LifecycleManager};
pub use settings::{Settings, SettingsError, validate_settings};
pub use translator::{
    annotation_to_spoken, build_units, clean_comment, demo_units, san_to_spoken,
    translate_annotation, translate_move,
};

#[cfg(test)]
use tokio_test as _;
