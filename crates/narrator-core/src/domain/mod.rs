//! Domain types shared by every narrator crate.

mod narration;
mod provider;
mod server;

pub use narration::{
    ClipPath, Generation, NarrationEvent, NarrationSequence, NarrationUnit, UnitContent, UnitMode,
};
pub use provider::{
    DEFAULT_CLOUD_BASE_URL, DEFAULT_KITTENTTS_URL, DEFAULT_OPENTTS_URL, ProviderConfig,
    ProviderId, UnknownProvider,
};
pub use server::{
    DependencyCheck, DependencyProbe, DependencyReport, KITTENTTS_PACKAGES, LocalServer,
    OPENTTS_CONTAINER, OPENTTS_IMAGE, ServerState, StartOptions,
};
