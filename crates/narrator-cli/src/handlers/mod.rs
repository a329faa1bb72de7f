//! Command handlers, one module per command group.

pub mod narrate;
pub mod server;
pub mod translate;
pub mod voices;
