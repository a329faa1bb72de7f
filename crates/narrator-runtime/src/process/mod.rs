//! Process helpers: one-shot commands, readiness polling, shutdown.

pub mod command;
pub mod health;
pub mod shutdown;

pub use command::{CommandOutput, first_line, run, run_checked};
pub use health::{Readiness, is_http_ready, wait_for_http_ready};
pub use shutdown::{SHUTDOWN_GRACE, shutdown_child};
