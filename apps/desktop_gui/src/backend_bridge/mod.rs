//! Worker thread that owns the tokio runtime and the workflow controller.

pub mod commands;
pub mod runtime;
