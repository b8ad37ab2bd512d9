// Application layer: CLI command handlers over the lease store.

pub mod commands;
pub mod render;

pub use commands::{run, run_with_clock};
