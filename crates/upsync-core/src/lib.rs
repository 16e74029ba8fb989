// # upsync-core
//
// Core library for keeping a reverse-proxy upstream pointed at whatever
// address a hostname currently resolves to.
//
// ## Architecture Overview
//
// - **Resolver**: Trait for hostname → address lookup
// - **Reloader**: Trait for making the external proxy apply the new file
// - **render**: Pure config file rendering
// - **ConfigFile**: Startup check and truncate-and-rewrite of the output
// - **Poller**: The resolve → compare → render → reload loop
//
// ## Design Principles
//
// 1. **No globals**: all run state lives in the Poller
// 2. **Substitutable I/O**: DNS and reload go through traits
// 3. **Converging retries**: the last address only moves after a full success

pub mod config;
pub mod dns;
pub mod engine;
pub mod error;
pub mod output;
pub mod reload;
pub mod render;
pub mod traits;

// Re-export core types for convenience
pub use config::{FlagValues, Protocol, ReloadCommand, RunConfig};
pub use dns::SystemResolver;
pub use engine::{CycleOutcome, Poller};
pub use error::{Error, Result};
pub use output::ConfigFile;
pub use reload::CommandReloader;
pub use render::{render, upstream_name};
pub use traits::{Reloader, Resolver, format_address};
