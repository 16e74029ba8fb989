//! Core traits for upsync
//!
//! The polling loop only talks to the outside world through these seams.
//!
//! - [`Resolver`]: Turn the configured hostname into an address
//! - [`Reloader`]: Make the external proxy apply the new file

pub mod reloader;
pub mod resolver;

pub use reloader::Reloader;
pub use resolver::{Resolver, format_address};
