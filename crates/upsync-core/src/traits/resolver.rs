// # Resolver Trait
//
// Defines the interface for turning the configured hostname into an address.
//
// ## Implementations
//
// - System resolver (getaddrinfo via tokio): `crate::dns::SystemResolver`
// - Test doubles in `tests/common`
//
// ## Usage
//
// ```rust,ignore
// use upsync_core::{Resolver, format_address};
//
// let resolver = /* Resolver implementation */;
// let ip = resolver.resolve("backend.example.com").await?;
// println!("server {}:80;", format_address(ip));
// ```

use async_trait::async_trait;
use std::net::IpAddr;

/// Trait for hostname resolution
///
/// Implementations return exactly one address per call. When a lookup yields
/// several, the choice must be deterministic within that call; it does not
/// have to be stable across calls (round-robin DNS is fine).
///
/// The polling loop owns all retry and comparison logic. A resolver only
/// answers "what is the address right now".
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Resolve `host` to a single address
    ///
    /// `host` may already be an IP literal, in which case it resolves to
    /// itself.
    ///
    /// # Returns
    ///
    /// - `Ok(IpAddr)`: the chosen address
    /// - `Err(Error::Resolution)`: lookup failed or returned nothing
    async fn resolve(&self, host: &str) -> Result<IpAddr, crate::Error>;
}

/// Format an address for embedding before a `:port` separator
///
/// IPv6 addresses are wrapped in brackets; IPv4 addresses are left bare.
/// IPv4-mapped IPv6 addresses are emitted in their IPv4 form.
pub fn format_address(ip: IpAddr) -> String {
    match ip.to_canonical() {
        IpAddr::V4(v4) => v4.to_string(),
        IpAddr::V6(v6) => format!("[{}]", v6),
    }
}
