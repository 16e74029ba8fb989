// # System Resolver
//
// Resolver backed by the operating system's resolver (getaddrinfo), reached
// through `tokio::net::lookup_host`.
//
// ## Selection Policy
//
// A lookup can return several addresses. The first IPv4 address wins; if
// there is none, the first address of any family is used. IPv4-mapped IPv6
// results count as IPv4.

use async_trait::async_trait;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tracing::debug;

use crate::error::{Error, Result};
use crate::traits::Resolver;

/// Upper bound on a single lookup
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(30);

/// Resolver using the system's name service
#[derive(Debug, Clone)]
pub struct SystemResolver {
    timeout: Duration,
}

impl SystemResolver {
    /// Create a resolver with the default lookup timeout
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    /// Create a resolver with a custom lookup timeout
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for SystemResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Resolver for SystemResolver {
    async fn resolve(&self, host: &str) -> Result<IpAddr> {
        // Literals never hit the network.
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(ip.to_canonical());
        }

        let lookup = tokio::net::lookup_host((host, 0));
        let addrs = match tokio::time::timeout(self.timeout, lookup).await {
            Ok(Ok(addrs)) => addrs.map(|addr: SocketAddr| addr.ip()),
            Ok(Err(e)) => return Err(Error::resolution(host, e.to_string())),
            Err(_) => {
                return Err(Error::resolution(
                    host,
                    format!("lookup timed out after {:?}", self.timeout),
                ));
            }
        };

        let candidates: Vec<IpAddr> = addrs.collect();
        debug!("Lookup of {} returned {:?}", host, candidates);

        select_address(&candidates)
            .ok_or_else(|| Error::resolution(host, "no addresses returned"))
    }
}

/// Pick one address from a lookup result, preferring IPv4
pub fn select_address(candidates: &[IpAddr]) -> Option<IpAddr> {
    let canonical = candidates.iter().map(|ip| ip.to_canonical());
    canonical
        .clone()
        .find(IpAddr::is_ipv4)
        .or_else(|| canonical.clone().next())
}
