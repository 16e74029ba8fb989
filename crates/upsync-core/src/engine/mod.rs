//! Polling loop
//!
//! The Poller is responsible for:
//! - Resolving the configured hostname once per cycle
//! - Comparing the answer with the last applied address
//! - Rendering and writing the config file when it changed
//! - Reloading the proxy and recording the new address on success
//!
//! ## Architecture
//!
//! ```text
//!                            ┌──────────────┐
//!                            │    Poller    │
//!                            └──────────────┘
//!                                     │
//!         ┌───────────────────────────┼───────────────────────────┐
//!         │                           │                           │
//!         ▼                           ▼                           ▼
//! ┌─────────────┐           ┌──────────────────┐          ┌─────────────┐
//! │  Resolver   │           │ render + write   │          │  Reloader   │
//! │ (resolve)   │           │ (ConfigFile)     │          │  (reload)   │
//! └─────────────┘           └──────────────────┘          └─────────────┘
//! ```
//!
//! ## Cycle
//!
//! 1. Resolve; on error keep the last address and wait for the next tick
//! 2. Same address as last time: nothing to do
//! 3. Render and write; on error keep the last address
//! 4. Reload; on error keep the last address (the file is already ahead of
//!    the live proxy until a later cycle succeeds)
//! 5. Record the new address

use std::future::Future;
use std::net::IpAddr;
use tracing::{debug, error, info};

use crate::config::RunConfig;
use crate::error::Result;
use crate::output::ConfigFile;
use crate::render::render;
use crate::traits::{Reloader, Resolver, format_address};

/// Result of one successful cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// DNS returned the address the proxy already uses
    Unchanged {
        address: IpAddr,
    },

    /// The file was rewritten and the proxy reloaded
    Updated {
        previous: Option<IpAddr>,
        current: IpAddr,
    },
}

/// Resolve → compare → render → reload loop
///
/// The Poller owns everything a cycle needs, including the only piece of
/// state carried between cycles: the last address that was written *and*
/// successfully reloaded.
///
/// ## Lifecycle
///
/// 1. Create with [`Poller::new()`]
/// 2. Start with [`Poller::run()`], which never returns
///
/// [`Poller::run_cycle()`] drives a single cycle without any waiting.
pub struct Poller {
    /// Resolver for the proxy host
    resolver: Box<dyn Resolver>,

    /// Reload trigger for the external proxy
    reloader: Box<dyn Reloader>,

    /// Generated file on disk
    config_file: ConfigFile,

    /// Immutable run parameters
    config: RunConfig,

    /// Address the live proxy is known to use
    last_address: Option<IpAddr>,
}

impl Poller {
    /// Create a new poller
    ///
    /// # Parameters
    ///
    /// - `resolver`: Resolver implementation
    /// - `reloader`: Reloader implementation
    /// - `config_file`: Output file, already checked by [`ConfigFile::ensure`]
    /// - `config`: Run configuration
    pub fn new(
        resolver: Box<dyn Resolver>,
        reloader: Box<dyn Reloader>,
        config_file: ConfigFile,
        config: RunConfig,
    ) -> Self {
        Self {
            resolver,
            reloader,
            config_file,
            config,
            last_address: None,
        }
    }

    /// Address recorded by the last fully successful cycle
    pub fn last_address(&self) -> Option<IpAddr> {
        self.last_address
    }

    /// Run the loop forever
    ///
    /// The first cycle starts immediately; each later one starts one refresh
    /// interval after the previous one finished. Cycle failures are logged
    /// and retried on the next tick.
    pub async fn run(&mut self) {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Run the loop until `shutdown` completes
    ///
    /// **TESTING ONLY**: the daemon has no cancellation path and uses
    /// [`Poller::run()`]. `shutdown` is only observed while sleeping between
    /// cycles, never in the middle of one.
    pub async fn run_until<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let reloader = self.reloader.describe();
        info!(
            "Tracking {} every {:?}, writing {}, reloading via `{}`",
            self.config.proxy_host,
            self.config.refresh_interval,
            self.config_file.path().display(),
            reloader
        );

        let mut first_run = true;
        loop {
            if !first_run {
                info!(
                    "Will refresh again after {} minute(s)",
                    self.config.refresh_interval.as_secs() / 60
                );
                tokio::select! {
                    _ = tokio::time::sleep(self.config.refresh_interval) => {}
                    _ = &mut shutdown => {
                        info!("Shutdown requested, leaving poll loop");
                        return;
                    }
                }
            }
            first_run = false;

            if let Err(e) = self.run_cycle().await {
                let reloader = self.reloader.describe();
                error!(
                    "Cycle failed, will retry next tick (reloader `{}`): {}",
                    reloader, e
                );
            }
        }
    }

    /// Run one resolve → compare → render → reload cycle
    ///
    /// # Returns
    ///
    /// - `Ok(CycleOutcome::Unchanged)`: nothing was written or reloaded
    /// - `Ok(CycleOutcome::Updated)`: file written, proxy reloaded, address recorded
    /// - `Err(Error)`: resolution, write or reload failed; the recorded address
    ///   is left as it was
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome> {
        let host = &self.config.proxy_host;
        let current = self.resolver.resolve(host).await?;
        info!(
            "Resolved IP address \"{}\" for host \"{}\"",
            format_address(current),
            host
        );

        if self.last_address == Some(current) {
            debug!(
                "IP address is unchanged, {} will not be modified",
                self.config_file.path().display()
            );
            return Ok(CycleOutcome::Unchanged { address: current });
        }

        let content = render(&self.config, current);
        self.config_file.write(&content).await?;
        info!(
            "Wrote upstream {} to {}",
            format_address(current),
            self.config_file.path().display()
        );

        self.reloader.reload().await?;

        let previous = self.last_address.replace(current);
        info!(
            "Proxy now points at {} (previous: {})",
            format_address(current),
            previous
                .map(format_address)
                .unwrap_or_else(|| "none".to_string())
        );

        Ok(CycleOutcome::Updated { previous, current })
    }
}
