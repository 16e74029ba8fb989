// # Reloader Trait
//
// Defines the interface for telling the external proxy to apply the
// regenerated config file.
//
// ## Implementations
//
// - Child process (`nginx -s reload` by default): `crate::reload::CommandReloader`
// - Test doubles in `tests/common`

use async_trait::async_trait;

/// Trait for proxy reload triggers
///
/// This is the only component that changes state outside this process. It is
/// called strictly after the config file write has completed.
#[async_trait]
pub trait Reloader: Send + Sync {
    /// Ask the proxy to reload and wait for the outcome
    ///
    /// # Returns
    ///
    /// - `Ok(())`: the proxy accepted the reload
    /// - `Err(Error::Reload)`: the trigger could not run or reported failure
    async fn reload(&self) -> Result<(), crate::Error>;

    /// Human-readable description used in log lines
    fn describe(&self) -> String;
}
