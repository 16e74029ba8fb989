// # upsyncd - upstream sync daemon
//
// Thin integration layer: all resolve/compare/render/reload logic lives in
// upsync-core.
//
// The upsyncd daemon is responsible for:
// 1. Reading flags and layering environment overrides on top
// 2. Checking that the config file can be created/opened (fatal otherwise)
// 3. Wiring the system resolver and the reload command into the poller
// 4. Running the poll loop until the process is killed
//
// ## Configuration
//
// Every flag has an environment variable that overrides it when set to a
// valid value:
//
// - `--config` / `CONFIG_PATH`: Generated file (default `stream.conf`)
// - `--proxy_host` / `PROXY_HOST`: Hostname to resolve
// - `--proxy_port` / `PROXY_PORT`: Port of the upstream server entry
// - `--local_port` / `LOCAL_PORT`: Listen port of the server block
// - `--protocol` / `PROTOCOL`: `tcp` or `udp` (anything else becomes tcp)
// - `--refresh_interval` / `REFRESH_INTERVAL`: Minutes between cycles
// - `--reload_command` / `RELOAD_COMMAND`: Command run after each rewrite
//
// ## Example
//
// ```bash
// export PROXY_HOST=backend.dyndns.example.net
// export PROXY_PORT=443
// export PROTOCOL=tcp
//
// upsyncd --config /etc/nginx/stream.d/backend.conf --local_port 8443
// ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;
use upsync_core::config::{
    DEFAULT_CONFIG_PATH, DEFAULT_LOCAL_PORT, DEFAULT_PROTOCOL, DEFAULT_PROXY_HOST,
    DEFAULT_PROXY_PORT, DEFAULT_REFRESH_INTERVAL_MINS, DEFAULT_RELOAD_COMMAND,
};
use upsync_core::{
    CommandReloader, ConfigFile, FlagValues, Poller, RunConfig, SystemResolver,
};

/// Exit codes for different termination scenarios
///
/// The poll loop never returns on its own, so in practice only the failure
/// codes are ever seen.
#[derive(Debug, Clone, Copy)]
enum UpsyncExitCode {
    /// Poll loop returned (not expected)
    CleanShutdown = 0,
    /// Invalid configuration or config file not accessible
    StartupError = 1,
    /// Async runtime could not be built
    RuntimeError = 2,
}

impl From<UpsyncExitCode> for ExitCode {
    fn from(code: UpsyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Regenerate a proxy upstream config whenever a hostname's address changes.
#[derive(Parser, Debug)]
#[command(name = "upsyncd")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file path
    #[arg(long = "config", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Proxy port
    #[arg(
        long = "proxy_port",
        default_value_t = DEFAULT_PROXY_PORT,
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    proxy_port: u16,

    /// Proxy address (hostname to resolve)
    #[arg(long = "proxy_host", default_value = DEFAULT_PROXY_HOST)]
    proxy_host: String,

    /// Local port
    #[arg(
        long = "local_port",
        default_value_t = DEFAULT_LOCAL_PORT,
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    local_port: u16,

    /// Proxy protocol (tcp or udp)
    #[arg(long = "protocol", default_value = DEFAULT_PROTOCOL)]
    protocol: String,

    /// Refresh interval (minutes)
    #[arg(
        long = "refresh_interval",
        default_value_t = DEFAULT_REFRESH_INTERVAL_MINS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    refresh_interval: u64,

    /// Command that makes the proxy reload its config
    #[arg(long = "reload_command", default_value = DEFAULT_RELOAD_COMMAND)]
    reload_command: String,
}

impl From<Args> for FlagValues {
    fn from(args: Args) -> Self {
        Self {
            config_path: args.config,
            proxy_port: args.proxy_port,
            proxy_host: args.proxy_host,
            local_port: args.local_port,
            protocol: args.protocol,
            refresh_interval_mins: args.refresh_interval,
            reload_command: args.reload_command,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Fixed INFO level, no runtime knob.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return UpsyncExitCode::StartupError.into();
    }

    // Merge after the subscriber is up so ignored env values get logged.
    let config = match RunConfig::from_flags_and_env(args.into()) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Configuration error: {}", e);
            return UpsyncExitCode::StartupError.into();
        }
    };

    info!("Starting upsyncd");

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return UpsyncExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("{:#}", e);
            UpsyncExitCode::StartupError
        } else {
            UpsyncExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon
async fn run_daemon(config: RunConfig) -> Result<()> {
    let config_file = ConfigFile::ensure(&config.config_path)
        .await
        .context("Config file is not usable")?;

    let existing = config_file
        .read()
        .await
        .context("Config file is not readable")?;
    info!(
        "Config file {} holds {} byte(s); first cycle will rewrite it",
        config_file.path().display(),
        existing.len()
    );

    info!("Proxy host: {}", config.proxy_host);
    info!(
        "Upstream port: {}, listen: {}/{}",
        config.proxy_port, config.local_port, config.protocol
    );
    info!("Reload command: {}", config.reload_command);

    let reloader = CommandReloader::new(config.reload_command.clone());
    let mut poller = Poller::new(
        Box::new(SystemResolver::new()),
        Box::new(reloader),
        config_file,
        config,
    );

    poller.run().await;
    Ok(())
}
