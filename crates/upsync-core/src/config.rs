//! Configuration types for upsync
//!
//! A [`RunConfig`] is built exactly once at startup by [`RunConfig::merge`],
//! which layers environment variables over flag values. Nothing reads the
//! environment after that.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

use crate::error::{Error, Result};

/// Default output file
pub const DEFAULT_CONFIG_PATH: &str = "stream.conf";
/// Default port of the upstream server entry
pub const DEFAULT_PROXY_PORT: u16 = 80;
/// Default hostname to resolve
pub const DEFAULT_PROXY_HOST: &str = "www.baidu.com";
/// Default listen port of the generated server block
pub const DEFAULT_LOCAL_PORT: u16 = 7890;
/// Default transport
pub const DEFAULT_PROTOCOL: &str = "udp";
/// Default polling period, in minutes
pub const DEFAULT_REFRESH_INTERVAL_MINS: u64 = 5;
/// Default reload command line
pub const DEFAULT_RELOAD_COMMAND: &str = "nginx -s reload";

/// Environment variable names, one per setting
pub mod env {
    pub const CONFIG_PATH: &str = "CONFIG_PATH";
    pub const PROXY_PORT: &str = "PROXY_PORT";
    pub const PROXY_HOST: &str = "PROXY_HOST";
    pub const LOCAL_PORT: &str = "LOCAL_PORT";
    pub const PROTOCOL: &str = "PROTOCOL";
    pub const REFRESH_INTERVAL: &str = "REFRESH_INTERVAL";
    pub const RELOAD_COMMAND: &str = "RELOAD_COMMAND";
}

/// Transport the generated server block listens on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Protocol {
    /// Stream over TCP (the proxy's default, no qualifier emitted)
    #[default]
    Tcp,
    /// Datagrams over UDP
    Udp,
}

impl Protocol {
    /// Lowercase name as written in flags and env
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
        }
    }

    /// Text appended after the listen port, including its leading space
    pub fn listen_qualifier(&self) -> &'static str {
        match self {
            Protocol::Tcp => "",
            Protocol::Udp => " udp",
        }
    }

    /// Parse a flag value, falling back to TCP for anything unrecognized
    pub fn normalize(value: &str) -> Self {
        value.parse().unwrap_or_else(|_| {
            warn!(
                "Unrecognized protocol {:?}, falling back to {}",
                value,
                Protocol::Tcp
            );
            Protocol::Tcp
        })
    }
}

impl FromStr for Protocol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "tcp" => Ok(Protocol::Tcp),
            "udp" => Ok(Protocol::Udp),
            other => Err(Error::config(format!(
                "unsupported protocol {:?} (expected tcp or udp)",
                other
            ))),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Program and arguments that make the proxy pick up the new file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadCommand {
    program: String,
    args: Vec<String>,
}

impl ReloadCommand {
    /// Build from an explicit program and argument list
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Split a command line on whitespace; `None` when it is blank
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let program = parts.next()?;
        Some(Self::new(program, parts))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl Default for ReloadCommand {
    fn default() -> Self {
        Self::new("nginx", ["-s", "reload"])
    }
}

impl fmt::Display for ReloadCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Raw values as they come off the command line, before env overrides
///
/// `protocol` stays a string so an unrecognized flag value can be normalized
/// (and logged) by the merge instead of rejected by the argument parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagValues {
    pub config_path: PathBuf,
    pub proxy_port: u16,
    pub proxy_host: String,
    pub local_port: u16,
    pub protocol: String,
    pub refresh_interval_mins: u64,
    pub reload_command: String,
}

impl Default for FlagValues {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            proxy_port: DEFAULT_PROXY_PORT,
            proxy_host: DEFAULT_PROXY_HOST.to_string(),
            local_port: DEFAULT_LOCAL_PORT,
            protocol: DEFAULT_PROTOCOL.to_string(),
            refresh_interval_mins: DEFAULT_REFRESH_INTERVAL_MINS,
            reload_command: DEFAULT_RELOAD_COMMAND.to_string(),
        }
    }
}

/// Immutable parameters for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Generated file location
    pub config_path: PathBuf,
    /// Hostname whose address is tracked
    pub proxy_host: String,
    /// Port used in the upstream server entry
    pub proxy_port: u16,
    /// Port the generated server block listens on
    pub local_port: u16,
    /// Listen transport
    pub protocol: Protocol,
    /// Delay between the end of one cycle and the start of the next
    pub refresh_interval: Duration,
    /// Command run after every rewrite
    pub reload_command: ReloadCommand,
}

impl RunConfig {
    /// Merge flag values with environment overrides
    ///
    /// A variable that is set and parses overrides the flag; a variable that
    /// is unset leaves the flag alone; a variable that is set but invalid is
    /// logged and ignored. `vars` is the lookup, usually `std::env::var`.
    pub fn merge<F>(flags: FlagValues, vars: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config_path = override_with(&vars, env::CONFIG_PATH, flags.config_path, |v| {
            (!v.is_empty()).then(|| PathBuf::from(v))
        });
        let proxy_port = override_with(&vars, env::PROXY_PORT, flags.proxy_port, parse_port);
        let proxy_host = override_with(&vars, env::PROXY_HOST, flags.proxy_host, |v| {
            let v = v.trim();
            (!v.is_empty()).then(|| v.to_string())
        });
        let local_port = override_with(&vars, env::LOCAL_PORT, flags.local_port, parse_port);

        // PROTOCOL only counts when it names a supported transport; the flag
        // value itself is normalized to tcp.
        let protocol = match vars(env::PROTOCOL) {
            Some(value) => match value.parse::<Protocol>() {
                Ok(protocol) => protocol,
                Err(_) => {
                    warn!("Ignoring {}={:?}: expected tcp or udp", env::PROTOCOL, value);
                    Protocol::normalize(&flags.protocol)
                }
            },
            None => Protocol::normalize(&flags.protocol),
        };

        let refresh_interval_mins = override_with(
            &vars,
            env::REFRESH_INTERVAL,
            flags.refresh_interval_mins,
            |v| v.trim().parse::<u64>().ok().filter(|mins| *mins > 0),
        );
        let reload_command = override_with(
            &vars,
            env::RELOAD_COMMAND,
            flags.reload_command,
            |v| (!v.trim().is_empty()).then(|| v.to_string()),
        );
        let reload_command = ReloadCommand::parse(&reload_command)
            .ok_or_else(|| Error::config("reload command cannot be empty"))?;

        let config = Self {
            config_path,
            proxy_host,
            proxy_port,
            local_port,
            protocol,
            refresh_interval: Duration::from_secs(refresh_interval_mins.saturating_mul(60)),
            reload_command,
        };
        config.validate()?;
        Ok(config)
    }

    /// Merge flag values with the process environment
    pub fn from_flags_and_env(flags: FlagValues) -> Result<Self> {
        Self::merge(flags, |name| std::env::var(name).ok())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.config_path.as_os_str().is_empty() {
            return Err(Error::config("config path cannot be empty"));
        }
        if self.proxy_host.trim().is_empty() {
            return Err(Error::config("proxy host cannot be empty"));
        }
        if self.proxy_port == 0 {
            return Err(Error::config("proxy port must be > 0"));
        }
        if self.local_port == 0 {
            return Err(Error::config("local port must be > 0"));
        }
        if self.refresh_interval.is_zero() {
            return Err(Error::config("refresh interval must be > 0"));
        }
        Ok(())
    }
}

fn parse_port(value: &str) -> Option<u16> {
    value.trim().parse::<u16>().ok().filter(|port| *port > 0)
}

fn override_with<F, T, P>(vars: &F, name: &str, flag: T, parse: P) -> T
where
    F: Fn(&str) -> Option<String>,
    P: FnOnce(&str) -> Option<T>,
{
    let Some(raw) = vars(name) else {
        return flag;
    };
    match parse(&raw) {
        Some(value) => value,
        None => {
            warn!("Ignoring invalid value {:?} for {}", raw, name);
            flag
        }
    }
}
