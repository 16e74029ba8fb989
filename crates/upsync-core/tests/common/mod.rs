//! Test doubles and common utilities for poll loop contract tests
//!
//! These fakes stand in for DNS and the external proxy so the loop's
//! compare/retry behavior can be checked without network access or child
//! processes.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::IpAddr;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use upsync_core::error::{Error, Result};
use upsync_core::{ConfigFile, FlagValues, Poller, Reloader, Resolver, RunConfig};

/// A resolver that replays a script of answers
///
/// Once the script is exhausted the last answer repeats.
pub struct ScriptedResolver {
    script: Arc<Mutex<VecDeque<std::result::Result<IpAddr, String>>>>,
    last: Arc<Mutex<Option<std::result::Result<IpAddr, String>>>>,
    call_count: Arc<AtomicUsize>,
    hosts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedResolver {
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            last: Arc::new(Mutex::new(None)),
            call_count: Arc::new(AtomicUsize::new(0)),
            hosts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a successful answer
    pub fn answer(self, ip: &str) -> Self {
        let ip = ip.parse().expect("test IP parses");
        self.script.lock().unwrap().push_back(Ok(ip));
        self
    }

    /// Queue a lookup failure
    pub fn fail(self, message: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        self
    }

    /// Get the number of times resolve() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Hostnames passed to resolve(), in order
    pub fn hosts(&self) -> Vec<String> {
        self.hosts.lock().unwrap().clone()
    }

    /// Create a new ScriptedResolver that shares its script and counters
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            script: Arc::clone(&other.script),
            last: Arc::clone(&other.last),
            call_count: Arc::clone(&other.call_count),
            hosts: Arc::clone(&other.hosts),
        }
    }
}

#[async_trait::async_trait]
impl Resolver for ScriptedResolver {
    async fn resolve(&self, host: &str) -> Result<IpAddr> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.hosts.lock().unwrap().push(host.to_string());

        let next = self.script.lock().unwrap().pop_front();
        let answer = match next {
            Some(answer) => {
                *self.last.lock().unwrap() = Some(answer.clone());
                answer
            }
            None => self
                .last
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| Err("script is empty".to_string())),
        };

        answer.map_err(|message| Error::resolution(host, message))
    }
}

/// A reloader that tracks calls and can be told to fail
pub struct MockReloader {
    call_count: Arc<AtomicUsize>,
    describe_count: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
}

impl MockReloader {
    pub fn new() -> Self {
        Self {
            call_count: Arc::new(AtomicUsize::new(0)),
            describe_count: Arc::new(AtomicUsize::new(0)),
            failing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get the number of times reload() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Get the number of times describe() was called
    pub fn describe_count(&self) -> usize {
        self.describe_count.load(Ordering::SeqCst)
    }

    /// Make subsequent reloads fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Create a new MockReloader that shares counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            call_count: Arc::clone(&other.call_count),
            describe_count: Arc::clone(&other.describe_count),
            failing: Arc::clone(&other.failing),
        }
    }
}

#[async_trait::async_trait]
impl Reloader for MockReloader {
    async fn reload(&self) -> Result<()> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::reload("mock reload", "exit status: 1"));
        }
        Ok(())
    }

    fn describe(&self) -> String {
        self.describe_count.fetch_add(1, Ordering::SeqCst);
        "mock reload".to_string()
    }
}

/// Run config writing `<dir>/stream.conf`, udp on 7890, upstream port 80
pub fn test_config(dir: &Path) -> RunConfig {
    let flags = FlagValues {
        config_path: dir.join("stream.conf"),
        proxy_host: "backend.example.com".to_string(),
        ..FlagValues::default()
    };
    RunConfig::merge(flags, |_| None).expect("test config is valid")
}

/// Same as [`test_config`] with a custom refresh interval
pub fn test_config_with_interval(dir: &Path, interval: Duration) -> RunConfig {
    RunConfig {
        refresh_interval: interval,
        ..test_config(dir)
    }
}

/// Build a poller whose fakes share counters with the returned handles
pub async fn poller_with(
    config: RunConfig,
    resolver: &ScriptedResolver,
    reloader: &MockReloader,
) -> Poller {
    let config_file = ConfigFile::ensure(&config.config_path)
        .await
        .expect("config file can be created");

    Poller::new(
        Box::new(ScriptedResolver::sharing_counters_with(resolver)),
        Box::new(MockReloader::sharing_counters_with(reloader)),
        config_file,
        config,
    )
}
