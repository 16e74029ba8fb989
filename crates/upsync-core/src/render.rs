//! Proxy config rendering
//!
//! [`render`] is a pure function of the run config and the resolved address.
//! Writing the result to disk is [`crate::output::ConfigFile`]'s job.

use std::net::IpAddr;
use std::path::Path;

use crate::config::RunConfig;
use crate::traits::format_address;

/// Upstream name used when the config path has no usable file stem
pub const FALLBACK_UPSTREAM_NAME: &str = "upstream";

/// Derive the upstream name from the config file's base name
///
/// `/etc/nginx/stream.d/backend.conf` becomes `backend`. Dotfiles such as
/// `.conf` get [`FALLBACK_UPSTREAM_NAME`].
pub fn upstream_name(config_path: &Path) -> String {
    config_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty() && !stem.starts_with('.'))
        .unwrap_or_else(|| FALLBACK_UPSTREAM_NAME.to_string())
}

/// Render the config file content for `address`
pub fn render(config: &RunConfig, address: IpAddr) -> String {
    let name = upstream_name(&config.config_path);
    format!(
        "upstream {name}_ips {{\n    server {address}:{proxy_port};\n}}\n\n\
         server {{\n    listen {local_port}{qualifier};\n    proxy_pass {name}_ips;\n}}\n",
        name = name,
        address = format_address(address),
        proxy_port = config.proxy_port,
        local_port = config.local_port,
        qualifier = config.protocol.listen_qualifier(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FlagValues, Protocol};
    use std::path::PathBuf;

    fn config() -> RunConfig {
        RunConfig::merge(FlagValues::default(), |_| None).unwrap()
    }

    #[test]
    fn test_render_ipv4_udp() {
        let rendered = render(&config(), "93.184.216.34".parse().unwrap());

        assert_eq!(
            rendered,
            "upstream stream_ips {\n    server 93.184.216.34:80;\n}\n\n\
             server {\n    listen 7890 udp;\n    proxy_pass stream_ips;\n}\n"
        );
    }

    #[test]
    fn test_render_ipv6_is_bracketed() {
        let rendered = render(
            &config(),
            "2606:2800:220:1:248:1893:25c8:1946".parse().unwrap(),
        );

        assert!(rendered.contains("    server [2606:2800:220:1:248:1893:25c8:1946]:80;\n"));
    }

    #[test]
    fn test_render_tcp_has_no_qualifier() {
        let mut config = config();
        config.protocol = Protocol::Tcp;
        config.local_port = 5353;

        let rendered = render(&config, "10.0.0.1".parse().unwrap());
        // Deliberately `listen 5353;`, not `listen 5353 ;`.
        assert!(rendered.contains("    listen 5353;\n"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let config = config();
        let ip: IpAddr = "10.1.2.3".parse().unwrap();
        assert_eq!(render(&config, ip), render(&config, ip));
    }

    #[test]
    fn test_upstream_name_uses_base_name() {
        assert_eq!(upstream_name(Path::new("stream.conf")), "stream");
        assert_eq!(
            upstream_name(Path::new("/etc/nginx/stream.d/backend.conf")),
            "backend"
        );
        assert_eq!(upstream_name(Path::new("relay")), "relay");
        assert_eq!(upstream_name(Path::new("my.site.conf")), "my.site");
        assert_eq!(upstream_name(&PathBuf::from("/")), FALLBACK_UPSTREAM_NAME);
    }

    #[test]
    fn test_upstream_name_falls_back_for_dotfiles() {
        assert_eq!(upstream_name(Path::new(".conf")), FALLBACK_UPSTREAM_NAME);
        assert_eq!(
            upstream_name(Path::new("/etc/nginx/stream.d/.hidden")),
            FALLBACK_UPSTREAM_NAME
        );

        let config = RunConfig {
            config_path: PathBuf::from("/etc/nginx/stream.d/.conf"),
            ..config()
        };
        let out = render(&config, "10.0.0.1".parse().unwrap());
        assert!(out.starts_with("upstream upstream_ips {"));
        assert!(out.contains("proxy_pass upstream_ips;"));
    }
}
