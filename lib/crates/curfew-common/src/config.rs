use serde::Deserialize;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// `curfewd` settings, read from `CURFEW_SERVER_*` environment variables.
#[derive(Debug, Deserialize)]
pub struct PolicyServerConfig {
    /// Listen address (default: 127.0.0.1:8787)
    /// The API has no authentication of its own; keep it on loopback or
    /// behind the dashboard's authenticated reverse proxy.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Engine config file; falls back to `CURFEW_CONFIG` / `~/.curfew/config.yaml`.
    #[serde(default)]
    pub config: Option<PathBuf>,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, 8787))
}

impl Default for PolicyServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            config: None,
        }
    }
}
