//! Challenge bridge configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use serde::Deserialize;

/// Local HTTP bridge hosting the verification widget.
#[derive(Debug, Clone, Deserialize)]
pub struct ChallengeConfig {
    /// Whether to run the bridge. Without it, verification-gated requests
    /// end as abandoned.
    #[serde(default)]
    pub enabled: bool,

    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Public site key of the challenge provider.
    #[serde(default)]
    pub site_key: String,
}

impl ChallengeConfig {
    /// Socket address the bridge binds to.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}


const fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

const fn default_port() -> u16 {
    8787
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_host(),
            port: default_port(),
            site_key: String::new(),
        }
    }
}
