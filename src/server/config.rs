//! Server configuration read from the environment.

use std::net::SocketAddr;

use anyhow::Context;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8765;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Fixed shuffle seed; entropy when unset
    pub deck_seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            deck_seed: None,
        }
    }
}

impl ServerConfig {
    /// Read `BLACKJACK_HOST`, `BLACKJACK_PORT` and `BLACKJACK_DECK_SEED`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let host = lookup("BLACKJACK_HOST")
            .filter(|raw| !raw.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = lookup("BLACKJACK_PORT")
            .and_then(|raw| raw.trim().parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);
        let deck_seed = lookup("BLACKJACK_DECK_SEED").and_then(|raw| raw.trim().parse::<u64>().ok());

        Self {
            host,
            port,
            deck_seed,
        }
    }

    pub fn listen_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .context("invalid listen addr")
    }
}
