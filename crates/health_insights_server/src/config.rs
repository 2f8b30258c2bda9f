use std::net::SocketAddr;

use tracing::warn;

pub const DEFAULT_MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub address: SocketAddr,
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: SocketAddr::from(([127, 0, 0, 1], 8000)),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Reads `ADDRESS` and `MAX_HTTP_BODY_SIZE`; invalid values keep the
    /// defaults.
    pub fn from_env_with<F>(mut get: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(raw) = get("ADDRESS") {
            match raw.trim().parse() {
                Ok(addr) => cfg.address = addr,
                Err(_) => warn!(value = %raw, "invalid ADDRESS, using {}", cfg.address),
            }
        }
        if let Some(raw) = get("MAX_HTTP_BODY_SIZE") {
            match raw.trim().parse::<usize>() {
                Ok(size) if size > 0 => cfg.max_body_size = size,
                _ => warn!(value = %raw, "invalid MAX_HTTP_BODY_SIZE, using {}", cfg.max_body_size),
            }
        }
        cfg
    }
}
