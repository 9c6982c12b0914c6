use std::env;
use std::net::SocketAddr;

use crate::core::FallbackPolicy;
use crate::error::{Error, Result};

pub const DEFAULT_BIND: &str = "0.0.0.0:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind: SocketAddr,
    pub fallback: FallbackPolicy,
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
            fallback: FallbackPolicy::Default,
            log_json: false,
        }
    }
}

impl Config {
    /// Reads `VALUER_BIND`, `VALUER_SEARCH_FALLBACK` and `VALUER_LOG_JSON`;
    /// unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup("VALUER_BIND") {
            config.bind = raw
                .trim()
                .parse()
                .map_err(|e| Error::Config(format!("VALUER_BIND={raw:?}: {e}")))?;
        }

        if let Some(raw) = lookup("VALUER_SEARCH_FALLBACK") {
            config.fallback = raw.parse()?;
        }

        if let Some(raw) = lookup("VALUER_LOG_JSON") {
            config.log_json = parse_bool(&raw)
                .ok_or_else(|| Error::Config(format!("VALUER_LOG_JSON={raw:?} is not a boolean")))?;
        }

        Ok(config)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim() {
        "1" | "true" | "TRUE" | "yes" | "YES" | "on" => Some(true),
        "0" | "false" | "FALSE" | "no" | "NO" | "off" => Some(false),
        _ => None,
    }
}
