//! Server configuration, resolved from the environment (and `.env`) then overridden by CLI flags.
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::consts::{DEFAULT_MAX_SUBMISSIONS_PER_HOUR, DEFAULT_PORT, DEFAULT_SITE_DIR, RATE_LIMIT_WINDOW};

/// Reads a variable, treating empty values as unset.
pub fn env_value(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).filter(|value| !value.is_empty())
}

pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Directory holding the rendered site (`index.html`, `thanks.html`, `assets/`...).
    pub site_dir: PathBuf,
    pub max_submissions_per_hour: usize,
    pub rate_limit_window: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            site_dir: PathBuf::from(DEFAULT_SITE_DIR),
            max_submissions_per_hour: DEFAULT_MAX_SUBMISSIONS_PER_HOUR,
            rate_limit_window: RATE_LIMIT_WINDOW,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(process_env)
    }

    /// Resolves `PORT`, `SITE_DIR` and `FORM_MAX_SUBMISSIONS_PER_HOUR`, keeping defaults for unset or invalid values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(port) = env_value(&lookup, "PORT") {
            match port.parse() {
                Ok(port) => config.port = port,
                Err(_) => warn!(name: "config", "Ignoring invalid PORT {:?}", port),
            }
        }

        if let Some(site_dir) = env_value(&lookup, "SITE_DIR") {
            config.site_dir = PathBuf::from(site_dir);
        }

        if let Some(max) = env_value(&lookup, "FORM_MAX_SUBMISSIONS_PER_HOUR") {
            match max.parse() {
                Ok(max) => config.max_submissions_per_hour = max,
                Err(_) => warn!(
                    name: "config",
                    "Ignoring invalid FORM_MAX_SUBMISSIONS_PER_HOUR {:?}", max
                ),
            }
        }

        config
    }

    pub fn with_overrides(
        mut self,
        host: Option<IpAddr>,
        port: Option<u16>,
        site_dir: Option<PathBuf>,
    ) -> Self {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        if let Some(site_dir) = site_dir {
            self.site_dir = site_dir;
        }
        self
    }
}

#[cfg(test)]
pub(crate) fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let pairs: Vec<(String, String)> = pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();

    move |name: &str| {
        pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
    }
}
