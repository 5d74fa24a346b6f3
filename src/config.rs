//! Configuration for the placeholder API.
//!
//! Config is read once at startup from two environment variables and held
//! for the lifetime of the process:
//!
//! | Variable       | Default   |
//! |----------------|-----------|
//! | `SERVICE_HOST` | `0.0.0.0` |
//! | `SERVICE_PORT` | `8000`    |
//!
//! An empty value is treated as missing: the default is used and a warning is
//! logged. A port that does not parse as a `u16` is rejected, which stops the
//! process before any socket is opened.

use std::fmt;

use tracing::warn;

use crate::error::ConfigError;

pub const HOST_VAR: &str = "SERVICE_HOST";
pub const PORT_VAR: &str = "SERVICE_PORT";

/// Bind settings for the HTTP listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Bind address. May be an IP literal or a resolvable host name.
    pub host: String,
    pub port: u16,
}

impl Config {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    ///
    /// `lookup` returns `None` for an unset variable. Tests pass a closure over
    /// a fixed map instead of mutating the real environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = setting(&lookup, HOST_VAR, defaults::HOST);
        let raw_port = setting(&lookup, PORT_VAR, defaults::PORT);
        let port = raw_port
            .trim()
            .parse::<u16>()
            .map_err(|source| ConfigError::InvalidPort {
                value: raw_port.clone(),
                source,
            })?;

        Ok(Self { host, port })
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Resolve one variable, substituting `default` when it is unset or empty.
fn setting<F>(lookup: &F, name: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) if !value.is_empty() => value,
        Some(_) => {
            warn!(variable = name, default, "environment variable is empty; using default");
            default.to_owned()
        }
        None => default.to_owned(),
    }
}

mod defaults {
    pub const HOST: &str = "0.0.0.0";
    pub const PORT: &str = "8000";
}
