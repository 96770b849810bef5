//! INI configuration for relays.
//!
//! Settings live in a `[relay]` section parsed with the `rust-ini` crate:
//!
//! ```ini
//! [relay]
//! token = 2bfbea1e-10c3-4419-bdad-7e6435882e1f
//! host = data.logentries.com
//! port = 80
//! timeout = 1.5
//! connect_timeout = 0.5
//! persistent = true
//! buffer_dir = /var/spool/femtorelay
//! warn_interval = 5
//! ```
//!
//! Every key is optional here; [`RelayBuilder`] validation decides what is
//! required for the relay being built.

use std::{fs, io::ErrorKind, path::Path, time::Duration};

use ini::Ini;
use thiserror::Error;

use crate::relay::RelayBuilder;

const SECTION: &str = "relay";

/// Errors raised while loading relay settings from INI text.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} doesn't exist")]
    NotFound(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid INI: {0}")]
    Parse(#[from] ini::ParseError),
    #[error("missing [relay] section")]
    MissingSection,
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, value)),
    }
}

fn parse_secs(key: &'static str, value: &str) -> Result<f64, ConfigError> {
    value.trim().parse().map_err(|_| invalid(key, value))
}

fn invalid(key: &'static str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: value.to_owned(),
    }
}

impl RelayBuilder {
    /// Read the `[relay]` section of an INI file.
    pub fn from_ini_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => ConfigError::NotFound(path.display().to_string()),
            _ => ConfigError::Io {
                path: path.display().to_string(),
                source: err,
            },
        })?;
        Self::from_ini_str(&text)
    }

    /// Parse the `[relay]` section from INI text.
    pub fn from_ini_str(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text)?;
        let section = ini
            .section(Some(SECTION))
            .ok_or(ConfigError::MissingSection)?;

        let mut builder = RelayBuilder::new();
        builder.token = section.get("token").map(|v| v.trim().to_owned());
        builder.host = section.get("host").map(|v| v.trim().to_owned());
        if let Some(value) = section.get("port") {
            builder.port = Some(value.trim().parse().map_err(|_| invalid("port", value))?);
        }
        if let Some(value) = section.get("timeout") {
            builder.timeout_secs = Some(parse_secs("timeout", value)?);
        }
        if let Some(value) = section.get("connect_timeout") {
            builder.connect_timeout_secs = Some(parse_secs("connect_timeout", value)?);
        }
        if let Some(value) = section.get("persistent") {
            builder.persistent = Some(parse_bool("persistent", value)?);
        }
        builder.buffer_dir = section.get("buffer_dir").map(|v| v.trim().into());
        if let Some(value) = section.get("warn_interval") {
            let secs = parse_secs("warn_interval", value)?;
            let interval =
                Duration::try_from_secs_f64(secs).map_err(|_| invalid("warn_interval", value))?;
            builder.warn_interval = Some(interval);
        }
        Ok(builder)
    }
}
