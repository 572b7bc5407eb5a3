//! Configuration schema, defaults, and layered loading.
//!
//! Precedence: defaults < config file < environment (PORTDROP_*).

use anyhow::{ensure, Context, Result};
use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const DEFAULT_API_PORT: u16 = 8080;
const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024 * 1024; // uploads are buffered whole
const DEFAULT_ACCEPT_TIMEOUT_SECS: u64 = 0; // 0 = wait forever

pub fn config_path() -> PathBuf {
    ProjectDirs::from("", "", "portdrop")
        .map(|p| p.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("portdrop.toml"))
}

/// Inclusive bounds for transfer code allocation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CodeRange {
    pub min: u16,
    pub max: u16,
}

impl Default for CodeRange {
    fn default() -> Self {
        Self {
            min: 1024,
            max: 65535,
        }
    }
}

impl CodeRange {
    pub fn as_range(&self) -> std::ops::RangeInclusive<u16> {
        self.min..=self.max
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Port the HTTP API listens on
    pub api_port: u16,
    /// Bounds for allocated transfer codes (and thus listening ports)
    pub code_range: CodeRange,
    /// Maximum accepted upload body size in bytes
    pub body_limit: usize,
    /// Seconds to wait for a downloader before a serve task gives up;
    /// 0 keeps the port held until a client arrives
    pub accept_timeout_secs: u64,
    /// Where uploaded files are staged; defaults to a subdirectory of the
    /// OS temp dir
    pub upload_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_port: DEFAULT_API_PORT,
            code_range: CodeRange::default(),
            body_limit: DEFAULT_BODY_LIMIT,
            accept_timeout_secs: DEFAULT_ACCEPT_TIMEOUT_SECS,
            upload_dir: None,
        }
    }
}

impl AppConfig {
    /// Load the layered configuration and validate it.
    pub fn load() -> Result<Self> {
        let config: AppConfig = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(config_path()))
            .merge(Env::prefixed("PORTDROP_"))
            .extract()
            .context("failed to load configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.code_range.min <= self.code_range.max,
            "code_range.min ({}) must not exceed code_range.max ({})",
            self.code_range.min,
            self.code_range.max
        );
        ensure!(
            self.code_range.min >= 1024,
            "code_range.min ({}) must stay above the privileged ports",
            self.code_range.min
        );
        ensure!(self.body_limit > 0, "body_limit must be positive");
        Ok(())
    }

    pub fn accept_timeout(&self) -> Option<std::time::Duration> {
        match self.accept_timeout_secs {
            0 => None,
            secs => Some(std::time::Duration::from_secs(secs)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        AppConfig::default().validate().expect("defaults validate");
    }

    #[test]
    fn inverted_code_range_is_rejected() {
        let config = AppConfig {
            code_range: CodeRange {
                min: 9000,
                max: 2000,
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn privileged_code_range_is_rejected() {
        let config = AppConfig {
            code_range: CodeRange { min: 80, max: 9000 },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_timeout_means_wait_forever() {
        let config = AppConfig::default();
        assert_eq!(config.accept_timeout(), None);

        let config = AppConfig {
            accept_timeout_secs: 30,
            ..AppConfig::default()
        };
        assert_eq!(
            config.accept_timeout(),
            Some(std::time::Duration::from_secs(30))
        );
    }
}
