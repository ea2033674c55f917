//! Sidecar configuration.
//!
//! Sources, highest priority first:
//! 1. `GRADEBOOKD_*` environment variables, `__` separating nested keys
//!    (`GRADEBOOKD_AUTH__USERNAME` -> `auth.username`)
//! 2. the TOML file named by `GRADEBOOKD_CONFIG_FILE`, or `gradebookd.toml`
//!    in the working directory when it exists
//! 3. built-in defaults

use crate::auth::CredentialPair;
use crate::store::DEFAULT_DATA_FILE;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub const ENV_PREFIX: &str = "GRADEBOOKD_";
pub const CONFIG_FILE_VAR: &str = "GRADEBOOKD_CONFIG_FILE";
const LOCAL_CONFIG_FILE: &str = "gradebookd.toml";

// sha256("password"), the stock admin password.
const DEFAULT_PASSWORD_SHA256: &str =
    "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Figment(#[from] figment::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GradebookConfig {
    /// Canonical gradebook file opened at startup.
    pub data_file: PathBuf,
    /// Reject store requests until `session.login` succeeds.
    pub require_login: bool,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    pub username: String,
    /// Lowercase hex SHA-256 of the password.
    pub password_sha256: String,
}

impl Default for GradebookConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            require_login: true,
            auth: AuthConfig::default(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password_sha256: DEFAULT_PASSWORD_SHA256.to_string(),
        }
    }
}

impl GradebookConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        Ok(figment.extract()?)
    }

    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        let file = std::env::var_os(CONFIG_FILE_VAR)
            .map(PathBuf::from)
            .or_else(|| {
                let local = PathBuf::from(LOCAL_CONFIG_FILE);
                local.is_file().then_some(local)
            });
        if let Some(path) = file {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).ignore(&["config_file"]).split("__"))
    }

    pub fn authenticator(&self) -> CredentialPair {
        CredentialPair::new(self.auth.username.clone(), &self.auth.password_sha256)
    }
}
