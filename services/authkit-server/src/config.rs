//! Configuration types and loading
//!
//! Precedence: env vars > config file > defaults. The config file is optional;
//! a bare environment (`WORKOS_API_KEY`, `WORKOS_CLIENT_ID`,
//! `WORKOS_COOKIE_PASSWORD`) is enough to run. Secrets are never read from
//! the TOML directly, only from env vars or the `*_file` paths it names.

use common::Secret;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use workos_auth::{DEFAULT_API_BASE_URL, MIN_COOKIE_PASSWORD_LEN};

/// Default config file name looked up in the working directory
const DEFAULT_CONFIG_FILE: &str = "authkit-server.toml";

/// Fully resolved and validated configuration
#[derive(Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub workos: WorkOsConfig,
    pub api_key: Secret<String>,
    pub cookie_password: Secret<String>,
}

/// Shape of the TOML file
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    #[serde(default)]
    server: ServerConfig,
    #[serde(default)]
    workos: WorkOsConfig,
}

/// HTTP listener settings
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

/// WorkOS client settings
#[derive(Debug, Deserialize)]
pub struct WorkOsConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Where the provider sends the browser after logout
    #[serde(default)]
    pub logout_return_to: Option<String>,
    /// Alternative to the WORKOS_API_KEY env var
    #[serde(default)]
    pub api_key_file: Option<PathBuf>,
    /// Alternative to the WORKOS_COOKIE_PASSWORD env var
    #[serde(default)]
    pub cookie_password_file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            max_connections: default_max_connections(),
        }
    }
}

impl Default for WorkOsConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            redirect_uri: default_redirect_uri(),
            api_base_url: default_api_base_url(),
            logout_return_to: None,
            api_key_file: None,
            cookie_password_file: None,
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

fn default_max_connections() -> usize {
    1000
}

fn default_redirect_uri() -> String {
    "http://localhost:3000/callback".into()
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.into()
}

impl Config {
    /// Load configuration from an optional TOML file, then overlay env vars.
    ///
    /// Secret resolution order (each secret independently):
    /// 1. env var (`WORKOS_API_KEY` / `WORKOS_COOKIE_PASSWORD`)
    /// 2. `*_file` path from config
    pub fn load(path: Option<&Path>) -> common::Result<Self> {
        let file: FileConfig = match path {
            Some(path) => toml::from_str(&std::fs::read_to_string(path)?)?,
            None => FileConfig::default(),
        };
        let FileConfig { server, mut workos } = file;

        if let Some(client_id) = env_value("WORKOS_CLIENT_ID") {
            workos.client_id = client_id;
        }

        let api_key = resolve_secret("WORKOS_API_KEY", workos.api_key_file.as_deref())?;
        let cookie_password =
            resolve_secret("WORKOS_COOKIE_PASSWORD", workos.cookie_password_file.as_deref())?;

        let config = Config {
            server,
            workos,
            api_key,
            cookie_password,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> common::Result<()> {
        if self.workos.client_id.trim().is_empty() {
            return Err(common::Error::Config(
                "client_id must be set (workos.client_id or WORKOS_CLIENT_ID)".into(),
            ));
        }

        for (name, value) in [
            ("redirect_uri", &self.workos.redirect_uri),
            ("api_base_url", &self.workos.api_base_url),
        ] {
            if !value.starts_with("http://") && !value.starts_with("https://") {
                return Err(common::Error::Config(format!(
                    "{name} must start with http:// or https://, got: {value}"
                )));
            }
        }

        if self.cookie_password.char_len() < MIN_COOKIE_PASSWORD_LEN {
            return Err(common::Error::Config(format!(
                "cookie password must be at least {MIN_COOKIE_PASSWORD_LEN} characters"
            )));
        }

        if self.server.max_connections == 0 {
            return Err(common::Error::Config(
                "max_connections must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Resolve config file path from CLI arg, CONFIG_PATH env var, or the
    /// default file name when it exists. `None` means environment only.
    pub fn resolve_path(cli_path: Option<&str>) -> Option<PathBuf> {
        if let Some(p) = cli_path {
            return Some(PathBuf::from(p));
        }
        if let Some(p) = env_value("CONFIG_PATH") {
            return Some(PathBuf::from(p));
        }
        let default = PathBuf::from(DEFAULT_CONFIG_FILE);
        default.exists().then_some(default)
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn resolve_secret(env_key: &'static str, file: Option<&Path>) -> common::Result<Secret<String>> {
    if let Some(value) = env_value(env_key) {
        return Ok(Secret::new(value));
    }
    if let Some(path) = file {
        let secret = Secret::from_file(path).map_err(|e| {
            common::Error::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        if let Some(secret) = secret {
            return Ok(secret);
        }
    }
    Err(common::Error::MissingSecret(env_key))
}
