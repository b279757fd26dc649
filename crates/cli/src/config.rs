use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use remote::{credentials_file, RemoteConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_VERSION: u32 = 2;
pub const CONFIG_ENV: &str = "TUNESYNC_CONFIG";

const APP_DIR: &str = "tunesync";
const DEFAULT_SERVER_URL: &str = "http://localhost:3000";
const DEFAULT_CREDENTIALS_DIR: &str = "credentials";
const DEFAULT_QUALITY: &str = "320k";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LOGIN_ATTEMPTS: u32 = 3;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub version: u32,
    pub server_url: String,
    pub credentials_dir: String,
    pub uploader_id: String,
    pub transcode_quality: String,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub login_attempts: u32,
    pub user_agent: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            server_url: DEFAULT_SERVER_URL.to_string(),
            credentials_dir: DEFAULT_CREDENTIALS_DIR.to_string(),
            uploader_id: String::new(),
            transcode_quality: DEFAULT_QUALITY.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: 3,
            login_attempts: DEFAULT_LOGIN_ATTEMPTS,
            user_agent: default_user_agent(),
        }
    }
}

impl ToolsConfig {
    /// Session settings for the credential file `cred`. An explicit
    /// uploader id takes precedence over the configured one.
    pub fn remote_config(
        &self,
        config_path: &Path,
        cred: &str,
        uploader_id: Option<String>,
    ) -> RemoteConfig {
        let credentials_dir = resolve_path(config_path, &self.credentials_dir);
        let uploader_id = uploader_id
            .or_else(|| Some(self.uploader_id.clone()))
            .filter(|id| !id.trim().is_empty());
        RemoteConfig {
            base_url: self.server_url.trim().to_string(),
            credentials_path: credentials_file(&credentials_dir, cred),
            uploader_id,
            timeout: Duration::from_secs(self.request_timeout_secs),
            max_retries: self.max_retries,
            user_agent: self.user_agent.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

fn default_user_agent() -> String {
    format!("{}/{}", APP_DIR, env!("CARGO_PKG_VERSION"))
}

pub fn config_path_from_env() -> PathBuf {
    match env::var(CONFIG_ENV) {
        Ok(value) if !value.trim().is_empty() => PathBuf::from(value),
        _ => default_config_path(),
    }
}

fn default_config_path() -> PathBuf {
    match dirs::config_dir() {
        Some(dir) => dir.join(APP_DIR).join("config.yaml"),
        None => PathBuf::from("config.yaml"),
    }
}

pub fn load_or_create_config(path: &Path) -> Result<(ToolsConfig, bool), ConfigError> {
    if path.exists() {
        let contents = fs::read_to_string(path)?;
        let mut config: ToolsConfig = if contents.trim().is_empty() {
            ToolsConfig::default()
        } else {
            serde_yaml::from_str(&contents)?
        };
        if config.version < CONFIG_VERSION {
            config.version = CONFIG_VERSION;
        }
        if config.server_url.trim().is_empty() {
            config.server_url = DEFAULT_SERVER_URL.to_string();
        }
        if config.credentials_dir.trim().is_empty() {
            config.credentials_dir = DEFAULT_CREDENTIALS_DIR.to_string();
        }
        if config.transcode_quality.trim().is_empty() {
            config.transcode_quality = DEFAULT_QUALITY.to_string();
        }
        if config.request_timeout_secs == 0 {
            config.request_timeout_secs = DEFAULT_TIMEOUT_SECS;
        }
        if config.login_attempts == 0 {
            config.login_attempts = DEFAULT_LOGIN_ATTEMPTS;
        }
        if config.user_agent.trim().is_empty() {
            config.user_agent = default_user_agent();
        }
        return Ok((config, false));
    }

    let config = ToolsConfig::default();
    save_config(path, &config)?;
    Ok((config, true))
}

pub fn save_config(path: &Path, config: &ToolsConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let contents = serde_yaml::to_string(config)?;
    fs::write(path, contents)?;
    Ok(())
}

pub fn resolve_path(config_path: &Path, value: &str) -> PathBuf {
    let raw = PathBuf::from(value);
    if raw.is_absolute() {
        return raw;
    }
    let base = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    base.join(raw)
}

#[cfg(test)]
mod tests {
    use super::{load_or_create_config, resolve_path, ToolsConfig, CONFIG_VERSION};
    use std::fs;
    use std::path::{Path, PathBuf};

    #[test]
    fn creates_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.yaml");
        let (config, created) = load_or_create_config(&path).unwrap();
        assert!(created);
        assert!(path.exists());
        assert_eq!(config, ToolsConfig::default());

        let (reloaded, created) = load_or_create_config(&path).unwrap();
        assert!(!created);
        assert_eq!(reloaded, config);
    }

    #[test]
    fn repairs_blank_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            "version: 1\nserver_url: ''\ntranscode_quality: ''\nlogin_attempts: 0\nmax_retries: 5\n",
        )
        .unwrap();
        let (config, created) = load_or_create_config(&path).unwrap();
        assert!(!created);
        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.server_url, "http://localhost:3000");
        assert_eq!(config.transcode_quality, "320k");
        assert_eq!(config.login_attempts, 3);
        assert_eq!(config.max_retries, 5);
    }

    #[test]
    fn credentials_live_next_to_config() {
        let config = ToolsConfig {
            uploader_id: "configured".to_string(),
            ..ToolsConfig::default()
        };
        let remote = config.remote_config(Path::new("/etc/tunesync/config.yaml"), "work", None);
        assert_eq!(
            remote.credentials_path,
            PathBuf::from("/etc/tunesync/credentials/work.cred")
        );
        assert_eq!(remote.uploader_id.as_deref(), Some("configured"));

        let remote = config.remote_config(
            Path::new("config.yaml"),
            "oauth",
            Some("override".to_string()),
        );
        assert_eq!(remote.uploader_id.as_deref(), Some("override"));
        assert_eq!(remote.credentials_path, PathBuf::from("./credentials/oauth.cred"));
    }

    #[test]
    fn absolute_paths_are_kept() {
        assert_eq!(
            resolve_path(Path::new("/a/config.yaml"), "/b/creds"),
            PathBuf::from("/b/creds")
        );
    }
}
