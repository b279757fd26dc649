use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

const CRED_EXTENSION: &str = "cred";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Location of the credential file called `name` inside `dir`.
pub fn credentials_file(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.{}", name, CRED_EXTENSION))
}

impl Credentials {
    pub fn load(path: &Path) -> Result<Option<Credentials>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(path)?;
        let credentials: Credentials = serde_json::from_str(&contents)?;
        if credentials.access_token.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(credentials))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{credentials_file, Credentials};

    #[test]
    fn saves_and_loads_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = credentials_file(&dir.path().join("creds"), "oauth");
        assert!(path.ends_with("creds/oauth.cred"));
        assert_eq!(Credentials::load(&path).unwrap(), None);

        let credentials = Credentials {
            access_token: "token-1".to_string(),
            refresh_token: None,
        };
        credentials.save(&path).unwrap();
        assert_eq!(Credentials::load(&path).unwrap(), Some(credentials));
    }

    #[test]
    fn blank_token_counts_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.cred");
        std::fs::write(&path, r#"{"access_token": "  "}"#).unwrap();
        assert_eq!(Credentials::load(&path).unwrap(), None);
    }
}
