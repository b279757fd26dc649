mod credentials;
mod error;
mod session;

use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use common::RemoteSong;
use serde::{Deserialize, Serialize};

pub use credentials::{credentials_file, Credentials};
pub use error::{RemoteError, Result};
pub use session::{HttpSession, RemoteConfig};

/// Server replies that mean the file is already in the library.
const ALREADY_EXISTS_MARKERS: [&str; 2] = ["ALREADY_EXISTS", "this song is already uploaded"];

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadResult {
    pub uploaded: bool,
    pub matched: bool,
    pub song_id: Option<String>,
    pub reason: Option<String>,
}

impl UploadResult {
    pub fn succeeded(&self) -> bool {
        self.uploaded || self.matched
    }

    pub fn already_exists(&self) -> bool {
        match &self.reason {
            Some(reason) => ALREADY_EXISTS_MARKERS
                .iter()
                .any(|marker| reason.contains(marker)),
            None => false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Download {
    pub suggested_filename: String,
    pub audio: Bytes,
}

/// An authenticated connection to the remote music library.
#[async_trait]
pub trait RemoteLibrary: Send + Sync {
    /// Logs in with stored credentials.
    async fn authenticate(&mut self) -> Result<()>;

    /// Page a user visits to obtain an authorization code.
    fn authorize_url(&self) -> String;

    /// Trades an authorization code for credentials and stores them.
    async fn exchange_code(&mut self, code: &str) -> Result<()>;

    async fn list_all_songs(&self) -> Result<Vec<RemoteSong>>;

    async fn list_uploaded_songs(&self) -> Result<Vec<RemoteSong>>;

    async fn upload(&self, path: &Path, quality: &str, enable_matching: bool)
        -> Result<UploadResult>;

    async fn download(&self, id: &str) -> Result<Download>;

    async fn delete(&self, id: &str) -> Result<()>;

    async fn logout(&mut self) -> Result<()>;
}
