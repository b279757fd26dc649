use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use common::RemoteSong;
use remote::{Download, RemoteError, RemoteLibrary, Result, UploadResult};

/// In-memory remote library that records what the tools ask of it.
#[derive(Default)]
pub struct FakeRemote {
    pub logged_in: bool,
    pub valid_codes: Vec<String>,
    pub auth_calls: usize,
    pub songs: Vec<RemoteSong>,
    pub downloads: HashMap<String, (String, Vec<u8>)>,
    /// Upload outcomes by file name; unlisted files upload fine.
    pub upload_results: HashMap<String, UploadResult>,
    /// File names or song ids whose transfer fails outright.
    pub failing: HashSet<String>,
    pub uploads: Mutex<Vec<PathBuf>>,
    pub deletes: Mutex<Vec<String>>,
}

impl FakeRemote {
    pub fn uploaded(&self) -> Vec<PathBuf> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }

    fn fail(&self, item: &str) -> Result<()> {
        if self.failing.contains(item) {
            return Err(RemoteError::Api {
                status: 500,
                message: format!("{} failed", item),
            });
        }
        Ok(())
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[async_trait]
impl RemoteLibrary for FakeRemote {
    async fn authenticate(&mut self) -> Result<()> {
        self.auth_calls += 1;
        if self.logged_in {
            Ok(())
        } else {
            Err(RemoteError::AuthenticationFailed("no credentials".to_string()))
        }
    }

    fn authorize_url(&self) -> String {
        "http://localhost/authorize".to_string()
    }

    async fn exchange_code(&mut self, code: &str) -> Result<()> {
        if self.valid_codes.iter().any(|valid| valid == code.trim()) {
            self.logged_in = true;
            Ok(())
        } else {
            Err(RemoteError::AuthenticationFailed("bad code".to_string()))
        }
    }

    async fn list_all_songs(&self) -> Result<Vec<RemoteSong>> {
        Ok(self.songs.clone())
    }

    async fn list_uploaded_songs(&self) -> Result<Vec<RemoteSong>> {
        Ok(self.songs.clone())
    }

    async fn upload(&self, path: &Path, _quality: &str, _matching: bool) -> Result<UploadResult> {
        let name = file_name(path);
        self.fail(&name)?;
        self.uploads.lock().unwrap().push(path.to_path_buf());
        Ok(self
            .upload_results
            .get(&name)
            .cloned()
            .unwrap_or(UploadResult {
                uploaded: true,
                ..UploadResult::default()
            }))
    }

    async fn download(&self, id: &str) -> Result<Download> {
        self.fail(id)?;
        let (name, audio) = self
            .downloads
            .get(id)
            .cloned()
            .unwrap_or_else(|| (format!("{}.mp3", id), b"audio".to_vec()));
        Ok(Download {
            suggested_filename: name,
            audio: Bytes::from(audio),
        })
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.fail(id)?;
        self.deletes.lock().unwrap().push(id.to_string());
        Ok(())
    }

    async fn logout(&mut self) -> Result<()> {
        self.logged_in = false;
        Ok(())
    }
}
