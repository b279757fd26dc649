use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use common::RemoteSong;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::credentials::Credentials;
use crate::error::{RemoteError, Result};
use crate::{Download, RemoteLibrary, UploadResult};

const UPLOADER_HEADER: &str = "X-Uploader-Id";
const BACKOFF_BASE_MS: u64 = 100;
const BACKOFF_MAX_MS: u64 = 30_000;

#[derive(Clone, Debug)]
pub struct RemoteConfig {
    pub base_url: String,
    pub credentials_path: PathBuf,
    pub uploader_id: Option<String>,
    pub timeout: Duration,
    pub max_retries: u32,
    pub user_agent: String,
}

#[derive(Debug, Deserialize)]
struct SongPage {
    #[serde(default)]
    songs: Vec<RemoteSong>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Remote library reached over its JSON HTTP API.
pub struct HttpSession {
    client: Client,
    base: Url,
    config: RemoteConfig,
    token: Option<String>,
}

impl HttpSession {
    pub fn new(config: RemoteConfig) -> Result<Self> {
        let base = Url::parse(&config.base_url)
            .map_err(|err| RemoteError::InvalidUrl(format!("{}: {}", config.base_url, err)))?;
        if base.cannot_be_a_base() {
            return Err(RemoteError::InvalidUrl(config.base_url.clone()));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self {
            client,
            base,
            config,
            token: None,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| RemoteError::InvalidUrl(self.config.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> Result<RequestBuilder> {
        let token = self.token.as_deref().ok_or(RemoteError::NotAuthenticated)?;
        Ok(self.bare_request(method, url).bearer_auth(token))
    }

    fn bare_request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match self.config.uploader_id.as_deref() {
            Some(id) if !id.is_empty() => builder.header(UPLOADER_HEADER, id),
            _ => builder,
        }
    }

    /// Sends a request, retrying throttled, failed and unreachable attempts
    /// with exponential backoff.
    async fn send<F>(&self, build: F) -> Result<Response>
    where
        F: Fn() -> Result<RequestBuilder>,
    {
        let mut attempt = 0u32;
        loop {
            let outcome = match build()?.send().await {
                Ok(response) => check_status(response).await,
                Err(err) => Err(RemoteError::from(err)),
            };
            match outcome {
                Ok(response) => return Ok(response),
                Err(err) if err.is_transient() && attempt < self.config.max_retries => {
                    attempt += 1;
                    let backoff = backoff_delay(attempt);
                    warn!(
                        "Request failed (attempt {}/{}): {}, retrying in {}ms",
                        attempt,
                        self.config.max_retries,
                        err,
                        backoff.as_millis()
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn list_pages(&self, segments: &[&str]) -> Result<Vec<RemoteSong>> {
        let url = self.url(segments)?;
        let mut songs = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let response = self
                .send(|| {
                    let builder = self.request(Method::GET, url.clone())?;
                    Ok(match page_token.as_deref() {
                        Some(token) => builder.query(&[("page_token", token)]),
                        None => builder,
                    })
                })
                .await?;
            let page: SongPage = serde_json::from_slice(&response.bytes().await?)?;
            debug!("Fetched page of {} songs", page.songs.len());
            songs.extend(page.songs);
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => return Ok(songs),
            }
        }
    }
}

fn backoff_delay(attempt: u32) -> Duration {
    let factor = 2u64.checked_pow(attempt).unwrap_or(u64::MAX);
    Duration::from_millis(BACKOFF_BASE_MS.saturating_mul(factor).min(BACKOFF_MAX_MS))
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(RemoteError::Api {
        status: status.as_u16(),
        message: message.trim().to_string(),
    })
}

fn auth_error(err: RemoteError) -> RemoteError {
    match err {
        RemoteError::Api { status, message }
            if status == StatusCode::UNAUTHORIZED.as_u16()
                || status == StatusCode::FORBIDDEN.as_u16() =>
        {
            RemoteError::AuthenticationFailed(if message.is_empty() {
                format!("server returned {}", status)
            } else {
                message
            })
        }
        other => other,
    }
}

/// File name carried by a `Content-Disposition` header, if any.
fn disposition_filename(value: &str) -> Option<String> {
    value.split(';').find_map(|part| {
        let (name, raw) = part.trim().split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("filename") {
            return None;
        }
        let name = raw.trim().trim_matches('"').trim();
        let name = Path::new(name).file_name()?.to_string_lossy().into_owned();
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    })
}

#[async_trait]
impl RemoteLibrary for HttpSession {
    async fn authenticate(&mut self) -> Result<()> {
        let credentials = Credentials::load(&self.config.credentials_path)?.ok_or_else(|| {
            RemoteError::AuthenticationFailed(format!(
                "no stored credentials at {:?}",
                self.config.credentials_path
            ))
        })?;
        self.token = Some(credentials.access_token);

        let url = self.url(&["v1", "session"])?;
        let result = self.send(|| self.request(Method::GET, url.clone())).await;
        match result {
            Ok(_) => {
                info!("Authenticated with {}", self.base);
                Ok(())
            }
            Err(err) => {
                self.token = None;
                Err(auth_error(err))
            }
        }
    }

    fn authorize_url(&self) -> String {
        let mut url = match self.url(&["v1", "oauth", "authorize"]) {
            Ok(url) => url,
            Err(_) => return self.config.base_url.clone(),
        };
        if let Some(id) = self.config.uploader_id.as_deref().filter(|id| !id.is_empty()) {
            url.query_pairs_mut().append_pair("uploader_id", id);
        }
        url.to_string()
    }

    async fn exchange_code(&mut self, code: &str) -> Result<()> {
        let url = self.url(&["v1", "oauth", "token"])?;
        let body = serde_json::json!({ "code": code.trim() });
        let response = self
            .send(|| Ok(self.bare_request(Method::POST, url.clone()).json(&body)))
            .await
            .map_err(auth_error)?;
        let token: TokenResponse = serde_json::from_slice(&response.bytes().await?)?;
        let credentials = Credentials {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
        };
        credentials.save(&self.config.credentials_path)?;
        info!("Stored credentials in {:?}", self.config.credentials_path);
        self.token = Some(credentials.access_token);
        Ok(())
    }

    async fn list_all_songs(&self) -> Result<Vec<RemoteSong>> {
        match self.list_pages(&["v1", "songs"]).await {
            Err(RemoteError::Api { status, message })
                if matches!(status, 404 | 405 | 501) =>
            {
                Err(RemoteError::Unsupported(format!(
                    "library listing ({}): {}",
                    status, message
                )))
            }
            other => other,
        }
    }

    async fn list_uploaded_songs(&self) -> Result<Vec<RemoteSong>> {
        self.list_pages(&["v1", "songs", "uploaded"]).await
    }

    async fn upload(
        &self,
        path: &Path,
        quality: &str,
        enable_matching: bool,
    ) -> Result<UploadResult> {
        let audio = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        let url = self.url(&["v1", "songs", "upload"])?;
        let matching = if enable_matching { "true" } else { "false" };

        let response = self
            .send(|| {
                Ok(self
                    .request(Method::POST, url.clone())?
                    .query(&[
                        ("filename", filename.as_str()),
                        ("quality", quality),
                        ("match", matching),
                    ])
                    .header(CONTENT_TYPE, mime.as_ref())
                    .body(audio.clone()))
            })
            .await;

        match response {
            Ok(response) => Ok(serde_json::from_slice(&response.bytes().await?)?),
            // Rejections carry the reason in the body.
            Err(RemoteError::Api { status: 409, message }) => Ok(UploadResult {
                reason: Some(message),
                ..UploadResult::default()
            }),
            Err(err) => Err(err),
        }
    }

    async fn download(&self, id: &str) -> Result<Download> {
        let url = self.url(&["v1", "songs", id, "download"])?;
        let response = self.send(|| self.request(Method::GET, url.clone())).await?;
        let suggested_filename = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(disposition_filename)
            .unwrap_or_else(|| format!("{}.mp3", id));
        let audio = response.bytes().await?;
        Ok(Download {
            suggested_filename,
            audio,
        })
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let url = self.url(&["v1", "songs", id])?;
        self.send(|| self.request(Method::DELETE, url.clone())).await?;
        Ok(())
    }

    async fn logout(&mut self) -> Result<()> {
        if self.token.is_none() {
            return Ok(());
        }
        let url = self.url(&["v1", "session"])?;
        let result = self.send(|| self.request(Method::DELETE, url.clone())).await;
        self.token = None;
        result.map(|_| ())
    }
}
