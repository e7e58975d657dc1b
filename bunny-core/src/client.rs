use std::{io, path::Path};

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokio_util::io::ReaderStream;
use tracing::debug;
use url::Url;

use crate::listing::{RemoteEntry, parse_listing};

const DEFAULT_HOST: &str = "storage.bunnycdn.com";
const ACCESS_KEY_HEADER: &str = "AccessKey";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("base url cannot carry a path")]
    InvalidBaseUrl,
    #[error("key contains a dot segment: {0}")]
    DotSegment(String),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("api returned {status}: {body}")]
    Api { status: StatusCode, body: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorClass {
    Auth,
    NotFound,
    RateLimit,
    Transient,
    Permanent,
}

/// Client for one storage zone.
#[derive(Clone)]
pub struct StorageClient {
    http: Client,
    base_url: Url,
    zone: String,
    access_key: String,
}

impl StorageClient {
    /// `region` selects the regional API host (`ny`, `la`, `sg`, ...); `None`
    /// or an empty string targets the default host.
    pub fn new(
        zone: impl Into<String>,
        access_key: impl Into<String>,
        region: Option<&str>,
    ) -> Result<Self, StorageError> {
        Self::with_base_url(&region_base_url(region), zone, access_key)
    }

    pub fn with_base_url(
        base_url: &str,
        zone: impl Into<String>,
        access_key: impl Into<String>,
    ) -> Result<Self, StorageError> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(StorageError::InvalidBaseUrl);
        }
        Ok(Self {
            http: Client::new(),
            base_url,
            zone: zone.into(),
            access_key: access_key.into(),
        })
    }

    pub fn zone(&self) -> &str {
        &self.zone
    }

    /// Streams a local file to `key`, overwriting any existing object.
    pub async fn upload_file(&self, source: &Path, key: &str) -> Result<(), StorageError> {
        let url = self.object_url(key, false)?;
        let file = tokio::fs::File::open(source).await?;
        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));
        let response = self
            .http
            .put(url)
            .header(ACCESS_KEY_HEADER, &self.access_key)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(body)
            .send()
            .await?;
        Self::ensure_success(response).await?;
        debug!(key, source = %source.display(), "uploaded");
        Ok(())
    }

    pub async fn upload_bytes(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        let url = self.object_url(key, false)?;
        let response = self
            .http
            .put(url)
            .header(ACCESS_KEY_HEADER, &self.access_key)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(bytes)
            .send()
            .await?;
        Self::ensure_success(response).await?;
        debug!(key, "uploaded");
        Ok(())
    }

    /// Deletes a single object.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let url = self.object_url(key, false)?;
        self.send_delete(url).await?;
        debug!(key, "deleted");
        Ok(())
    }

    /// Deletes a directory key. The API expects directory keys with a
    /// trailing slash.
    pub async fn delete_directory(&self, dir: &str) -> Result<(), StorageError> {
        let url = self.object_url(dir, true)?;
        self.send_delete(url).await?;
        debug!(dir, "deleted directory");
        Ok(())
    }

    /// Lists one level of `dir`. A directory that does not exist lists as
    /// empty.
    pub async fn list_directory(&self, dir: &str) -> Result<Vec<RemoteEntry>, StorageError> {
        let url = self.object_url(dir, true)?;
        let response = self
            .http
            .get(url)
            .header(ACCESS_KEY_HEADER, &self.access_key)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!(dir, "listing not found, treating as empty");
            return Ok(Vec::new());
        }
        let body: serde_json::Value = Self::handle_response(response).await?;
        let entries = parse_listing(&body);
        debug!(dir, entries = entries.len(), "listed");
        Ok(entries)
    }

    /// Rejects keys with `.` or `..` segments. URL building would resolve
    /// them and address a different object.
    pub fn check_key(key: &str) -> Result<(), StorageError> {
        if key.split('/').any(|part| part == "." || part == "..") {
            return Err(StorageError::DotSegment(key.to_string()));
        }
        Ok(())
    }

    async fn send_delete(&self, url: Url) -> Result<(), StorageError> {
        let response = self
            .http
            .delete(url)
            .header(ACCESS_KEY_HEADER, &self.access_key)
            .send()
            .await?;
        Self::ensure_success(response).await
    }

    /// Builds `{base}/{zone}/{key}`. Empty segments in `key` are dropped;
    /// other segments are kept verbatim and percent-encoded. The zone root
    /// and directory keys end with a slash.
    fn object_url(&self, key: &str, directory: bool) -> Result<Url, StorageError> {
        Self::check_key(key)?;
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| StorageError::InvalidBaseUrl)?;
            segments.pop_if_empty().push(&self.zone);
            let mut pushed = false;
            for part in key.split('/').filter(|part| !part.is_empty()) {
                segments.push(part);
                pushed = true;
            }
            if directory || !pushed {
                segments.push("");
            }
        }
        Ok(url)
    }

    async fn ensure_success(response: reqwest::Response) -> Result<(), StorageError> {
        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(StorageError::Api { status, body })
        }
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, StorageError> {
        if response.status().is_success() {
            Ok(response.json::<T>().await?)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(StorageError::Api { status, body })
        }
    }
}

impl StorageError {
    pub fn classification(&self) -> Option<ApiErrorClass> {
        match self {
            StorageError::Api { status, .. } => Some(classify_api_status(*status)),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.classification() == Some(ApiErrorClass::NotFound)
    }
}

fn classify_api_status(status: StatusCode) -> ApiErrorClass {
    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        ApiErrorClass::Auth
    } else if status == StatusCode::NOT_FOUND {
        ApiErrorClass::NotFound
    } else if status == StatusCode::TOO_MANY_REQUESTS {
        ApiErrorClass::RateLimit
    } else if status.is_server_error()
        || matches!(
            status,
            StatusCode::REQUEST_TIMEOUT | StatusCode::CONFLICT | StatusCode::TOO_EARLY
        )
    {
        ApiErrorClass::Transient
    } else {
        ApiErrorClass::Permanent
    }
}

fn region_base_url(region: Option<&str>) -> String {
    match region.map(str::trim).filter(|region| !region.is_empty()) {
        Some(region) => format!("https://{region}.{DEFAULT_HOST}"),
        None => format!("https://{DEFAULT_HOST}"),
    }
}
