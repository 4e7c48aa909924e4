// src/repository/mod.rs

//! Remote sources and the HTTP transport
//!
//! This module provides functionality for:
//! - Fetching raw bytes over HTTP(S) behind the `Transport` trait
//! - Resolving GitHub repositories to tags, manifests and release archives

pub mod github;

pub use github::{ArchiveKind, GithubRepository, Tag};

use reqwest::blocking::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Default timeout for HTTP requests (30 seconds)
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Failure of a single GET request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Server answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// Connection, timeout or body read failure
    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },
}

impl TransportError {
    /// True for an HTTP 404 response
    pub fn is_not_found(&self) -> bool {
        matches!(self, TransportError::Status { status: 404, .. })
    }
}

/// Blocking GET of a URL into memory
///
/// Every network access of the crate goes through this trait, so a resolver
/// can be driven entirely from canned responses.
pub trait Transport {
    fn get(&self, url: &str) -> std::result::Result<Vec<u8>, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, url: &str) -> std::result::Result<Vec<u8>, TransportError> {
        (**self).get(url)
    }
}

/// HTTP transport backed by a blocking reqwest client
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new() -> crate::Result<Self> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(format!("bowerpm/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| crate::Error::Repository(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl Transport for HttpClient {
    fn get(&self, url: &str) -> std::result::Result<Vec<u8>, TransportError> {
        debug!("GET {}", url);

        let response = self.client.get(url).send().map_err(|e| TransportError::Request {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        if !response.status().is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body = response.bytes().map_err(|e| TransportError::Request {
            url: url.to_string(),
            message: format!("Failed to read response body: {}", e),
        })?;

        debug!("Received {} bytes from {}", body.len(), url);
        Ok(body.to_vec())
    }
}
