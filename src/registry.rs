// src/registry.rs

//! Package registry client
//!
//! The registry maps a package name to the repository it lives in:
//! `GET <base>/<name>` answers `{"name": ..., "url": ...}` and
//! `GET <base>/search/<query>` answers an array of the same objects.

use crate::error::{Error, Result};
use crate::repository::Transport;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// A registry record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub name: String,
    pub url: String,
}

/// Client for one registry base URL
pub struct RegistryClient<'a> {
    transport: &'a dyn Transport,
    base_url: String,
}

impl<'a> RegistryClient<'a> {
    pub fn new(transport: &'a dyn Transport, base_url: &str) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve a package name to its repository URL
    pub fn lookup(&self, name: &str) -> Result<RegistryEntry> {
        let cannot_resolve = || Error::Registry(format!("Cannot resolve package `{}`", name));

        let url = self.endpoint(&[name])?;
        debug!("Looking up {} at {}", name, url);

        let body = self.transport.get(url.as_str()).map_err(|e| {
            debug!("Registry request failed: {}", e);
            cannot_resolve()
        })?;

        let entry: RegistryEntry = serde_json::from_slice(&body).map_err(|e| {
            debug!("Invalid registry response for {}: {}", name, e);
            cannot_resolve()
        })?;

        if entry.url.trim().is_empty() {
            return Err(cannot_resolve());
        }

        info!("Registry resolved {} to {}", name, entry.url);
        Ok(entry)
    }

    /// Search the registry; no matches is an empty list, not an error
    pub fn search(&self, query: &str) -> Result<Vec<RegistryEntry>> {
        let url = self.endpoint(&["search", query])?;
        debug!("Searching registry: {}", url);

        let body = self
            .transport
            .get(url.as_str())
            .map_err(|e| Error::Registry(format!("Search for `{}` failed: {}", query, e)))?;

        let entries: Vec<RegistryEntry> = serde_json::from_slice(&body).map_err(|e| {
            Error::Registry(format!("Invalid search response for `{}`: {}", query, e))
        })?;

        debug!("Search for {} returned {} results", query, entries.len());
        Ok(entries)
    }

    /// Append percent-encoded path segments to the base URL
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| Error::Config(format!("Invalid registry URL {}: {}", self.base_url, e)))?;

        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("Invalid registry URL {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }
}
