// src/lib.rs

//! bowerpm - a front-end package manager
//!
//! Resolves bower-style package specs to GitHub-hosted releases, downloads
//! and unpacks them into the project's install directory and keeps the
//! on-disk records consistent across install, update, uninstall and prune.
//!
//! # Architecture
//!
//! - Registry: package name to repository URL
//! - Repository: tags, manifests and release archives over a `Transport`
//! - Installer: archive cache, extraction with ignore rules, `.bower.json` records
//! - Resolver: depth-first dependency walk returning structured outcomes
//! - File-based state: `bower.json`, `.bowerrc` and one record per package

pub mod config;
mod error;
pub mod filesystem;
pub mod installer;
pub mod packages;
pub mod registry;
pub mod repository;
pub mod resolver;
pub mod version;

#[cfg(test)]
pub(crate) mod test_utils;

pub use error::{Error, Result};
