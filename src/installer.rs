// src/installer.rs

//! Package installation on disk
//!
//! The installer turns a resolved `Package` plus the repository it was
//! resolved against into files under the install directory: it downloads
//! (or reuses a cached) release archive, extracts it with the package's
//! ignore rules and writes the frozen `.bower.json` record.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::filesystem;
use crate::packages::{Package, validate_name};
use crate::repository::{ArchiveKind, GithubRepository};
use crate::version;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

pub use crate::filesystem::is_ignored;

/// Ignore rules used when a manifest declares none
pub const DEFAULT_IGNORE: &[&str] = &[".git", ".svn", ".hg"];

/// Writes packages into the install directory
pub struct Installer<'a> {
    config: &'a Config,
    archive_kind: ArchiveKind,
}

impl<'a> Installer<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            archive_kind: ArchiveKind::default(),
        }
    }

    /// Download tarballs instead of zipballs
    pub fn with_archive_kind(mut self, kind: ArchiveKind) -> Self {
        self.archive_kind = kind;
        self
    }

    pub fn is_installed(&self, name: &str) -> bool {
        self.config.is_installed(name)
    }

    /// Cached archive location for a resolved package
    pub fn cache_path(&self, name: &str, resolved: &str) -> PathBuf {
        let file_name = format!("{}-{}.{}", name, resolved, self.archive_kind.extension())
            .replace(['/', '\\'], "_");
        self.config.cache_dir().join(file_name)
    }

    /// Install a resolved package
    ///
    /// Returns the number of files extracted.
    pub fn install(&self, package: &Package, repository: &GithubRepository<'_>) -> Result<usize> {
        let resolved = release_version(package)?;
        let archive = self.fetch_archive(package.name(), resolved, repository)?;
        self.unpack(package, resolved, &archive)
    }

    /// Replace an installed package with a newly resolved version
    ///
    /// The old files stay in place until the new release has been fetched.
    pub fn update(&self, package: &Package, repository: &GithubRepository<'_>) -> Result<usize> {
        let resolved = release_version(package)?;
        if !self.is_installed(package.name()) {
            return Err(Error::NotInstalled(package.name().to_string()));
        }

        let archive = self.fetch_archive(package.name(), resolved, repository)?;

        // Files dropped by the new release must not linger
        filesystem::remove(self.config.install_dir(), package.name())?;
        self.unpack(package, resolved, &archive)
    }

    /// Extract a fetched archive and write the install record
    fn unpack(&self, package: &Package, resolved: &str, archive: &[u8]) -> Result<usize> {
        let ignore = package
            .info()
            .ignore_patterns()
            .unwrap_or_else(|| DEFAULT_IGNORE.iter().map(|p| p.to_string()).collect());

        let written = filesystem::extract(
            archive,
            self.config.install_dir(),
            package.name(),
            &ignore,
        )?;

        self.config
            .write_installed_manifest(package.name(), &package.frozen_record())?;

        info!("Installed {} {}", package.name(), resolved);
        Ok(written)
    }

    /// Remove an installed package
    pub fn uninstall(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        if !self.is_installed(name) {
            return Err(Error::NotInstalled(name.to_string()));
        }

        filesystem::remove(self.config.install_dir(), name)?;
        info!("Uninstalled {}", name);
        Ok(())
    }

    /// All packages with an install record, sorted by name
    pub fn get_installed(&self) -> Result<Vec<Package>> {
        let install_dir = self.config.install_dir();
        if !install_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut packages = Vec::new();
        for entry in fs::read_dir(install_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }

            let dir_name = entry.file_name().to_string_lossy().into_owned();
            if !self.config.is_installed(&dir_name) {
                debug!("Skipping {} without install record", dir_name);
                continue;
            }

            let record = self.config.read_installed_manifest(&dir_name)?;
            packages.push(Package::from_record(&dir_name, record)?);
        }

        packages.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(packages)
    }

    /// Installed packages that depend on `name`, keyed by the constraint each declares
    pub fn find_dependent_packages(&self, name: &str) -> Result<BTreeMap<String, String>> {
        let mut dependents = BTreeMap::new();

        for package in self.get_installed()? {
            if let Some(constraint) = package.requires().get(name) {
                debug!("{} requires {} {}", package.name(), name, constraint);
                dependents.insert(constraint.clone(), package.name().to_string());
            }
        }

        Ok(dependents)
    }

    /// Read the release archive from the cache or download it
    ///
    /// Branch heads move, so they are never served from the cache.
    fn fetch_archive(
        &self,
        name: &str,
        resolved: &str,
        repository: &GithubRepository<'_>,
    ) -> Result<Vec<u8>> {
        if version::is_branch(resolved) {
            return repository.fetch_release(self.archive_kind);
        }

        let cache_path = self.cache_path(name, resolved);
        if let Ok(archive) = fs::read(&cache_path) {
            info!("Using cached archive {}", cache_path.display());
            return Ok(archive);
        }

        let archive = repository.fetch_release(self.archive_kind)?;
        if let Err(e) = self.store_in_cache(&cache_path, &archive) {
            warn!("Failed to cache {}: {}", cache_path.display(), e);
        }
        Ok(archive)
    }

    /// Write an archive to the cache atomically
    fn store_in_cache(&self, cache_path: &Path, archive: &[u8]) -> std::io::Result<()> {
        let cache_dir = self.config.cache_dir();
        fs::create_dir_all(cache_dir)?;

        let mut temp = NamedTempFile::new_in(cache_dir)?;
        temp.write_all(archive)?;
        temp.persist(cache_path).map_err(|e| e.error)?;

        debug!("Cached {} bytes at {}", archive.len(), cache_path.display());
        Ok(())
    }
}

/// Resolved version of a package that is safe to write to disk
fn release_version(package: &Package) -> Result<&str> {
    validate_name(package.name())?;
    package.version().ok_or_else(|| {
        Error::Logic(format!("Package {} has no resolved version", package.name()))
    })
}
