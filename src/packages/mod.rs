// src/packages/mod.rs

//! Package model
//!
//! A `Package` is one node of the dependency graph: a name, the constraint
//! it was requested with, and once resolved its concrete version and the
//! manifest fetched at that version.

pub mod manifest;

pub use manifest::Manifest;

use crate::error::{Error, Result};
use crate::repository::github;
use crate::version;
use indexmap::IndexMap;
use std::path::{Component, Path};

/// Constraint used when none is given
pub const ANY_VERSION: &str = "*";

/// A package node
#[derive(Debug, Clone, PartialEq)]
pub struct Package {
    name: String,
    required_version: String,
    /// Source override: a repository URL or another registry name
    source: Option<String>,
    version: Option<String>,
    requires: IndexMap<String, String>,
    info: Manifest,
    repository: Option<String>,
}

impl Package {
    /// Create a package requested with a constraint
    ///
    /// The name is not checked here; the installer refuses names that are
    /// not a single path component.
    pub fn new(name: impl Into<String>, required_version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required_version: clean_constraint(&required_version.into()),
            source: None,
            version: None,
            requires: IndexMap::new(),
            info: Manifest::default(),
            repository: None,
        }
    }

    /// Parse a command-line spec
    ///
    /// Accepted forms: `jquery`, `jquery#2.0.3`, `components/jquery#~2.0`,
    /// `https://github.com/components/jquery.git#2.0.3`. For a URL the
    /// package is named after the repository.
    pub fn parse(spec: &str) -> Result<Self> {
        let spec = spec.trim();
        let (left, constraint) = match spec.rsplit_once('#') {
            Some((left, constraint)) => (left, constraint),
            None => (spec, ANY_VERSION),
        };

        if left.is_empty() {
            return Err(Error::Config(format!("Invalid package spec: {}", spec)));
        }

        if is_source_url(left) {
            let (_, repo) = github::parse_source(left)?;
            validate_name(&repo)?;
            return Ok(Package::new(repo, constraint).with_source(left));
        }

        validate_name(left)?;
        Ok(Package::new(left, constraint))
    }

    /// Build a package from a manifest `dependencies` entry
    ///
    /// The value is a constraint, a source (`owner/repo`, a URL) or a
    /// `source#constraint` composite. Keys come from fetched manifests, so
    /// the name is validated.
    pub fn from_dependency(name: &str, value: &str) -> Result<Self> {
        validate_name(name)?;
        let value = value.trim();

        if let Some((source, constraint)) = value.rsplit_once('#') {
            if !source.is_empty() {
                return Ok(Package::new(name, constraint).with_source(source));
            }
            return Ok(Package::new(name, constraint));
        }

        if is_source_url(value) {
            return Ok(Package::new(name, ANY_VERSION).with_source(value));
        }

        Ok(Package::new(name, value))
    }

    /// Build a package from its frozen install record
    ///
    /// The package is named after its directory, whatever the record says.
    pub fn from_record(dir_name: &str, record: Manifest) -> Result<Self> {
        validate_name(dir_name)?;
        let mut package = Package::new(dir_name, record.target().unwrap_or(ANY_VERSION));
        package.version = record.version.clone();
        package.set_info(record);
        Ok(package)
    }

    /// Attach a source override
    pub fn with_source(mut self, source: &str) -> Self {
        self.source = Some(source.trim().to_string());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn required_version(&self) -> &str {
        &self.required_version
    }

    /// Replace the constraint to resolve against
    pub fn set_required_version(&mut self, constraint: &str) {
        self.required_version = clean_constraint(constraint);
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Resolved version, once known
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn set_version(&mut self, version: &str) {
        self.version = Some(version.to_string());
    }

    /// Dependencies declared by the resolved manifest
    pub fn requires(&self) -> &IndexMap<String, String> {
        &self.requires
    }

    pub fn info(&self) -> &Manifest {
        &self.info
    }

    /// Store the fetched manifest; `requires` follows its dependencies
    pub fn set_info(&mut self, info: Manifest) {
        self.requires = info.dependencies.clone();
        self.info = info;
    }

    /// Normalized URL of the repository this package resolved against
    pub fn repository(&self) -> Option<&str> {
        self.repository.as_deref()
    }

    /// Bind the package to its repository; a package binds exactly once
    pub fn bind_repository(&mut self, url: &str) -> Result<()> {
        if let Some(existing) = &self.repository {
            return Err(Error::Logic(format!(
                "Package {} is already bound to repository {}",
                self.name, existing
            )));
        }
        self.repository = Some(url.to_string());
        Ok(())
    }

    /// Value recorded in the root manifest for this package
    ///
    /// An unconstrained request is pinned to `~<resolved>`.
    pub fn manifest_constraint(&self) -> String {
        let unconstrained = version::normalize(&self.required_version) == "*";
        let constraint = match &self.version {
            Some(resolved) if unconstrained && !version::is_branch(resolved) => {
                format!("~{}", resolved)
            }
            _ => self.required_version.clone(),
        };

        match &self.source {
            Some(source) => format!("{}#{}", source, constraint),
            None => constraint,
        }
    }

    /// The `.bower.json` record describing this installed package
    pub fn frozen_record(&self) -> Manifest {
        let mut record = self.info.clone();
        record.name = Some(self.name.clone());
        record.version = self.version.clone();
        record.set_meta(manifest::TARGET_KEY, &self.required_version);
        if let Some(url) = &self.repository {
            record.set_meta(manifest::SOURCE_KEY, url);
        }
        record
    }
}

fn clean_constraint(constraint: &str) -> String {
    match constraint.trim() {
        "" => ANY_VERSION.to_string(),
        trimmed => trimmed.to_string(),
    }
}

/// Check that a package name is a single, plain path component
///
/// Names become directories under the install directory.
pub fn validate_name(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    let plain = matches!(components.next(), Some(Component::Normal(_)))
        && components.next().is_none()
        && !name.contains(['/', '\\', '\0'])
        && name.trim() == name;

    if plain {
        Ok(())
    } else {
        Err(Error::InvalidName(name.to_string()))
    }
}

/// True when a spec names a repository rather than a registry package
pub fn is_source_url(value: &str) -> bool {
    value.contains("://") || value.starts_with("git@") || value.contains('/')
}
