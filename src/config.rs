// src/config.rs

//! Project configuration and manifest storage
//!
//! This module handles all on-disk state:
//! - `.bowerrc` overrides for the install and cache directories
//! - The root manifest (`bower.json`)
//! - Per-package install records (`<install dir>/<name>/.bower.json`)
//!
//! The existence of a package's `.bower.json` is the only thing that marks
//! it as installed.

use crate::error::{Error, Result};
use crate::packages::{Manifest, manifest};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Root manifest file name
pub const ROOT_MANIFEST: &str = "bower.json";

/// Install record file name inside each package directory
pub const INSTALLED_MANIFEST: &str = ".bower.json";

/// Optional project settings file
pub const RC_FILE: &str = ".bowerrc";

/// Install directory when `.bowerrc` does not set one
pub const DEFAULT_INSTALL_DIR: &str = "bower_components";

/// Registry used when `.bowerrc` does not set one
pub const DEFAULT_REGISTRY: &str = "https://bower.herokuapp.com/packages";

/// Ignore list written by `init`
const INIT_IGNORE: &[&str] = &["**/.*", "node_modules", "bower_components", "test", "tests"];

/// `.bowerrc` contents
#[derive(Debug, Default, Deserialize)]
struct BowerRc {
    directory: Option<String>,
    storage: Option<Storage>,
    registry: Option<RegistrySetting>,
}

#[derive(Debug, Deserialize)]
struct Storage {
    packages: Option<String>,
}

/// `registry` may be a URL or an object with a `search` endpoint list
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RegistrySetting {
    Url(String),
    Endpoints { search: Vec<String> },
}

/// Parameters for a new root manifest
#[derive(Debug, Clone, Default)]
pub struct InitParams {
    pub name: String,
    pub author: Option<String>,
}

/// Project configuration and manifest store
#[derive(Debug, Clone)]
pub struct Config {
    project_dir: PathBuf,
    install_dir: PathBuf,
    cache_dir: PathBuf,
    registry: String,
    save_to_manifest: bool,
}

impl Config {
    /// Configuration with defaults and no `.bowerrc`
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        let project_dir = project_dir.into();
        Self {
            install_dir: project_dir.join(DEFAULT_INSTALL_DIR),
            cache_dir: std::env::temp_dir().join("bowerpm").join("cache"),
            registry: DEFAULT_REGISTRY.to_string(),
            save_to_manifest: false,
            project_dir,
        }
    }

    /// Load configuration for a project, applying `.bowerrc` if present
    pub fn load(project_dir: impl Into<PathBuf>) -> Result<Self> {
        let mut config = Self::new(project_dir);

        let rc_path = config.project_dir.join(RC_FILE);
        if !rc_path.exists() {
            return Ok(config);
        }

        debug!("Reading {}", rc_path.display());
        let content = fs::read(&rc_path)?;
        let rc: BowerRc = serde_json::from_slice(&content)
            .map_err(|e| Error::Config(format!("Invalid .bowerrc file: {}", e)))?;

        if let Some(directory) = rc.directory {
            config.install_dir = config.project_dir.join(directory);
        }
        if let Some(packages) = rc.storage.and_then(|s| s.packages) {
            config.cache_dir = config.project_dir.join(packages);
        }
        match rc.registry {
            Some(RegistrySetting::Url(url)) => config.registry = url,
            Some(RegistrySetting::Endpoints { search }) => {
                if let Some(url) = search.into_iter().next() {
                    config.registry = url;
                }
            }
            None => {}
        }

        info!(
            "Using install directory {} and cache {}",
            config.install_dir.display(),
            config.cache_dir.display()
        );
        Ok(config)
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Registry base URL
    pub fn registry(&self) -> &str {
        &self.registry
    }

    /// Whether install/uninstall write back to `bower.json`
    pub fn is_save_to_manifest(&self) -> bool {
        self.save_to_manifest
    }

    pub fn set_save_to_manifest(&mut self, save: bool) {
        self.save_to_manifest = save;
    }

    /// Directory a package is installed into
    pub fn package_dir(&self, name: &str) -> PathBuf {
        self.install_dir.join(name)
    }

    fn installed_manifest_path(&self, name: &str) -> PathBuf {
        self.package_dir(name).join(INSTALLED_MANIFEST)
    }

    /// Check for a package's install record
    pub fn is_installed(&self, name: &str) -> bool {
        self.installed_manifest_path(name).is_file()
    }

    /// Read a package's install record
    pub fn read_installed_manifest(&self, name: &str) -> Result<Manifest> {
        let path = self.installed_manifest_path(name);
        if !path.is_file() {
            return Err(Error::Config(format!(
                "Could not find .bower.json file for package {}",
                name
            )));
        }

        let content = fs::read(&path)?;
        Manifest::from_slice(&content).map_err(|e| {
            Error::Config(format!(
                "Invalid content in .bower.json for package {}: {}",
                name, e
            ))
        })
    }

    /// Write a package's install record
    pub fn write_installed_manifest(&self, name: &str, record: &Manifest) -> Result<()> {
        let path = self.installed_manifest_path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = record.to_pretty_json().map_err(|e| {
            Error::Config(format!("Cannot serialize .bower.json for {}: {}", name, e))
        })?;
        fs::write(&path, json)?;
        debug!("Wrote {}", path.display());
        Ok(())
    }

    pub fn root_manifest_path(&self) -> PathBuf {
        self.project_dir.join(ROOT_MANIFEST)
    }

    /// Read the project's `bower.json`
    pub fn read_root_manifest(&self) -> Result<Manifest> {
        let path = self.root_manifest_path();
        if !path.is_file() {
            return Err(Error::Config(format!(
                "No bower.json found in {}. You can run \"init\" command to create it",
                self.project_dir.display()
            )));
        }

        let content = fs::read(&path)?;
        Manifest::from_slice(&content).map_err(|_| {
            Error::Config(format!(
                "Malformed JSON in bower.json: {}",
                String::from_utf8_lossy(&content)
            ))
        })
    }

    /// Create `bower.json`; fails if one already exists
    pub fn init_root_manifest(&self, params: &InitParams) -> Result<Manifest> {
        let path = self.root_manifest_path();
        if path.exists() {
            return Err(Error::Config(format!(
                "bower.json already exists in {}",
                self.project_dir.display()
            )));
        }

        let authors = params
            .author
            .iter()
            .map(|a| Value::String(a.clone()))
            .collect::<Vec<_>>();
        let ignore = INIT_IGNORE
            .iter()
            .map(|p| Value::String(p.to_string()))
            .collect::<Vec<_>>();

        let mut document = Map::new();
        document.insert("name".to_string(), Value::String(params.name.clone()));
        document.insert("authors".to_string(), Value::Array(authors));
        document.insert("private".to_string(), Value::Bool(true));
        document.insert("ignore".to_string(), Value::Array(ignore));
        document.insert("dependencies".to_string(), Value::Object(Map::new()));

        let json = manifest::pretty_json(&document)
            .map_err(|e| Error::Config(format!("Cannot serialize {}: {}", path.display(), e)))?;
        fs::write(&path, json)?;

        let manifest: Manifest = serde_json::from_value(Value::Object(document))
            .map_err(|e| Error::Config(format!("Invalid bower.json template: {}", e)))?;
        info!("Created {}", path.display());
        Ok(manifest)
    }

    /// Write `bower.json` if saving is enabled
    ///
    /// Returns whether the file was written.
    pub fn write_root_manifest(&self, manifest: &Manifest) -> Result<bool> {
        if !self.save_to_manifest {
            return Ok(false);
        }
        self.write_manifest_file(&self.root_manifest_path(), manifest)?;
        Ok(true)
    }

    /// Merge dependency updates into an existing manifest and save it
    pub fn update_root_manifest(
        &self,
        mut existing: Manifest,
        updates: &IndexMap<String, String>,
    ) -> Result<bool> {
        if !self.save_to_manifest {
            return Ok(false);
        }
        for (name, constraint) in updates {
            existing.dependencies.insert(name.clone(), constraint.clone());
        }
        self.write_root_manifest(&existing)
    }

    /// Record a dependency in `bower.json`, creating the file if needed
    pub fn save_dependency(&self, name: &str, constraint: &str) -> Result<bool> {
        if !self.save_to_manifest {
            return Ok(false);
        }

        let existing = if self.root_manifest_path().is_file() {
            self.read_root_manifest()?
        } else {
            self.default_project_name()
                .map(Manifest::named)
                .unwrap_or_default()
        };

        let updates = IndexMap::from([(name.to_string(), constraint.to_string())]);
        self.update_root_manifest(existing, &updates)
    }

    /// Drop a dependency from `bower.json`
    pub fn remove_dependency(&self, name: &str) -> Result<bool> {
        if !self.save_to_manifest || !self.root_manifest_path().is_file() {
            return Ok(false);
        }

        let mut manifest = self.read_root_manifest()?;
        if manifest.dependencies.shift_remove(name).is_none() {
            return Ok(false);
        }
        self.write_root_manifest(&manifest)
    }

    fn default_project_name(&self) -> Option<String> {
        self.project_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
    }

    fn write_manifest_file(&self, path: &Path, manifest: &Manifest) -> Result<()> {
        let json = manifest
            .to_pretty_json()
            .map_err(|e| Error::Config(format!("Cannot serialize {}: {}", path.display(), e)))?;
        fs::write(path, json)?;
        debug!("Wrote {}", path.display());
        Ok(())
    }
}
