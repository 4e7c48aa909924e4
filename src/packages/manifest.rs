// src/packages/manifest.rs

//! Package manifest (`bower.json` / `.bower.json`) representation
//!
//! Only `name`, `version` and `dependencies` are typed. Every other field is
//! kept verbatim as JSON so that rewriting a manifest preserves it.

use indexmap::IndexMap;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Frozen record key holding the normalized repository URL
pub const SOURCE_KEY: &str = "_source";

/// Frozen record key holding the constraint that was resolved
pub const TARGET_KEY: &str = "_target";

/// A parsed manifest
///
/// Written back as `name`, `version`, then the remaining fields in file
/// order with `dependencies` at the position it was read from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Manifest {
    pub name: Option<String>,

    pub version: Option<String>,

    /// Untyped fields (`main`, `ignore`, `authors`, ...) in file order
    pub extra: Map<String, Value>,

    /// Declared dependencies in file order
    pub dependencies: IndexMap<String, String>,

    /// Number of untyped fields read before `dependencies`
    dependencies_at: Option<usize>,
}

impl TryFrom<Map<String, Value>> for Manifest {
    type Error = serde_json::Error;

    fn try_from(fields: Map<String, Value>) -> serde_json::Result<Self> {
        let mut manifest = Manifest::default();

        for (key, value) in fields {
            match key.as_str() {
                "name" => manifest.name = typed_field(&key, value)?,
                "version" => manifest.version = typed_field(&key, value)?,
                "dependencies" => {
                    manifest.dependencies =
                        typed_field::<Option<_>>(&key, value)?.unwrap_or_default();
                    manifest.dependencies_at = Some(manifest.extra.len());
                }
                _ => {
                    manifest.extra.insert(key, value);
                }
            }
        }

        Ok(manifest)
    }
}

impl From<Manifest> for Map<String, Value> {
    fn from(manifest: Manifest) -> Self {
        let mut fields = Map::new();
        if let Some(name) = manifest.name {
            fields.insert("name".to_string(), Value::String(name));
        }
        if let Some(version) = manifest.version {
            fields.insert("version".to_string(), Value::String(version));
        }

        // A manifest that never had the key only gets one when it has entries
        let mut dependencies = (manifest.dependencies_at.is_some()
            || !manifest.dependencies.is_empty())
        .then(|| {
            Value::Object(
                manifest
                    .dependencies
                    .into_iter()
                    .map(|(name, constraint)| (name, Value::String(constraint)))
                    .collect(),
            )
        });
        let position = manifest.dependencies_at.unwrap_or(manifest.extra.len());

        for (index, (key, value)) in manifest.extra.into_iter().enumerate() {
            if index == position {
                if let Some(dependencies) = dependencies.take() {
                    fields.insert("dependencies".to_string(), dependencies);
                }
            }
            fields.insert(key, value);
        }
        if let Some(dependencies) = dependencies {
            fields.insert("dependencies".to_string(), dependencies);
        }

        fields
    }
}

fn typed_field<T: DeserializeOwned>(key: &str, value: Value) -> serde_json::Result<T> {
    serde_json::from_value(value)
        .map_err(|e| serde_json::Error::custom(format!("invalid `{}`: {}", key, e)))
}

impl Manifest {
    /// Manifest holding only a name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Parse manifest JSON
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// Pretty-print with 4-space indentation and a trailing newline
    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        pretty_json(self)
    }

    /// The `ignore` list, if the manifest declares one
    pub fn ignore_patterns(&self) -> Option<Vec<String>> {
        let list = self.extra.get("ignore")?.as_array()?;
        Some(
            list.iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
        )
    }

    /// Value of a field by name, typed fields included
    pub fn field(&self, key: &str) -> Option<Value> {
        match key {
            "name" => self.name.clone().map(Value::String),
            "version" => self.version.clone().map(Value::String),
            "dependencies" => Some(Value::Object(
                self.dependencies
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect(),
            )),
            _ => self.extra.get(key).cloned(),
        }
    }

    /// Repository URL recorded at install time
    pub fn source(&self) -> Option<&str> {
        self.extra.get(SOURCE_KEY).and_then(Value::as_str)
    }

    /// Constraint recorded at install time
    pub fn target(&self) -> Option<&str> {
        self.extra.get(TARGET_KEY).and_then(Value::as_str)
    }

    /// Set an untyped string field
    pub fn set_meta(&mut self, key: &str, value: &str) {
        self.extra.insert(key.to_string(), Value::String(value.to_string()));
    }
}

/// Serialize any value the way manifests are written on disk
pub fn pretty_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;

    let mut json = String::from_utf8_lossy(&buffer).into_owned();
    json.push('\n');
    Ok(json)
}
