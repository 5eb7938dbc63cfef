//! Key-path addressable configuration document.
//!
//! The document is read from TOML and held as a `serde_json::Value` tree so
//! that lookups by dotted path (`"validate.test_class"`) work uniformly for
//! file values and command-line overrides.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{GraderError, Result};

/// Nested configuration document with dotted-path lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    root: Value,
}

impl Default for Config {
    fn default() -> Self {
        Self::empty()
    }
}

impl Config {
    /// An empty document: every lookup yields its default.
    pub fn empty() -> Self {
        Self {
            root: Value::Object(Map::new()),
        }
    }

    /// Wrap an existing value tree. Non-object roots are replaced by an empty
    /// document.
    pub fn from_value(root: Value) -> Self {
        if root.is_object() {
            Self { root }
        } else {
            Self::empty()
        }
    }

    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> std::result::Result<Self, toml::de::Error> {
        let root: Value = toml::from_str(text)?;
        Ok(Self::from_value(root))
    }

    /// Read and parse a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| GraderError::ConfigFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text).map_err(|source| GraderError::ConfigSyntax {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The whole document.
    pub fn as_value(&self) -> &Value {
        &self.root
    }

    /// Walk a dotted key path. Returns `None` as soon as a segment is absent
    /// or an intermediate value is not a table.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut node = &self.root;
        for segment in path.split('.').filter(|s| !s.is_empty()) {
            node = node.as_object()?.get(segment)?;
        }
        Some(node)
    }

    /// Typed lookup that never fails: absent keys and values of the wrong
    /// type both yield `default`.
    pub fn get_or<T: DeserializeOwned>(&self, path: &str, default: T) -> T {
        match self.get(path) {
            None | Some(Value::Null) => default,
            Some(value) => match serde_json::from_value(value.clone()) {
                Ok(v) => v,
                Err(e) => {
                    warn!(key = %path, error = %e, "Config value has unexpected type, using default");
                    default
                }
            },
        }
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    pub fn get_bool(&self, path: &str, default: bool) -> bool {
        self.get_or(path, default)
    }

    pub fn get_u64(&self, path: &str, default: u64) -> u64 {
        self.get_or(path, default)
    }

    /// String lookup for required keys. Absent or blank values are fatal.
    pub fn require_str(&self, path: &str) -> Result<&str> {
        match self.get_str(path).map(str::trim) {
            Some(s) if !s.is_empty() => Ok(s),
            _ => Err(GraderError::MissingConfig {
                key: path.to_string(),
            }),
        }
    }

    /// Set a value at a dotted path, creating intermediate tables.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) {
        let segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
        if let Value::Object(map) = &mut self.root {
            insert_path(map, &segments, value.into());
        }
    }
}

fn insert_path(map: &mut Map<String, Value>, segments: &[&str], value: Value) {
    match segments {
        [] => {}
        [last] => {
            map.insert(last.to_string(), value);
        }
        [head, rest @ ..] => {
            let child = map
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            if let Value::Object(child_map) = child {
                insert_path(child_map, rest, value);
            }
        }
    }
}
