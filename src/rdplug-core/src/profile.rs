//! Connection profiles as stored by the host.
//!
//! A profile is a flat map from option key to a loosely typed value. The
//! typed getters follow the host's own coercion rules so that a profile
//! written by hand (`colordepth = "16"`) reads the same as one written by
//! the settings dialog (`colordepth = 16`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A single stored option value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProfileValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl From<bool> for ProfileValue {
    fn from(value: bool) -> Self {
        ProfileValue::Bool(value)
    }
}

impl From<i64> for ProfileValue {
    fn from(value: i64) -> Self {
        ProfileValue::Int(value)
    }
}

impl From<&str> for ProfileValue {
    fn from(value: &str) -> Self {
        ProfileValue::Text(value.to_owned())
    }
}

impl From<String> for ProfileValue {
    fn from(value: String) -> Self {
        ProfileValue::Text(value)
    }
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("failed to read profile at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse profile at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Read-only view of a stored connection, populated by the host before a
/// connection is opened.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    settings: BTreeMap<String, ProfileValue>,
    #[serde(skip)]
    secrets: BTreeMap<String, String>,
}

impl ConnectionProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Load a profile from a TOML file with a top-level `name` and a
    /// `[settings]` table.
    pub fn load(path: &Path) -> Result<Self, ProfileError> {
        let contents = fs::read_to_string(path).map_err(|source| ProfileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents).map_err(|source| ProfileError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ProfileValue>) -> &mut Self {
        self.settings.insert(key.into(), value.into());
        self
    }

    pub fn set_secret(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.secrets.insert(key.into(), value.into());
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.settings.contains_key(key) || self.secrets.contains_key(key)
    }

    /// Text value for `key`. Empty strings count as unset.
    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.settings.get(key) {
            Some(ProfileValue::Text(text)) if !text.is_empty() => Some(text),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.settings.get(key) {
            Some(ProfileValue::Bool(value)) => *value,
            Some(ProfileValue::Int(value)) => *value != 0,
            Some(ProfileValue::Text(text)) => match text.trim() {
                "1" | "true" | "TRUE" | "True" => true,
                "0" | "false" | "FALSE" | "False" => false,
                _ => default,
            },
            None => default,
        }
    }

    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        match self.settings.get(key) {
            Some(ProfileValue::Int(value)) => *value,
            Some(ProfileValue::Bool(value)) => i64::from(*value),
            Some(ProfileValue::Text(text)) => text.trim().parse().unwrap_or(default),
            None => default,
        }
    }

    /// Secret-backed value. Secrets attached by the host take precedence over
    /// a plain entry stored in the profile itself.
    pub fn get_secret(&self, key: &str) -> Option<&str> {
        self.secrets
            .get(key)
            .map(String::as_str)
            .filter(|secret| !secret.is_empty())
            .or_else(|| self.get_string(key))
    }
}

impl fmt::Debug for ConnectionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionProfile")
            .field("name", &self.name)
            .field("settings", &RedactedSettings(&self.settings))
            .field("secrets", &self.secrets.keys().collect::<Vec<_>>())
            .finish()
    }
}

struct RedactedSettings<'a>(&'a BTreeMap<String, ProfileValue>);

impl fmt::Debug for RedactedSettings<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in self.0 {
            if crate::redact::is_secret_key(key) {
                map.entry(key, &"[REDACTED]");
            } else {
                map.entry(key, value);
            }
        }
        map.finish()
    }
}
