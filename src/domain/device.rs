//! Known peer devices and their display names.
//!
//! The registry is optional and purely cosmetic: identifiers stay opaque and
//! are never normalized, the registry only supplies human-readable names for
//! condition blurbs and log fields.
//!
//! # File Format
//!
//! ```toml
//! [[device]]
//! address = "00:1A:7D:DA:71:13"
//! name = "Car stereo"
//!
//! [[device]]
//! address = "A4:C1:38:0F:22:9B"
//! name = "Headphones"
//! ```

use crate::domain::error::{AclError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(default, rename = "device")]
    devices: Vec<DeviceEntry>,
}

#[derive(Debug, Deserialize)]
struct DeviceEntry {
    address: String,
    name: String,
}

/// Mapping from device identifier to display name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceRegistry {
    names: HashMap<String, String>,
}

impl DeviceRegistry {
    /// Parses a registry from TOML text.
    ///
    /// Entries with an empty address are skipped. When an address appears
    /// twice, the later entry wins.
    ///
    /// # Errors
    ///
    /// Returns [`AclError::Config`] if the text is not a valid registry.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: RegistryFile = toml::from_str(contents)
            .map_err(|e| AclError::Config(format!("failed to parse device registry: {e}")))?;

        let names = file
            .devices
            .into_iter()
            .filter(|entry| !entry.address.is_empty())
            .map(|entry| (entry.address, entry.name))
            .collect();

        Ok(Self { names })
    }

    /// Loads a registry from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let registry = Self::from_toml_str(&contents)?;
        tracing::debug!(path = ?path, devices = registry.len(), "device registry loaded");
        Ok(registry)
    }

    /// Registers or renames a device.
    pub fn insert(&mut self, address: impl Into<String>, name: impl Into<String>) {
        self.names.insert(address.into(), name.into());
    }

    #[must_use]
    pub fn name_of(&self, address: &str) -> Option<&str> {
        self.names.get(address).map(String::as_str)
    }

    /// Display label for `address`, falling back to the identifier itself.
    #[must_use]
    pub fn label<'a>(&'a self, address: &'a str) -> &'a str {
        self.name_of(address).unwrap_or(address)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
