// SPDX-License-Identifier: Apache-2.0

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{Error, ModulePort, Result};

/// Port table for a single module: the module's name plus its ports in
/// declaration order.
///
/// Built once by the extractor and treated as immutable afterwards. The
/// serialized form matches the per-module JSON produced for downstream
/// consumers: `{"submodule": <name>, "ports": {...}}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModuleConfig {
    #[serde(rename = "submodule")]
    pub name: String,
    pub ports: IndexMap<String, ModulePort>,
}

impl ModuleConfig {
    /// Creates an empty port table for the module with the given name.
    pub fn new(name: impl AsRef<str>) -> ModuleConfig {
        ModuleConfig {
            name: name.as_ref().to_string(),
            ports: IndexMap::new(),
        }
    }

    /// Returns the port with the given name, if declared on this module.
    pub fn port(&self, name: &str) -> Option<&ModulePort> {
        self.ports.get(name)
    }

    /// Checks the table invariants: a non-empty module name and a width of at
    /// least 1 on every port.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::manifest("module config has an empty name"));
        }
        for (port_name, port) in &self.ports {
            if port.width == 0 {
                return Err(Error::manifest(format!(
                    "port {}.{} has width 0",
                    self.name, port_name
                )));
            }
        }
        Ok(())
    }

    /// Reads and validates a module config from a JSON file.
    pub fn read_json(path: &Path) -> Result<ModuleConfig> {
        let text = fs::read_to_string(path)?;
        let config: ModuleConfig =
            serde_json::from_str(&text).map_err(|err| Error::MalformedManifest {
                path: Some(path.to_path_buf()),
                detail: err.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Writes this module config to a JSON file.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let text =
            serde_json::to_string_pretty(self).expect("serializing module config to JSON");
        fs::write(path, text)?;
        Ok(())
    }
}

/// Keyed store of module port tables, the interchange contract between
/// extraction and generation.
///
/// Inserting a module that is already present replaces the earlier table
/// entirely; iteration follows first-insertion order.
#[derive(Clone, Debug, Default)]
pub struct ConfigStore {
    modules: IndexMap<String, ModuleConfig>,
}

impl ConfigStore {
    pub fn new() -> ConfigStore {
        ConfigStore::default()
    }

    /// Adds a module config, replacing any earlier table for the same name.
    pub fn insert(&mut self, config: ModuleConfig) {
        self.modules.insert(config.name.clone(), config);
    }

    /// Returns the port table for the given module, if present.
    pub fn get(&self, name: &str) -> Option<&ModuleConfig> {
        self.modules.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// Merges another store into this one; entries from `other` replace
    /// entries already present under the same module name.
    pub fn merge(&mut self, other: ConfigStore) {
        for config in other.modules.into_values() {
            self.insert(config);
        }
    }

    /// Iterates over the stored module configs in insertion order.
    pub fn modules(&self) -> impl Iterator<Item = &ModuleConfig> {
        self.modules.values()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Writes one `module_<name>_config.json` file per stored module into
    /// `dir`, returning the paths written.
    pub fn write_json_dir(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for config in self.modules.values() {
            let path = dir.join(format!("module_{}_config.json", config.name.to_lowercase()));
            config.write_json(&path)?;
            written.push(path);
        }
        Ok(written)
    }
}
