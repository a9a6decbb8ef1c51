// SPDX-License-Identifier: Apache-2.0

//! The instance graph: instances, their port bindings, and the top-level
//! port list. This is the netlist handed to the resolver and then to the
//! emitter, and the on-disk connection manifest format.

use std::fs;
use std::path::Path;

use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{Error, PortDir, Result};

/// A port on the generated top-level module.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TopPort {
    pub direction: PortDir,
    pub width: usize,
}

/// An output alias: the instance port it is attached to is exposed as a
/// top-level output under `signal`.
///
/// The manifest form is either a bare string (width defaults to the port's
/// own width) or `{"signal": ..., "width": ...}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutputMap {
    Signal(String),
    Sized { signal: String, width: usize },
}

impl OutputMap {
    pub fn signal(&self) -> &str {
        match self {
            OutputMap::Signal(signal) => signal,
            OutputMap::Sized { signal, .. } => signal,
        }
    }

    /// Returns the declared width, if the mapping carries one.
    pub fn width(&self) -> Option<usize> {
        match self {
            OutputMap::Signal(_) => None,
            OutputMap::Sized { width, .. } => Some(*width),
        }
    }
}

/// One instantiated module within the graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub module: String,
    #[serde(default)]
    pub connect: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub output_map: IndexMap<String, OutputMap>,
    /// Filled in by the resolver; absent on a freshly built or authored
    /// graph.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<InstanceResolution>,
}

impl Instance {
    pub fn new(module: impl AsRef<str>) -> Instance {
        Instance {
            module: module.as_ref().to_string(),
            connect: IndexMap::new(),
            output_map: IndexMap::new(),
            resolution: None,
        }
    }
}

/// The resolver's annotation for one instance: every port bound to a
/// concrete signal, the internal nets this instance drives, and the top
/// ports it exposes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceResolution {
    /// Port name to the signal bound in the instantiation, in the module's
    /// declared port order.
    pub ports: IndexMap<String, String>,
    /// Internal net name to bit width.
    pub internal_nets: IndexMap<String, usize>,
    /// Exposed top ports: dangling inputs surfaced under their own names and
    /// output aliases under their mapped names.
    pub exposed_ports: IndexMap<String, TopPort>,
}

/// The instances, their port bindings, and the top-level port list.
///
/// Built once — by the grid builder or read from an authored manifest — then
/// incrementally annotated by the resolver and consumed read-only by the
/// emitter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InstanceGraph {
    pub top_module: String,
    #[serde(default)]
    pub top_ports: IndexMap<String, TopPort>,
    #[serde(default)]
    pub instances: IndexMap<String, Instance>,
}

impl InstanceGraph {
    /// Creates an empty graph for the given top module.
    pub fn new(top_module: impl AsRef<str>) -> InstanceGraph {
        InstanceGraph {
            top_module: top_module.as_ref().to_string(),
            top_ports: IndexMap::new(),
            instances: IndexMap::new(),
        }
    }

    /// Checks the graph invariants that do not require a config store: a
    /// designated top module and a width of at least 1 on every top port.
    pub fn validate(&self) -> Result<()> {
        if self.top_module.is_empty() {
            return Err(Error::manifest("no designated top module"));
        }
        for (name, port) in &self.top_ports {
            if port.width == 0 {
                return Err(Error::manifest(format!("top port {name} has width 0")));
            }
        }
        for (name, instance) in &self.instances {
            if instance.module.is_empty() {
                return Err(Error::manifest(format!(
                    "instance {name} does not name a module"
                )));
            }
        }
        Ok(())
    }

    /// Reads and validates a connection manifest from a JSON file.
    pub fn read_json(path: &Path) -> Result<InstanceGraph> {
        let text = fs::read_to_string(path)?;
        let graph: InstanceGraph =
            serde_json::from_str(&text).map_err(|err| Error::MalformedManifest {
                path: Some(path.to_path_buf()),
                detail: err.to_string(),
            })?;
        graph.validate()?;
        Ok(graph)
    }

    /// Writes this graph, including any resolution annotations, to a JSON
    /// file. The manifest round-trips losslessly through `read_json`.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self).expect("serializing instance graph to JSON");
        fs::write(path, text)?;
        Ok(())
    }
}

/// Allocation map from net name to bit width.
///
/// A name is never reused once allocated: allocating the same name at the
/// same width is idempotent (the two endpoints of a handshake pair land on
/// one net), while allocating it at a different width is fatal, since that
/// would mis-wire the design. Iteration follows first-allocation order.
#[derive(Clone, Debug, Default)]
pub struct NetTable {
    nets: IndexMap<String, usize>,
}

impl NetTable {
    pub fn new() -> NetTable {
        NetTable::default()
    }

    pub fn allocate(&mut self, name: &str, width: usize) -> Result<()> {
        match self.nets.entry(name.to_string()) {
            Entry::Occupied(entry) => {
                if *entry.get() != width {
                    return Err(Error::NetWidthConflict {
                        net: name.to_string(),
                        widths: (*entry.get(), width),
                    });
                }
                Ok(())
            }
            Entry::Vacant(entry) => {
                entry.insert(width);
                Ok(())
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nets.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &usize)> {
        self.nets.iter()
    }

    pub fn len(&self) -> usize {
        self.nets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nets.is_empty()
    }
}
