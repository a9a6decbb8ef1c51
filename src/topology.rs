// SPDX-License-Identifier: Apache-2.0

//! Synthesis of an instance graph for a rectangular grid of identical
//! processing elements.
//!
//! The builder classifies the PE module's ports into five directional groups
//! by name prefix, allocates boundary top ports for the grid edges, tiles the
//! instances row-major, and wires neighboring instances together with
//! deterministically named nets.

use std::fs;
use std::path::Path;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    ConfigStore, Error, Instance, InstanceGraph, ModuleConfig, NetTable, PortDir, Result, TopPort,
};

/// A top-level port as written in the topology spec.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TopPortSpec {
    pub name: String,
    pub direction: PortDir,
    pub width: usize,
}

/// One instance directive in the topology spec. `array: [rows, cols]` tiles
/// the named module across the grid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InstanceSpec {
    pub module: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array: Option<[usize; 2]>,
}

/// Topology specification: top module name, grid shape, explicit top ports,
/// and the instance directive naming the PE module.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TopologyConfig {
    pub top_module: String,
    pub dimensions: [usize; 2],
    #[serde(default)]
    pub top_ports: Vec<TopPortSpec>,
    #[serde(default)]
    pub instances: Vec<InstanceSpec>,
}

impl TopologyConfig {
    /// Reads and validates a topology spec from a YAML file.
    pub fn read_yaml(path: &Path) -> Result<TopologyConfig> {
        let text = fs::read_to_string(path)?;
        let config: TopologyConfig =
            serde_yaml::from_str(&text).map_err(|err| Error::MalformedManifest {
                path: Some(path.to_path_buf()),
                detail: err.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the spec invariants: a designated top module, a grid of at
    /// least 1x1, positive port widths, and exactly one grid instance
    /// directive whose array shape matches the grid shape.
    pub fn validate(&self) -> Result<()> {
        if self.top_module.is_empty() {
            return Err(Error::manifest("no designated top module"));
        }
        let [rows, cols] = self.dimensions;
        if rows == 0 || cols == 0 {
            return Err(Error::manifest(format!(
                "grid dimensions must be at least 1x1, got {rows}x{cols}"
            )));
        }
        for port in &self.top_ports {
            if port.width == 0 {
                return Err(Error::manifest(format!(
                    "top port {} has width 0",
                    port.name
                )));
            }
        }
        let mut grid_directives = 0;
        for spec in &self.instances {
            match spec.array {
                Some(array) => {
                    grid_directives += 1;
                    if array != self.dimensions {
                        return Err(Error::manifest(format!(
                            "instance directive for module {} declares a {}x{} array, \
                             but the grid is {rows}x{cols}",
                            spec.module, array[0], array[1]
                        )));
                    }
                }
                None => {
                    return Err(Error::manifest(format!(
                        "instance directive for module {} has no array shape; \
                         explicit instances belong in a connection manifest",
                        spec.module
                    )));
                }
            }
        }
        if grid_directives != 1 {
            return Err(Error::manifest(format!(
                "expected exactly one grid instance directive, found {grid_directives}"
            )));
        }
        Ok(())
    }

    fn grid_directive(&self) -> &InstanceSpec {
        self.instances
            .iter()
            .find(|spec| spec.array.is_some())
            .expect("validated topology spec has a grid directive")
    }
}

/// Canonical port-naming convention for grid wiring.
///
/// PE ports are classified into five directional groups by prefix match (not
/// exact equality, so multi-signal handshakes share a group). Control ports
/// are bound to identically named top-level signals on every instance.
#[derive(Clone, Debug)]
pub struct PortNaming {
    pub left_in: String,
    pub right_out: String,
    pub up_in: String,
    pub down_out: String,
    pub result_out: String,
    pub control: Vec<String>,
    /// Grid instances are named `<instance_prefix>_<row>_<col>`.
    pub instance_prefix: String,
}

impl Default for PortNaming {
    fn default() -> PortNaming {
        PortNaming {
            left_in: "left_in".to_string(),
            right_out: "right_out".to_string(),
            up_in: "up_in".to_string(),
            down_out: "down_out".to_string(),
            result_out: "result_out".to_string(),
            control: vec!["clk".to_string(), "rst".to_string()],
            instance_prefix: "PE".to_string(),
        }
    }
}

impl PortNaming {
    pub fn instance_name(&self, row: usize, col: usize) -> String {
        format!("{}_{}_{}", self.instance_prefix, row, col)
    }

    /// Splits a group port into the base and suffix used for boundary-port
    /// naming: at `_rsc` when the port carries one, otherwise at the end of
    /// the group prefix.
    fn split_port<'a>(&self, group: &'a str, port: &'a str) -> (&'a str, &'a str) {
        match port.find("_rsc") {
            Some(pos) => (&port[..pos], &port[pos + 4..]),
            None => (group, &port[group.len()..]),
        }
    }

    /// Name of the boundary top port that a group port binds to at grid edge
    /// `index`.
    fn boundary_port(&self, group: &str, port: &str, index: usize) -> String {
        let (base, suffix) = self.split_port(group, port);
        format!("{base}_rsc{index}{suffix}")
    }

    /// Base of the net joining two neighboring instances through a group
    /// port: handshake suffixes map to fixed prefixes, any other suffix uses
    /// the literal port name.
    fn net_base<'a>(&self, group: &str, port: &'a str) -> &'a str {
        let (_, suffix) = self.split_port(group, port);
        match suffix {
            "_dat" => "data",
            "_vld" => "val",
            "_rdy" => "rdy",
            _ => port,
        }
    }

    fn net_name(&self, group: &str, port: &str, from: &str, to: &str) -> String {
        format!("{}_{}_to_{}", self.net_base(group, port), from, to)
    }
}

/// The PE module's ports, classified into the five directional groups.
/// A missing group yields zero wiring for that group; it is not an error.
struct PortGroups {
    left: Vec<String>,
    right: Vec<String>,
    up: Vec<String>,
    down: Vec<String>,
    result: Vec<String>,
}

impl PortGroups {
    fn classify(pe: &ModuleConfig, naming: &PortNaming) -> PortGroups {
        let group = |prefix: &str| -> Vec<String> {
            pe.ports
                .keys()
                .filter(|name| name.starts_with(prefix))
                .cloned()
                .collect()
        };
        PortGroups {
            left: group(&naming.left_in),
            right: group(&naming.right_out),
            up: group(&naming.up_in),
            down: group(&naming.down_out),
            result: group(&naming.result_out),
        }
    }
}

/// Builds an instance graph for an R×C mesh of identical PE instances,
/// including boundary-to-top-port bindings.
pub struct GridBuilder<'a> {
    config: &'a TopologyConfig,
    store: &'a ConfigStore,
    naming: PortNaming,
}

impl<'a> GridBuilder<'a> {
    pub fn new(config: &'a TopologyConfig, store: &'a ConfigStore) -> GridBuilder<'a> {
        GridBuilder {
            config,
            store,
            naming: PortNaming::default(),
        }
    }

    /// Replaces the default naming convention.
    pub fn with_naming(mut self, naming: PortNaming) -> GridBuilder<'a> {
        self.naming = naming;
        self
    }

    /// Synthesizes the instance graph.
    pub fn build(&self) -> Result<InstanceGraph> {
        self.config.validate()?;

        let [rows, cols] = self.config.dimensions;
        let directive = self.config.grid_directive();
        let pe = self
            .store
            .get(&directive.module)
            .ok_or_else(|| Error::UnknownModuleReference {
                module: directive.module.clone(),
                referenced_by: "grid instance directive".to_string(),
            })?;

        let naming = &self.naming;
        let groups = PortGroups::classify(pe, naming);
        let mut graph = InstanceGraph::new(&self.config.top_module);

        // Explicit top ports first, in spec order.
        for spec in &self.config.top_ports {
            let port = TopPort {
                direction: spec.direction,
                width: spec.width,
            };
            add_top_port(&mut graph, &spec.name, port)?;
        }

        // Boundary top ports: one per left/right group port per row, one per
        // up/down group port per column, then one indexed result port per
        // instance.
        for i in 0..rows {
            for port in &groups.left {
                let name = naming.boundary_port(&naming.left_in, port, i);
                add_top_port(&mut graph, &name, top_port_for(pe, port))?;
            }
            for port in &groups.right {
                let name = naming.boundary_port(&naming.right_out, port, i);
                add_top_port(&mut graph, &name, top_port_for(pe, port))?;
            }
        }
        for j in 0..cols {
            for port in &groups.up {
                let name = naming.boundary_port(&naming.up_in, port, j);
                add_top_port(&mut graph, &name, top_port_for(pe, port))?;
            }
            for port in &groups.down {
                let name = naming.boundary_port(&naming.down_out, port, j);
                add_top_port(&mut graph, &name, top_port_for(pe, port))?;
            }
        }
        for port in &groups.result {
            for index in 0..rows * cols {
                add_top_port(&mut graph, &format!("{port}{index}"), top_port_for(pe, port))?;
            }
        }

        // Instances, row-major.
        for (i, j) in (0..rows).cartesian_product(0..cols) {
            graph
                .instances
                .insert(naming.instance_name(i, j), Instance::new(&directive.module));
        }

        let mut nets = NetTable::new();

        for (i, j) in (0..rows).cartesian_product(0..cols) {
            let inst = naming.instance_name(i, j);

            // Shared control ports bind identically on every instance.
            for ctrl in &naming.control {
                if pe.ports.contains_key(ctrl) {
                    connect(&mut graph, &inst, ctrl, ctrl.clone());
                }
            }

            // Horizontal wiring: one net per right/left port pair, except the
            // last column, whose right group binds to the row's edge port.
            if j + 1 < cols {
                let east = naming.instance_name(i, j + 1);
                for port in &groups.right {
                    let net = naming.net_name(&naming.right_out, port, &inst, &east);
                    nets.allocate(&net, port_width(pe, port))?;
                    connect(&mut graph, &inst, port, net);
                }
                for port in &groups.left {
                    let net = naming.net_name(&naming.left_in, port, &inst, &east);
                    nets.allocate(&net, port_width(pe, port))?;
                    connect(&mut graph, &east, port, net);
                }
            } else {
                for port in &groups.right {
                    let edge = naming.boundary_port(&naming.right_out, port, i);
                    connect(&mut graph, &inst, port, edge);
                }
            }

            // Vertical wiring, symmetric: the last row's down group binds to
            // the column's edge port.
            if i + 1 < rows {
                let south = naming.instance_name(i + 1, j);
                for port in &groups.down {
                    let net = naming.net_name(&naming.down_out, port, &inst, &south);
                    nets.allocate(&net, port_width(pe, port))?;
                    connect(&mut graph, &inst, port, net);
                }
                for port in &groups.up {
                    let net = naming.net_name(&naming.up_in, port, &inst, &south);
                    nets.allocate(&net, port_width(pe, port))?;
                    connect(&mut graph, &south, port, net);
                }
            } else {
                for port in &groups.down {
                    let edge = naming.boundary_port(&naming.down_out, port, j);
                    connect(&mut graph, &inst, port, edge);
                }
            }

            // Column 0's left group and row 0's up group always bind to the
            // corresponding edge ports.
            if j == 0 {
                for port in &groups.left {
                    let edge = naming.boundary_port(&naming.left_in, port, i);
                    connect(&mut graph, &inst, port, edge);
                }
            }
            if i == 0 {
                for port in &groups.up {
                    let edge = naming.boundary_port(&naming.up_in, port, j);
                    connect(&mut graph, &inst, port, edge);
                }
            }

            // Each instance's result group binds to its own indexed port.
            let index = i * cols + j;
            for port in &groups.result {
                connect(&mut graph, &inst, port, format!("{port}{index}"));
            }
        }

        Ok(graph)
    }
}

fn top_port_for(pe: &ModuleConfig, port: &str) -> TopPort {
    let info = &pe.ports[port];
    TopPort {
        direction: info.direction,
        width: info.width,
    }
}

fn port_width(pe: &ModuleConfig, port: &str) -> usize {
    pe.ports[port].width
}

fn add_top_port(graph: &mut InstanceGraph, name: &str, port: TopPort) -> Result<()> {
    if graph.top_ports.insert(name.to_string(), port).is_some() {
        return Err(Error::manifest(format!(
            "top port {name} is allocated more than once"
        )));
    }
    Ok(())
}

fn connect(graph: &mut InstanceGraph, instance: &str, port: &str, signal: String) {
    graph
        .instances
        .get_mut(instance)
        .expect("grid instances are allocated before wiring")
        .connect
        .insert(port.to_string(), signal);
}
