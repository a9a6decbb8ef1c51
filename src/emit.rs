// SPDX-License-Identifier: Apache-2.0

//! Rendering of a resolved instance graph into a structural Verilog module.

use std::path::Path;

use crate::{ConfigStore, Error, Instance, InstanceGraph, InstanceResolution, NetTable, Result};

/// Emits a resolved instance graph as a single structural Verilog text block.
///
/// The header lists the explicit top ports in spec order followed by the
/// output-mapped ports in instance-iteration order; each distinct internal
/// net is declared once with its bit width; each instance is rendered with
/// named port connections in the instantiated module's own declared port
/// order. Identical inputs produce byte-identical output: every ordering
/// derives from input iteration order.
pub struct Emitter<'a> {
    store: &'a ConfigStore,
}

impl<'a> Emitter<'a> {
    pub fn new(store: &'a ConfigStore) -> Emitter<'a> {
        Emitter { store }
    }

    /// Returns the Verilog text for the top module.
    pub fn emit(&self, graph: &InstanceGraph) -> Result<String> {
        let mut port_lines = Vec::new();
        for (name, port) in &graph.top_ports {
            port_lines.push(format!(
                "  {} {}{}",
                port.direction,
                width_decl(port.width),
                name
            ));
        }

        // Output-mapped ports extend the header in instance-iteration order.
        let mut aliases = Vec::new();
        for (inst_name, inst) in &graph.instances {
            let resolution = resolution_of(inst_name, inst)?;
            for mapping in inst.output_map.values() {
                let alias = mapping.signal();
                aliases.push(alias.to_string());
                let port = resolution.exposed_ports.get(alias).ok_or_else(|| {
                    Error::manifest(format!(
                        "resolution for instance {inst_name} does not expose {alias}"
                    ))
                })?;
                port_lines.push(format!(
                    "  output {}{}",
                    width_decl(port.width),
                    alias
                ));
            }
        }

        // One declaration per distinct internal net, first-seen order.
        let mut nets = NetTable::new();
        for (inst_name, inst) in &graph.instances {
            let resolution = resolution_of(inst_name, inst)?;
            for (net, width) in &resolution.internal_nets {
                if graph.top_ports.contains_key(net) || aliases.contains(net) {
                    return Err(Error::manifest(format!(
                        "internal net {net} collides with a top port"
                    )));
                }
                nets.allocate(net, *width)?;
            }
        }

        let mut text = String::new();
        text.push_str("// Auto-generated top module\n");
        text.push_str(&format!("module {}(\n", graph.top_module));
        text.push_str(&port_lines.join(",\n"));
        text.push_str("\n);\n\n");

        if !nets.is_empty() {
            text.push_str("// Internal nets\n");
            for (net, width) in nets.iter() {
                text.push_str(&format!("  wire {}{};\n", width_decl(*width), net));
            }
            text.push('\n');
        }

        for (inst_name, inst) in &graph.instances {
            let config =
                self.store
                    .get(&inst.module)
                    .ok_or_else(|| Error::UnknownModuleReference {
                        module: inst.module.clone(),
                        referenced_by: format!("instance {inst_name}"),
                    })?;
            let resolution = resolution_of(inst_name, inst)?;

            text.push_str(&format!("  // Instance of {}\n", inst.module));
            text.push_str(&format!("  {} {} (\n", inst.module, inst_name));

            let mut connections = Vec::new();
            for port_name in config.ports.keys() {
                let signal = resolution.ports.get(port_name).ok_or_else(|| {
                    Error::manifest(format!(
                        "resolution for instance {inst_name} does not bind port {port_name}"
                    ))
                })?;
                connections.push(format!("    .{port_name}({signal})"));
            }
            text.push_str(&connections.join(",\n"));
            text.push_str("\n  );\n\n");
        }

        text.push_str("endmodule\n");
        Ok(text)
    }

    /// Writes the Verilog text for the top module to the given file path.
    pub fn emit_to_file(&self, graph: &InstanceGraph, path: &Path) -> Result<()> {
        std::fs::write(path, self.emit(graph)?)?;
        Ok(())
    }
}

fn resolution_of<'g>(inst_name: &str, inst: &'g Instance) -> Result<&'g InstanceResolution> {
    inst.resolution
        .as_ref()
        .ok_or_else(|| Error::manifest(format!("instance {inst_name} has not been resolved")))
}

/// Bit-range annotation for a declaration; the width-1 form is omitted.
fn width_decl(width: usize) -> String {
    if width > 1 {
        format!("[{}:0] ", width - 1)
    } else {
        String::new()
    }
}
