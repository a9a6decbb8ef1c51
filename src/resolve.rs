// SPDX-License-Identifier: Apache-2.0

//! Resolution of instance ports into internal nets, exposed top ports, and
//! constant bindings.

use std::collections::HashSet;

use crate::{
    ConfigStore, Error, InstanceGraph, InstanceResolution, NetTable, PortDir, Result, TopPort,
};

/// Constants that may appear on the right-hand side of a connection. They
/// are bound verbatim and never net-declared.
const CONSTANTS: [&str; 2] = ["0", "1"];

/// Resolves every port of every instance in a graph against a config store.
///
/// Each instance is annotated with its [`InstanceResolution`]; the graph
/// itself is never rebuilt or overwritten. Resolution rules, in precedence
/// order per port:
///
/// 1. An output-mapped port is exposed as a top-level output under its alias
///    and declared width.
/// 2. A connected port is bound to its signal; if the signal is neither a
///    constant nor a top port and the port is an output, the signal becomes
///    an internal net sized by the port's width.
/// 3. An unconnected input is exposed under the port's own name — dangling
///    inputs always surface, they are never silently tied off.
/// 4. An unconnected output drives a net named `<instance>_<port>`, so that
///    nothing dangles and instances never collide.
pub struct Resolver<'a> {
    store: &'a ConfigStore,
}

impl<'a> Resolver<'a> {
    pub fn new(store: &'a ConfigStore) -> Resolver<'a> {
        Resolver { store }
    }

    /// Annotates `graph` in place. Fails fast on the first instance whose
    /// module has no entry in the store; no partial annotation is kept
    /// usable in that case because the caller aborts the run.
    pub fn resolve(&self, graph: &mut InstanceGraph) -> Result<()> {
        let InstanceGraph {
            top_ports,
            instances,
            ..
        } = graph;

        let mut nets = NetTable::new();
        let mut aliases: HashSet<String> = HashSet::new();

        for (inst_name, inst) in instances.iter_mut() {
            let config =
                self.store
                    .get(&inst.module)
                    .ok_or_else(|| Error::UnknownModuleReference {
                        module: inst.module.clone(),
                        referenced_by: format!("instance {inst_name}"),
                    })?;

            // Every connected or output-mapped port must exist on the module.
            for port in inst.connect.keys() {
                if !config.ports.contains_key(port) {
                    return Err(Error::manifest(format!(
                        "instance {inst_name} connects port {port}, \
                         which module {} does not declare",
                        inst.module
                    )));
                }
            }
            for port in inst.output_map.keys() {
                if !config.ports.contains_key(port) {
                    return Err(Error::manifest(format!(
                        "instance {inst_name} output-maps port {port}, \
                         which module {} does not declare",
                        inst.module
                    )));
                }
            }

            let mut resolution = InstanceResolution::default();

            for (port_name, port) in &config.ports {
                if let Some(mapping) = inst.output_map.get(port_name) {
                    if port.direction != PortDir::Output {
                        return Err(Error::manifest(format!(
                            "instance {inst_name} output-maps {}.{port_name}, \
                             which is not an output",
                            inst.module
                        )));
                    }
                    let alias = mapping.signal().to_string();
                    if top_ports.contains_key(&alias) {
                        return Err(Error::manifest(format!(
                            "output alias {alias} on instance {inst_name} \
                             collides with a top port"
                        )));
                    }
                    if !aliases.insert(alias.clone()) {
                        return Err(Error::manifest(format!(
                            "output alias {alias} is mapped by more than one instance"
                        )));
                    }
                    let width = mapping.width().unwrap_or(port.width);
                    resolution.ports.insert(port_name.clone(), alias.clone());
                    resolution.exposed_ports.insert(
                        alias,
                        TopPort {
                            direction: PortDir::Output,
                            width,
                        },
                    );
                } else if let Some(signal) = inst.connect.get(port_name) {
                    resolution.ports.insert(port_name.clone(), signal.clone());
                    if port.direction.is_output()
                        && !CONSTANTS.contains(&signal.as_str())
                        && !top_ports.contains_key(signal)
                    {
                        nets.allocate(signal, port.width)?;
                        resolution.internal_nets.insert(signal.clone(), port.width);
                    }
                } else if port.direction.is_input() {
                    resolution
                        .ports
                        .insert(port_name.clone(), port_name.clone());
                    resolution.exposed_ports.insert(
                        port_name.clone(),
                        TopPort {
                            direction: PortDir::Input,
                            width: port.width,
                        },
                    );
                } else {
                    let net = format!("{inst_name}_{port_name}");
                    nets.allocate(&net, port.width)?;
                    resolution.ports.insert(port_name.clone(), net.clone());
                    resolution.internal_nets.insert(net, port.width);
                }
            }

            inst.resolution = Some(resolution);
        }

        Ok(())
    }
}
