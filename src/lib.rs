// SPDX-License-Identifier: Apache-2.0

//! Generate top-level structural Verilog for rectangular arrays of processing
//! elements.
//!
//! The pipeline extracts module port tables from Verilog source text,
//! synthesizes the connectivity of an R×C grid of identical instances (or
//! accepts an explicitly authored connection graph), resolves every instance
//! port to a net, a top port, or a constant, and emits a single structural
//! top-level module with deterministic, diffable output.

mod config;
mod emit;
mod error;
mod extract;
mod flow;
mod graph;
mod io;
mod resolve;
mod topology;

pub use config::{ConfigStore, ModuleConfig};
pub use emit::Emitter;
pub use error::{Error, Result};
pub use extract::{extract_modules, extract_modules_from_file, extract_modules_from_files};
pub use flow::{Flow, FlowArtifacts, FlowConfig, TopologySource};
pub use graph::{Instance, InstanceGraph, InstanceResolution, NetTable, OutputMap, TopPort};
pub use io::{ModulePort, PortDir, StorageClass};
pub use resolve::Resolver;
pub use topology::{GridBuilder, InstanceSpec, PortNaming, TopPortSpec, TopologyConfig};
