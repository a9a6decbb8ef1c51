// SPDX-License-Identifier: Apache-2.0

//! Extraction of module port tables from Verilog source text.
//!
//! The extractor covers the restricted declaration subset needed to recover a
//! module's interface: `module <name> (...)` headers with ANSI port
//! declarations, non-ANSI direction declarations in the module body, optional
//! `wire`/`reg`/`logic` storage keywords, and optional `[msb:lsb]` ranges.
//! Behavioral constructs are not interpreted.

use std::path::Path;

use regex::{Captures, Regex};

use crate::{ConfigStore, Error, ModuleConfig, ModulePort, PortDir, Result, StorageClass};

/// Extracts a port table for every `module ... endmodule` block in `source`.
///
/// Header declarations take precedence: a body declaration may add a port
/// that the header omits (non-ANSI style), but never overrides a header
/// entry. A standalone `reg` declaration upgrades the storage class of an
/// already-classified port to `Reg`; it never downgrades one and never
/// introduces a new port. If the same module name appears more than once,
/// the later block's table replaces the earlier one entirely.
pub fn extract_modules(source: &str) -> Result<ConfigStore> {
    let module_re = Regex::new(r"(?s)module\s+(\w+)\s*\((.*?)\)\s*;").unwrap();
    let port_re = Regex::new(
        r"\b(input|output|inout)\b\s*(?:(wire|reg|logic)\s+)?(?:\[\s*(\d+)\s*:\s*(\d+)\s*\]\s*)?(\w+)",
    )
    .unwrap();
    let body_port_re = Regex::new(
        r"(?m)^\s*(input|output|inout)\b\s*(?:(wire|reg|logic)\s+)?(?:\[\s*(\d+)\s*:\s*(\d+)\s*\]\s*)?(\w+)\s*;",
    )
    .unwrap();
    let body_reg_re =
        Regex::new(r"(?m)^\s*reg\s*(?:\[\s*\d+\s*:\s*\d+\s*\]\s*)?(\w+)\s*;").unwrap();

    let mut store = ConfigStore::new();

    for module_match in module_re.captures_iter(source) {
        let name = module_match.get(1).unwrap().as_str();
        let header = module_match.get(2).unwrap().as_str();
        let mut config = ModuleConfig::new(name);

        for captures in port_re.captures_iter(header) {
            let (port_name, port) = captures_to_port(name, &captures)?;
            if !config.ports.contains_key(&port_name) {
                config.ports.insert(port_name, port);
            }
        }

        // Body declarations run from the end of the header to `endmodule`.
        let rest = &source[module_match.get(0).unwrap().end()..];
        let body = match rest.find("endmodule") {
            Some(pos) => &rest[..pos],
            None => rest,
        };

        for captures in body_port_re.captures_iter(body) {
            let (port_name, port) = captures_to_port(name, &captures)?;
            if !config.ports.contains_key(&port_name) {
                config.ports.insert(port_name, port);
            }
        }

        for captures in body_reg_re.captures_iter(body) {
            let port_name = captures.get(1).unwrap().as_str();
            if let Some(port) = config.ports.get_mut(port_name) {
                port.storage = StorageClass::Reg;
            }
        }

        store.insert(config);
    }

    Ok(store)
}

/// Extracts port tables from one source file.
///
/// An absent file yields an empty store; reporting a missing input is the
/// caller's responsibility, not a component-level error.
pub fn extract_modules_from_file(path: &Path) -> Result<ConfigStore> {
    if !path.exists() {
        return Ok(ConfigStore::new());
    }
    let source = std::fs::read_to_string(path)?;
    extract_modules(&source)
}

/// Extracts port tables from several source files, merged in file order.
/// A module declared in a later file replaces an earlier table of the same
/// name.
pub fn extract_modules_from_files(paths: &[impl AsRef<Path>]) -> Result<ConfigStore> {
    let mut store = ConfigStore::new();
    for path in paths {
        store.merge(extract_modules_from_file(path.as_ref())?);
    }
    Ok(store)
}

fn captures_to_port(module: &str, captures: &Captures) -> Result<(String, ModulePort)> {
    let port_name = captures.get(5).unwrap().as_str().to_string();

    let direction = match captures.get(1).unwrap().as_str() {
        "input" => PortDir::Input,
        "output" => PortDir::Output,
        _ => {
            return Err(Error::UnsupportedPort {
                module: module.to_string(),
                port: port_name,
                detail: "inout ports are not supported".to_string(),
            });
        }
    };

    let storage = match captures.get(2).map(|m| m.as_str()) {
        Some("reg") => StorageClass::Reg,
        _ => StorageClass::Wire,
    };

    // Width of `[msb:lsb]` is msb - lsb + 1; a declaration without a range is
    // a single bit.
    let width = match (captures.get(3), captures.get(4)) {
        (Some(msb), Some(lsb)) => {
            let msb: usize = msb.as_str().parse().unwrap();
            let lsb: usize = lsb.as_str().parse().unwrap();
            msb.abs_diff(lsb) + 1
        }
        _ => 1,
    };

    Ok((
        port_name,
        ModulePort {
            direction,
            storage,
            width,
        },
    ))
}
