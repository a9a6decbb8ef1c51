// SPDX-License-Identifier: Apache-2.0

use gridstitch::*;

const ALU: &str = "\
module alu(
  input clk,
  input [7:0] a,
  input [7:0] b,
  input mode,
  output [7:0] y,
  output carry
);
endmodule
";

fn alu_store() -> ConfigStore {
    extract_modules(ALU).unwrap()
}

fn graph_with(instances: Vec<(&str, Instance)>) -> InstanceGraph {
    let mut graph = InstanceGraph::new("top");
    for (name, instance) in instances {
        graph.instances.insert(name.to_string(), instance);
    }
    graph
}

#[test]
fn test_unknown_module_reference_is_fatal() {
    let store = alu_store();
    let mut graph = graph_with(vec![("u0", Instance::new("ghost"))]);

    let err = Resolver::new(&store).resolve(&mut graph).unwrap_err();
    assert!(matches!(
        err,
        Error::UnknownModuleReference { module, referenced_by }
            if module == "ghost" && referenced_by == "instance u0"
    ));
}

#[test]
fn test_connected_output_becomes_internal_net() {
    let store = alu_store();
    let mut u0 = Instance::new("alu");
    u0.connect.insert("y".to_string(), "stage0_y".to_string());
    let mut graph = graph_with(vec![("u0", u0)]);

    Resolver::new(&store).resolve(&mut graph).unwrap();

    let resolution = graph.instances["u0"].resolution.as_ref().unwrap();
    assert_eq!(resolution.internal_nets.get("stage0_y"), Some(&8));
    assert_eq!(resolution.ports.get("y"), Some(&"stage0_y".to_string()));
}

#[test]
fn test_constants_are_never_net_declared() {
    let store = alu_store();
    let mut u0 = Instance::new("alu");
    u0.connect.insert("mode".to_string(), "0".to_string());
    u0.connect.insert("a".to_string(), "1".to_string());
    let mut graph = graph_with(vec![("u0", u0)]);

    Resolver::new(&store).resolve(&mut graph).unwrap();

    let resolution = graph.instances["u0"].resolution.as_ref().unwrap();
    assert_eq!(resolution.ports.get("mode"), Some(&"0".to_string()));
    assert!(resolution.internal_nets.is_empty());
    assert!(!resolution.exposed_ports.contains_key("mode"));
}

#[test]
fn test_signal_bound_to_top_port_is_not_a_net() {
    let store = alu_store();
    let mut graph = InstanceGraph::new("top");
    graph.top_ports.insert(
        "result".to_string(),
        TopPort {
            direction: PortDir::Output,
            width: 8,
        },
    );
    let mut u0 = Instance::new("alu");
    u0.connect.insert("y".to_string(), "result".to_string());
    graph.instances.insert("u0".to_string(), u0);

    Resolver::new(&store).resolve(&mut graph).unwrap();

    let resolution = graph.instances["u0"].resolution.as_ref().unwrap();
    assert_eq!(resolution.ports.get("y"), Some(&"result".to_string()));
    assert!(resolution.internal_nets.is_empty());
}

#[test]
fn test_dangling_inputs_always_surface() {
    let store = alu_store();
    let mut graph = graph_with(vec![("u0", Instance::new("alu"))]);

    Resolver::new(&store).resolve(&mut graph).unwrap();

    let resolution = graph.instances["u0"].resolution.as_ref().unwrap();
    for input in ["clk", "a", "b", "mode"] {
        assert_eq!(
            resolution.ports.get(input),
            Some(&input.to_string()),
            "dangling input {input} must be bound to its own name"
        );
        assert!(resolution.exposed_ports.contains_key(input));
    }
    assert_eq!(
        resolution.exposed_ports.get("a"),
        Some(&TopPort {
            direction: PortDir::Input,
            width: 8,
        })
    );
}

#[test]
fn test_unconnected_output_drives_instance_net() {
    let store = alu_store();
    let mut graph = graph_with(vec![("u0", Instance::new("alu"))]);

    Resolver::new(&store).resolve(&mut graph).unwrap();

    let resolution = graph.instances["u0"].resolution.as_ref().unwrap();
    assert_eq!(resolution.ports.get("y"), Some(&"u0_y".to_string()));
    assert_eq!(resolution.internal_nets.get("u0_y"), Some(&8));
    assert_eq!(resolution.internal_nets.get("u0_carry"), Some(&1));
}

#[test]
fn test_output_map_takes_precedence() {
    let store = alu_store();
    let mut u0 = Instance::new("alu");
    u0.connect.insert("y".to_string(), "ignored_net".to_string());
    u0.output_map
        .insert("y".to_string(), OutputMap::Signal("sum".to_string()));
    let mut graph = graph_with(vec![("u0", u0)]);

    Resolver::new(&store).resolve(&mut graph).unwrap();

    let resolution = graph.instances["u0"].resolution.as_ref().unwrap();
    assert_eq!(resolution.ports.get("y"), Some(&"sum".to_string()));
    assert!(!resolution.internal_nets.contains_key("ignored_net"));
    assert_eq!(
        resolution.exposed_ports.get("sum"),
        Some(&TopPort {
            direction: PortDir::Output,
            width: 8,
        })
    );
}

#[test]
fn test_output_map_declared_width_wins() {
    let store = alu_store();
    let mut u0 = Instance::new("alu");
    u0.output_map.insert(
        "y".to_string(),
        OutputMap::Sized {
            signal: "sum".to_string(),
            width: 16,
        },
    );
    let mut graph = graph_with(vec![("u0", u0)]);

    Resolver::new(&store).resolve(&mut graph).unwrap();

    let resolution = graph.instances["u0"].resolution.as_ref().unwrap();
    assert_eq!(resolution.exposed_ports.get("sum").unwrap().width, 16);
}

#[test]
fn test_output_map_on_input_is_malformed() {
    let store = alu_store();
    let mut u0 = Instance::new("alu");
    u0.output_map
        .insert("a".to_string(), OutputMap::Signal("alias".to_string()));
    let mut graph = graph_with(vec![("u0", u0)]);

    let err = Resolver::new(&store).resolve(&mut graph).unwrap_err();
    assert!(matches!(err, Error::MalformedManifest { .. }));
}

#[test]
fn test_connection_to_undeclared_port_is_malformed() {
    let store = alu_store();
    let mut u0 = Instance::new("alu");
    u0.connect
        .insert("no_such_port".to_string(), "sig".to_string());
    let mut graph = graph_with(vec![("u0", u0)]);

    let err = Resolver::new(&store).resolve(&mut graph).unwrap_err();
    assert!(matches!(err, Error::MalformedManifest { .. }));
}

#[test]
fn test_net_width_conflict_is_fatal() {
    let source = "\
module wide(
  output [7:0] y
);
endmodule

module narrow(
  output [3:0] y
);
endmodule
";
    let store = extract_modules(source).unwrap();
    let mut u0 = Instance::new("wide");
    u0.connect.insert("y".to_string(), "shared".to_string());
    let mut u1 = Instance::new("narrow");
    u1.connect.insert("y".to_string(), "shared".to_string());
    let mut graph = graph_with(vec![("u0", u0), ("u1", u1)]);

    let err = Resolver::new(&store).resolve(&mut graph).unwrap_err();
    assert!(matches!(
        err,
        Error::NetWidthConflict { net, widths: (8, 4) } if net == "shared"
    ));
}

#[test]
fn test_resolution_preserves_declared_port_order() {
    let store = alu_store();
    let mut u0 = Instance::new("alu");
    // Connections inserted in arbitrary order; resolution follows the
    // module's declaration order.
    u0.connect.insert("y".to_string(), "net_y".to_string());
    u0.connect.insert("clk".to_string(), "clk".to_string());
    let mut graph = graph_with(vec![("u0", u0)]);

    Resolver::new(&store).resolve(&mut graph).unwrap();

    let resolution = graph.instances["u0"].resolution.as_ref().unwrap();
    let order: Vec<&String> = resolution.ports.keys().collect();
    assert_eq!(order, ["clk", "a", "b", "mode", "y", "carry"]);
}

#[test]
fn test_output_map_manifest_accepts_both_forms() {
    let json = r#"{
  "top_module": "top",
  "top_ports": {},
  "instances": {
    "u0": {
      "module": "alu",
      "connect": {},
      "output_map": {
        "y": {"signal": "sum", "width": 8},
        "carry": "carry_out"
      }
    }
  }
}"#;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.json");
    std::fs::write(&path, json).unwrap();

    let graph = InstanceGraph::read_json(&path).unwrap();
    let u0 = &graph.instances["u0"];
    assert_eq!(
        u0.output_map.get("y"),
        Some(&OutputMap::Sized {
            signal: "sum".to_string(),
            width: 8,
        })
    );
    assert_eq!(
        u0.output_map.get("carry"),
        Some(&OutputMap::Signal("carry_out".to_string()))
    );
}
