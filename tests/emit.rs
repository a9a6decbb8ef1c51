// SPDX-License-Identifier: Apache-2.0

use gridstitch::*;

const SIMPLE_PE: &str = "\
module pe(
  input clk,
  input rst,
  input [7:0] left_in_dat,
  output [7:0] right_out_dat,
  output [7:0] result_out_dat
);
endmodule
";

fn one_by_two() -> (ConfigStore, InstanceGraph) {
    let store = extract_modules(SIMPLE_PE).unwrap();
    let config = TopologyConfig {
        top_module: "grid_top".to_string(),
        dimensions: [1, 2],
        top_ports: vec![
            TopPortSpec {
                name: "clk".to_string(),
                direction: PortDir::Input,
                width: 1,
            },
            TopPortSpec {
                name: "rst".to_string(),
                direction: PortDir::Input,
                width: 1,
            },
        ],
        instances: vec![InstanceSpec {
            module: "pe".to_string(),
            array: Some([1, 2]),
        }],
    };
    let mut graph = GridBuilder::new(&config, &store).build().unwrap();
    Resolver::new(&store).resolve(&mut graph).unwrap();
    (store, graph)
}

#[test]
fn test_emit_one_by_two_grid() {
    let (store, graph) = one_by_two();

    assert_eq!(
        Emitter::new(&store).emit(&graph).unwrap(),
        "\
// Auto-generated top module
module grid_top(
  input clk,
  input rst,
  input [7:0] left_in_rsc0_dat,
  output [7:0] right_out_rsc0_dat,
  output [7:0] result_out_dat0,
  output [7:0] result_out_dat1
);

// Internal nets
  wire [7:0] data_PE_0_0_to_PE_0_1;

  // Instance of pe
  pe PE_0_0 (
    .clk(clk),
    .rst(rst),
    .left_in_dat(left_in_rsc0_dat),
    .right_out_dat(data_PE_0_0_to_PE_0_1),
    .result_out_dat(result_out_dat0)
  );

  // Instance of pe
  pe PE_0_1 (
    .clk(clk),
    .rst(rst),
    .left_in_dat(data_PE_0_0_to_PE_0_1),
    .right_out_dat(right_out_rsc0_dat),
    .result_out_dat(result_out_dat1)
  );

endmodule
"
    );
}

#[test]
fn test_output_mapped_ports_extend_the_header() {
    let source = "\
module blinker(
  input clk,
  output led
);
endmodule
";
    let store = extract_modules(source).unwrap();
    let mut graph = InstanceGraph::new("top");
    let mut u0 = Instance::new("blinker");
    u0.connect.insert("clk".to_string(), "clk".to_string());
    u0.output_map
        .insert("led".to_string(), OutputMap::Signal("led_out".to_string()));
    graph.instances.insert("u0".to_string(), u0);
    graph.top_ports.insert(
        "clk".to_string(),
        TopPort {
            direction: PortDir::Input,
            width: 1,
        },
    );

    Resolver::new(&store).resolve(&mut graph).unwrap();

    assert_eq!(
        Emitter::new(&store).emit(&graph).unwrap(),
        "\
// Auto-generated top module
module top(
  input clk,
  output led_out
);

  // Instance of blinker
  blinker u0 (
    .clk(clk),
    .led(led_out)
  );

endmodule
"
    );
}

#[test]
fn test_emission_is_idempotent() {
    let (store_a, graph_a) = one_by_two();
    let (store_b, graph_b) = one_by_two();

    let first = Emitter::new(&store_a).emit(&graph_a).unwrap();
    let second = Emitter::new(&store_a).emit(&graph_a).unwrap();
    let rebuilt = Emitter::new(&store_b).emit(&graph_b).unwrap();

    assert_eq!(first, second);
    assert_eq!(first, rebuilt);
}

#[test]
fn test_manifest_round_trip_is_lossless() {
    let (store, graph) = one_by_two();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("topmodule_config.json");

    graph.write_json(&path).unwrap();
    let reloaded = InstanceGraph::read_json(&path).unwrap();

    assert_eq!(graph, reloaded);
    assert_eq!(
        Emitter::new(&store).emit(&graph).unwrap(),
        Emitter::new(&store).emit(&reloaded).unwrap()
    );
}

#[test]
fn test_unresolved_graph_is_rejected() {
    let store = extract_modules(SIMPLE_PE).unwrap();
    let mut graph = InstanceGraph::new("top");
    graph.instances.insert("u0".to_string(), Instance::new("pe"));

    let err = Emitter::new(&store).emit(&graph).unwrap_err();
    assert!(matches!(err, Error::MalformedManifest { .. }));
}
