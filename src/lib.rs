//! # Keiro - Workflow Graph Compiler
//!
//! **Keiro** converts a visually authored flow (typed nodes connected by
//! directed edges, including conditional branch nodes and fan-out points)
//! into a nested, structurally valid execution plan that a sequential and
//! branching runtime can walk node by node.
//!
//! ## Core Workflow
//!
//! The compiler is format-agnostic. It operates on a canonical internal
//! model of a "flow definition." The primary workflow is:
//!
//! 1.  **Load Your Data**: Parse your authoring document (JSON, YAML, ...) into your own Rust structs.
//! 2.  **Convert to Keiro's Model**: Implement the `IntoFlow` trait to translate them into a `FlowDefinition`.
//! 3.  **Compile**: Use `Compiler::builder` to configure a catalog and interceptors, then compile the flow into a `Route`.
//! 4.  **Execute**: Hand the route (or a saved `CompiledFlow` artifact) to your execution engine.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use keiro::prelude::*;
//!
//! fn main() -> Result<()> {
//!     // A -> X(choice) -> (when "temperature > 25" -> B, otherwise -> C) -> D
//!     let flow = FlowDefinition {
//!         id: "alerts".to_string(),
//!         nodes: vec![
//!             FlowNodeDefinition { id: "A".into(), component_id: "start".into(), ..Default::default() },
//!             FlowNodeDefinition {
//!                 id: "X".into(),
//!                 component_id: "choice".into(),
//!                 children: vec![
//!                     BranchDefinition::when("X-hot", "temperature > 25"),
//!                     BranchDefinition::otherwise("X-else"),
//!                 ],
//!                 ..Default::default()
//!             },
//!             FlowNodeDefinition { id: "B".into(), component_id: "http-request".into(), ..Default::default() },
//!             FlowNodeDefinition { id: "C".into(), component_id: "log".into(), ..Default::default() },
//!             FlowNodeDefinition { id: "D".into(), component_id: "save-telemetry".into(), ..Default::default() },
//!         ],
//!         edges: vec![
//!             FlowEdgeDefinition::new("A", "X"),
//!             FlowEdgeDefinition::from_output("X", "X-hot", "B"),
//!             FlowEdgeDefinition::from_output("X", "X-else", "C"),
//!             FlowEdgeDefinition::new("B", "D"),
//!             FlowEdgeDefinition::new("C", "D"),
//!         ],
//!     };
//!
//!     let compiler = Compiler::builder().build();
//!     let route = compiler.compile(&flow)?;
//!
//!     // Sequential(A) -> Choice(when temperature > 25: [Sequential(B)], otherwise: [Sequential(C)]) -> Leaf(D)
//!     println!("{}", route.chain());
//!     println!("{}", DisplayRoute { route: &route });
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod compiler;
pub mod error;
pub mod flow;
pub mod graph;
pub mod plan;
pub mod prelude;

#[cfg(feature = "python-bindings")]
mod python;
