//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the keiro crate.
//! Import this module to get access to the core functionality without having to import
//! each type individually.
//!
//! # Example
//!
//! ```rust,no_run
//! use keiro::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let document = std::fs::read_to_string("path/to/flow.json")?;
//! let flow: FlowDefinition = serde_json::from_str(&document)?;
//!
//! let route = Compiler::default().compile(&flow)?;
//! CompiledFlow::new(route).save("path/to/flow.plan")?;
//! # Ok(())
//! # }
//! ```

// Core compilation
pub use crate::compiler::{
    Compiler, CompilerBuilder, DEFAULT_MAX_DEPTH, InterceptorChain, NodeInterceptor,
};

// Input model
pub use crate::catalog::{ComponentCatalog, NodeCatalog, NodeShape};
pub use crate::flow::{
    BranchDefinition, CompiledFlow, FlowDefinition, FlowEdgeDefinition, FlowNodeDefinition,
    IntoFlow,
};
pub use crate::graph::{FlowGraph, GraphNode, NodeKind};

// Plan types
pub use crate::plan::{ChoiceBranch, DisplayRoute, ParallelBranch, PlanNode, PlanStep, Route, Value};

// Error types
pub use crate::error::{ArtifactError, CompileError, FlowConversionError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
