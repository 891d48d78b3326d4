use crate::catalog::{ComponentCatalog, NodeCatalog};
use crate::error::CompileError;
use crate::flow::FlowDefinition;
use crate::graph::FlowGraph;
use crate::plan::Route;

#[cfg(feature = "debug-tools")]
use {crate::plan::DisplayRoute, std::fs};

mod builder;
mod ids;
pub mod interceptor;

use builder::PlanBuilder;
pub use interceptor::{InterceptorChain, NodeInterceptor};

/// Default bound on branch nesting before compilation fails with `GraphTooDeep`.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Compiles flow definitions into nested execution plans.
///
/// A `Compiler` holds no per-flow state and can be shared across threads;
/// every compilation runs on a fresh plan builder.
pub struct Compiler {
    catalog: Box<dyn NodeCatalog>,
    interceptors: InterceptorChain,
    max_depth: usize,
}

pub struct CompilerBuilder {
    catalog: Box<dyn NodeCatalog>,
    interceptors: InterceptorChain,
    max_depth: usize,
}

impl CompilerBuilder {
    pub fn new() -> Self {
        Self {
            catalog: Box::new(ComponentCatalog::new()),
            interceptors: InterceptorChain::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
    pub fn with_catalog(mut self, catalog: impl NodeCatalog + 'static) -> Self {
        self.catalog = Box::new(catalog);
        self
    }
    pub fn with_interceptor(mut self, interceptor: Box<dyn NodeInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
    pub fn build(self) -> Compiler {
        Compiler {
            catalog: self.catalog,
            interceptors: self.interceptors,
            max_depth: self.max_depth,
        }
    }
}

impl Default for CompilerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for Compiler {
    fn default() -> Self {
        CompilerBuilder::new().build()
    }
}

impl Compiler {
    pub fn builder() -> CompilerBuilder {
        CompilerBuilder::new()
    }

    /// Indexes a flow with this compiler's catalog.
    pub fn index(&self, flow: &FlowDefinition) -> Result<FlowGraph, CompileError> {
        FlowGraph::build(&flow.nodes, &flow.edges, self.catalog.as_ref())
    }

    /// Indexes and compiles a flow. No partial plan is returned on error.
    pub fn compile(&self, flow: &FlowDefinition) -> Result<Route, CompileError> {
        let graph = self.index(flow)?;
        self.compile_graph(&flow.id, &graph)
    }

    /// Compiles an already indexed graph on behalf of `flow_id`.
    pub fn compile_graph(&self, flow_id: &str, graph: &FlowGraph) -> Result<Route, CompileError> {
        let route = PlanBuilder::new(graph, &self.interceptors, flow_id, self.max_depth).compile()?;
        log::debug!("Compiled flow '{}': {}", flow_id, route.chain());

        #[cfg(feature = "debug-tools")]
        self.write_debug_file(&route);

        Ok(route)
    }

    #[cfg(feature = "debug-tools")]
    fn write_debug_file(&self, route: &Route) {
        let sanitized_id = route
            .flow_id
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
            .collect::<String>();
        let path = format!("tmp/flow_{}_plan.txt", sanitized_id);
        let written = fs::create_dir_all("tmp")
            .and_then(|_| fs::write(&path, DisplayRoute { route }.to_string()));
        match written {
            Ok(()) => log::info!("  -> Wrote plan tree to '{}'", path),
            Err(e) => log::warn!("Could not write plan tree to '{}': {}", path, e),
        }
    }
}
