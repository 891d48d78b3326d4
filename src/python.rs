use crate::compiler::Compiler;
use crate::flow::FlowDefinition;
use pyo3::prelude::*;

/// A workflow graph compiler.
///
/// The compiler is stateless between calls; a single instance can compile
/// any number of flows.
#[pyclass(name = "Compiler")]
struct CompilerPy {
    compiler: Compiler,
}

#[pymethods]
impl CompilerPy {
    /// Initializes a compiler with the built-in component catalog.
    ///
    /// Args:
    ///     max_depth (int | None): Maximum branch nesting before compilation
    ///         fails. Defaults to the library default.
    #[new]
    #[pyo3(signature = (max_depth=None))]
    fn new(max_depth: Option<usize>) -> Self {
        let mut builder = Compiler::builder();
        if let Some(depth) = max_depth {
            builder = builder.with_max_depth(depth);
        }
        CompilerPy {
            compiler: builder.build(),
        }
    }

    /// Compiles a flow definition into an execution plan.
    ///
    /// Args:
    ///     flow_json (str): The JSON flow definition with `id`, `nodes` and
    ///         `edges`.
    ///
    /// Returns:
    ///     str: The compiled route serialized as JSON.
    ///
    /// Raises:
    ///     ValueError: If the JSON cannot be parsed or the flow is not a
    ///         valid graph (malformed edges, no unique entry node,
    ///         unsupported node shapes, excessive nesting).
    fn compile(&self, flow_json: &str) -> PyResult<String> {
        let flow: FlowDefinition = serde_json::from_str(flow_json)
            .map_err(|e| PyErr::new::<pyo3::exceptions::PyValueError, _>(e.to_string()))?;

        let route = self
            .compiler
            .compile(&flow)
            .map_err(|e| PyErr::new::<pyo3::exceptions::PyValueError, _>(e.to_string()))?;

        serde_json::to_string(&route)
            .map_err(|e| PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(e.to_string()))
    }
}

/// Python bindings to the Keiro workflow graph compiler.
#[pymodule]
fn keiro(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<CompilerPy>()?;
    Ok(())
}
