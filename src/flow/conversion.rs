use super::definition::FlowDefinition;
use crate::error::FlowConversionError;

/// A trait for custom authoring models that can be converted into a Keiro `FlowDefinition`.
///
/// This is the primary extension point for making Keiro format-agnostic. By implementing
/// this trait on your own document structs, you provide a translation layer that
/// allows the compiler to process whatever the authoring layer persists.
///
/// # Example
///
/// ```rust,no_run
/// use keiro::prelude::*;
/// use keiro::error::FlowConversionError;
///
/// // 1. Define your custom structs for parsing your format.
/// struct MyStep { name: String, kind: String }
/// struct MyPipeline { name: String, steps: Vec<MyStep> }
///
/// // 2. Implement `IntoFlow` for your top-level struct.
/// impl IntoFlow for MyPipeline {
///     fn into_flow(self) -> std::result::Result<FlowDefinition, FlowConversionError> {
///         if self.steps.is_empty() {
///             return Err(FlowConversionError::ValidationError("pipeline has no steps".into()));
///         }
///         let edges = self
///             .steps
///             .windows(2)
///             .map(|pair| FlowEdgeDefinition::new(&pair[0].name, &pair[1].name))
///             .collect();
///         let nodes = self
///             .steps
///             .into_iter()
///             .map(|step| FlowNodeDefinition {
///                 id: step.name,
///                 component_id: step.kind,
///                 ..Default::default()
///             })
///             .collect();
///
///         Ok(FlowDefinition { id: self.name, nodes, edges })
///     }
/// }
/// ```
pub trait IntoFlow {
    /// Consumes the object and converts it into a Keiro-compatible flow definition.
    fn into_flow(self) -> Result<FlowDefinition, FlowConversionError>;
}

impl IntoFlow for FlowDefinition {
    fn into_flow(self) -> Result<FlowDefinition, FlowConversionError> {
        Ok(self)
    }
}
