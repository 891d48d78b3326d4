use serde::{Deserialize, Serialize};

/// The complete, canonical definition of an authored flow, ready for compilation.
/// This is the target structure for any custom authoring format conversion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowDefinition {
    /// Owning flow id. Every id generated during compilation is namespaced by it.
    pub id: String,
    pub nodes: Vec<FlowNodeDefinition>,
    pub edges: Vec<FlowEdgeDefinition>,
}

/// Defines a single node of the flow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowNodeDefinition {
    pub id: String,
    #[serde(alias = "componentId")]
    pub component_id: String,
    #[serde(default)]
    pub parameters: serde_json::Map<String, serde_json::Value>,
    /// Branches of a conditional node, in evaluation order.
    #[serde(default)]
    pub children: Vec<BranchDefinition>,
}

/// A when or otherwise branch declared on a conditional node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchDefinition {
    pub id: String,
    /// Opaque reference to the branch predicate. `None` marks the otherwise branch.
    #[serde(default)]
    pub condition: Option<String>,
}

impl BranchDefinition {
    pub fn when(id: &str, condition: &str) -> Self {
        Self {
            id: id.to_string(),
            condition: Some(condition.to_string()),
        }
    }

    pub fn otherwise(id: &str) -> Self {
        Self {
            id: id.to_string(),
            condition: None,
        }
    }
}

/// Defines a directed connection between two nodes of the flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowEdgeDefinition {
    pub source: String,
    /// Output port of a multi-output node. For a conditional node this names
    /// the branch the edge leaves from.
    #[serde(default, alias = "sourceOutput")]
    pub source_output: Option<String>,
    pub target: String,
}

impl FlowEdgeDefinition {
    pub fn new(source: &str, target: &str) -> Self {
        Self {
            source: source.to_string(),
            source_output: None,
            target: target.to_string(),
        }
    }

    pub fn from_output(source: &str, output: &str, target: &str) -> Self {
        Self {
            source: source.to_string(),
            source_output: Some(output.to_string()),
            target: target.to_string(),
        }
    }
}
