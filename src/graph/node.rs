use crate::plan::{PlanStep, Value};
use std::collections::BTreeMap;

/// What a node in the graph index is.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Plain,
    /// A conditional node; `branches` are the ids of its synthetic children, in declaration order.
    Conditional { branches: Vec<String> },
    /// A synthetic when (`condition` set) or otherwise child of a conditional node.
    Branch {
        parent: String,
        condition: Option<String>,
    },
    /// The catalog did not recognize the node's component.
    Unrecognized,
}

/// A node registered in a `FlowGraph`.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub id: String,
    pub component_id: String,
    pub parameters: BTreeMap<String, Value>,
    pub kind: NodeKind,
}

impl GraphNode {
    pub fn is_conditional(&self) -> bool {
        matches!(self.kind, NodeKind::Conditional { .. })
    }

    pub fn is_branch(&self) -> bool {
        matches!(self.kind, NodeKind::Branch { .. })
    }

    pub fn to_step(&self) -> PlanStep {
        PlanStep {
            id: self.id.clone(),
            component_id: self.component_id.clone(),
            parameters: self.parameters.clone(),
        }
    }
}
