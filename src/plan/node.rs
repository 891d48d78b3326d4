use super::Value;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A flow node as it appears in the compiled plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    pub id: String,
    pub component_id: String,
    pub parameters: BTreeMap<String, Value>,
}

/// One element of a compiled sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlanNode {
    /// A node followed by the next element of the enclosing sequence.
    Sequential { node: PlanStep },
    /// A node with no successor.
    Leaf { node: PlanStep },
    Choice {
        id: String,
        /// The conditional node this choice was compiled from.
        node: PlanStep,
        branches: Vec<ChoiceBranch>,
        otherwise: Option<Vec<PlanNode>>,
    },
    Parallel {
        id: String,
        branches: Vec<ParallelBranch>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceBranch {
    /// Id of the when branch on the conditional node.
    pub id: String,
    pub condition: String,
    pub body: Vec<PlanNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParallelBranch {
    pub branch_id: String,
    pub body: Vec<PlanNode>,
}

/// The compiled root handed to the execution engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub flow_id: String,
    pub steps: Vec<PlanNode>,
}

impl PlanNode {
    /// The generated id of a branch structure, or the node id of a step.
    pub fn id(&self) -> &str {
        match self {
            PlanNode::Sequential { node } | PlanNode::Leaf { node } => &node.id,
            PlanNode::Choice { id, .. } | PlanNode::Parallel { id, .. } => id,
        }
    }

    /// Collects the ids of every flow node this plan element contains, in plan order.
    pub fn collect_node_ids<'a>(&'a self, ids: &mut Vec<&'a str>) {
        match self {
            PlanNode::Sequential { node } | PlanNode::Leaf { node } => ids.push(&node.id),
            PlanNode::Choice {
                node,
                branches,
                otherwise,
                ..
            } => {
                ids.push(&node.id);
                for branch in branches {
                    branch.body.iter().for_each(|n| n.collect_node_ids(ids));
                }
                for n in otherwise.iter().flatten() {
                    n.collect_node_ids(ids);
                }
            }
            PlanNode::Parallel { branches, .. } => {
                for branch in branches {
                    branch.body.iter().for_each(|n| n.collect_node_ids(ids));
                }
            }
        }
    }

    /// One-line rendering used in logs and assertions.
    pub fn chain(&self) -> String {
        match self {
            PlanNode::Sequential { node } => format!("Sequential({})", node.id),
            PlanNode::Leaf { node } => format!("Leaf({})", node.id),
            PlanNode::Choice {
                branches,
                otherwise,
                ..
            } => {
                let mut parts: Vec<String> = branches
                    .iter()
                    .map(|b| format!("when {}: {}", b.condition, chain_of(&b.body)))
                    .collect();
                if let Some(body) = otherwise {
                    parts.push(format!("otherwise: {}", chain_of(body)));
                }
                format!("Choice({})", parts.join(", "))
            }
            PlanNode::Parallel { branches, .. } => format!(
                "Parallel({})",
                branches.iter().map(|b| chain_of(&b.body)).join(", ")
            ),
        }
    }
}

/// Renders a sequence as `[A -> B -> ...]`.
pub fn chain_of(nodes: &[PlanNode]) -> String {
    format!("[{}]", nodes.iter().map(PlanNode::chain).join(" -> "))
}

impl Route {
    /// Ids of every flow node in the plan, in plan order. A well-formed,
    /// acyclic flow lists each reachable node exactly once.
    pub fn node_ids(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        for node in &self.steps {
            node.collect_node_ids(&mut ids);
        }
        ids
    }

    pub fn chain(&self) -> String {
        self.steps.iter().map(PlanNode::chain).join(" -> ")
    }
}
