//! Directed-graph index over an authored flow.
//!
//! `FlowGraph` answers the structural questions the plan builder asks:
//! successors and predecessors, the unique entry node, reachability, and
//! which merge node closes each fan-out. Conditional nodes are indexed with
//! their when/otherwise branches as synthetic child nodes, so a conditional
//! is a branch start through the same out-degree rule as a parallel fan-out.
//! The implicit `conditional -> branch` port links are the only edges `build`
//! adds beyond the authored ones.
//!
//! The graph may contain user-authored loops. Every traversal carries a
//! visited set and terminates on cyclic input.

mod node;
mod pairing;

pub use node::*;

use crate::catalog::{NodeCatalog, NodeShape};
use crate::error::CompileError;
use crate::flow::{FlowEdgeDefinition, FlowNodeDefinition};
use crate::plan::Value;
use ahash::AHashMap;
use pairing::BranchPairing;
use std::collections::VecDeque;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct FlowGraph {
    /// Nodes in registration order: declared nodes, each conditional followed by its branches.
    nodes: Vec<GraphNode>,
    index: AHashMap<String, usize>,
    successors: Vec<Vec<usize>>,
    predecessors: Vec<Vec<usize>>,
    /// Computed on first use; not every compilation needs it.
    pairing: OnceLock<BranchPairing>,
}

impl FlowGraph {
    /// Indexes the nodes and edges of a flow.
    pub fn build(
        nodes: &[FlowNodeDefinition],
        edges: &[FlowEdgeDefinition],
        catalog: &dyn NodeCatalog,
    ) -> Result<Self, CompileError> {
        if nodes.is_empty() {
            return Err(malformed("flow has no nodes"));
        }
        if edges.is_empty() {
            return Err(malformed("flow has no edges"));
        }

        let mut graph = FlowGraph {
            nodes: Vec::with_capacity(nodes.len()),
            index: AHashMap::with_capacity(nodes.len()),
            successors: Vec::new(),
            predecessors: Vec::new(),
            pairing: OnceLock::new(),
        };

        for definition in nodes {
            graph.register_definition(definition, catalog)?;
        }

        // A conditional's declared branches are its output ports.
        let port_links: Vec<(usize, usize)> = graph
            .nodes
            .iter()
            .enumerate()
            .filter_map(|(i, node)| match &node.kind {
                NodeKind::Conditional { branches } => Some((i, branches)),
                _ => None,
            })
            .flat_map(|(i, branches)| branches.iter().map(move |b| (i, b)))
            .map(|(i, branch)| (i, graph.index[branch.as_str()]))
            .collect();
        for (parent, branch) in port_links {
            graph.link(parent, branch);
        }

        for edge in edges {
            graph.register_edge(edge)?;
        }

        log::debug!(
            "Indexed flow graph with {} nodes ({} declared) and {} edges",
            graph.nodes.len(),
            nodes.len(),
            graph.successors.iter().map(Vec::len).sum::<usize>()
        );
        Ok(graph)
    }

    fn register_definition(
        &mut self,
        definition: &FlowNodeDefinition,
        catalog: &dyn NodeCatalog,
    ) -> Result<(), CompileError> {
        let parameters = definition
            .parameters
            .iter()
            .map(|(key, value)| (key.clone(), Value::from(value.clone())))
            .collect();

        let kind = match catalog.shape_of(&definition.component_id) {
            Some(NodeShape::Conditional) => {
                let otherwise_count = definition
                    .children
                    .iter()
                    .filter(|child| child.condition.is_none())
                    .count();
                if otherwise_count > 1 {
                    return Err(malformed(&format!(
                        "conditional node '{}' declares {} otherwise branches",
                        definition.id, otherwise_count
                    )));
                }
                NodeKind::Conditional {
                    branches: definition.children.iter().map(|c| c.id.clone()).collect(),
                }
            }
            Some(NodeShape::Plain) if !definition.children.is_empty() => {
                return Err(malformed(&format!(
                    "node '{}' declares branches but component '{}' is not conditional",
                    definition.id, definition.component_id
                )));
            }
            Some(NodeShape::Plain) => NodeKind::Plain,
            None => NodeKind::Unrecognized,
        };
        let is_conditional = matches!(kind, NodeKind::Conditional { .. });

        self.register(GraphNode {
            id: definition.id.clone(),
            component_id: definition.component_id.clone(),
            parameters,
            kind,
        })?;

        if is_conditional {
            for child in &definition.children {
                self.register(GraphNode {
                    id: child.id.clone(),
                    component_id: definition.component_id.clone(),
                    parameters: Default::default(),
                    kind: NodeKind::Branch {
                        parent: definition.id.clone(),
                        condition: child.condition.clone(),
                    },
                })?;
            }
        }
        Ok(())
    }

    fn register(&mut self, node: GraphNode) -> Result<usize, CompileError> {
        if self.index.contains_key(&node.id) {
            return Err(malformed(&format!("duplicate node id '{}'", node.id)));
        }
        let idx = self.nodes.len();
        self.index.insert(node.id.clone(), idx);
        self.nodes.push(node);
        self.successors.push(Vec::new());
        self.predecessors.push(Vec::new());
        Ok(idx)
    }

    fn register_edge(&mut self, edge: &FlowEdgeDefinition) -> Result<(), CompileError> {
        let source = self.resolve(&edge.source, "source")?;
        let target = self.resolve(&edge.target, "target")?;

        let source = match (&self.nodes[source].kind, &edge.source_output) {
            (NodeKind::Conditional { branches }, Some(port)) => {
                if !branches.contains(port) {
                    return Err(malformed(&format!(
                        "edge leaves conditional node '{}' through unknown branch '{}'",
                        edge.source, port
                    )));
                }
                self.index[port.as_str()]
            }
            (NodeKind::Conditional { branches }, None) => {
                if branches.contains(&edge.target) {
                    // Explicit port link, already indexed.
                    return Ok(());
                }
                return Err(malformed(&format!(
                    "edge '{}' -> '{}' must leave the conditional node through one of its branches",
                    edge.source, edge.target
                )));
            }
            _ => source,
        };

        if let NodeKind::Branch { parent, .. } = &self.nodes[target].kind {
            if self.nodes[source].id != *parent {
                return Err(malformed(&format!(
                    "edge from '{}' targets branch '{}' of conditional node '{}'",
                    self.nodes[source].id, edge.target, parent
                )));
            }
        }

        self.link(source, target);
        Ok(())
    }

    fn resolve(&self, id: &str, role: &str) -> Result<usize, CompileError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| malformed(&format!("edge references unknown {} node '{}'", role, id)))
    }

    fn link(&mut self, source: usize, target: usize) {
        if !self.successors[source].contains(&target) {
            self.successors[source].push(target);
            self.predecessors[target].push(source);
        }
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.position(id).map(|i| &self.nodes[i])
    }

    /// All nodes, synthetic branches included, in registration order.
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Direct successors in insertion order. Empty for an unknown id.
    pub fn successors(&self, id: &str) -> Vec<&GraphNode> {
        self.position(id)
            .map(|i| self.successors[i].iter().map(|&s| &self.nodes[s]).collect())
            .unwrap_or_default()
    }

    /// Direct predecessors in insertion order. Empty for an unknown id.
    pub fn predecessors(&self, id: &str) -> Vec<&GraphNode> {
        self.position(id)
            .map(|i| self.predecessors[i].iter().map(|&p| &self.nodes[p]).collect())
            .unwrap_or_default()
    }

    pub fn in_degree(&self, id: &str) -> usize {
        self.position(id).map_or(0, |i| self.predecessors[i].len())
    }

    pub fn out_degree(&self, id: &str) -> usize {
        self.position(id).map_or(0, |i| self.successors[i].len())
    }

    pub fn is_branch_start(&self, id: &str) -> bool {
        self.out_degree(id) > 1
    }

    pub fn is_branch_end(&self, id: &str) -> bool {
        self.in_degree(id) > 1
    }

    /// The unique node without predecessors.
    pub fn entry_node(&self) -> Result<&GraphNode, CompileError> {
        let candidates: Vec<&GraphNode> = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(i, _)| self.predecessors[*i].is_empty())
            .map(|(_, node)| node)
            .collect();

        match candidates.as_slice() {
            [entry] => Ok(*entry),
            _ => Err(CompileError::NoEntryNode {
                candidates: candidates.iter().map(|n| n.id.clone()).collect(),
            }),
        }
    }

    /// Whether `to` can be reached from `from` by following at least one edge.
    pub fn is_reachable(&self, from: &str, to: &str) -> bool {
        match (self.position(from), self.position(to)) {
            (Some(from), Some(to)) => self.reachable_from(from, to),
            _ => false,
        }
    }

    fn reachable_from(&self, from: usize, to: usize) -> bool {
        let mut visited = vec![false; self.nodes.len()];
        let mut queue = VecDeque::from([from]);
        visited[from] = true;

        while let Some(current) = queue.pop_front() {
            for &next in &self.successors[current] {
                if next == to {
                    return true;
                }
                if !visited[next] {
                    visited[next] = true;
                    queue.push_back(next);
                }
            }
        }
        false
    }

    fn pairing(&self) -> &BranchPairing {
        if let Some(pairing) = self.pairing.get() {
            return pairing;
        }
        // Computed outside the cell; concurrent first callers may each compute it
        // and the first stored result wins.
        let computed = BranchPairing::compute(self);
        self.pairing.get_or_init(|| computed)
    }

    /// The merge node paired with a branch start, if its branches reconverge.
    pub fn branch_end(&self, branch_start: &str) -> Option<&str> {
        let start = self.position(branch_start)?;
        self.pairing()
            .end_of
            .get(&start)
            .copied()
            .flatten()
            .map(|end| self.nodes[end].id.as_str())
    }

    /// Every branch start paired with `branch_end`, in registration order.
    pub fn branch_starts_of(&self, branch_end: &str) -> Vec<&str> {
        self.position(branch_end)
            .and_then(|end| self.pairing().starts_of.get(&end))
            .map(|starts| starts.iter().map(|&s| self.nodes[s].id.as_str()).collect())
            .unwrap_or_default()
    }
}

fn malformed(message: &str) -> CompileError {
    CompileError::GraphMalformed(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ComponentCatalog;
    use crate::flow::BranchDefinition;

    fn node(id: &str, component_id: &str) -> FlowNodeDefinition {
        FlowNodeDefinition {
            id: id.to_string(),
            component_id: component_id.to_string(),
            ..Default::default()
        }
    }

    fn edge(source: &str, target: &str) -> FlowEdgeDefinition {
        FlowEdgeDefinition::new(source, target)
    }

    #[test]
    fn branch_children_register_after_their_parent() {
        let mut choice = node("X", "choice");
        choice.children = vec![
            BranchDefinition::when("X-w", "cond"),
            BranchDefinition::otherwise("X-o"),
        ];
        let nodes = vec![node("A", "start"), choice, node("B", "log")];
        let edges = vec![edge("A", "X"), edge("X-w", "B"), edge("X-o", "B")];

        let graph = FlowGraph::build(&nodes, &edges, &ComponentCatalog::new()).unwrap();
        let order: Vec<&str> = graph.nodes().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(order, vec!["A", "X", "X-w", "X-o", "B"]);
        assert_eq!(graph.out_degree("X"), 2);
        assert!(graph.is_branch_start("X"));
        assert!(graph.is_branch_end("B"));
    }

    #[test]
    fn duplicate_edges_are_indexed_once() {
        let nodes = vec![node("A", "start"), node("B", "log")];
        let edges = vec![edge("A", "B"), edge("A", "B")];
        let graph = FlowGraph::build(&nodes, &edges, &ComponentCatalog::new()).unwrap();
        assert_eq!(graph.out_degree("A"), 1);
        assert_eq!(graph.in_degree("B"), 1);
    }

    #[test]
    fn pairing_is_computed_lazily() {
        let nodes = vec![node("A", "start"), node("B", "log")];
        let graph = FlowGraph::build(&nodes, &[edge("A", "B")], &ComponentCatalog::new()).unwrap();
        assert!(graph.pairing.get().is_none());
        assert_eq!(graph.branch_end("A"), None);
        assert!(graph.pairing.get().is_some());
    }

    #[test]
    fn pairing_keeps_the_first_stored_result() {
        let nodes = vec![node("A", "start"), node("B", "log"), node("C", "log"), node("D", "log")];
        let edges = [edge("A", "B"), edge("A", "C"), edge("B", "D"), edge("C", "D")];
        let graph = FlowGraph::build(&nodes, &edges, &ComponentCatalog::new()).unwrap();

        let stored = BranchPairing::compute(&graph);
        assert!(graph.pairing.set(stored).is_ok());
        let first = graph.pairing.get().unwrap() as *const BranchPairing;
        assert!(std::ptr::eq(graph.pairing(), first));
        assert_eq!(graph.branch_end("A"), Some("D"));
        assert!(std::ptr::eq(graph.pairing(), first));
    }
}
