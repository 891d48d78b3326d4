//! Common test utilities for building flow definitions.
use keiro::prelude::*;

/// A plain node backed by the `script` component.
#[allow(dead_code)]
pub fn plain(id: &str) -> FlowNodeDefinition {
    FlowNodeDefinition {
        id: id.to_string(),
        component_id: "script".to_string(),
        ..Default::default()
    }
}

/// A `choice` node with the given when branches and an optional otherwise branch.
#[allow(dead_code)]
pub fn choice(id: &str, when: &[(&str, &str)], otherwise: Option<&str>) -> FlowNodeDefinition {
    let mut children: Vec<BranchDefinition> = when
        .iter()
        .map(|(branch, condition)| BranchDefinition::when(branch, condition))
        .collect();
    children.extend(otherwise.map(BranchDefinition::otherwise));
    FlowNodeDefinition {
        id: id.to_string(),
        component_id: "choice".to_string(),
        children,
        ..Default::default()
    }
}

#[allow(dead_code)]
pub fn edge(source: &str, target: &str) -> FlowEdgeDefinition {
    FlowEdgeDefinition::new(source, target)
}

/// An edge leaving a conditional node through one of its branches.
#[allow(dead_code)]
pub fn port(source: &str, branch: &str, target: &str) -> FlowEdgeDefinition {
    FlowEdgeDefinition::from_output(source, branch, target)
}

/// Plain nodes wired by `edges`. Every node id must appear in `ids`.
#[allow(dead_code)]
pub fn plain_flow(id: &str, ids: &[&str], edges: &[(&str, &str)]) -> FlowDefinition {
    FlowDefinition {
        id: id.to_string(),
        nodes: ids.iter().map(|node| plain(node)).collect(),
        edges: edges.iter().map(|(s, t)| edge(s, t)).collect(),
    }
}

/// `A -> {B, C} -> D`
#[allow(dead_code)]
pub fn diamond_flow() -> FlowDefinition {
    plain_flow(
        "diamond",
        &["A", "B", "C", "D"],
        &[("A", "B"), ("A", "C"), ("B", "D"), ("C", "D")],
    )
}

/// `A -> X(when cond1 -> B, otherwise -> C) -> D`
///
/// The when branch is wired through a port edge, the otherwise branch by
/// an edge that leaves the branch id directly.
#[allow(dead_code)]
pub fn choice_flow() -> FlowDefinition {
    FlowDefinition {
        id: "choices".to_string(),
        nodes: vec![
            plain("A"),
            choice("X", &[("X-w", "cond1")], Some("X-o")),
            plain("B"),
            plain("C"),
            plain("D"),
        ],
        edges: vec![
            edge("A", "X"),
            port("X", "X-w", "B"),
            edge("X-o", "C"),
            edge("B", "D"),
            edge("C", "D"),
        ],
    }
}

/// A choice nested in the first branch of a parallel, both closing on `D`:
///
/// `A -> {X(when fast -> P, otherwise -> Q), C}`, `P, Q, C -> D`
#[allow(dead_code)]
pub fn nested_flow() -> FlowDefinition {
    FlowDefinition {
        id: "nested".to_string(),
        nodes: vec![
            plain("A"),
            choice("X", &[("X-w", "fast")], Some("X-o")),
            plain("C"),
            plain("P"),
            plain("Q"),
            plain("D"),
        ],
        edges: vec![
            edge("A", "X"),
            edge("A", "C"),
            port("X", "X-w", "P"),
            port("X", "X-o", "Q"),
            edge("P", "D"),
            edge("Q", "D"),
            edge("C", "D"),
        ],
    }
}

/// Like `nested_flow`, but the choice closes on its own merge node `M`,
/// which then joins the parallel's merge node `D`:
///
/// `A -> {X(when fast -> P, otherwise -> Q), C}`, `P, Q -> M`, `M, C -> D`
///
/// With `m_first`, `M` is declared before `D`.
#[allow(dead_code)]
pub fn overlapping_flow(m_first: bool) -> FlowDefinition {
    let mut nodes = vec![
        plain("A"),
        choice("X", &[("X-w", "fast")], Some("X-o")),
        plain("C"),
        plain("P"),
        plain("Q"),
    ];
    if m_first {
        nodes.extend([plain("M"), plain("D")]);
    } else {
        nodes.extend([plain("D"), plain("M")]);
    }
    FlowDefinition {
        id: "overlapping".to_string(),
        nodes,
        edges: vec![
            edge("A", "X"),
            edge("A", "C"),
            port("X", "X-w", "P"),
            port("X", "X-o", "Q"),
            edge("P", "M"),
            edge("Q", "M"),
            edge("M", "D"),
            edge("C", "D"),
        ],
    }
}

/// Indexes a flow with the default catalog, panicking on error.
#[allow(dead_code)]
pub fn index(flow: &FlowDefinition) -> FlowGraph {
    Compiler::default()
        .index(flow)
        .expect("Failed to index flow")
}

/// Compiles a flow with a default compiler, panicking on error.
#[allow(dead_code)]
pub fn compile(flow: &FlowDefinition) -> Route {
    Compiler::default()
        .compile(flow)
        .expect("Failed to compile flow")
}

/// Every declared node id of a flow.
#[allow(dead_code)]
pub fn declared_ids(flow: &FlowDefinition) -> Vec<&str> {
    flow.nodes.iter().map(|n| n.id.as_str()).collect()
}

/// The sample authoring document used by the integration tests, in camelCase.
#[allow(dead_code)]
pub const ALERTS_FLOW_JSON: &str = r#"{
    "id": "alerts",
    "nodes": [
        { "id": "start", "componentId": "start" },
        {
            "id": "check",
            "componentId": "choice",
            "children": [
                { "id": "check-hot", "condition": "temperature > 25" },
                { "id": "check-else" }
            ]
        },
        {
            "id": "notify",
            "componentId": "http-request",
            "parameters": { "url": "https://example.com/hook", "retries": 3, "headers": { "x-source": "sensor" } }
        },
        { "id": "note", "componentId": "log", "parameters": { "level": "info" } },
        { "id": "store", "componentId": "save-telemetry", "parameters": { "tags": ["temp", true, null] } }
    ],
    "edges": [
        { "source": "start", "target": "check" },
        { "source": "check", "sourceOutput": "check-hot", "target": "notify" },
        { "source": "check", "sourceOutput": "check-else", "target": "note" },
        { "source": "notify", "target": "store" },
        { "source": "note", "target": "store" }
    ]
}"#;
