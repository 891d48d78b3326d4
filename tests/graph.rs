//! Tests for flow indexing, entry detection, reachability and branch pairing.
mod common;
use common::*;
use keiro::prelude::*;

fn index_err(flow: &FlowDefinition) -> CompileError {
    Compiler::default()
        .index(flow)
        .expect_err("Indexing should have failed")
}

#[test]
fn test_index_answers_degree_queries() {
    let graph = index(&diamond_flow());

    assert_eq!(graph.len(), 4);
    assert_eq!(graph.out_degree("A"), 2);
    assert_eq!(graph.in_degree("D"), 2);
    assert!(graph.is_branch_start("A"));
    assert!(graph.is_branch_end("D"));
    assert!(!graph.is_branch_start("B"));

    let successors: Vec<&str> = graph.successors("A").iter().map(|n| n.id.as_str()).collect();
    assert_eq!(successors, vec!["B", "C"]);
    let predecessors: Vec<&str> = graph.predecessors("D").iter().map(|n| n.id.as_str()).collect();
    assert_eq!(predecessors, vec!["B", "C"]);
}

#[test]
fn test_unknown_ids_are_empty_not_errors() {
    let graph = index(&diamond_flow());
    assert!(graph.node("nope").is_none());
    assert!(graph.successors("nope").is_empty());
    assert!(graph.predecessors("nope").is_empty());
    assert_eq!(graph.in_degree("nope"), 0);
    assert_eq!(graph.out_degree("nope"), 0);
    assert_eq!(graph.branch_end("nope"), None);
    assert!(graph.branch_starts_of("nope").is_empty());
    assert!(!graph.is_reachable("A", "nope"));
}

#[test]
fn test_conditional_branches_are_indexed_as_children() {
    let graph = index(&choice_flow());

    let order: Vec<&str> = graph.nodes().iter().map(|n| n.id.as_str()).collect();
    assert_eq!(order, vec!["A", "X", "X-w", "X-o", "B", "C", "D"]);

    let x = graph.node("X").unwrap();
    assert!(x.is_conditional());
    assert_eq!(
        x.kind,
        NodeKind::Conditional {
            branches: vec!["X-w".to_string(), "X-o".to_string()]
        }
    );

    let when = graph.node("X-w").unwrap();
    assert!(when.is_branch());
    assert_eq!(
        when.kind,
        NodeKind::Branch {
            parent: "X".to_string(),
            condition: Some("cond1".to_string())
        }
    );

    assert!(graph.is_branch_start("X"));
    assert_eq!(graph.branch_end("X"), Some("D"));
}

#[test]
fn test_explicit_port_link_is_deduplicated() {
    let mut flow = choice_flow();
    flow.edges.push(edge("X", "X-w"));
    let graph = index(&flow);
    assert_eq!(graph.out_degree("X"), 2);
    assert_eq!(graph.in_degree("X-w"), 1);
}

#[test]
fn test_build_adds_only_branch_port_links() {
    let flow = choice_flow();
    let graph = index(&flow);

    let links: usize = graph.nodes().iter().map(|n| graph.out_degree(&n.id)).sum();
    assert_eq!(links, flow.edges.len() + 2);
    assert_eq!(
        graph.successors("X").iter().map(|n| n.id.as_str()).collect::<Vec<_>>(),
        vec!["X-w", "X-o"]
    );
}

#[test]
fn test_parameters_are_carried_into_the_graph() {
    let mut flow = diamond_flow();
    flow.nodes[1]
        .parameters
        .insert("timeout".to_string(), serde_json::json!(30));
    let graph = index(&flow);

    let b = graph.node("B").unwrap();
    assert_eq!(b.parameters.get("timeout"), Some(&Value::Number(30.0)));
    assert_eq!(b.to_step().parameters, b.parameters);
}

#[test]
fn test_entry_node_is_the_unique_root() {
    let graph = index(&choice_flow());
    assert_eq!(graph.entry_node().unwrap().id, "A");
}

#[test]
fn test_entry_node_rejects_multiple_roots() {
    let flow = plain_flow("roots", &["A", "B", "C"], &[("A", "C"), ("B", "C")]);
    let graph = index(&flow);
    assert_eq!(
        graph.entry_node().unwrap_err(),
        CompileError::NoEntryNode {
            candidates: vec!["A".to_string(), "B".to_string()]
        }
    );
}

#[test]
fn test_entry_node_rejects_a_closed_cycle() {
    let flow = plain_flow("cycle", &["A", "B"], &[("A", "B"), ("B", "A")]);
    let graph = index(&flow);
    assert_eq!(
        graph.entry_node().unwrap_err(),
        CompileError::NoEntryNode { candidates: vec![] }
    );
}

#[test]
fn test_reachability_follows_edges_and_terminates_on_loops() {
    let flow = plain_flow(
        "loop",
        &["E", "A", "B", "C", "D"],
        &[("E", "A"), ("A", "B"), ("A", "C"), ("B", "D"), ("C", "D"), ("D", "A")],
    );
    let graph = index(&flow);

    assert!(graph.is_reachable("E", "D"));
    assert!(graph.is_reachable("D", "B"));
    assert!(graph.is_reachable("A", "A"));
    assert!(!graph.is_reachable("E", "E"));
    assert!(!graph.is_reachable("D", "E"));
}

#[test]
fn test_reachability_requires_at_least_one_edge() {
    let graph = index(&diamond_flow());
    assert!(!graph.is_reachable("A", "A"));
    assert!(!graph.is_reachable("D", "A"));
    assert!(graph.is_reachable("A", "D"));
}

#[test]
fn test_branch_end_pairs_diamond() {
    let graph = index(&diamond_flow());
    assert_eq!(graph.branch_end("A"), Some("D"));
    assert_eq!(graph.branch_starts_of("D"), vec!["A"]);
}

#[test]
fn test_branch_end_is_none_without_reconvergence() {
    let flow = plain_flow("fanout", &["A", "B", "C"], &[("A", "B"), ("A", "C")]);
    let graph = index(&flow);
    assert!(graph.is_branch_start("A"));
    assert_eq!(graph.branch_end("A"), None);
}

#[test]
fn test_branch_end_skips_the_start_itself() {
    // B is both a branch start and a branch end through its self-loop.
    let flow = plain_flow("self-loop", &["A", "B", "C"], &[("A", "B"), ("B", "B"), ("B", "C")]);
    let graph = index(&flow);
    assert!(graph.is_branch_start("B"));
    assert!(graph.is_branch_end("B"));
    assert_eq!(graph.branch_end("B"), None);
}

#[test]
fn test_shared_merge_node_lists_every_start() {
    let graph = index(&nested_flow());
    assert_eq!(graph.branch_end("A"), Some("D"));
    assert_eq!(graph.branch_end("X"), Some("D"));
    assert_eq!(graph.branch_starts_of("D"), vec!["A", "X"]);
}

#[test]
fn test_branch_end_takes_first_reachable_end_in_registration_order() {
    // The choice closes on M, the parallel on D. Pairing does not look for
    // the nearest merge node: whichever end was declared first wins for both.
    let m_first = index(&overlapping_flow(true));
    assert_eq!(m_first.branch_end("A"), Some("M"));
    assert_eq!(m_first.branch_end("X"), Some("M"));
    assert_eq!(m_first.branch_starts_of("M"), vec!["A", "X"]);
    assert!(m_first.branch_starts_of("D").is_empty());

    let d_first = index(&overlapping_flow(false));
    assert_eq!(d_first.branch_end("A"), Some("D"));
    assert_eq!(d_first.branch_end("X"), Some("D"));
    assert!(d_first.branch_starts_of("M").is_empty());
}

#[test]
fn test_branch_end_is_stable_across_threads() {
    let graph = index(&nested_flow());

    let ends: Vec<Option<String>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let graph = &graph;
                let start = if i % 2 == 0 { "A" } else { "X" };
                scope.spawn(move || graph.branch_end(start).map(str::to_string))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(ends.iter().all(|end| end.as_deref() == Some("D")));
}

#[test]
fn test_build_rejects_empty_flows() {
    let no_nodes = FlowDefinition {
        id: "empty".to_string(),
        ..Default::default()
    };
    assert!(matches!(index_err(&no_nodes), CompileError::GraphMalformed(_)));

    let no_edges = plain_flow("lonely", &["A"], &[]);
    assert!(matches!(index_err(&no_edges), CompileError::GraphMalformed(_)));
}

#[test]
fn test_build_rejects_dangling_edges() {
    let flow = plain_flow("dangling", &["A", "B"], &[("A", "B"), ("B", "Z")]);
    match index_err(&flow) {
        CompileError::GraphMalformed(message) => assert!(message.contains("'Z'")),
        other => panic!("Expected GraphMalformed, got {:?}", other),
    }
}

#[test]
fn test_build_rejects_duplicate_ids() {
    let flow = plain_flow("dupes", &["A", "B", "A"], &[("A", "B")]);
    assert!(matches!(index_err(&flow), CompileError::GraphMalformed(_)));

    // A branch id may not shadow a declared node either.
    let mut flow = choice_flow();
    flow.nodes.push(plain("X-w"));
    assert!(matches!(index_err(&flow), CompileError::GraphMalformed(_)));
}

#[test]
fn test_build_rejects_edges_that_bypass_branches() {
    let mut flow = choice_flow();
    flow.edges.push(edge("X", "D"));
    assert!(matches!(index_err(&flow), CompileError::GraphMalformed(_)));
}

#[test]
fn test_build_rejects_unknown_branch_port() {
    let mut flow = choice_flow();
    flow.edges.push(port("X", "X-missing", "D"));
    assert!(matches!(index_err(&flow), CompileError::GraphMalformed(_)));
}

#[test]
fn test_build_rejects_edges_into_foreign_branches() {
    let mut flow = choice_flow();
    flow.edges.push(edge("A", "X-o"));
    assert!(matches!(index_err(&flow), CompileError::GraphMalformed(_)));
}

#[test]
fn test_build_rejects_more_than_one_otherwise() {
    let mut flow = choice_flow();
    flow.nodes[1].children.push(BranchDefinition::otherwise("X-o2"));
    assert!(matches!(index_err(&flow), CompileError::GraphMalformed(_)));
}

#[test]
fn test_build_rejects_branches_on_plain_components() {
    let mut flow = diamond_flow();
    flow.nodes[0].children.push(BranchDefinition::when("A-w", "cond"));
    assert!(matches!(index_err(&flow), CompileError::GraphMalformed(_)));
}

#[test]
fn test_unknown_components_index_as_unrecognized() {
    let mut flow = diamond_flow();
    flow.nodes[2].component_id = "mystery".to_string();
    let graph = index(&flow);
    assert_eq!(graph.node("C").unwrap().kind, NodeKind::Unrecognized);
}

#[test]
fn test_custom_catalog_shapes_nodes() {
    let mut flow = choice_flow();
    flow.nodes[1].component_id = "decision".to_string();

    let compiler = Compiler::builder()
        .with_catalog(ComponentCatalog::new().with_type_mapping("decision", "choice"))
        .build();
    let graph = compiler.index(&flow).expect("Failed to index flow");
    assert!(graph.node("X").unwrap().is_conditional());
    assert_eq!(graph.node("X-w").unwrap().component_id, "decision");
}
