use super::FlowGraph;
use ahash::AHashMap;

/// Branch-start to branch-end pairing, computed once per graph.
#[derive(Debug, Clone, Default)]
pub(super) struct BranchPairing {
    pub(super) end_of: AHashMap<usize, Option<usize>>,
    pub(super) starts_of: AHashMap<usize, Vec<usize>>,
}

impl BranchPairing {
    /// Pairs every branch start with the first branch end, in registration
    /// order, that is reachable from it. This is not necessarily the nearest
    /// merge node: overlapping or nested structures can pair a start with an
    /// outer merge point.
    pub(super) fn compute(graph: &FlowGraph) -> Self {
        let count = graph.nodes.len();
        let branch_starts: Vec<usize> = (0..count)
            .filter(|&i| graph.successors[i].len() > 1)
            .collect();
        let branch_ends: Vec<usize> = (0..count)
            .filter(|&i| graph.predecessors[i].len() > 1)
            .collect();

        let mut pairing = BranchPairing::default();
        for &start in &branch_starts {
            let end = branch_ends
                .iter()
                .copied()
                .find(|&end| end != start && graph.reachable_from(start, end));

            match end {
                Some(end) => {
                    log::debug!(
                        "Paired branch start '{}' with merge node '{}'",
                        graph.nodes[start].id,
                        graph.nodes[end].id
                    );
                    pairing.starts_of.entry(end).or_default().push(start);
                }
                None => log::debug!(
                    "Branch start '{}' never reconverges",
                    graph.nodes[start].id
                ),
            }
            pairing.end_of.insert(start, end);
        }
        pairing
    }
}
