use super::ids::{IdGenerator, namespaced_id};
use super::interceptor::InterceptorChain;
use crate::error::CompileError;
use crate::graph::{FlowGraph, GraphNode, NodeKind};
use crate::plan::{ChoiceBranch, ParallelBranch, PlanNode, Route};
use ahash::AHashSet;

/// Where a branch body must stop.
#[derive(Debug, Clone, Copy)]
enum Stop<'a> {
    Never,
    /// Stop before stepping onto this merge node.
    Before(&'a str),
}

impl<'a> Stop<'a> {
    fn at(end: Option<&'a str>) -> Self {
        end.map_or(Stop::Never, Stop::Before)
    }

    fn halts(&self, successors: &[&GraphNode]) -> bool {
        match (self, successors) {
            (Stop::Before(end), [only]) => only.id == *end,
            _ => false,
        }
    }

    fn targets(&self, id: &str) -> bool {
        matches!(self, Stop::Before(end) if *end == id)
    }
}

/// Walks a `FlowGraph` from its entry node and synthesizes the nested plan.
///
/// One builder serves exactly one compilation. Its state is discarded on
/// error, so error paths do not unwind the bookkeeping.
pub(super) struct PlanBuilder<'a> {
    graph: &'a FlowGraph,
    interceptors: &'a InterceptorChain,
    flow_id: &'a str,
    ids: IdGenerator,
    /// Branch starts currently open, outermost first.
    branch_stack: Vec<&'a str>,
    /// Nodes on the current recursion path. Stepping onto one of them follows a back-edge.
    path: AHashSet<&'a str>,
    depth: usize,
    max_depth: usize,
    /// Plan elements emitted so far, and the most this graph may produce.
    emitted: usize,
    max_emitted: usize,
}

impl<'a> PlanBuilder<'a> {
    pub(super) fn new(
        graph: &'a FlowGraph,
        interceptors: &'a InterceptorChain,
        flow_id: &'a str,
        max_depth: usize,
    ) -> Self {
        Self {
            graph,
            interceptors,
            flow_id,
            ids: IdGenerator::new(flow_id),
            branch_stack: Vec::new(),
            path: AHashSet::new(),
            depth: 0,
            max_depth,
            emitted: 0,
            max_emitted: graph.len().saturating_mul(max_depth.max(1)),
        }
    }

    pub(super) fn compile(mut self) -> Result<Route, CompileError> {
        let graph = self.graph;
        let entry = graph.entry_node()?;
        log::info!(
            "Compiling flow '{}' from entry node '{}'",
            self.flow_id,
            entry.id
        );

        let steps = match &entry.kind {
            NodeKind::Conditional { .. } => self.build_choice(entry, Stop::Never)?,
            NodeKind::Plain => {
                let mut steps = vec![self.step(entry)?];
                self.path.insert(&entry.id);
                steps.extend(self.build_from(&entry.id, Stop::Never)?);
                steps
            }
            _ => return Err(unsupported(entry, "entry node is not a plain or conditional node")),
        };

        let route = Route {
            flow_id: self.flow_id.to_string(),
            steps,
        };
        Ok(self.interceptors.on_route(self.flow_id, route))
    }

    /// Compiles everything after `node_id` until the flow ends or `stop` halts it.
    /// `node_id` itself has already been emitted by the caller.
    fn build_from(&mut self, node_id: &'a str, stop: Stop<'a>) -> Result<Vec<PlanNode>, CompileError> {
        self.descend(node_id)?;
        let graph = self.graph;
        let mut plan = Vec::new();
        let mut entered = Vec::new();
        let mut current = node_id;

        // Sequential runs are walked in place; only branch structures recurse.
        loop {
            let successors = graph.successors(current);
            if successors.is_empty() || stop.halts(&successors) {
                break;
            }

            if successors.len() > 1 {
                plan.extend(self.build_parallel(current, &successors, stop)?);
                break;
            }

            let next = successors[0];
            if self.path.contains(next.id.as_str()) {
                log::debug!("Back-edge '{}' -> '{}' ends the sequence", current, next.id);
                break;
            }
            match &next.kind {
                NodeKind::Plain => {
                    plan.push(self.step(next)?);
                    self.path.insert(&next.id);
                    entered.push(next.id.as_str());
                    current = next.id.as_str();
                }
                NodeKind::Conditional { .. } => {
                    plan.extend(self.build_choice(next, stop)?);
                    break;
                }
                NodeKind::Branch { parent, .. } => {
                    return Err(unsupported(
                        next,
                        &format!("branch reached outside its conditional node '{}'", parent),
                    ));
                }
                NodeKind::Unrecognized => return Err(unrecognized(next)),
            }
        }

        for id in entered {
            self.path.remove(id);
        }
        self.ascend();
        Ok(plan)
    }

    fn build_choice(
        &mut self,
        conditional: &'a GraphNode,
        outer: Stop<'a>,
    ) -> Result<Vec<PlanNode>, CompileError> {
        let graph = self.graph;
        let branches = graph.successors(&conditional.id);
        if branches.is_empty() {
            return Err(unsupported(conditional, "conditional node declares no branches"));
        }

        self.descend(&conditional.id)?;
        self.branch_stack.push(&conditional.id);
        self.path.insert(&conditional.id);
        let id = self.ids.next_id("choice");
        let end = graph.branch_end(&conditional.id);
        log::debug!(
            "Opening choice '{}' on '{}' with {} branches (merge node: {})",
            id,
            conditional.id,
            branches.len(),
            end.unwrap_or("none")
        );

        // Each branch recurses until it would step onto the merge node.
        let stop = Stop::at(end);
        let mut when = Vec::new();
        let mut otherwise = None;
        for branch in branches {
            match &branch.kind {
                NodeKind::Branch {
                    condition: Some(condition),
                    ..
                } => when.push(ChoiceBranch {
                    id: branch.id.clone(),
                    condition: condition.clone(),
                    body: self.build_from(&branch.id, stop)?,
                }),
                NodeKind::Branch {
                    condition: None, ..
                } => otherwise = Some(self.build_from(&branch.id, stop)?),
                _ => {
                    return Err(unsupported(
                        conditional,
                        &format!("successor '{}' is not one of its branches", branch.id),
                    ));
                }
            }
        }

        self.emit(&conditional.id)?;
        let choice = PlanNode::Choice {
            id,
            node: conditional.to_step(),
            branches: when,
            otherwise,
        };
        let mut plan = vec![self.interceptors.on_step(self.flow_id, choice)];
        plan.extend(self.continuation(&conditional.id, end, outer)?);

        self.path.remove(conditional.id.as_str());
        self.branch_stack.pop();
        self.ascend();
        Ok(plan)
    }

    fn build_parallel(
        &mut self,
        branch_start: &'a str,
        successors: &[&'a GraphNode],
        outer: Stop<'a>,
    ) -> Result<Vec<PlanNode>, CompileError> {
        self.descend(branch_start)?;
        let graph = self.graph;
        self.branch_stack.push(branch_start);
        let id = self.ids.next_id("parallel");
        let end = graph.branch_end(branch_start);
        log::debug!(
            "Opening parallel '{}' on '{}' with {} branches (merge node: {})",
            id,
            branch_start,
            successors.len(),
            end.unwrap_or("none")
        );

        let stop = Stop::at(end);
        let mut branches = Vec::with_capacity(successors.len());
        for (index, &successor) in successors.iter().enumerate() {
            branches.push(ParallelBranch {
                branch_id: namespaced_id(&id, index),
                body: self.parallel_branch(successor, stop)?,
            });
        }

        self.emit(branch_start)?;
        let parallel = PlanNode::Parallel { id, branches };
        let mut plan = vec![self.interceptors.on_step(self.flow_id, parallel)];
        plan.extend(self.continuation(branch_start, end, outer)?);

        self.branch_stack.pop();
        self.ascend();
        Ok(plan)
    }

    fn parallel_branch(
        &mut self,
        successor: &'a GraphNode,
        stop: Stop<'a>,
    ) -> Result<Vec<PlanNode>, CompileError> {
        // A branch that goes straight to the merge node passes through empty.
        if stop.targets(&successor.id) {
            return Ok(Vec::new());
        }
        if self.path.contains(successor.id.as_str()) {
            log::debug!("Back-edge to '{}' leaves its branch empty", successor.id);
            return Ok(Vec::new());
        }

        match &successor.kind {
            NodeKind::Plain => {
                let mut body = vec![self.step(successor)?];
                self.path.insert(&successor.id);
                body.extend(self.build_from(&successor.id, stop)?);
                self.path.remove(successor.id.as_str());
                Ok(body)
            }
            NodeKind::Conditional { .. } => self.build_choice(successor, stop),
            NodeKind::Branch { parent, .. } => Err(unsupported(
                successor,
                &format!("branch reached outside its conditional node '{}'", parent),
            )),
            NodeKind::Unrecognized => Err(unrecognized(successor)),
        }
    }

    /// Re-attaches the shared tail after a branch structure closes.
    ///
    /// When several branch starts share one merge node, only the outermost
    /// open structure emits the tail; inner ones end at the merge point.
    fn continuation(
        &mut self,
        branch_start: &'a str,
        end: Option<&'a str>,
        outer: Stop<'a>,
    ) -> Result<Vec<PlanNode>, CompileError> {
        let Some(end) = end else {
            return Ok(Vec::new());
        };
        let graph = self.graph;

        let sharers = graph.branch_starts_of(end);
        if sharers.len() > 1 && self.branch_stack.first() != Some(&branch_start) {
            log::debug!(
                "Merge node '{}' is shared by [{}]; '{}' leaves it to the outermost branch",
                end,
                sharers.join(", "),
                branch_start
            );
            return Ok(Vec::new());
        }
        if outer.targets(end) {
            return Ok(Vec::new());
        }
        if self.path.contains(end) {
            log::debug!("Back-edge to merge node '{}' ends the continuation", end);
            return Ok(Vec::new());
        }

        let Some(merge) = graph.node(end) else {
            return Ok(Vec::new());
        };
        match &merge.kind {
            NodeKind::Plain => {
                let mut plan = vec![self.step(merge)?];
                self.path.insert(&merge.id);
                plan.extend(self.build_from(&merge.id, outer)?);
                self.path.remove(merge.id.as_str());
                Ok(plan)
            }
            NodeKind::Conditional { .. } => self.build_choice(merge, outer),
            NodeKind::Branch { .. } => Err(unsupported(merge, "merge node is a conditional branch")),
            NodeKind::Unrecognized => Err(unrecognized(merge)),
        }
    }

    /// A `Sequential` step, or a `Leaf` when the node has no successor.
    fn step(&mut self, node: &GraphNode) -> Result<PlanNode, CompileError> {
        self.emit(&node.id)?;
        let step = if self.graph.out_degree(&node.id) == 0 {
            PlanNode::Leaf {
                node: node.to_step(),
            }
        } else {
            PlanNode::Sequential {
                node: node.to_step(),
            }
        };
        Ok(self.interceptors.on_step(self.flow_id, step))
    }

    /// Counts one plan element against the budget. Pairing a branch start
    /// with a distant merge node makes every branch re-walk the path up to
    /// it, which can grow the plan exponentially at shallow depth.
    fn emit(&mut self, node_id: &str) -> Result<(), CompileError> {
        self.emitted += 1;
        if self.emitted > self.max_emitted {
            return Err(CompileError::PlanTooLarge {
                node_id: node_id.to_string(),
                limit: self.max_emitted,
            });
        }
        Ok(())
    }

    fn descend(&mut self, node_id: &str) -> Result<(), CompileError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(CompileError::GraphTooDeep {
                node_id: node_id.to_string(),
                max_depth: self.max_depth,
            });
        }
        Ok(())
    }

    fn ascend(&mut self) {
        self.depth -= 1;
    }
}

fn unsupported(node: &GraphNode, reason: &str) -> CompileError {
    CompileError::UnsupportedShape {
        node_id: node.id.clone(),
        reason: reason.to_string(),
    }
}

fn unrecognized(node: &GraphNode) -> CompileError {
    unsupported(
        node,
        &format!("component '{}' is not in the catalog", node.component_id),
    )
}
