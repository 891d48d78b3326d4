use super::{PlanNode, Route};
use std::fmt;

/// A wrapper to display a compiled route as an indented tree.
/// Used by the CLI and the `debug-tools` dumps.
pub struct DisplayRoute<'a> {
    pub route: &'a Route,
}

impl<'a> fmt::Display for DisplayRoute<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Route: {}", self.route.flow_id)?;
        self.fmt_sequence(f, &self.route.steps, "")
    }
}

impl<'a> DisplayRoute<'a> {
    fn fmt_sequence(&self, f: &mut fmt::Formatter<'_>, nodes: &[PlanNode], prefix: &str) -> fmt::Result {
        if nodes.is_empty() {
            return writeln!(f, "{}└── <pass-through>", prefix);
        }
        for (i, node) in nodes.iter().enumerate() {
            self.fmt_as_tree(node, f, prefix, i + 1 == nodes.len())?;
        }
        Ok(())
    }

    /// Recursively formats a plan element and its branch bodies.
    fn fmt_as_tree(
        &self,
        node: &PlanNode,
        f: &mut fmt::Formatter<'_>,
        prefix: &str,
        is_last: bool,
    ) -> fmt::Result {
        let node_marker = if is_last { "└── " } else { "├── " };
        write!(f, "{}{}", prefix, node_marker)?;

        let child_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });

        match node {
            PlanNode::Sequential { node } => {
                writeln!(f, "Sequential: {} ({})", node.id, node.component_id)?
            }
            PlanNode::Leaf { node } => writeln!(f, "Leaf: {} ({})", node.id, node.component_id)?,
            PlanNode::Choice {
                id,
                node,
                branches,
                otherwise,
            } => {
                writeln!(f, "Choice: {} [{}]", id, node.id)?;
                let branch_count = branches.len() + usize::from(otherwise.is_some());
                for (i, branch) in branches.iter().enumerate() {
                    let last = i + 1 == branch_count;
                    self.fmt_branch(
                        f,
                        &format!("When {} ({})", branch.id, branch.condition),
                        &branch.body,
                        &child_prefix,
                        last,
                    )?;
                }
                if let Some(body) = otherwise {
                    self.fmt_branch(f, "Otherwise", body, &child_prefix, true)?;
                }
            }
            PlanNode::Parallel { id, branches } => {
                writeln!(f, "Parallel: {}", id)?;
                for (i, branch) in branches.iter().enumerate() {
                    self.fmt_branch(
                        f,
                        &format!("Branch {}", branch.branch_id),
                        &branch.body,
                        &child_prefix,
                        i + 1 == branches.len(),
                    )?;
                }
            }
        }
        Ok(())
    }

    fn fmt_branch(
        &self,
        f: &mut fmt::Formatter<'_>,
        label: &str,
        body: &[PlanNode],
        prefix: &str,
        is_last: bool,
    ) -> fmt::Result {
        writeln!(f, "{}{}{}", prefix, if is_last { "└── " } else { "├── " }, label)?;
        let body_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });
        self.fmt_sequence(f, body, &body_prefix)
    }
}
