//! Static validation of the whole graph.
//!
//! Produces findings without mutating anything. Fatal findings gate
//! publishing; warnings are advisory. Every check runs on every pass so the
//! UI can annotate all problems at once.

use crate::edge::SourcePort;
use crate::graph::WorkflowData;
use crate::node::{AnswerType, ArgSpec, Binding, BranchKind, Node, NodeKind, NodeParams};
use crate::reference::{outgoing_targets, parse_ref, upstream_args};
use flowdeck_core::NodeId;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use std::collections::{HashMap, HashSet};

/// How severe a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Blocks publishing, never editing or auto-save.
    Fatal,
    /// Advisory only.
    Warning,
}

/// One validation finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// The offending node, or `None` for workflow-level findings.
    pub node_id: Option<NodeId>,
    pub severity: Severity,
    /// Config field the finding points at, when there is one.
    pub field: Option<&'static str>,
    pub message: String,
}

impl Finding {
    fn fatal(node_id: Option<NodeId>, field: Option<&'static str>, message: impl Into<String>) -> Self {
        Self {
            node_id,
            severity: Severity::Fatal,
            field,
            message: message.into(),
        }
    }

    fn warning(
        node_id: Option<NodeId>,
        field: Option<&'static str>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            node_id,
            severity: Severity::Warning,
            field,
            message: message.into(),
        }
    }

    /// True for findings that block publishing.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }
}

/// The loop-boundary predicate: an edge from a body member back to its
/// owning loop node is structural, not a user-visible cycle.
#[must_use]
pub fn is_loop_boundary_edge(source: &Node, target: &Node) -> bool {
    matches!(target.config.params, NodeParams::Loop { .. }) && source.is_in_loop_body(target.id)
}

/// Runs every check over the current graph.
#[must_use]
pub fn validate(data: &WorkflowData) -> Vec<Finding> {
    let mut findings = Vec::new();

    check_structure(data, &mut findings);
    check_cycles(data, &mut findings);
    check_reachability(data, &mut findings);
    for node in &data.nodes {
        check_node_config(node, &mut findings);
        check_required_inputs(node, &mut findings);
    }
    check_references(data, &mut findings);
    check_branch_wiring(data, &mut findings);

    findings
}

fn check_structure(data: &WorkflowData, findings: &mut Vec<Finding>) {
    let starts = data.nodes.iter().filter(|n| n.kind() == NodeKind::Start).count();
    let ends = data.nodes.iter().filter(|n| n.kind() == NodeKind::End).count();

    if starts != 1 {
        findings.push(Finding::fatal(
            None,
            None,
            format!("workflow must have exactly one start node, found {starts}"),
        ));
    }
    if ends != 1 {
        findings.push(Finding::fatal(
            None,
            None,
            format!("workflow must have exactly one end node, found {ends}"),
        ));
    }
}

fn build_petgraph(
    data: &WorkflowData,
    skip_loop_boundary: bool,
) -> (DiGraph<NodeId, ()>, HashMap<NodeId, NodeIndex>) {
    let mut graph = DiGraph::new();
    let mut index = HashMap::new();
    for node in &data.nodes {
        index.insert(node.id, graph.add_node(node.id));
    }
    for edge in &data.edges {
        let (Some(&source), Some(&target)) = (index.get(&edge.source), index.get(&edge.target))
        else {
            continue;
        };
        if skip_loop_boundary {
            let (Some(source_node), Some(target_node)) =
                (data.node(edge.source), data.node(edge.target))
            else {
                continue;
            };
            if is_loop_boundary_edge(source_node, target_node) {
                continue;
            }
        }
        graph.add_edge(source, target, ());
    }
    (graph, index)
}

fn check_cycles(data: &WorkflowData, findings: &mut Vec<Finding>) {
    let (graph, _) = build_petgraph(data, true);
    if petgraph::algo::is_cyclic_directed(&graph) {
        findings.push(Finding::fatal(
            None,
            None,
            "workflow contains a cycle; connections must form a directed acyclic graph",
        ));
    }
}

fn check_reachability(data: &WorkflowData, findings: &mut Vec<Finding>) {
    let Some(start) = data.start_node() else {
        return;
    };

    let (graph, index) = build_petgraph(data, false);
    let mut reachable = HashSet::new();
    let mut dfs = Dfs::new(&graph, index[&start.id]);
    while let Some(visited) = dfs.next(&graph) {
        reachable.insert(graph[visited]);
    }

    if let Some(end) = data.end_node() {
        if !reachable.contains(&end.id) {
            findings.push(Finding::fatal(
                Some(start.id),
                None,
                "the end node cannot be reached from the start node",
            ));
        }
    }

    for node in &data.nodes {
        if node.loop_node_id.is_some() {
            continue;
        }
        if !reachable.contains(&node.id) {
            findings.push(Finding::warning(
                Some(node.id),
                None,
                "node cannot be reached from the start node",
            ));
        }

        let has_outgoing =
            !outgoing_targets(node).is_empty() || data.edges.iter().any(|e| e.source == node.id);
        if !has_outgoing
            && node.kind() != NodeKind::End
            && !node.kind().is_loop_control()
        {
            findings.push(Finding::warning(
                Some(node.id),
                None,
                "node is not connected to a next node",
            ));
        }
    }
}

fn check_node_config(node: &Node, findings: &mut Vec<Finding>) {
    let id = Some(node.id);
    match &node.config.params {
        NodeParams::End { return_type } => {
            if return_type.is_none() {
                findings.push(Finding::fatal(id, Some("return_type"), "return type not set"));
            }
        }
        NodeParams::Llm {
            model_id,
            user_prompt,
            ..
        } => {
            if model_id.is_none() {
                findings.push(Finding::fatal(id, Some("model_id"), "no model selected"));
            }
            if user_prompt.trim().is_empty() {
                findings.push(Finding::fatal(id, Some("user_prompt"), "user prompt is empty"));
            }
        }
        NodeParams::Condition { branches } => {
            if branches.is_empty() {
                findings.push(Finding::fatal(id, Some("branches"), "no branches configured"));
            }
            for (position, branch) in branches.iter().enumerate() {
                if branch.kind != BranchKind::Else && branch.conditions.is_empty() {
                    findings.push(Finding::fatal(
                        id,
                        Some("branches"),
                        format!("branch {} has no comparisons", position + 1),
                    ));
                }
            }
        }
        NodeParams::Loop {
            mode,
            inner_start_node_id,
            inner_end_node_id,
            ..
        } => {
            if mode.is_none() {
                findings.push(Finding::fatal(id, Some("mode"), "loop mode not set"));
            }
            if inner_start_node_id.is_none() {
                findings.push(Finding::fatal(
                    id,
                    Some("inner_start_node_id"),
                    "loop body entry is not wired",
                ));
            }
            if inner_end_node_id.is_none() {
                findings.push(Finding::fatal(
                    id,
                    Some("inner_end_node_id"),
                    "loop body exit is not wired",
                ));
            }
        }
        NodeParams::Qa {
            question,
            answer_type,
            options,
            ..
        } => {
            if question.trim().is_empty() {
                findings.push(Finding::fatal(id, Some("question"), "question is empty"));
            }
            if *answer_type == AnswerType::Select && options.is_empty() {
                findings.push(Finding::fatal(id, Some("options"), "no answer options configured"));
            }
        }
        NodeParams::Http { method, url, .. } => {
            if url.trim().is_empty() {
                findings.push(Finding::fatal(id, Some("url"), "request url is empty"));
            }
            if method.is_none() {
                findings.push(Finding::fatal(id, Some("method"), "request method not set"));
            }
        }
        NodeParams::Code { source, .. } => {
            if source.trim().is_empty() {
                findings.push(Finding::fatal(id, Some("source"), "code is empty"));
            }
        }
        NodeParams::Knowledge {
            knowledge_base_ids, ..
        } => {
            if knowledge_base_ids.is_empty() {
                findings.push(Finding::fatal(
                    id,
                    Some("knowledge_base_ids"),
                    "no knowledge base selected",
                ));
            }
        }
        NodeParams::IntentRecognition { intents } => {
            if intents.is_empty() {
                findings.push(Finding::fatal(id, Some("intents"), "no intents configured"));
            }
        }
        NodeParams::TableSql { sql } => {
            if sql.trim().is_empty() {
                findings.push(Finding::fatal(id, Some("sql"), "sql statement is empty"));
            }
        }
        _ => {}
    }
}

fn check_required_inputs(node: &Node, findings: &mut Vec<Finding>) {
    for arg in &node.config.input_args {
        if !arg.required {
            continue;
        }
        let bound = arg.binding.as_ref().is_some_and(|b| !b.is_empty());
        if !bound {
            findings.push(Finding::fatal(
                Some(node.id),
                Some("input_args"),
                format!("required input '{}' has no value", arg.name),
            ));
        }
    }
}

/// References must parse and point at a value that is actually visible
/// upstream of the node using them.
fn check_references(data: &WorkflowData, findings: &mut Vec<Finding>) {
    for node in &data.nodes {
        let mut keys: Vec<(&'static str, &str)> = Vec::new();
        collect_reference_keys(&node.config.input_args, &mut keys);
        if let NodeParams::Condition { branches } = &node.config.params {
            for branch in branches {
                for comparison in &branch.conditions {
                    if let Some(key) = comparison.left.as_reference() {
                        keys.push(("branches", key));
                    }
                    if let Some(key) = comparison.right.as_ref().and_then(Binding::as_reference) {
                        keys.push(("branches", key));
                    }
                }
            }
        }
        if keys.is_empty() {
            continue;
        }

        let available = upstream_args(node.id, data);
        for (field, key) in keys {
            if key.is_empty() {
                continue;
            }
            if parse_ref(key).is_none() {
                findings.push(Finding::fatal(
                    Some(node.id),
                    Some(field),
                    format!("reference '{key}' is malformed"),
                ));
            } else if !available.is_valid_reference(key) {
                findings.push(Finding::fatal(
                    Some(node.id),
                    Some(field),
                    format!("reference '{key}' does not resolve to an upstream output"),
                ));
            }
        }
    }
}

fn collect_reference_keys<'a>(args: &'a [ArgSpec], keys: &mut Vec<(&'static str, &'a str)>) {
    for arg in args {
        if let Some(key) = arg.binding.as_ref().and_then(Binding::as_reference) {
            keys.push(("input_args", key));
        }
        collect_reference_keys(&arg.sub_args, keys);
    }
}

/// Every declared branch should be represented on the canvas; a branch with
/// neither stored targets nor a live edge is declared but never wired.
fn check_branch_wiring(data: &WorkflowData, findings: &mut Vec<Finding>) {
    for node in &data.nodes {
        for (uuid, targets) in node.config.params.branch_links() {
            if !targets.is_empty() {
                continue;
            }
            let wired = data
                .edges
                .iter()
                .any(|e| e.source == node.id && e.source_port == SourcePort::Branch(uuid));
            if !wired {
                findings.push(Finding::warning(
                    Some(node.id),
                    None,
                    "branch is declared but not connected",
                ));
            }
        }
    }
}
