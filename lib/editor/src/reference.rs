//! Upstream variable resolution.
//!
//! For a target node, computes the set of upstream output variables its
//! configuration is allowed to reference: every declared output of every
//! ancestor (reachable backwards over the current connections), flattened
//! into dotted reference keys, plus the synthetic variables contributed by
//! Start nodes and loop bodies.
//!
//! `upstream_args` is a pure function of `(node_id, nodes, edges)`. It holds
//! no state and may be re-invoked on every keystroke; callers are free to
//! memoize.

use crate::graph::WorkflowData;
use crate::node::{ArgSpec, Binding, DataType, Node, NodeKind, NodeParams, VariableMode};
use flowdeck_core::NodeId;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

/// Synthetic integer exposed inside loop bodies: the current iteration index.
pub const INDEX_VARIABLE: &str = "INDEX";
/// Process-level variable exposed by Start nodes.
pub const USER_ID_VARIABLE: &str = "SYS_USER_ID";
/// Synthetic boolean appended to the outputs of variable-set nodes.
pub const SET_RESULT_VARIABLE: &str = "isSuccess";

/// A parsed reference key, `"{node}.{arg}[.{sub}...]"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRef {
    pub node_id: NodeId,
    pub path: Vec<String>,
}

/// Parses a reference key. Returns `None` for malformed keys.
#[must_use]
pub fn parse_ref(raw: &str) -> Option<ParsedRef> {
    let mut parts = raw.split('.');
    let node_id = parts.next()?.parse().ok()?;
    let path: Vec<String> = parts.map(str::to_string).collect();
    if path.is_empty() || path.iter().any(String::is_empty) {
        return None;
    }
    Some(ParsedRef { node_id, path })
}

/// An upstream node together with the outputs it exposes at the target.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamNode {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    pub output_args: Vec<ArgSpec>,
}

/// The reference map computed for one target node.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpstreamArgs {
    /// Upstream nodes in Start-first traversal order.
    pub previous_nodes: Vec<UpstreamNode>,
    /// Every reachable reference key, flattened over sub-fields.
    pub arg_map: BTreeMap<String, ArgSpec>,
}

impl UpstreamArgs {
    /// True when the key (or an empty, unset key) may be used at this node.
    #[must_use]
    pub fn is_valid_reference(&self, key: &str) -> bool {
        key.is_empty() || self.arg_map.contains_key(key)
    }

    /// Looks up the declared argument behind a reference key.
    #[must_use]
    pub fn referenced_arg(&self, key: &str) -> Option<&ArgSpec> {
        self.arg_map.get(key)
    }
}

/// Every downstream pointer embedded in a node: plain (minus the owning-loop
/// back-pointer), branch, exception-flow, and the loop body entry.
pub(crate) fn outgoing_targets(node: &Node) -> Vec<NodeId> {
    let mut targets = Vec::new();
    let mut push = |id: NodeId| {
        if id != node.id && !targets.contains(&id) {
            targets.push(id);
        }
    };

    for &id in &node.next_node_ids {
        if Some(id) != node.loop_node_id {
            push(id);
        }
    }
    for (_, branch_targets) in node.config.params.branch_links() {
        for &id in branch_targets {
            push(id);
        }
    }
    if let Some(exception) = &node.config.exception {
        for &id in exception.flow_targets() {
            push(id);
        }
    }
    if let NodeParams::Loop {
        inner_start_node_id: Some(inner_start),
        ..
    } = node.config.params
    {
        push(inner_start);
    }

    targets
}

/// Computes the variables available for reference at the given node.
#[must_use]
pub fn upstream_args(node_id: NodeId, data: &WorkflowData) -> UpstreamArgs {
    let Some(current) = data.node(node_id) else {
        return UpstreamArgs::default();
    };

    let reverse = reverse_adjacency(data);
    let predecessors = collect_predecessors(node_id, &reverse);

    let mut previous_nodes = Vec::new();
    let mut arg_map = BTreeMap::new();

    for &pred_id in &predecessors {
        // The owning loop node is listed once, by the loop-scope block below.
        if Some(pred_id) == current.loop_node_id {
            continue;
        }
        let Some(pred) = data.node(pred_id) else {
            continue;
        };
        // Loop body boundary nodes carry no user-visible outputs.
        if matches!(pred.kind(), NodeKind::LoopStart | NodeKind::LoopEnd) {
            continue;
        }
        let outputs = exposed_outputs(pred);
        flatten_args(pred.id, &outputs, &[], &mut arg_map);
        previous_nodes.push(UpstreamNode {
            id: pred.id,
            name: pred.name.clone(),
            kind: pred.kind(),
            output_args: outputs,
        });
    }

    if let Some(loop_id) = current.loop_node_id {
        if let Some(loop_node) = data.node(loop_id) {
            let scoped = loop_scope_outputs(loop_node, &arg_map);
            flatten_args(loop_node.id, &scoped, &[], &mut arg_map);
            previous_nodes.push(UpstreamNode {
                id: loop_node.id,
                name: loop_node.name.clone(),
                kind: loop_node.kind(),
                output_args: scoped,
            });
        }
    }

    // A loop node itself may reference its body's collected results.
    if let NodeParams::Loop {
        inner_end_node_id: Some(inner_end),
        ..
    } = current.config.params
    {
        if let Some(end_node) = data.node(inner_end) {
            let lifted: Vec<ArgSpec> = end_node
                .config
                .output_args
                .iter()
                .map(|arg| {
                    let mut lifted = arg.clone();
                    lifted.data_type = DataType::array_of(lifted.data_type);
                    lifted
                })
                .collect();
            if !lifted.is_empty() {
                flatten_args(end_node.id, &lifted, &[], &mut arg_map);
                previous_nodes.push(UpstreamNode {
                    id: end_node.id,
                    name: end_node.name.clone(),
                    kind: end_node.kind(),
                    output_args: lifted,
                });
            }
        }
    }

    sort_by_traversal_order(&mut previous_nodes, data);

    UpstreamArgs {
        previous_nodes,
        arg_map,
    }
}

/// Reverse adjacency built from both node pointers and the live edge list,
/// so the result is correct mid-session as well as right after load.
fn reverse_adjacency(data: &WorkflowData) -> HashMap<NodeId, Vec<NodeId>> {
    let mut reverse: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    for node in &data.nodes {
        reverse.entry(node.id).or_default();
    }

    for node in &data.nodes {
        for target in outgoing_targets(node) {
            push_unique(&mut reverse, target, node.id);
        }
    }
    for edge in &data.edges {
        push_unique(&mut reverse, edge.target, edge.source);
    }

    reverse
}

fn push_unique(map: &mut HashMap<NodeId, Vec<NodeId>>, key: NodeId, value: NodeId) {
    let bucket = map.entry(key).or_default();
    if !bucket.contains(&value) {
        bucket.push(value);
    }
}

/// BFS over the reverse adjacency, deduplicated, nearest-first.
fn collect_predecessors(node_id: NodeId, reverse: &HashMap<NodeId, Vec<NodeId>>) -> Vec<NodeId> {
    let mut visited = HashSet::new();
    let mut result = Vec::new();
    let mut queue: VecDeque<NodeId> =
        reverse.get(&node_id).cloned().unwrap_or_default().into();

    while let Some(current) = queue.pop_front() {
        if !visited.insert(current) {
            continue;
        }
        result.push(current);
        for &prev in reverse.get(&current).map(Vec::as_slice).unwrap_or(&[]) {
            if !visited.contains(&prev) {
                queue.push_back(prev);
            }
        }
    }

    result
}

/// The outputs a node exposes to its downstream referencers.
fn exposed_outputs(node: &Node) -> Vec<ArgSpec> {
    match &node.config.params {
        // Start exposes the workflow's input arguments (with bindings
        // stripped) and the process-level system variables.
        NodeParams::Start => {
            let mut outputs: Vec<ArgSpec> = node
                .config
                .input_args
                .iter()
                .map(|arg| {
                    let mut arg = arg.clone();
                    arg.binding = None;
                    arg
                })
                .collect();
            outputs.push(
                ArgSpec::system(USER_ID_VARIABLE, DataType::String)
                    .with_description("id of the user running the workflow"),
            );
            outputs.extend(node.config.output_args.iter().cloned());
            outputs
        }
        NodeParams::Variable {
            mode: VariableMode::SetVariable,
        } => {
            let mut outputs = node.config.output_args.clone();
            if !outputs.iter().any(|o| o.name == SET_RESULT_VARIABLE) {
                // A regular node output, not a process-level system variable.
                outputs.push(
                    ArgSpec::new(SET_RESULT_VARIABLE, DataType::Boolean)
                        .with_description("whether the variable was written"),
                );
            }
            outputs
        }
        _ => node.config.output_args.clone(),
    }
}

/// The synthetic variables a loop exposes inside its body only: the current
/// element of each referenced array input, the iteration index, and the
/// declared loop variables.
fn loop_scope_outputs(loop_node: &Node, arg_map: &BTreeMap<String, ArgSpec>) -> Vec<ArgSpec> {
    let mut outputs = Vec::new();

    for input in &loop_node.config.input_args {
        let Some(key) = input.binding.as_ref().and_then(Binding::as_reference) else {
            continue;
        };
        let Some(referenced) = arg_map.get(key) else {
            continue;
        };
        let Some(element) = referenced.data_type.element_type() else {
            continue;
        };
        let mut item = input.clone();
        item.name = format!("{}_item", input.name);
        item.data_type = element;
        item.binding = None;
        item.sub_args = referenced.sub_args.clone();
        outputs.push(item);
    }

    outputs.push(
        ArgSpec::system(INDEX_VARIABLE, DataType::Integer)
            .with_description("current iteration index"),
    );

    if let NodeParams::Loop { variable_args, .. } = &loop_node.config.params {
        for variable in variable_args {
            let mut out = variable.clone();
            if let Some(key) = variable.binding.as_ref().and_then(Binding::as_reference) {
                if let Some(referenced) = arg_map.get(key) {
                    out.sub_args = referenced.sub_args.clone();
                }
            }
            outputs.push(out);
        }
    }

    outputs
}

/// A configuration field found to reference a given upstream node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundReference {
    /// Dotted path of the referencing field.
    pub field: String,
    /// The reference key or template text containing it.
    pub key: String,
}

/// Which parts of `node`'s configuration reference outputs of `target`.
/// Used to warn before deleting a node that others depend on.
#[must_use]
pub fn find_references_to(target: NodeId, node: &Node) -> Vec<FoundReference> {
    let mut found = Vec::new();
    collect_arg_references(&node.config.input_args, "input_args", target, &mut found);

    // Prompt-like fields may embed `{{node.path}}` templates.
    let mut template_fields: Vec<(&str, &str)> = Vec::new();
    match &node.config.params {
        NodeParams::Llm {
            system_prompt,
            user_prompt,
            ..
        } => {
            template_fields.push(("system_prompt", system_prompt));
            template_fields.push(("user_prompt", user_prompt));
        }
        NodeParams::Qa { question, .. } => template_fields.push(("question", question)),
        NodeParams::Http { url, .. } => template_fields.push(("url", url)),
        NodeParams::Output { content } => template_fields.push(("content", content)),
        NodeParams::TableSql { sql } => template_fields.push(("sql", sql)),
        _ => {}
    }
    let marker = format!("{{{{{target}.");
    for (field, text) in template_fields {
        if text.contains(&marker) {
            found.push(FoundReference {
                field: field.to_string(),
                key: text.to_string(),
            });
        }
    }

    found
}

fn collect_arg_references(
    args: &[ArgSpec],
    prefix: &str,
    target: NodeId,
    found: &mut Vec<FoundReference>,
) {
    let target_prefix = format!("{target}.");
    for arg in args {
        if let Some(key) = arg.binding.as_ref().and_then(Binding::as_reference) {
            if key.starts_with(&target_prefix) {
                found.push(FoundReference {
                    field: format!("{prefix}.{}", arg.name),
                    key: key.to_string(),
                });
            }
        }
        let nested = format!("{prefix}.{}", arg.name);
        collect_arg_references(&arg.sub_args, &nested, target, found);
    }
}

/// Recursively expands declared sub-fields into dotted reference keys.
fn flatten_args(
    node_id: NodeId,
    args: &[ArgSpec],
    prefix: &[String],
    map: &mut BTreeMap<String, ArgSpec>,
) {
    for arg in args {
        let mut path = prefix.to_vec();
        path.push(arg.name.clone());
        map.insert(format!("{node_id}.{}", path.join(".")), arg.clone());
        flatten_args(node_id, &arg.sub_args, &path, map);
    }
}

/// Orders upstream nodes by DFS preorder from the Start node so the UI list
/// is stable; unreached nodes sort last, ties break on id.
fn sort_by_traversal_order(previous_nodes: &mut [UpstreamNode], data: &WorkflowData) {
    let mut order: HashMap<NodeId, usize> = HashMap::new();
    if let Some(start) = data.start_node() {
        let mut stack = vec![start.id];
        while let Some(id) = stack.pop() {
            if order.contains_key(&id) {
                continue;
            }
            order.insert(id, order.len());
            if let Some(node) = data.node(id) {
                for target in outgoing_targets(node).into_iter().rev() {
                    if !order.contains_key(&target) {
                        stack.push(target);
                    }
                }
            }
        }
    }

    previous_nodes.sort_by(|a, b| {
        let oa = order.get(&a.id).copied().unwrap_or(usize::MAX);
        let ob = order.get(&b.id).copied().unwrap_or(usize::MAX);
        oa.cmp(&ob).then(a.id.cmp(&b.id))
    });
}
