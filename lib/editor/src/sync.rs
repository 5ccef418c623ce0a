//! Bidirectional projection between node pointers and the canvas edge list.
//!
//! Persisted workflows store connections inside nodes: plain `next_node_ids`,
//! per-branch pointer lists, and exception-flow targets. The canvas works on
//! a uniform edge list. This module is the single place that knows how to
//! project between the two representations:
//!
//! - `extract_edges_from_nodes` bootstraps the edge list on load;
//! - `sync_nodes_from_edges` rewrites node pointers from the live edge list
//!   before every save.
//!
//! Round-trip law: for a well-formed node list (no self-pointers, no pointer
//! at the owning loop node, branching kinds routing only through branches)
//! `sync_nodes_from_edges(n, extract_edges_from_nodes(n))` is a no-op.

use crate::edge::{Edge, SourcePort};
use crate::node::{Node, NodeParams};
use flowdeck_core::{BranchId, NodeId};
use std::collections::{HashMap, HashSet};

/// Derives the uniform edge list from the pointers embedded in nodes.
#[must_use]
pub fn extract_edges_from_nodes(nodes: &[Node]) -> Vec<Edge> {
    let mut edges = Vec::new();

    for node in nodes {
        for &target in &node.next_node_ids {
            if target == node.id || Some(target) == node.loop_node_id {
                continue;
            }
            edges.push(Edge::new(node.id, target));
        }

        for (uuid, targets) in node.config.params.branch_links() {
            for &target in targets {
                edges.push(Edge::branch(node.id, target, uuid));
            }
        }

        if let Some(exception) = &node.config.exception {
            for &target in exception.flow_targets() {
                edges.push(Edge::exception(node.id, target));
            }
        }

        // A loop node is wired to its body entry point on the plain port.
        if let NodeParams::Loop {
            inner_start_node_id: Some(inner_start),
            ..
        } = node.config.params
        {
            edges.push(Edge::new(node.id, inner_start));
        }
    }

    let mut seen = HashSet::new();
    edges.retain(|e| seen.insert((e.source, e.source_port, e.target)));
    edges
}

/// Rewrites every node's pointers from the live edge list.
///
/// Plain pointers, exception-flow targets, and branch pointer lists are all
/// recomputed by grouping edges on their source port discriminator, so the
/// persisted data reflects exactly the current canvas connections.
#[must_use]
pub fn sync_nodes_from_edges(nodes: &[Node], edges: &[Edge]) -> Vec<Node> {
    let mut plain: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    let mut exception: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    let mut branch: HashMap<(NodeId, BranchId), Vec<NodeId>> = HashMap::new();

    for edge in edges {
        let bucket = match edge.source_port {
            SourcePort::Out => plain.entry(edge.source).or_default(),
            SourcePort::Exception => exception.entry(edge.source).or_default(),
            SourcePort::Branch(uuid) => branch.entry((edge.source, uuid)).or_default(),
        };
        if !bucket.contains(&edge.target) {
            bucket.push(edge.target);
        }
    }

    nodes
        .iter()
        .map(|node| {
            let mut node = node.clone();

            if node.config.params.uses_branch_ports() {
                let targets: HashMap<BranchId, Vec<NodeId>> = node
                    .config
                    .params
                    .branch_links()
                    .iter()
                    .map(|&(uuid, _)| {
                        let wired = branch.get(&(node.id, uuid)).cloned().unwrap_or_default();
                        (uuid, wired)
                    })
                    .collect();
                node.config.params.set_branch_targets(&targets);
            } else {
                let mut targets = plain.get(&node.id).cloned().unwrap_or_default();
                // The body entry pointer lives in the loop params, not in the
                // plain pointer list.
                if let NodeParams::Loop {
                    inner_start_node_id: Some(inner_start),
                    ..
                } = node.config.params
                {
                    targets.retain(|&t| t != inner_start);
                }
                node.next_node_ids = targets;
            }

            let flow = exception.get(&node.id).cloned().unwrap_or_default();
            if !flow.is_empty() {
                node.config
                    .exception
                    .get_or_insert_with(Default::default)
                    .set_flow_targets(flow);
            }

            node
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{AnswerType, ExceptionConfig, Node, NodeKind, NodeParams, QaOption};
    use flowdeck_core::WorkflowId;

    fn node(kind: NodeKind, id: i64) -> Node {
        Node::create(kind, NodeId::new(id), WorkflowId::new(1))
    }

    fn chained(kind: NodeKind, id: i64, next: &[i64]) -> Node {
        let mut node = node(kind, id);
        node.next_node_ids = next.iter().map(|&n| NodeId::new(n)).collect();
        node
    }

    #[test]
    fn extracts_plain_edges_in_pointer_order() {
        let nodes = vec![
            chained(NodeKind::Start, 1, &[2, 3]),
            chained(NodeKind::Llm, 2, &[4]),
            chained(NodeKind::Code, 3, &[4]),
            chained(NodeKind::End, 4, &[]),
        ];

        let edges = extract_edges_from_nodes(&nodes);
        assert_eq!(edges.len(), 4);
        assert_eq!(edges[0], Edge::new(NodeId::new(1), NodeId::new(2)));
        assert_eq!(edges[1], Edge::new(NodeId::new(1), NodeId::new(3)));
    }

    #[test]
    fn extraction_skips_self_pointers_and_dedupes() {
        let mut start = chained(NodeKind::Start, 1, &[1, 2, 2]);
        start.next_node_ids.push(NodeId::new(2));
        let edges = extract_edges_from_nodes(&[start, node(NodeKind::End, 2)]);
        assert_eq!(edges, vec![Edge::new(NodeId::new(1), NodeId::new(2))]);
    }

    #[test]
    fn extracts_branch_and_exception_edges() {
        let mut condition = node(NodeKind::Condition, 2);
        let NodeParams::Condition { branches } = &mut condition.config.params else {
            panic!("expected condition params");
        };
        branches[0].next_node_ids = vec![NodeId::new(3)];
        branches[1].next_node_ids = vec![NodeId::new(4)];
        let if_uuid = branches[0].uuid;

        let mut llm = node(NodeKind::Llm, 3);
        let mut exception = ExceptionConfig::default();
        exception.add_flow_target(NodeId::new(4));
        llm.config.exception = Some(exception);

        let edges = extract_edges_from_nodes(&[condition, llm, node(NodeKind::End, 4)]);
        assert_eq!(edges.len(), 3);
        assert!(edges.contains(&Edge::branch(NodeId::new(2), NodeId::new(3), if_uuid)));
        assert!(edges.contains(&Edge::exception(NodeId::new(3), NodeId::new(4))));
    }

    #[test]
    fn loop_node_emits_edge_to_inner_start() {
        let mut looped = node(NodeKind::Loop, 5);
        looped.config.params = NodeParams::Loop {
            mode: None,
            loop_times: None,
            variable_args: Vec::new(),
            inner_start_node_id: Some(NodeId::new(6)),
            inner_end_node_id: Some(NodeId::new(7)),
        };
        looped.next_node_ids = vec![NodeId::new(8)];

        let mut inner_start = node(NodeKind::LoopStart, 6);
        inner_start.loop_node_id = Some(NodeId::new(5));

        let edges = extract_edges_from_nodes(&[looped, inner_start]);
        assert!(edges.contains(&Edge::new(NodeId::new(5), NodeId::new(6))));
        assert!(edges.contains(&Edge::new(NodeId::new(5), NodeId::new(8))));
    }

    #[test]
    fn sync_rewrites_plain_pointers_from_edges() {
        let nodes = vec![
            chained(NodeKind::Start, 1, &[2]),
            node(NodeKind::Llm, 2),
            node(NodeKind::End, 3),
        ];
        // The user rewired 1 -> 3 and connected 2 -> 3 on the canvas.
        let edges = vec![
            Edge::new(NodeId::new(1), NodeId::new(3)),
            Edge::new(NodeId::new(2), NodeId::new(3)),
        ];

        let synced = sync_nodes_from_edges(&nodes, &edges);
        assert_eq!(synced[0].next_node_ids, vec![NodeId::new(3)]);
        assert_eq!(synced[1].next_node_ids, vec![NodeId::new(3)]);
        assert!(synced[2].next_node_ids.is_empty());
    }

    #[test]
    fn sync_empties_unwired_branches() {
        let mut condition = node(NodeKind::Condition, 1);
        let NodeParams::Condition { branches } = &mut condition.config.params else {
            panic!("expected condition params");
        };
        branches[0].next_node_ids = vec![NodeId::new(2)];
        branches[1].next_node_ids = vec![NodeId::new(3)];
        let if_uuid = branches[0].uuid;

        // Only the IF branch is still wired on the canvas.
        let edges = vec![Edge::branch(NodeId::new(1), NodeId::new(2), if_uuid)];
        let synced = sync_nodes_from_edges(&[condition], &edges);

        let links = synced[0].config.params.branch_links();
        assert_eq!(links[0].1, &[NodeId::new(2)]);
        assert!(links[1].1.is_empty());
    }

    #[test]
    fn sync_writes_exception_targets_into_config() {
        let nodes = vec![node(NodeKind::Llm, 1), node(NodeKind::Code, 2)];
        let edges = vec![Edge::exception(NodeId::new(1), NodeId::new(2))];

        let synced = sync_nodes_from_edges(&nodes, &edges);
        let exception = synced[0].config.exception.as_ref().expect("exception config");
        assert_eq!(exception.flow_targets(), &[NodeId::new(2)]);
    }

    #[test]
    fn round_trip_is_identity_for_well_formed_graphs() {
        let mut condition = node(NodeKind::Condition, 3);
        let NodeParams::Condition { branches } = &mut condition.config.params else {
            panic!("expected condition params");
        };
        branches[0].next_node_ids = vec![NodeId::new(4)];
        branches[1].next_node_ids = vec![NodeId::new(5)];

        let mut llm = chained(NodeKind::Llm, 2, &[3]);
        let mut exception = ExceptionConfig::default();
        exception.add_flow_target(NodeId::new(5));
        llm.config.exception = Some(exception);

        let mut qa = node(NodeKind::Qa, 4);
        let option_a = QaOption::new("A");
        let mut option_b = QaOption::new("B");
        option_b.next_node_ids = vec![NodeId::new(5)];
        qa.config.params = NodeParams::Qa {
            question: "continue?".to_string(),
            answer_type: AnswerType::Select,
            options: vec![option_a, option_b],
            max_reply_count: None,
        };

        let mut looped = node(NodeKind::Loop, 6);
        looped.config.params = NodeParams::Loop {
            mode: None,
            loop_times: None,
            variable_args: Vec::new(),
            inner_start_node_id: Some(NodeId::new(7)),
            inner_end_node_id: Some(NodeId::new(8)),
        };
        let mut inner_start = node(NodeKind::LoopStart, 7);
        inner_start.loop_node_id = Some(NodeId::new(6));
        let mut inner_end = chained(NodeKind::LoopEnd, 8, &[]);
        inner_end.loop_node_id = Some(NodeId::new(6));

        let nodes = vec![
            chained(NodeKind::Start, 1, &[2, 6]),
            llm,
            condition,
            qa,
            chained(NodeKind::End, 5, &[]),
            looped,
            inner_start,
            inner_end,
        ];

        let synced = sync_nodes_from_edges(&nodes, &extract_edges_from_nodes(&nodes));
        assert_eq!(synced, nodes);
    }

    #[test]
    fn round_trip_twice_is_stable() {
        let nodes = vec![
            chained(NodeKind::Start, 1, &[2]),
            chained(NodeKind::Llm, 2, &[3]),
            chained(NodeKind::End, 3, &[]),
        ];
        let once = sync_nodes_from_edges(&nodes, &extract_edges_from_nodes(&nodes));
        let twice = sync_nodes_from_edges(&once, &extract_edges_from_nodes(&once));
        assert_eq!(once, twice);
    }
}
