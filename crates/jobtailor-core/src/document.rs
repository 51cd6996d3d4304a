//! Document building: raw reader-proxy text in, ordered classified nodes out.

use crate::classify::classify;
use crate::node::{Node, NodeType};

/// Split raw text into lines, classify each non-blank one, and collect the
/// survivors in original order. Never fails; empty input yields an empty
/// document. Order is semantically meaningful downstream — documents read
/// top to bottom.
pub fn build(raw: &str) -> Vec<Node> {
    raw.lines()
        .filter_map(|line| {
            let line = line.trim_end_matches('\r');
            classify(line).map(|node_type| Node::new(line, node_type))
        })
        .collect()
}

/// Remove structural-noise nodes. Pure, order-preserving, idempotent.
pub fn filter(nodes: Vec<Node>) -> Vec<Node> {
    nodes
        .into_iter()
        .filter(|n| !n.node_type.is_dropped())
        .collect()
}

/// The full pipeline: build then filter. Drop-set categories never appear
/// in the output.
pub fn parse(raw: &str) -> Vec<Node> {
    filter(build(raw))
}
