//! Removing a source column from transform and condition trees
//!
//! Column arguments lose the column; argument lists that become empty are
//! dropped; a node that loses something and is left without any column or
//! nested node argument is removed from its list. When a list lost a node and
//! nothing left in it carries a column, the list is cleared: what remains
//! (parsers, `ConditionalOr` markers, the literal suffix of a
//! `ConcatCombineTransform`) has nothing left to act on.
//!
//! A `ValueTransform` outside a combine is real payload and survives.

use super::node::{Arg, Node, NodeKind};

/// Delete `column` from `nodes` in place.
///
/// Returns whether the list ended up empty, so the owner can drop it.
pub fn delete_column(nodes: &mut Vec<Node>, column: &str) -> bool {
    delete_from_list(nodes, column, false);
    nodes.is_empty()
}

/// Returns whether anything in the list changed.
fn delete_from_list(nodes: &mut Vec<Node>, column: &str, in_combine: bool) -> bool {
    let mut changed = false;
    let mut pruned = false;
    nodes.retain_mut(|node| {
        let (node_changed, emptied) = delete_from_node(node, column);
        changed |= node_changed;
        pruned |= emptied;
        !emptied
    });
    if pruned && nodes.iter().all(|node| !carries_payload(node, in_combine)) {
        nodes.clear();
    }
    changed
}

/// Returns (changed, emptied).
fn delete_from_node(node: &mut Node, column: &str) -> (bool, bool) {
    let children_in_combine = node.kind == NodeKind::ConcatCombine;
    let mut changed = false;
    node.args.retain(|_, arg| match arg {
        Arg::Column(value) => {
            if value == column {
                changed = true;
                false
            } else {
                true
            }
        }
        Arg::Columns(values) => {
            let before = values.len();
            values.retain(|value| value != column);
            let lost = values.len() != before;
            changed |= lost;
            !(lost && values.is_empty())
        }
        Arg::Nodes(children) => {
            let lost = delete_from_list(children, column, children_in_combine);
            changed |= lost;
            !(lost && children.is_empty())
        }
        _ => true,
    });
    (changed, changed && !node.has_sources())
}

fn carries_payload(node: &Node, in_combine: bool) -> bool {
    (node.kind == NodeKind::Value && !in_combine) || !node.columns().is_empty()
}
