//! Pathfinding algorithms
//!
//! Unweighted shortest path over the store's adjacency lists. The search can
//! follow edges in either direction and is cut off after a fixed number of hops.

use crate::graph::{EdgeId, EdgeKind, GraphStore, NodeId};
use std::collections::{HashMap, VecDeque};

/// Result of a pathfinding algorithm
#[derive(Debug, Clone, PartialEq)]
pub struct PathResult {
    pub source: NodeId,
    pub target: NodeId,
    /// Nodes from source to target inclusive
    pub nodes: Vec<NodeId>,
    /// Edges traversed, `edges[i]` joins `nodes[i]` and `nodes[i + 1]`
    pub edges: Vec<EdgeId>,
}

impl PathResult {
    pub fn hops(&self) -> usize {
        self.edges.len()
    }
}

/// Shortest path over the undirected projection of the allowed edge kinds,
/// at most `max_hops` long.
pub fn bounded_shortest_path(
    store: &GraphStore,
    source: NodeId,
    target: NodeId,
    kinds: &[EdgeKind],
    max_hops: usize,
) -> Option<PathResult> {
    search(store, source, target, max_hops, |kind| kinds.contains(&kind))
}

fn search<F>(
    store: &GraphStore,
    source: NodeId,
    target: NodeId,
    max_hops: usize,
    allow: F,
) -> Option<PathResult>
where
    F: Fn(EdgeKind) -> bool,
{
    if !store.has_node(source) || !store.has_node(target) {
        return None;
    }

    let mut queue = VecDeque::new();
    // node -> (parent, edge used, depth)
    let mut visited: HashMap<NodeId, Option<(NodeId, EdgeId)>> = HashMap::new();
    let mut depth: HashMap<NodeId, usize> = HashMap::new();

    queue.push_back(source);
    visited.insert(source, None);
    depth.insert(source, 0);

    while let Some(current) = queue.pop_front() {
        if current == target {
            return Some(reconstruct(&visited, source, target));
        }

        let current_depth = depth.get(&current).copied().unwrap_or(0);
        if current_depth >= max_hops {
            continue;
        }

        for edge in store.get_incident_edges(current) {
            if !allow(edge.kind) {
                continue;
            }
            let next = match edge.other_end(current) {
                Some(n) => n,
                None => continue,
            };
            if !visited.contains_key(&next) {
                visited.insert(next, Some((current, edge.id)));
                depth.insert(next, current_depth + 1);
                queue.push_back(next);
            }
        }
    }

    None
}

fn reconstruct(
    visited: &HashMap<NodeId, Option<(NodeId, EdgeId)>>,
    source: NodeId,
    target: NodeId,
) -> PathResult {
    let mut nodes = vec![target];
    let mut edges = Vec::new();
    let mut curr = target;
    while let Some(Some((parent, edge))) = visited.get(&curr) {
        edges.push(*edge);
        nodes.push(*parent);
        curr = *parent;
    }
    nodes.reverse();
    edges.reverse();
    PathResult {
        source,
        target,
        nodes,
        edges,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeLabel;

    fn chain(store: &mut GraphStore, len: usize) -> Vec<NodeId> {
        let ids: Vec<NodeId> = (0..len)
            .map(|i| store.merge_node(NodeLabel::User, &[&format!("USR-{}", i)]).unwrap().0)
            .collect();
        for pair in ids.windows(2) {
            store.merge_edge(pair[0], pair[1], EdgeKind::SentTo, &[]).unwrap();
        }
        ids
    }

    #[test]
    fn test_undirected_search() {
        let mut store = GraphStore::new();
        let ids = chain(&mut store, 4);

        let result = bounded_shortest_path(&store, ids[3], ids[0], &[EdgeKind::SentTo], 6).unwrap();
        assert_eq!(result.nodes, vec![ids[3], ids[2], ids[1], ids[0]]);
        assert_eq!(result.hops(), 3);
        for (i, edge_id) in result.edges.iter().enumerate() {
            let edge = store.get_edge(*edge_id).unwrap();
            assert_eq!(edge.other_end(result.nodes[i]), Some(result.nodes[i + 1]));
        }
    }

    #[test]
    fn test_hop_bound() {
        let mut store = GraphStore::new();
        let ids = chain(&mut store, 8);

        assert!(bounded_shortest_path(&store, ids[0], ids[6], &[EdgeKind::SentTo], 6).is_some());
        assert!(bounded_shortest_path(&store, ids[0], ids[7], &[EdgeKind::SentTo], 6).is_none());
    }

    #[test]
    fn test_shortest_of_several() {
        let mut store = GraphStore::new();
        let ids = chain(&mut store, 5);
        let (attr, _) = store.merge_node(NodeLabel::Attribute, &["EMAIL", "h"]).unwrap();
        store.merge_edge(ids[0], attr, EdgeKind::HasAttribute, &[]).unwrap();
        store.merge_edge(ids[4], attr, EdgeKind::HasAttribute, &[]).unwrap();

        let all = [EdgeKind::SentTo, EdgeKind::HasAttribute];
        let result = bounded_shortest_path(&store, ids[0], ids[4], &all, 6).unwrap();
        assert_eq!(result.nodes, vec![ids[0], attr, ids[4]]);

        // Excluded kinds are not traversed
        let result = bounded_shortest_path(&store, ids[0], ids[4], &[EdgeKind::SentTo], 6).unwrap();
        assert_eq!(result.hops(), 4);
    }
}
