use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::{Result, SnapshotError};
use crate::model::SnapshotRelation;

/// Adjacency representation of a snapshot's relation layer
///
/// Nodes are item ids; the graph never holds references to items themselves.
/// Two indexes are kept in step: outgoing edges per node and the single
/// permitted predecessor per node.
///
/// Invariants upheld by every mutation:
/// - no self-loops
/// - acyclic
/// - at most one predecessor per node
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationGraph {
    successors: BTreeMap<String, BTreeSet<String>>,
    predecessor: BTreeMap<String, String>,
}

impl RelationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a graph from persisted edges, re-checking every invariant
    ///
    /// # Errors
    ///
    /// Fails with the first `SelfLoop`, `CycleDetected` or
    /// `DuplicatePredecessor` encountered.
    pub fn from_edges<I>(edges: I) -> Result<Self>
    where
        I: IntoIterator<Item = SnapshotRelation>,
    {
        let mut graph = Self::new();
        for edge in edges {
            graph.add_edge(&edge.from_item_id, &edge.to_item_id)?;
        }
        Ok(graph)
    }

    /// Add the edge `from -> to`
    ///
    /// Returns `false` when the identical edge is already present.
    ///
    /// # Errors
    ///
    /// * `SelfLoop` - `from == to`
    /// * `CycleDetected` - `from` is already reachable from `to`
    /// * `DuplicatePredecessor` - `to` already has a different predecessor
    pub fn add_edge(&mut self, from: &str, to: &str) -> Result<bool> {
        if from == to {
            return Err(SnapshotError::SelfLoop {
                item_id: from.to_string(),
            });
        }

        if self.contains_edge(from, to) {
            return Ok(false);
        }

        if self.reaches(to, from) {
            return Err(SnapshotError::CycleDetected {
                from_item_id: from.to_string(),
                to_item_id: to.to_string(),
            });
        }

        if let Some(existing) = self.predecessor.get(to) {
            return Err(SnapshotError::DuplicatePredecessor {
                item_id: to.to_string(),
                existing_predecessor_id: existing.clone(),
                rejected_predecessor_id: from.to_string(),
            });
        }

        self.successors
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string());
        self.predecessor.insert(to.to_string(), from.to_string());
        Ok(true)
    }

    /// Remove the edge `from -> to`; returns whether it existed
    pub fn remove_edge(&mut self, from: &str, to: &str) -> bool {
        let removed = match self.successors.get_mut(from) {
            Some(targets) => {
                let removed = targets.remove(to);
                if targets.is_empty() {
                    self.successors.remove(from);
                }
                removed
            }
            None => false,
        };
        if removed {
            self.predecessor.remove(to);
        }
        removed
    }

    /// Drop every edge touching `item_id`, returning the dropped edges
    pub fn remove_node(&mut self, item_id: &str) -> Vec<SnapshotRelation> {
        let mut dropped = Vec::new();

        if let Some(pred) = self.predecessor.get(item_id).cloned() {
            self.remove_edge(&pred, item_id);
            dropped.push(SnapshotRelation::new(pred, item_id));
        }

        if let Some(targets) = self.successors.remove(item_id) {
            for to in targets {
                self.predecessor.remove(&to);
                dropped.push(SnapshotRelation::new(item_id, to));
            }
        }

        dropped
    }

    pub fn contains_edge(&self, from: &str, to: &str) -> bool {
        self.successors
            .get(from)
            .is_some_and(|targets| targets.contains(to))
    }

    pub fn predecessor_of(&self, item_id: &str) -> Option<&str> {
        self.predecessor.get(item_id).map(String::as_str)
    }

    pub fn has_incoming(&self, item_id: &str) -> bool {
        self.predecessor.contains_key(item_id)
    }

    /// Outgoing neighbours of `item_id`, in id order
    pub fn successors_of<'a>(&'a self, item_id: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.successors
            .get(item_id)
            .into_iter()
            .flat_map(|targets| targets.iter().map(String::as_str))
    }

    /// Ids reachable from `start_id` in breadth-first order, starting with
    /// `start_id` itself; at each node successors are visited in id order
    pub fn breadth_first_order(&self, start_id: &str) -> Vec<String> {
        let mut order = Vec::new();
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::new();
        seen.insert(start_id.to_string());
        queue.push_back(start_id.to_string());

        while let Some(current) = queue.pop_front() {
            for next in self.successors_of(&current) {
                if seen.insert(next.to_string()) {
                    queue.push_back(next.to_string());
                }
            }
            order.push(current);
        }

        order
    }

    /// Set of ids reachable from `start_id`, including itself
    pub fn compute_reachable_set(&self, start_id: &str) -> BTreeSet<String> {
        self.breadth_first_order(start_id).into_iter().collect()
    }

    /// Full-graph cycle check, independent of the incremental checks in
    /// [`RelationGraph::add_edge`]
    pub fn has_cycle(&self) -> bool {
        self.find_cycle().is_some()
    }

    /// Return one back edge `(from, to)` closing a cycle, if any exists
    pub fn find_cycle(&self) -> Option<(String, String)> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            InProgress,
            Done,
        }

        let mut marks: BTreeMap<&str, Mark> = BTreeMap::new();

        for root in self.successors.keys() {
            if marks.contains_key(root.as_str()) {
                continue;
            }
            // (node, expanded) pairs; a node is re-pushed once to close it
            let mut stack: Vec<(&str, bool)> = vec![(root.as_str(), false)];
            while let Some((node, expanded)) = stack.pop() {
                if expanded {
                    marks.insert(node, Mark::Done);
                    continue;
                }
                if marks.contains_key(node) {
                    continue;
                }
                marks.insert(node, Mark::InProgress);
                stack.push((node, true));
                for next in self.successors_of(node) {
                    match marks.get(next) {
                        Some(Mark::InProgress) => {
                            return Some((node.to_string(), next.to_string()))
                        }
                        Some(Mark::Done) => {}
                        None => stack.push((next, false)),
                    }
                }
            }
        }

        None
    }

    /// All edges, ordered by (from, to)
    pub fn edges(&self) -> Vec<SnapshotRelation> {
        self.successors
            .iter()
            .flat_map(|(from, targets)| {
                targets
                    .iter()
                    .map(move |to| SnapshotRelation::new(from.clone(), to.clone()))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.predecessor.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predecessor.is_empty()
    }

    /// Whether `target` is reachable from `source` along outgoing edges
    fn reaches(&self, source: &str, target: &str) -> bool {
        if source == target {
            return true;
        }
        let mut seen = BTreeSet::new();
        let mut stack = vec![source];
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            for next in self.successors_of(current) {
                if next == target {
                    return true;
                }
                stack.push(next);
            }
        }
        false
    }

    #[cfg(test)]
    pub(crate) fn insert_unchecked(&mut self, from: &str, to: &str) {
        self.successors
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string());
        self.predecessor.insert(to.to_string(), from.to_string());
    }
}

impl Serialize for RelationGraph {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.edges().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RelationGraph {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let edges = Vec::<SnapshotRelation>::deserialize(deserializer)?;
        RelationGraph::from_edges(edges).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(ids: &[&str]) -> RelationGraph {
        let mut graph = RelationGraph::new();
        for pair in ids.windows(2) {
            graph.add_edge(pair[0], pair[1]).unwrap();
        }
        graph
    }

    #[test]
    fn test_add_edge_records_both_indexes() {
        let graph = chain(&["a", "b"]);
        assert!(graph.contains_edge("a", "b"));
        assert_eq!(graph.predecessor_of("b"), Some("a"));
        assert!(!graph.has_incoming("a"));
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_add_same_edge_twice_is_noop() {
        let mut graph = chain(&["a", "b"]);
        assert!(!graph.add_edge("a", "b").unwrap());
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_self_loop_rejected() {
        let mut graph = RelationGraph::new();
        let err = graph.add_edge("a", "a").unwrap_err();
        assert!(matches!(err, SnapshotError::SelfLoop { .. }));
    }

    #[test]
    fn test_back_edge_rejected_as_cycle() {
        let mut graph = chain(&["a", "b", "c"]);
        let err = graph.add_edge("c", "a").unwrap_err();
        assert!(matches!(err, SnapshotError::CycleDetected { .. }));
        assert!(!graph.has_cycle());
    }

    #[test]
    fn test_second_predecessor_rejected() {
        let mut graph = chain(&["a", "c"]);
        let err = graph.add_edge("b", "c").unwrap_err();
        match err {
            SnapshotError::DuplicatePredecessor {
                item_id,
                existing_predecessor_id,
                rejected_predecessor_id,
            } => {
                assert_eq!(item_id, "c");
                assert_eq!(existing_predecessor_id, "a");
                assert_eq!(rejected_predecessor_id, "b");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_branching_is_allowed() {
        let mut graph = RelationGraph::new();
        graph.add_edge("a", "b").unwrap();
        graph.add_edge("a", "c").unwrap();
        let reach = graph.compute_reachable_set("a");
        assert_eq!(reach.len(), 3);
    }

    #[test]
    fn test_remove_edge_missing_is_noop() {
        let mut graph = chain(&["a", "b"]);
        assert!(!graph.remove_edge("b", "a"));
        assert!(graph.remove_edge("a", "b"));
        assert!(graph.is_empty());
        assert!(!graph.has_incoming("b"));
    }

    #[test]
    fn test_remove_node_drops_incident_edges() {
        let mut graph = chain(&["a", "b", "c"]);
        let dropped = graph.remove_node("b");
        assert_eq!(dropped.len(), 2);
        assert!(graph.is_empty());
        assert!(!graph.has_incoming("c"));
    }

    #[test]
    fn test_reachable_set_of_isolated_node_is_itself() {
        let graph = RelationGraph::new();
        let reach = graph.compute_reachable_set("solo");
        assert_eq!(reach.into_iter().collect::<Vec<_>>(), vec!["solo".to_string()]);
    }

    #[test]
    fn test_disconnected_chains_not_mutually_reachable() {
        let mut graph = chain(&["a", "b"]);
        graph.add_edge("x", "y").unwrap();
        let reach = graph.compute_reachable_set("a");
        assert!(!reach.contains("x"));
        assert!(!reach.contains("y"));
    }

    #[test]
    fn test_breadth_first_order_visits_levels_by_id() {
        let mut graph = RelationGraph::new();
        graph.add_edge("s", "z").unwrap();
        graph.add_edge("s", "m").unwrap();
        graph.add_edge("m", "a").unwrap();
        graph.add_edge("z", "b").unwrap();
        assert_eq!(graph.breadth_first_order("s"), vec!["s", "m", "z", "a", "b"]);
        assert_eq!(
            graph.compute_reachable_set("m").into_iter().collect::<Vec<_>>(),
            vec!["a".to_string(), "m".to_string()]
        );
    }

    #[test]
    fn test_has_cycle_detects_injected_cycle() {
        let mut graph = chain(&["a", "b"]);
        graph.insert_unchecked("b", "a");
        assert!(graph.has_cycle());
        let (from, to) = graph.find_cycle().unwrap();
        assert!(graph.contains_edge(&from, &to));
    }

    #[test]
    fn test_has_cycle_false_for_diamond_free_tree() {
        let mut graph = RelationGraph::new();
        graph.add_edge("a", "b").unwrap();
        graph.add_edge("a", "c").unwrap();
        graph.add_edge("c", "d").unwrap();
        assert!(!graph.has_cycle());
    }

    #[test]
    fn test_serde_rebuilds_indexes() {
        let graph = chain(&["a", "b", "c"]);
        let json = serde_json::to_string(&graph).unwrap();
        let back: RelationGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(back, graph);
        assert_eq!(back.predecessor_of("c"), Some("b"));
    }

    #[test]
    fn test_deserialize_rejects_cyclic_edges() {
        let json = r#"[
            {"from_item_id":"a","to_item_id":"b"},
            {"from_item_id":"b","to_item_id":"a"}
        ]"#;
        let result: std::result::Result<RelationGraph, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
