//! Relation layer: sequencing edges between leaf items

pub mod relation_graph;

pub use relation_graph::RelationGraph;
