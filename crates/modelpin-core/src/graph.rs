//! Arena-backed computation graph.
//!
//! This module provides the graph the directive layer resolves outputs
//! against. Nodes live in a `Vec` arena addressed by [`NodeId`]; edges connect
//! a producer output slot to a consumer input slot and are indexed from both
//! ends so that forward and reverse traversal are equally cheap.
//!
//! # Architecture
//!
//! - [`Node`]: name, operator type, slot counts, declared shape and attributes
//! - [`Edge`]: producer [`Endpoint`] to consumer [`Endpoint`]
//! - [`Graph`]: the arena, a name index, the adjacency lists and the
//!   authoritative output list
//!
//! Enumeration order for nodes and edges is always insertion order, which
//! keeps every traversal built on top of the graph deterministic.

use std::{
    collections::{HashMap, HashSet},
    fmt,
    ops::{Index, IndexMut},
};

use indexmap::IndexMap;
use log::trace;
use thiserror::Error;

use crate::{attr::AttrValue, op_type::OpType};

// =============================================================================
// Identifiers and primitive types
// =============================================================================

/// Stable handle to a node inside a [`Graph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Returns the arena position of the node.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Index of an edge inside a [`Graph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeIndex(usize);

/// One side of an edge: a node and one of its slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub node: NodeId,
    pub slot: u32,
}

/// A directed data edge from a producer output slot to a consumer input slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    src: Endpoint,
    dst: Endpoint,
}

impl Edge {
    /// Producer side of the edge.
    pub fn src(&self) -> Endpoint {
        self.src
    }

    /// Consumer side of the edge.
    pub fn dst(&self) -> Endpoint {
        self.dst
    }
}

/// A single model output: a node and one of its output slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutputRef {
    pub node: NodeId,
    pub index: u32,
}

/// Errors raised while building a [`Graph`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("node `{0}` already exists in the graph")]
    DuplicateNode(String),

    #[error("node {0} does not belong to this graph")]
    UnknownNode(NodeId),

    #[error("{direction} slot {slot} of node `{node}` is out of range (node has {count})")]
    SlotOutOfRange {
        node: String,
        direction: &'static str,
        slot: u32,
        count: u32,
    },

    #[error("input slot {slot} of node `{node}` is already connected")]
    InputAlreadyConnected { node: String, slot: u32 },
}

// =============================================================================
// Nodes
// =============================================================================

/// A node of the computation graph.
#[derive(Debug, Clone)]
pub struct Node {
    name: String,
    op_type: OpType,
    input_count: u32,
    output_count: u32,
    shape: Vec<i64>,
    attrs: IndexMap<String, AttrValue>,
}

impl Node {
    /// Creates a node with no slots, no declared shape and no attributes.
    pub fn new(name: impl Into<String>, op_type: impl Into<OpType>) -> Self {
        Self {
            name: name.into(),
            op_type: op_type.into(),
            input_count: 0,
            output_count: 0,
            shape: Vec::new(),
            attrs: IndexMap::new(),
        }
    }

    /// Sets the number of input slots.
    pub fn with_inputs(mut self, count: u32) -> Self {
        self.input_count = count;
        self
    }

    /// Sets the number of output slots.
    pub fn with_outputs(mut self, count: u32) -> Self {
        self.output_count = count;
        self
    }

    /// Sets the declared shape. Only meaningful for input placeholders.
    pub fn with_shape(mut self, shape: Vec<i64>) -> Self {
        self.shape = shape;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn op_type(&self) -> OpType {
        self.op_type
    }

    pub fn input_count(&self) -> u32 {
        self.input_count
    }

    pub fn output_count(&self) -> u32 {
        self.output_count
    }

    pub fn shape(&self) -> &[i64] {
        &self.shape
    }

    /// Returns the attribute stored under `key`.
    pub fn attr(&self, key: &str) -> Option<&AttrValue> {
        self.attrs.get(key)
    }

    /// Iterates over all attributes in the order they were first set.
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.attrs.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Sets `key` to `value`, replacing any previous value.
    pub fn set_attr(&mut self, key: &str, value: impl Into<AttrValue>) {
        self.attrs.insert(key.to_string(), value.into());
    }

    /// Appends `items` to the string-list attribute `key`, skipping entries
    /// already present.
    ///
    /// A missing attribute, or one holding a non-list value, is replaced by a
    /// fresh list. Returns the number of entries actually added.
    pub fn extend_list_attr<I, S>(&mut self, key: &str, items: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !matches!(self.attrs.get(key), Some(AttrValue::StrList(_))) {
            self.attrs
                .insert(key.to_string(), AttrValue::StrList(Vec::new()));
        }
        let Some(AttrValue::StrList(list)) = self.attrs.get_mut(key) else {
            return 0;
        };

        let mut added = 0;
        for item in items {
            let item = item.into();
            if !list.contains(&item) {
                list.push(item);
                added += 1;
            }
        }
        added
    }
}

// =============================================================================
// Graph
// =============================================================================

/// Computation graph with forward and reverse adjacency.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    name: String,
    nodes: Vec<Node>,
    names: HashMap<String, NodeId>,
    edges: Vec<Edge>,
    incoming: Vec<Vec<EdgeIndex>>,
    outgoing: Vec<Vec<EdgeIndex>>,
    outputs: Vec<OutputRef>,
}

impl Graph {
    /// Creates an empty graph.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Adds a node and returns its handle.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateNode`] if a node with the same name exists.
    pub fn add_node(&mut self, node: Node) -> Result<NodeId, GraphError> {
        if self.names.contains_key(node.name()) {
            return Err(GraphError::DuplicateNode(node.name().to_string()));
        }

        let id = NodeId(self.nodes.len());
        trace!(name = node.name(), op_type:% = node.op_type(); "Adding node");
        self.names.insert(node.name().to_string(), id);
        self.nodes.push(node);
        self.incoming.push(Vec::new());
        self.outgoing.push(Vec::new());
        Ok(id)
    }

    /// Connects output slot `src_slot` of `src` to input slot `dst_slot` of `dst`.
    ///
    /// An output slot may feed any number of consumers; an input slot accepts
    /// at most one producer.
    ///
    /// # Errors
    ///
    /// Fails if either node is not part of this graph, if either slot is
    /// outside the node's slot count, or if the input slot is already fed.
    pub fn add_edge(
        &mut self,
        src: NodeId,
        src_slot: u32,
        dst: NodeId,
        dst_slot: u32,
    ) -> Result<EdgeIndex, GraphError> {
        let src_node = self.node(src).ok_or(GraphError::UnknownNode(src))?;
        if src_slot >= src_node.output_count() {
            return Err(GraphError::SlotOutOfRange {
                node: src_node.name().to_string(),
                direction: "output",
                slot: src_slot,
                count: src_node.output_count(),
            });
        }

        let dst_node = self.node(dst).ok_or(GraphError::UnknownNode(dst))?;
        if dst_slot >= dst_node.input_count() {
            return Err(GraphError::SlotOutOfRange {
                node: dst_node.name().to_string(),
                direction: "input",
                slot: dst_slot,
                count: dst_node.input_count(),
            });
        }
        if self.producer(dst, dst_slot).is_some() {
            return Err(GraphError::InputAlreadyConnected {
                node: dst_node.name().to_string(),
                slot: dst_slot,
            });
        }

        let idx = EdgeIndex(self.edges.len());
        self.edges.push(Edge {
            src: Endpoint {
                node: src,
                slot: src_slot,
            },
            dst: Endpoint {
                node: dst,
                slot: dst_slot,
            },
        });
        self.outgoing[src.0].push(idx);
        self.incoming[dst.0].push(idx);
        Ok(idx)
    }

    /// Looks up a node by name.
    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Iterates over all nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| (NodeId(idx), node))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns the edge at `idx`.
    ///
    /// # Panics
    ///
    /// Panics if the index does not belong to this graph.
    pub fn edge(&self, idx: EdgeIndex) -> &Edge {
        &self.edges[idx.0]
    }

    /// Iterates over the edges feeding `id`, in insertion order.
    ///
    /// Yields nothing for a node that is not part of this graph.
    pub fn incoming_edges(&self, id: NodeId) -> impl Iterator<Item = &Edge> {
        self.incoming
            .get(id.0)
            .into_iter()
            .flatten()
            .map(|idx| &self.edges[idx.0])
    }

    /// Iterates over the edges leaving `id`, in insertion order.
    ///
    /// Yields nothing for a node that is not part of this graph.
    pub fn outgoing_edges(&self, id: NodeId) -> impl Iterator<Item = &Edge> {
        self.outgoing
            .get(id.0)
            .into_iter()
            .flatten()
            .map(|idx| &self.edges[idx.0])
    }

    /// Returns the producer feeding input slot `input_slot` of `id`.
    pub fn producer(&self, id: NodeId, input_slot: u32) -> Option<Endpoint> {
        self.incoming_edges(id)
            .find(|edge| edge.dst.slot == input_slot)
            .map(|edge| edge.src)
    }

    /// Returns `true` if the node has at least one incoming edge and no
    /// outgoing edges.
    pub fn is_sink(&self, id: NodeId) -> bool {
        let has_inputs = self.incoming.get(id.0).is_some_and(|edges| !edges.is_empty());
        let has_outputs = self.outgoing.get(id.0).is_some_and(|edges| !edges.is_empty());
        has_inputs && !has_outputs
    }

    /// Collects the distinct operator types used by the graph.
    pub fn op_types(&self) -> HashSet<OpType> {
        self.nodes.iter().map(Node::op_type).collect()
    }

    /// Replaces the authoritative output list.
    pub fn set_outputs(&mut self, outputs: Vec<OutputRef>) {
        self.outputs = outputs;
    }

    /// Returns the authoritative output list.
    pub fn outputs(&self) -> &[OutputRef] {
        &self.outputs
    }
}

impl Index<NodeId> for Graph {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Self::Output {
        &self.nodes[id.0]
    }
}

impl IndexMut<NodeId> for Graph {
    fn index_mut(&mut self, id: NodeId) -> &mut Self::Output {
        &mut self.nodes[id.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::attr;

    fn op(name: &str, inputs: u32, outputs: u32) -> Node {
        Node::new(name, "Op").with_inputs(inputs).with_outputs(outputs)
    }

    /// Builds `a -> b -> c`, each node having one input and one output slot.
    fn chain() -> (Graph, NodeId, NodeId, NodeId) {
        let mut graph = Graph::new("chain");
        let a = graph.add_node(Node::new("a", "Data").with_outputs(1)).unwrap();
        let b = graph.add_node(op("b", 1, 1)).unwrap();
        let c = graph.add_node(op("c", 1, 1)).unwrap();
        graph.add_edge(a, 0, b, 0).unwrap();
        graph.add_edge(b, 0, c, 0).unwrap();
        (graph, a, b, c)
    }

    #[test]
    fn test_graph_new() {
        let graph = Graph::new("empty");

        assert_eq!(graph.name(), "empty");
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.outputs().is_empty());
    }

    #[test]
    fn test_add_node_and_lookup() {
        let mut graph = Graph::new("g");
        let a = graph.add_node(op("a", 0, 1)).unwrap();
        let b = graph.add_node(op("b", 1, 0)).unwrap();

        assert_eq!(graph.find_node("a"), Some(a));
        assert_eq!(graph.find_node("b"), Some(b));
        assert_eq!(graph.find_node("c"), None);
        assert_eq!(graph[a].name(), "a");
        assert_eq!(graph[b].input_count(), 1);
    }

    #[test]
    fn test_add_node_rejects_duplicate_name() {
        let mut graph = Graph::new("g");
        graph.add_node(op("a", 0, 1)).unwrap();

        let err = graph.add_node(op("a", 1, 1)).unwrap_err();
        assert_eq!(err, GraphError::DuplicateNode("a".to_string()));
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_nodes_in_insertion_order() {
        let mut graph = Graph::new("g");
        for name in ["z", "a", "m"] {
            graph.add_node(op(name, 0, 1)).unwrap();
        }

        let names: Vec<&str> = graph.nodes().map(|(_, node)| node.name()).collect();
        assert_eq!(names, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_add_edge_validates_slots() {
        let mut graph = Graph::new("g");
        let a = graph.add_node(op("a", 0, 1)).unwrap();
        let b = graph.add_node(op("b", 1, 1)).unwrap();

        let err = graph.add_edge(a, 1, b, 0).unwrap_err();
        assert!(
            matches!(err, GraphError::SlotOutOfRange { direction: "output", .. }),
            "Expected output slot error, got {err:?}"
        );

        let err = graph.add_edge(a, 0, b, 3).unwrap_err();
        assert!(
            matches!(err, GraphError::SlotOutOfRange { direction: "input", .. }),
            "Expected input slot error, got {err:?}"
        );
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_add_edge_rejects_second_producer() {
        let mut graph = Graph::new("g");
        let a = graph.add_node(op("a", 0, 1)).unwrap();
        let b = graph.add_node(op("b", 0, 1)).unwrap();
        let c = graph.add_node(op("c", 1, 0)).unwrap();

        graph.add_edge(a, 0, c, 0).unwrap();
        let err = graph.add_edge(b, 0, c, 0).unwrap_err();
        assert_eq!(
            err,
            GraphError::InputAlreadyConnected {
                node: "c".to_string(),
                slot: 0
            }
        );
    }

    #[test]
    fn test_add_edge_rejects_foreign_node() {
        let mut other = Graph::new("other");
        for name in ["x", "y", "z"] {
            other.add_node(op(name, 1, 1)).unwrap();
        }
        let foreign = other.find_node("z").unwrap();

        let mut graph = Graph::new("g");
        let a = graph.add_node(op("a", 0, 1)).unwrap();

        assert_eq!(
            graph.add_edge(a, 0, foreign, 0),
            Err(GraphError::UnknownNode(foreign))
        );
    }

    #[test]
    fn test_fan_out_from_one_slot() {
        let mut graph = Graph::new("g");
        let a = graph.add_node(op("a", 0, 1)).unwrap();
        let b = graph.add_node(op("b", 1, 0)).unwrap();
        let c = graph.add_node(op("c", 1, 0)).unwrap();

        graph.add_edge(a, 0, b, 0).unwrap();
        graph.add_edge(a, 0, c, 0).unwrap();

        assert_eq!(graph.outgoing_edges(a).count(), 2);
        assert!(graph.is_sink(b));
        assert!(graph.is_sink(c));
    }

    #[test]
    fn test_producer_and_sinks() {
        let (graph, a, b, c) = chain();

        assert_eq!(graph.producer(c, 0), Some(Endpoint { node: b, slot: 0 }));
        assert_eq!(graph.producer(b, 0), Some(Endpoint { node: a, slot: 0 }));
        assert_eq!(graph.producer(a, 0), None);

        assert!(!graph.is_sink(a), "roots have no incoming edges");
        assert!(!graph.is_sink(b));
        assert!(graph.is_sink(c));
    }

    #[test]
    fn test_isolated_node_is_not_sink() {
        let mut graph = Graph::new("g");
        let lonely = graph.add_node(op("lonely", 0, 1)).unwrap();

        assert!(!graph.is_sink(lonely));
    }

    #[test]
    fn test_op_types_are_distinct() {
        let (graph, _, _, _) = chain();
        let types = graph.op_types();

        assert_eq!(types.len(), 2);
        assert!(types.contains(&OpType::new("Data")));
        assert!(types.contains(&OpType::new("Op")));
    }

    #[test]
    fn test_set_outputs() {
        let (mut graph, _, _, c) = chain();
        graph.set_outputs(vec![OutputRef { node: c, index: 0 }]);

        assert_eq!(graph.outputs(), &[OutputRef { node: c, index: 0 }]);
    }

    #[test]
    fn test_extend_list_attr_is_set_like() {
        let (mut graph, _, _, c) = chain();
        let node = &mut graph[c];

        assert_eq!(node.extend_list_attr(attr::OUTPUT_DTYPE_OVERRIDE, ["0:DT_FLOAT16"]), 1);
        assert_eq!(
            node.extend_list_attr(attr::OUTPUT_DTYPE_OVERRIDE, ["0:DT_FLOAT16", "1:DT_UINT8"]),
            1
        );
        assert_eq!(node.extend_list_attr(attr::OUTPUT_DTYPE_OVERRIDE, ["1:DT_UINT8"]), 0);

        let list = node.attr(attr::OUTPUT_DTYPE_OVERRIDE).and_then(AttrValue::as_list);
        assert_eq!(
            list,
            Some(&["0:DT_FLOAT16".to_string(), "1:DT_UINT8".to_string()][..])
        );
    }

    #[test]
    fn test_extend_list_attr_replaces_scalar() {
        let mut node = op("n", 1, 1);
        node.set_attr("k", "scalar");

        node.extend_list_attr("k", ["x"]);
        assert_eq!(node.attr("k"), Some(&AttrValue::StrList(vec!["x".to_string()])));
    }
}

#[cfg(test)]
mod proptest_tests {
    use std::collections::BTreeSet;

    use proptest::prelude::*;

    use super::*;

    // ===================
    // Strategies
    // ===================

    /// Strategy for a node count and a set of forward edges `(src, dst)` with
    /// `src < dst`, so every generated graph is acyclic.
    fn dag_strategy() -> impl Strategy<Value = (usize, BTreeSet<(usize, usize)>)> {
        (2usize..16).prop_flat_map(|count| {
            let edge = (0..count - 1).prop_flat_map(move |src| (Just(src), src + 1..count));
            (Just(count), prop::collection::btree_set(edge, 0..32))
        })
    }

    /// Builds the graph: every node has `count` input slots, and the edge
    /// `(src, dst)` lands on input slot `src` of `dst`, so no slot is fed twice.
    fn build(count: usize, edges: &BTreeSet<(usize, usize)>) -> Graph {
        let mut graph = Graph::new("dag");
        let ids: Vec<NodeId> = (0..count)
            .map(|i| {
                let node = Node::new(format!("n{i}"), "Op")
                    .with_inputs(count as u32)
                    .with_outputs(1);
                graph.add_node(node).unwrap()
            })
            .collect();
        for &(src, dst) in edges {
            graph.add_edge(ids[src], 0, ids[dst], src as u32).unwrap();
        }
        graph
    }

    // ===================
    // Property Test Functions
    // ===================

    /// Every edge is indexed exactly once from each end.
    fn check_adjacency_is_consistent(
        count: usize,
        edges: &BTreeSet<(usize, usize)>,
    ) -> Result<(), TestCaseError> {
        let graph = build(count, edges);

        let incoming: usize = graph.nodes().map(|(id, _)| graph.incoming_edges(id).count()).sum();
        let outgoing: usize = graph.nodes().map(|(id, _)| graph.outgoing_edges(id).count()).sum();
        prop_assert_eq!(incoming, edges.len());
        prop_assert_eq!(outgoing, edges.len());

        for &(src, dst) in edges {
            let producer = graph.producer(NodeId(dst), src as u32);
            prop_assert_eq!(producer, Some(Endpoint { node: NodeId(src), slot: 0 }));
        }
        Ok(())
    }

    /// A node is a sink exactly when it is fed and feeds nothing.
    fn check_sink_definition(
        count: usize,
        edges: &BTreeSet<(usize, usize)>,
    ) -> Result<(), TestCaseError> {
        let graph = build(count, edges);

        for i in 0..count {
            let fed = edges.iter().any(|&(_, dst)| dst == i);
            let feeds = edges.iter().any(|&(src, _)| src == i);
            prop_assert_eq!(graph.is_sink(NodeId(i)), fed && !feeds, "node n{}", i);
        }
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn adjacency_is_consistent((count, edges) in dag_strategy()) {
            check_adjacency_is_consistent(count, &edges)?;
        }

        #[test]
        fn sink_definition_holds((count, edges) in dag_strategy()) {
            check_sink_definition(count, &edges)?;
        }
    }
}
