//! TOML graph descriptions.
//!
//! The CLI stands in for a model importer: it reads a small TOML file
//! describing nodes and edges and builds the [`Graph`] the directives are
//! applied to.
//!
//! ```toml
//! top_names = ["prob"]
//! default_outputs = [{ node = "softmax", index = 0 }]
//!
//! [[node]]
//! name = "data"
//! type = "Data"
//! outputs = 1
//! shape = [1, 3, 224, 224]
//!
//! [[node]]
//! name = "softmax"
//! type = "Softmax"
//! inputs = 1
//! outputs = 1
//! tops = ["prob"]
//!
//! [[edge]]
//! src = "data"
//! dst = "softmax"
//! ```

use std::{collections::HashMap, io};

use log::{debug, trace};
use serde::Deserialize;
use thiserror::Error;

use modelpin::{
    ModelpinError,
    context::SessionContext,
    graph::{Graph, GraphError, Node, NodeId},
};

/// Errors raised while reading a graph description.
#[derive(Debug, Error)]
pub enum GraphFileError {
    #[error("Failed to parse graph description: {0}")]
    Parse(String),

    #[error("Edge {edge} refers to unknown node `{name}`")]
    UnknownNode { edge: usize, name: String },

    #[error(transparent)]
    Build(#[from] GraphError),
}

impl From<GraphFileError> for ModelpinError {
    fn from(err: GraphFileError) -> Self {
        match err {
            GraphFileError::Build(err) => ModelpinError::GraphBuild(err),
            other => ModelpinError::Io(io::Error::new(io::ErrorKind::InvalidData, other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct NodeDecl {
    name: String,
    #[serde(rename = "type")]
    op_type: String,
    #[serde(default)]
    inputs: u32,
    #[serde(default)]
    outputs: u32,
    #[serde(default)]
    shape: Vec<i64>,
    /// Top blob produced at each output slot.
    #[serde(default)]
    tops: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct EdgeDecl {
    src: String,
    #[serde(default)]
    src_slot: u32,
    dst: String,
    #[serde(default)]
    dst_slot: u32,
}

#[derive(Debug, Clone, Deserialize)]
struct OutputDecl {
    node: String,
    #[serde(default)]
    index: u32,
}

/// A parsed graph description.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphFile {
    #[serde(default, rename = "node")]
    nodes: Vec<NodeDecl>,
    #[serde(default, rename = "edge")]
    edges: Vec<EdgeDecl>,
    #[serde(default)]
    default_outputs: Vec<OutputDecl>,
    #[serde(default)]
    top_names: Vec<String>,
}

impl GraphFile {
    /// Parses a graph description from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, GraphFileError> {
        let file: GraphFile =
            toml::from_str(text).map_err(|err| GraphFileError::Parse(err.to_string()))?;
        debug!(nodes = file.nodes.len(), edges = file.edges.len(); "Graph description parsed");
        Ok(file)
    }

    /// Builds the graph named `name`.
    ///
    /// # Errors
    ///
    /// Fails on duplicate nodes, edges naming unknown nodes, and slots out of
    /// range.
    pub fn build(&self, name: impl Into<String>) -> Result<Graph, GraphFileError> {
        let mut graph = Graph::new(name);
        let mut ids: HashMap<&str, NodeId> = HashMap::with_capacity(self.nodes.len());

        for decl in &self.nodes {
            let node = Node::new(decl.name.as_str(), decl.op_type.as_str())
                .with_inputs(decl.inputs)
                .with_outputs(decl.outputs)
                .with_shape(decl.shape.clone());
            let id = graph.add_node(node)?;
            ids.insert(decl.name.as_str(), id);
        }

        for (pos, edge) in self.edges.iter().enumerate() {
            let lookup = |name: &str| {
                ids.get(name)
                    .copied()
                    .ok_or_else(|| GraphFileError::UnknownNode {
                        edge: pos,
                        name: name.to_string(),
                    })
            };
            let src = lookup(&edge.src)?;
            let dst = lookup(&edge.dst)?;
            graph.add_edge(src, edge.src_slot, dst, edge.dst_slot)?;
            trace!(src = edge.src, dst = edge.dst; "Edge added");
        }

        Ok(graph)
    }

    /// Records the importer-provided default outputs, top names and the
    /// top-blob table used to resolve bare top names in `out_nodes`.
    pub fn record_into(&self, ctx: &mut SessionContext) {
        ctx.record_default_outputs(
            self.default_outputs
                .iter()
                .map(|output| (output.node.clone(), output.index))
                .collect(),
        );
        ctx.record_top_names(self.top_names.clone());
        ctx.record_top_blobs(self.nodes.iter().flat_map(|decl| {
            (0u32..)
                .zip(&decl.tops)
                .map(move |(index, top)| (top.clone(), (decl.name.clone(), index)))
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
top_names = ["prob"]
default_outputs = [{ node = "softmax" }]

[[node]]
name = "data"
type = "Data"
outputs = 1
shape = [1, 3, 224, 224]

[[node]]
name = "softmax"
type = "Softmax"
inputs = 1
outputs = 1
tops = ["prob"]

[[edge]]
src = "data"
dst = "softmax"
"#;

    #[test]
    fn test_build_sample() {
        let file = GraphFile::from_toml(SAMPLE).expect("Failed to parse");
        let graph = file.build("lenet").expect("Failed to build");

        assert_eq!(graph.name(), "lenet");
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);

        let data = graph.find_node("data").unwrap();
        assert_eq!(graph[data].shape(), &[1, 3, 224, 224]);
        assert!(graph[data].op_type().is_data());

        let mut ctx = SessionContext::default();
        file.record_into(&mut ctx);
        assert_eq!(ctx.default_out_nodes(), &[("softmax".to_string(), 0)]);
        assert_eq!(ctx.out_top_names(), &["prob".to_string()]);
        assert_eq!(ctx.top_blobs().get("prob"), Some(&("softmax".to_string(), 0)));
    }

    #[test]
    fn test_unknown_edge_node() {
        let file = GraphFile::from_toml(
            r#"
[[node]]
name = "a"
type = "Data"
outputs = 1

[[edge]]
src = "a"
dst = "b"
"#,
        )
        .unwrap();

        let err = file.build("g").unwrap_err();
        assert!(matches!(err, GraphFileError::UnknownNode { edge: 0, .. }));
    }

    #[test]
    fn test_slot_out_of_range() {
        let file = GraphFile::from_toml(
            r#"
[[node]]
name = "a"
type = "Data"
outputs = 1

[[node]]
name = "b"
type = "Relu"
inputs = 1

[[edge]]
src = "a"
src_slot = 3
dst = "b"
"#,
        )
        .unwrap();

        let err: ModelpinError = file.build("g").unwrap_err().into();
        assert!(matches!(err, ModelpinError::GraphBuild(_)));
    }

    #[test]
    fn test_malformed_toml() {
        let err = GraphFile::from_toml("[[node]]\nname = 3\n").unwrap_err();
        assert!(matches!(err, GraphFileError::Parse(_)));
    }
}
