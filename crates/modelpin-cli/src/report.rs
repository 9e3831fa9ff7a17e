//! Conversion report written after a successful run.

use std::io;

use serde::Serialize;

use modelpin::{
    ModelpinError,
    context::{ResolvedOutput, SessionContext},
    graph::Graph,
};

/// Summary of one conversion, serialized as TOML.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    graph: String,
    framework: String,
    format: String,
    net_out_nodes: Vec<String>,
    #[serde(rename = "output")]
    outputs: Vec<ReportOutput>,
}

#[derive(Debug, Clone, Serialize)]
struct ReportOutput {
    name: String,
    node: String,
    index: u32,
    /// Attributes written onto the output node, rendered as strings.
    attrs: Vec<String>,
}

impl Report {
    pub fn new(graph: &Graph, ctx: &SessionContext, outputs: &[ResolvedOutput]) -> Self {
        let outputs = outputs
            .iter()
            .map(|output| {
                let node = &graph[output.node];
                ReportOutput {
                    name: output.display_name.clone(),
                    node: node.name().to_string(),
                    index: output.index,
                    attrs: node
                        .attrs()
                        .map(|(key, value)| format!("{key}={value}"))
                        .collect(),
                }
            })
            .collect();

        Self {
            graph: graph.name().to_string(),
            framework: ctx.framework().to_string(),
            format: ctx.format().to_string(),
            net_out_nodes: ctx.net_out_nodes().to_vec(),
            outputs,
        }
    }

    pub fn to_toml(&self) -> Result<String, ModelpinError> {
        toml::to_string(self)
            .map_err(|err| ModelpinError::Io(io::Error::new(io::ErrorKind::InvalidData, err)))
    }
}
