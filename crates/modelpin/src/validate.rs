//! Directive-versus-graph validation.
//!
//! These checks run once the graph has been built. Each function either
//! validates a directive against the graph or applies an input-side
//! attribute directive, failing with a graph-phase [`Diagnostic`].

use std::collections::BTreeMap;

use log::{debug, info, warn};

use modelpin_core::{
    attr,
    graph::{Graph, NodeId},
    op_type::OpType,
    tensor::{DataType, TensorFormat},
};
use modelpin_parser::{Diagnostic, DirectiveKey, error::ErrorCode};

use crate::context::{SessionContext, SessionState};

/// Checks declared input shapes against the graph.
///
/// # Errors
///
/// - `UnsupportedValue` when, outside dynamic-input mode, a `Data` node has a
///   negative declared dimension, or a declared input is not a `Data` node.
/// - `NotFound` when an `input_shape` name is not a graph node.
/// - `InternalInvariant` when directives have not been parsed yet.
pub fn validate_input_shapes(graph: &Graph, ctx: &SessionContext) -> Result<(), Diagnostic> {
    ctx.require_state(SessionState::DirectivesParsed, "validate_input_shapes")?;

    if !ctx.is_dynamic_input() {
        for (_, node) in graph.nodes().filter(|(_, node)| node.op_type().is_data()) {
            if let Some((pos, dim)) = node
                .shape()
                .iter()
                .enumerate()
                .find(|(_, dim)| **dim < 0)
            {
                return Err(Diagnostic::error(format!(
                    "dimension {pos} of input `{}` is unresolved ({dim})",
                    node.name()
                ))
                .with_code(ErrorCode::E202)
                .with_parameter(node.name())
                .with_value(dim.to_string())
                .with_help("set input_shape to specify its shape"));
            }
        }
    }

    for (name, _) in ctx.user_input_dims() {
        let id = lookup(graph, DirectiveKey::InputShape, name)?;
        require_data(graph, DirectiveKey::InputShape, id)?;
    }

    debug!(inputs = ctx.user_input_dims().len(); "Validated input shapes");
    Ok(())
}

/// Checks the op-name map loaded from `source` against the graph.
///
/// # Errors
///
/// `UnsupportedValue` when the map is empty or maps onto an operator type the
/// graph does not use.
pub fn validate_op_name_map(
    graph: &Graph,
    map: &BTreeMap<String, String>,
    source: &str,
) -> Result<(), Diagnostic> {
    if map.is_empty() {
        return Err(Diagnostic::error("the file content is empty")
            .with_code(ErrorCode::E203)
            .with_parameter(DirectiveKey::OpNameMap.as_str())
            .with_value(source));
    }

    let op_types = graph.op_types();
    for (custom, target) in map {
        if !op_types.contains(&OpType::new(target)) {
            return Err(Diagnostic::error(format!(
                "op type `{target}` mapped from `{custom}` is not used by the graph"
            ))
            .with_code(ErrorCode::E204)
            .with_parameter(DirectiveKey::OpNameMap.as_str())
            .with_value(target.as_str())
            .with_help(format!("check the mapping in {source}")));
        }
    }

    debug!(entries = map.len(); "Validated op_name_map");
    Ok(())
}

/// Marks the listed input nodes as FP16 inputs.
///
/// When the positionally aligned `adjust_layout` flag is `true` the node also
/// takes the NC1HWC0 layout. Missing flags count as `false`.
///
/// # Errors
///
/// `NotFound` for an unknown node, `UnsupportedValue` for a non-`Data` node.
pub fn apply_input_fp16_nodes(
    graph: &mut Graph,
    nodes: &[String],
    adjust_layout: &[bool],
) -> Result<(), Diagnostic> {
    for (pos, name) in nodes.iter().enumerate() {
        let id = lookup(graph, DirectiveKey::InputFp16Nodes, name)?;
        require_data(graph, DirectiveKey::InputFp16Nodes, id)?;

        let node = &mut graph[id];
        node.set_attr(attr::INPUT_DTYPE_OVERRIDE, DataType::Float16.serial_name());
        if adjust_layout.get(pos).copied().unwrap_or(false) {
            node.set_attr(attr::INPUT_LAYOUT_OVERRIDE, TensorFormat::Nc1hwc0.as_str());
        }
        info!(node = name; "Input set to FP16");
    }
    Ok(())
}

/// Sets the `compress-weight` attribute on the listed nodes.
///
/// Names not present in the graph are skipped.
pub fn apply_compress_weight(graph: &mut Graph, nodes: &[String]) {
    for name in nodes {
        match graph.find_node(name) {
            Some(id) => graph[id].set_attr(attr::COMPRESS_WEIGHT, true),
            None => warn!(node = name; "Compress weight node not found in graph, skipping"),
        }
    }
}

fn lookup(graph: &Graph, key: DirectiveKey, name: &str) -> Result<NodeId, Diagnostic> {
    graph.find_node(name).ok_or_else(|| {
        Diagnostic::error(format!("node `{name}` from {key} is not in the graph"))
            .with_code(ErrorCode::E200)
            .with_parameter(key.as_str())
            .with_value(name)
    })
}

fn require_data(graph: &Graph, key: DirectiveKey, id: NodeId) -> Result<(), Diagnostic> {
    let node = &graph[id];
    if node.op_type().is_data() {
        return Ok(());
    }
    Err(Diagnostic::error(format!(
        "node `{}` from {key} is a {} node, not an input",
        node.name(),
        node.op_type()
    ))
    .with_code(ErrorCode::E201)
    .with_parameter(key.as_str())
    .with_value(node.name()))
}
