//! Graph output resolution.
//!
//! [`resolve_outputs`] decides which `(node, index)` pairs are the model's
//! outputs. User-declared `out_nodes` win, either as `name:index` pairs or as
//! top names looked up in the recorded top-blob table. Otherwise the
//! framework's static defaults are used, and failing those every sink of the
//! graph is an output.
//! A `NetOutput` sink is transparent: its producers are the outputs.
//!
//! Resolution only writes attributes and the output list, never topology,
//! so it can be re-run on the same graph.

use log::{debug, info, trace, warn};

use modelpin_core::{
    attr,
    graph::{Graph, NodeId, OutputRef},
    tensor::TensorFormat,
};
use modelpin_parser::{Diagnostic, DirectiveKey, error::ErrorCode};

use crate::context::{ResolvedOutput, SessionContext, SessionState};

/// Resolves the model outputs and records them on `graph` and `ctx`.
///
/// # Errors
///
/// - `NotFound` when a declared or default output node is not in the graph,
///   or a declared top name has no producer.
/// - `IndexOutOfRange` when a declared index exceeds the node's outputs.
/// - `InternalInvariant` when a `NetOutput` input slot has no producer, or
///   when directives have not been parsed yet.
pub fn resolve_outputs(
    graph: &mut Graph,
    ctx: &mut SessionContext,
) -> Result<Vec<ResolvedOutput>, Diagnostic> {
    ctx.require_state(SessionState::DirectivesParsed, "resolve_outputs")?;

    let by_top_name =
        ctx.user_out_nodes().is_empty() && !ctx.user_out_nodes_top_vec().is_empty();
    let outputs = if !ctx.user_out_nodes().is_empty() {
        let declared = indexed_outputs(graph, ctx.user_out_nodes())?;
        pin_user_outputs(graph, ctx, &declared);
        declared
    } else if by_top_name {
        let declared = top_name_outputs(graph, ctx)?;
        pin_user_outputs(graph, ctx, &declared);
        declared
    } else {
        default_outputs(graph, ctx)?
    };

    let top_names = if by_top_name {
        ctx.user_out_nodes_top_vec()
    } else {
        ctx.out_top_names()
    };
    let resolved: Vec<ResolvedOutput> = outputs
        .iter()
        .enumerate()
        .map(|(pos, output)| ResolvedOutput {
            node: output.node,
            index: output.index,
            display_name: display_name(graph, top_names, pos, *output),
        })
        .collect();

    graph.set_outputs(outputs);
    ctx.set_resolved(resolved.clone());
    info!(outputs:? = ctx.net_out_nodes(); "Resolved graph outputs");
    Ok(resolved)
}

/// Looks up every `name:index` entry of `out_nodes`.
///
/// Nothing is written to the graph, so a failing entry leaves it untouched.
fn indexed_outputs(
    graph: &Graph,
    entries: &[(String, u32)],
) -> Result<Vec<OutputRef>, Diagnostic> {
    entries
        .iter()
        .map(|(name, index)| checked_output(graph, DirectiveKey::OutNodes, name, *index))
        .collect()
}

/// Maps bare top names of `out_nodes` to their producing `(node, index)`.
fn top_name_outputs(graph: &Graph, ctx: &SessionContext) -> Result<Vec<OutputRef>, Diagnostic> {
    ctx.user_out_nodes_top_vec()
        .iter()
        .map(|top| {
            let (name, index) = ctx.top_blobs().get(top).ok_or_else(|| {
                Diagnostic::error(format!("top name `{top}` is not produced by any node"))
                    .with_code(ErrorCode::E300)
                    .with_parameter(DirectiveKey::OutNodes.as_str())
                    .with_value(top.as_str())
                    .with_help("use a top name declared by the model")
            })?;
            trace!(top, node = name, index; "Top name resolved");
            checked_output(graph, DirectiveKey::OutNodes, name, *index)
        })
        .collect()
}

fn checked_output(
    graph: &Graph,
    key: DirectiveKey,
    name: &str,
    index: u32,
) -> Result<OutputRef, Diagnostic> {
    let id = find_output_node(graph, key, name)?;
    let output_count = graph[id].output_count();
    if index >= output_count {
        return Err(Diagnostic::error(format!(
            "output index {index} of node `{name}` is out of range"
        ))
        .with_code(ErrorCode::E301)
        .with_parameter(key.as_str())
        .with_value(format!("{name}:{index}"))
        .with_help(format!("node `{name}` has {output_count} output(s)")));
    }
    Ok(OutputRef { node: id, index })
}

/// Pins the output overrides onto each declared output node.
fn pin_user_outputs(graph: &mut Graph, ctx: &SessionContext, outputs: &[OutputRef]) {
    let dtype_entries = ctx
        .output_type()
        .map(|output_type| output_type.node_entries())
        .unwrap_or_default();

    for (pos, output) in outputs.iter().enumerate() {
        let dtypes = dtype_entries.get(graph[output.node].name()).cloned();
        let node = &mut graph[output.node];

        node.set_attr(attr::USER_DEFINED_OUTPUT, "true");
        if ctx.output_formats().get(pos) == Some(&TensorFormat::Nc1hwc0) {
            node.extend_list_attr(
                attr::OUTPUT_LAYOUT_OVERRIDE,
                [format!("{}:{}", output.index, TensorFormat::Nc1hwc0)],
            );
        }
        if let Some(entries) = dtypes {
            node.extend_list_attr(attr::OUTPUT_DTYPE_OVERRIDE, entries);
        }

        trace!(node = node.name(), index = output.index; "User-declared output");
    }
}

fn default_outputs(graph: &Graph, ctx: &SessionContext) -> Result<Vec<OutputRef>, Diagnostic> {
    if ctx.capabilities().has_static_default_outputs() && !ctx.default_out_nodes().is_empty() {
        debug!(count = ctx.default_out_nodes().len(); "Using framework default outputs");
        return ctx
            .default_out_nodes()
            .iter()
            .map(|(name, index)| {
                find_output_node(graph, DirectiveKey::OutNodes, name).map(|node| OutputRef {
                    node,
                    index: *index,
                })
            })
            .collect();
    }

    let mut outputs = Vec::new();
    for (id, node) in graph.nodes() {
        if !graph.is_sink(id) {
            continue;
        }
        if node.op_type().is_net_output() {
            for slot in 0..node.input_count() {
                let producer = graph.producer(id, slot).ok_or_else(|| {
                    Diagnostic::error(format!(
                        "input {slot} of `{}` has no producer",
                        node.name()
                    ))
                    .with_code(ErrorCode::E302)
                    .with_parameter(node.name())
                    .with_value(slot.to_string())
                })?;
                outputs.push(OutputRef {
                    node: producer.node,
                    index: producer.slot,
                });
            }
        } else {
            outputs.extend((0..node.output_count()).map(|index| OutputRef { node: id, index }));
        }
    }
    debug!(count = outputs.len(); "Discovered default outputs from sinks");
    Ok(outputs)
}

fn find_output_node(graph: &Graph, key: DirectiveKey, name: &str) -> Result<NodeId, Diagnostic> {
    graph.find_node(name).ok_or_else(|| {
        Diagnostic::error(format!("output node `{name}` is not in the graph"))
            .with_code(ErrorCode::E300)
            .with_parameter(key.as_str())
            .with_value(name)
    })
}

fn display_name(graph: &Graph, top_names: &[String], pos: usize, output: OutputRef) -> String {
    let base = format!("{}:{}", graph[output.node].name(), output.index);
    if top_names.is_empty() {
        return base;
    }
    match top_names.get(pos) {
        Some(top) => format!("{base}:{top}"),
        None => {
            warn!(output = base, pos; "No top name recorded for output");
            base
        }
    }
}
