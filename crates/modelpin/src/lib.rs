//! Modelpin - resolve model outputs and pin conversion directives onto a graph.
//!
//! A conversion runs in two phases. [`Converter::parse_directives`] turns the
//! raw directive options into a [`SessionContext`] before any graph exists.
//! Once the graph is built, [`Converter::apply_to_graph`] validates the
//! directives against it, writes the override attributes and resolves the
//! model outputs.

pub mod config;
pub mod context;
pub mod resolve;
pub mod validate;

mod error;

pub use modelpin_core::{attr, framework, graph, op_type, tensor};
pub use modelpin_parser::{Diagnostic, DirectiveKey, error::ErrorKind};

pub use error::ModelpinError;

use std::time::{SystemTime, UNIX_EPOCH};

use indexmap::IndexMap;
use log::{debug, info, trace};

use modelpin_core::graph::Graph;
use modelpin_parser as parser;

use config::AppConfig;
use context::{ResolvedOutput, SessionContext, SessionState};

/// Drives directive parsing and graph application for one configuration.
///
/// # Examples
///
/// ```rust
/// use indexmap::IndexMap;
/// use modelpin::{
///     Converter,
///     graph::{Graph, Node},
///     op_type::DATA,
/// };
///
/// let converter = Converter::default();
/// let mut ctx = converter.new_context();
///
/// let mut directives = IndexMap::new();
/// directives.insert("output".to_string(), "resnet".to_string());
/// let name = converter
///     .parse_directives(&mut ctx, &directives)
///     .expect("Failed to parse directives");
/// assert_eq!(name, "resnet");
///
/// let mut graph = Graph::new(name);
/// let x = graph.add_node(Node::new("x", DATA).with_outputs(1)).unwrap();
/// let y = graph.add_node(Node::new("y", "Relu").with_inputs(1).with_outputs(1)).unwrap();
/// graph.add_edge(x, 0, y, 0).unwrap();
///
/// let outputs = converter
///     .apply_to_graph(&mut ctx, &mut graph, &directives)
///     .expect("Failed to resolve outputs");
/// assert_eq!(outputs[0].display_name, "y:0");
/// ```
#[derive(Debug, Default)]
pub struct Converter {
    config: AppConfig,
}

impl Converter {
    /// Create a new converter with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Creates an empty session for the configured framework.
    pub fn new_context(&self) -> SessionContext {
        SessionContext::new(self.config.framework())
    }

    /// Parses the graph-independent directives into `ctx`.
    ///
    /// Every directive family is replaced: a directive that is absent clears
    /// what an earlier call committed. Returns the graph name, taken from the
    /// `output` directive or generated from the configured prefix.
    ///
    /// # Errors
    ///
    /// Returns [`ModelpinError::Directive`] carrying the raw directive text for
    /// the first directive that fails to parse. Nothing is committed for the
    /// failing directive.
    pub fn parse_directives(
        &self,
        ctx: &mut SessionContext,
        directives: &IndexMap<String, String>,
    ) -> Result<String, ModelpinError> {
        info!(framework:% = ctx.framework(), count = directives.len(); "Parsing directives");

        parser::check_option_keys(directives.keys().map(String::as_str)).map_err(|diag| {
            let src = diag.parameter().unwrap_or_default().to_string();
            ModelpinError::new_directive_error(diag, src)
        })?;

        let get = |key: DirectiveKey| directives.get(key.as_str()).map_or("", String::as_str);

        let spec = get(DirectiveKey::Log);
        let level = if spec.is_empty() {
            None
        } else {
            parser::parse_log_level(spec).map_err(directive_error(spec))?
        };
        if let Some(level) = level {
            log::set_max_level(level);
            debug!(level:%; "Log level set from directive");
        }

        let spec = get(DirectiveKey::InputFormat);
        let format =
            parser::parse_input_format(spec, ctx.framework()).map_err(directive_error(spec))?;
        ctx.commit_input_format(format);

        let spec = get(DirectiveKey::IsDynamicInput);
        let dynamic = if spec.is_empty() {
            false
        } else {
            parser::parse_bool_flag(spec, DirectiveKey::IsDynamicInput)
                .map_err(directive_error(spec))?
        };

        let spec = get(DirectiveKey::InputShape);
        let shapes = parser::parse_input_shape(spec, dynamic).map_err(directive_error(spec))?;
        ctx.commit_input_shape(dynamic, shapes);

        let spec = get(DirectiveKey::OutNodes);
        let selection =
            parser::parse_out_nodes(spec, ctx.framework()).map_err(directive_error(spec))?;
        ctx.commit_out_nodes(&selection);

        let spec = get(DirectiveKey::OutputType);
        let output_type = if spec.is_empty() {
            None
        } else {
            Some(
                parser::parse_output_type(spec, ctx.user_out_nodes())
                    .map_err(directive_error(spec))?,
            )
        };
        ctx.commit_output_type(output_type);

        let spec = get(DirectiveKey::IsOutputAdjustHwLayout);
        let adjust = parser::parse_bool_list(spec, DirectiveKey::IsOutputAdjustHwLayout)
            .map_err(directive_error(spec))?;
        ctx.commit_output_formats(&adjust);

        let path = get(DirectiveKey::OpNameMap);
        let op_conf_map = if path.is_empty() {
            Default::default()
        } else {
            parser::load_op_name_map(path).map_err(file_directive_error)?
        };
        ctx.commit_op_conf_map(op_conf_map);

        ctx.commit_scope_fusion_passes(get(DirectiveKey::EnableScopeFusionPasses));

        let graph_name = match get(DirectiveKey::Output) {
            "" => self.generated_graph_name(),
            name => name.to_string(),
        };

        ctx.mark_directives_parsed();
        info!(graph_name; "Directives parsed");
        trace!(ctx:?; "Session after parsing");
        Ok(graph_name)
    }

    /// Applies the graph-dependent directives to `graph` and resolves its
    /// outputs.
    ///
    /// `ctx` must have been filled by [`Self::parse_directives`].
    ///
    /// # Errors
    ///
    /// Directive text that fails to parse yields [`ModelpinError::Directive`];
    /// failures against the graph yield [`ModelpinError::Graph`].
    pub fn apply_to_graph(
        &self,
        ctx: &mut SessionContext,
        graph: &mut Graph,
        directives: &IndexMap<String, String>,
    ) -> Result<Vec<ResolvedOutput>, ModelpinError> {
        info!(graph = graph.name(), nodes = graph.node_count(); "Applying directives to graph");
        ctx.require_state(SessionState::DirectivesParsed, "apply_to_graph")
            .map_err(ModelpinError::Graph)?;
        let get = |key: DirectiveKey| directives.get(key.as_str()).map_or("", String::as_str);

        // The layout flags are checked even when no fp16 node is named.
        let spec = get(DirectiveKey::IsInputAdjustHwLayout);
        let adjust = parser::parse_bool_list(spec, DirectiveKey::IsInputAdjustHwLayout)
            .map_err(directive_error(spec))?;
        let fp16_nodes = parser::parse_node_list(get(DirectiveKey::InputFp16Nodes));
        if !fp16_nodes.is_empty() {
            validate::apply_input_fp16_nodes(graph, &fp16_nodes, &adjust)
                .map_err(ModelpinError::Graph)?;
        }

        validate::validate_input_shapes(graph, ctx).map_err(ModelpinError::Graph)?;

        let path = get(DirectiveKey::CompressWeightConf);
        if !path.is_empty() {
            let nodes = parser::load_compress_weight_conf(path).map_err(file_directive_error)?;
            validate::apply_compress_weight(graph, &nodes);
        }

        let path = get(DirectiveKey::OpNameMap);
        if !path.is_empty() {
            validate::validate_op_name_map(graph, ctx.op_conf_map(), path)
                .map_err(ModelpinError::Graph)?;
        }

        let outputs = resolve::resolve_outputs(graph, ctx).map_err(ModelpinError::Graph)?;
        debug!(outputs = outputs.len(); "Graph outputs resolved");
        Ok(outputs)
    }

    fn generated_graph_name(&self) -> String {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();
        format!("{}_{secs}", self.config.graph_name_prefix())
    }
}

fn directive_error(src: &str) -> impl FnOnce(Diagnostic) -> ModelpinError + '_ {
    move |diag| ModelpinError::new_directive_error(diag, src)
}

/// File-backed directives report the path or the offending line as the value.
fn file_directive_error(diag: Diagnostic) -> ModelpinError {
    let src = diag.value().unwrap_or_default().to_string();
    ModelpinError::new_directive_error(diag, src)
}
