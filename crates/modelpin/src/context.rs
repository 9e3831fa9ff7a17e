//! Session context shared by the parse phase and the resolve phase.
//!
//! A [`SessionContext`] is created once per conversion. The directive commit
//! methods replace one directive family at a time; the resolver records its
//! answer through [`SessionContext::set_resolved`]. Nothing here is global:
//! independent conversions use independent contexts.

use std::collections::BTreeMap;

use indexmap::{IndexMap, IndexSet};
use log::{debug, trace};

use modelpin_core::{
    framework::{Capabilities, Framework},
    graph::NodeId,
    tensor::TensorFormat,
};
use modelpin_parser::{
    Diagnostic, OutputSelection, OutputTypeOverride, ShapeEntry, error::ErrorCode,
};

/// Lifecycle of a [`SessionContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum SessionState {
    #[default]
    Uninitialized,
    DirectivesParsed,
    OutputsResolved,
}

/// One resolved model output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutput {
    pub node: NodeId,
    pub index: u32,
    /// `"<node>:<index>"`, or `"<node>:<index>:<top>"` when a top name is known.
    pub display_name: String,
}

/// Parsed directives and derived state for one conversion.
#[derive(Debug, Clone)]
pub struct SessionContext {
    framework: Framework,
    format: TensorFormat,
    input_dims: IndexMap<String, Vec<i64>>,
    user_input_dims: Vec<(String, Vec<i64>)>,
    is_dynamic_input: bool,
    out_nodes_map: IndexMap<String, IndexSet<u32>>,
    user_out_nodes: Vec<(String, u32)>,
    user_out_nodes_top_vec: Vec<String>,
    output_formats: Vec<TensorFormat>,
    output_type: Option<OutputTypeOverride>,
    default_out_nodes: Vec<(String, u32)>,
    out_top_names: Vec<String>,
    top_blobs: IndexMap<String, (String, u32)>,
    op_conf_map: BTreeMap<String, String>,
    enable_scope_fusion_passes: String,
    resolved_outputs: Vec<ResolvedOutput>,
    net_out_nodes: Vec<String>,
    state: SessionState,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new(Framework::default())
    }
}

impl SessionContext {
    /// Creates an empty context for models exported from `framework`.
    pub fn new(framework: Framework) -> Self {
        Self {
            framework,
            format: framework.capabilities().default_input_format(),
            input_dims: IndexMap::new(),
            user_input_dims: Vec::new(),
            is_dynamic_input: false,
            out_nodes_map: IndexMap::new(),
            user_out_nodes: Vec::new(),
            user_out_nodes_top_vec: Vec::new(),
            output_formats: Vec::new(),
            output_type: None,
            default_out_nodes: Vec::new(),
            out_top_names: Vec::new(),
            top_blobs: IndexMap::new(),
            op_conf_map: BTreeMap::new(),
            enable_scope_fusion_passes: String::new(),
            resolved_outputs: Vec::new(),
            net_out_nodes: Vec::new(),
            state: SessionState::Uninitialized,
        }
    }

    /// Clears every field and returns the context to
    /// [`SessionState::Uninitialized`]. The framework is kept.
    pub fn reset(&mut self) {
        debug!(framework:% = self.framework; "Resetting session context");
        *self = Self::new(self.framework);
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn framework(&self) -> Framework {
        self.framework
    }

    pub fn capabilities(&self) -> Capabilities {
        self.framework.capabilities()
    }

    pub fn format(&self) -> TensorFormat {
        self.format
    }

    /// Declared input shapes keyed by name; a later duplicate wins.
    pub fn input_dims(&self) -> &IndexMap<String, Vec<i64>> {
        &self.input_dims
    }

    /// Declared input shapes in the order they were written, duplicates included.
    pub fn user_input_dims(&self) -> &[(String, Vec<i64>)] {
        &self.user_input_dims
    }

    pub fn is_dynamic_input(&self) -> bool {
        self.is_dynamic_input
    }

    pub fn out_nodes_map(&self) -> &IndexMap<String, IndexSet<u32>> {
        &self.out_nodes_map
    }

    pub fn user_out_nodes(&self) -> &[(String, u32)] {
        &self.user_out_nodes
    }

    pub fn user_out_nodes_top_vec(&self) -> &[String] {
        &self.user_out_nodes_top_vec
    }

    /// Output layouts aligned with [`Self::user_out_nodes`].
    pub fn output_formats(&self) -> &[TensorFormat] {
        &self.output_formats
    }

    pub fn output_type(&self) -> Option<&OutputTypeOverride> {
        self.output_type.as_ref()
    }

    pub fn default_out_nodes(&self) -> &[(String, u32)] {
        &self.default_out_nodes
    }

    pub fn out_top_names(&self) -> &[String] {
        &self.out_top_names
    }

    /// Top-blob name to producing `(node, index)`, as recorded by the graph builder.
    pub fn top_blobs(&self) -> &IndexMap<String, (String, u32)> {
        &self.top_blobs
    }

    pub fn op_conf_map(&self) -> &BTreeMap<String, String> {
        &self.op_conf_map
    }

    pub fn enable_scope_fusion_passes(&self) -> &str {
        &self.enable_scope_fusion_passes
    }

    pub fn resolved_outputs(&self) -> &[ResolvedOutput] {
        &self.resolved_outputs
    }

    /// Display names of the resolved outputs.
    pub fn net_out_nodes(&self) -> &[String] {
        &self.net_out_nodes
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    // =========================================================================
    // Directive commits
    // =========================================================================

    pub fn commit_input_format(&mut self, format: TensorFormat) {
        self.format = format;
    }

    /// Replaces the `input_shape` family.
    pub fn commit_input_shape(&mut self, dynamic: bool, entries: Vec<ShapeEntry>) {
        self.input_dims.clear();
        self.user_input_dims.clear();
        self.is_dynamic_input = dynamic;

        for ShapeEntry { name, dims } in entries {
            self.input_dims.insert(name.clone(), dims.clone());
            self.user_input_dims.push((name, dims));
        }
        trace!(input_dims:? = self.input_dims; "Committed input shapes");
    }

    /// Replaces the `out_nodes` family. Earlier selections are discarded,
    /// not merged.
    pub fn commit_out_nodes(&mut self, selection: &OutputSelection) {
        self.out_nodes_map = selection.out_nodes_map().clone();
        self.user_out_nodes = selection
            .user_out_nodes()
            .map(|(name, index)| (name.to_string(), index))
            .collect();
        self.user_out_nodes_top_vec = selection.top_names().map(str::to_string).collect();
        trace!(user_out_nodes:? = self.user_out_nodes; "Committed out_nodes");
    }

    /// Replaces the output layouts from the `is_output_adjust_hw_layout` flags.
    pub fn commit_output_formats(&mut self, adjust: &[bool]) {
        self.output_formats = adjust
            .iter()
            .map(|&flag| {
                if flag {
                    TensorFormat::Nc1hwc0
                } else {
                    TensorFormat::Nd
                }
            })
            .collect();
    }

    pub fn commit_output_type(&mut self, output_type: Option<OutputTypeOverride>) {
        self.output_type = output_type;
    }

    pub fn commit_op_conf_map(&mut self, map: BTreeMap<String, String>) {
        self.op_conf_map = map;
    }

    pub fn commit_scope_fusion_passes(&mut self, passes: &str) {
        self.enable_scope_fusion_passes = passes.to_string();
    }

    // =========================================================================
    // Graph builder records
    // =========================================================================

    /// Records the static default outputs declared by the model file.
    ///
    /// Only consulted for frameworks with static default outputs.
    pub fn record_default_outputs(&mut self, outputs: Vec<(String, u32)>) {
        self.default_out_nodes = outputs;
    }

    /// Records top-blob names by resolved output position.
    pub fn record_top_names(&mut self, names: Vec<String>) {
        self.out_top_names = names;
    }

    /// Records which `(node, index)` produces each top blob.
    ///
    /// Bare top names in `out_nodes` are resolved through this table.
    pub fn record_top_blobs(&mut self, blobs: impl IntoIterator<Item = (String, (String, u32))>) {
        self.top_blobs = blobs.into_iter().collect();
    }

    // =========================================================================
    // State machine
    // =========================================================================

    pub fn mark_directives_parsed(&mut self) {
        self.state = SessionState::DirectivesParsed;
    }

    /// Checks that the context has reached at least `required`.
    ///
    /// # Errors
    ///
    /// Returns an `E303` diagnostic otherwise.
    pub fn require_state(&self, required: SessionState, operation: &str) -> Result<(), Diagnostic> {
        if self.state >= required {
            return Ok(());
        }
        Err(Diagnostic::error(format!(
            "{operation} requires the session to be in state {required:?}, but it is {:?}",
            self.state
        ))
        .with_code(ErrorCode::E303)
        .with_parameter(operation)
        .with_help("parse the conversion directives before applying them to a graph"))
    }

    /// Stores the resolver's answer and moves to [`SessionState::OutputsResolved`].
    pub fn set_resolved(&mut self, outputs: Vec<ResolvedOutput>) {
        self.net_out_nodes = outputs
            .iter()
            .map(|output| output.display_name.clone())
            .collect();
        self.resolved_outputs = outputs;
        self.state = SessionState::OutputsResolved;
    }
}
