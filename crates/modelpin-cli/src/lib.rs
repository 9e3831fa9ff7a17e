//! Modelpin CLI library
//!
//! This module contains the core CLI logic for the modelpin tool.

pub mod error_adapter;

mod args;
mod config;
mod graph_file;
mod report;

pub use args::Args;
pub use graph_file::{GraphFile, GraphFileError};
pub use report::Report;

use std::fs;

use log::{debug, info};

use modelpin::{Converter, ModelpinError, framework::Framework};

/// Run the modelpin CLI application
///
/// Loads the configuration, parses the directives, builds the graph from its
/// description, applies the directives and writes the report.
///
/// # Arguments
///
/// * `args` - Command-line arguments
///
/// # Errors
///
/// Returns `ModelpinError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Directive parsing errors
/// - Graph description and graph validation errors
pub fn run(args: &Args) -> Result<(), ModelpinError> {
    info!(input_path = args.input; "Processing graph");

    let mut app_config = config::load_config(args.config.as_ref())?;
    if let Some(framework) = &args.framework {
        let framework: Framework = framework.parse().map_err(ModelpinError::Config)?;
        app_config.set_framework(framework);
    }
    let directives = app_config.merged_directives(args.directive_overrides()?);
    debug!(directives:?; "Effective directives");

    let source = fs::read_to_string(&args.input)?;
    let graph_file = GraphFile::from_toml(&source)?;

    let converter = Converter::new(app_config);
    let mut ctx = converter.new_context();
    let graph_name = converter.parse_directives(&mut ctx, &directives)?;

    let mut graph = graph_file.build(graph_name)?;
    graph_file.record_into(&mut ctx);
    let outputs = converter.apply_to_graph(&mut ctx, &mut graph, &directives)?;

    let report = Report::new(&graph, &ctx, &outputs).to_toml()?;
    match &args.output {
        Some(path) => {
            fs::write(path, report)?;
            info!(output_file = path; "Report written");
        }
        None => print!("{report}"),
    }

    Ok(())
}
