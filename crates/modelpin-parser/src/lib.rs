//! # Modelpin Parser
//!
//! Stateless parsers for model-conversion directives. Each directive is a
//! short delimited text value (`input_shape`, `out_nodes`, `output_type`,
//! ...) and each parser turns it into a typed record or a [`Diagnostic`]
//! whose labels point into the raw directive text.
//!
//! Parsers never touch the graph and never retain state: callers commit a
//! record only when parsing succeeded.
//!
//! ## Usage
//!
//! ```
//! # use modelpin_core::framework::Framework;
//! # use modelpin_parser::{parse_input_shape, parse_out_nodes, Diagnostic};
//!
//! fn main() -> Result<(), Diagnostic> {
//!     let shapes = parse_input_shape("data:1,3,224,224", false)?;
//!     assert_eq!(shapes[0].dims, vec![1, 3, 224, 224]);
//!
//!     let outputs = parse_out_nodes("prob:0;logits:0", Framework::Tensorflow)?;
//!     assert_eq!(outputs.user_out_nodes().count(), 2);
//!     Ok(())
//! }
//! ```

mod bool_list;
pub mod error;
mod key;
mod node_list;
mod op_name_map;
mod options;
mod out_nodes;
mod output_type;
mod shape;
mod span;
mod token;

pub use bool_list::{parse_bool_flag, parse_bool_list};
pub use error::Diagnostic;
pub use key::{DirectiveKey, check_option_keys};
pub use node_list::{load_compress_weight_conf, parse_node_list};
pub use op_name_map::{load_op_name_map, parse_op_name_map};
pub use options::{parse_input_format, parse_log_level};
pub use out_nodes::{OutputSelection, OutputSelector, parse_out_nodes};
pub use output_type::{DtypeOverride, OutputTypeOverride, parse_output_type};
pub use shape::{ShapeEntry, parse_input_shape};
pub use span::{Span, Spanned};
