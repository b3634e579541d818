//! Transform and condition trees
//!
//! Property values and entity filters in a flight are declared as lists of
//! self-describing nodes. Each node carries exactly one kind key from the
//! `transforms.` or `conditions.` namespace; its other keys are arguments,
//! some of which hold nested node lists.
//!
//! This module reads those lists into typed [`Node`]s, writes them back in the
//! document syntax, discovers the source columns they reference and removes
//! a column from them.

pub mod delete;
pub mod error;
pub mod node;
pub mod parser;
pub mod writer;

pub use delete::delete_column;
pub use error::{TransformError, TransformResult};
pub use node::{
    Arg, Namespace, Node, NodeKind, Scalar, columns, kinds_used, mentions_argument, timezone_present,
};
pub use parser::{Parsed, normalize_tags, parse, parse_node, parse_str, to_scalar};
pub use writer::{quote, write_nodes};
