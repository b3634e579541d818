//! Writing transform and condition trees in the flight document syntax
//!
//! List items sit at the indentation of their parent key and arguments two
//! spaces deeper:
//!
//! ```text
//! transforms:
//! - !<transforms.ConcatCombineTransform>
//!   transforms:
//!   - !<transforms.ColumnTransform>
//!     column: "a"
//! ```

use super::node::{Arg, Node, Scalar};
use std::fmt::{self, Write};

/// Render `nodes` as list items indented by `depth` spaces
pub fn write_nodes(nodes: &[Node], depth: usize) -> String {
    NodeList { nodes, depth }.to_string()
}

struct NodeList<'a> {
    nodes: &'a [Node],
    depth: usize,
}

impl fmt::Display for NodeList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in self.nodes {
            write_node(f, node, self.depth)?;
        }
        Ok(())
    }
}

fn write_node(out: &mut impl Write, node: &Node, depth: usize) -> fmt::Result {
    let pad = " ".repeat(depth);
    let inner = " ".repeat(depth + 2);

    if node.args.is_empty() {
        return writeln!(out, "{pad}- !<{}> {{}}", node.kind.tag());
    }
    writeln!(out, "{pad}- !<{}>", node.kind.tag())?;
    for (key, arg) in &node.args {
        write!(out, "{inner}{key}:")?;
        match arg {
            Arg::Nodes(children) if children.is_empty() => out.write_str(" []\n")?,
            Arg::Nodes(children) => {
                out.write_char('\n')?;
                for child in children {
                    write_node(out, child, depth + 2)?;
                }
            }
            Arg::Column(column) => writeln!(out, " {}", quote(column))?,
            Arg::Columns(columns) => {
                let items: Vec<String> = columns.iter().map(|c| quote(c)).collect();
                writeln!(out, " [{}]", items.join(", "))?;
            }
            Arg::List(items) => {
                let items: Vec<String> = items.iter().map(render_scalar).collect();
                writeln!(out, " [{}]", items.join(", "))?;
            }
            Arg::Scalar(scalar) => writeln!(out, " {}", render_scalar(scalar))?,
            Arg::Raw(value) => {
                let rendered = serde_json::to_string(value).map_err(|_| fmt::Error)?;
                writeln!(out, " {}", rendered)?;
            }
        }
    }
    Ok(())
}

/// Double-quote a string for a YAML document
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn render_scalar(scalar: &Scalar) -> String {
    match scalar {
        Scalar::String(s) => quote(s),
        Scalar::Bool(b) => b.to_string(),
        Scalar::Integer(i) => i.to_string(),
        Scalar::Float(f) if f.is_nan() => ".nan".to_string(),
        Scalar::Float(f) if f.is_infinite() && f.is_sign_positive() => ".inf".to_string(),
        Scalar::Float(f) if f.is_infinite() => "-.inf".to_string(),
        Scalar::Float(f) => format!("{:?}", f),
        Scalar::Null => "null".to_string(),
    }
}
