//! Typed transform and condition nodes

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

const SHUTTLE_PREFIX: &str = "com.openlattice.shuttle.";

/// Which family a node kind belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Namespace {
    Transforms,
    Conditions,
}

impl Namespace {
    pub fn prefix(&self) -> &'static str {
        match self {
            Namespace::Transforms => "transforms.",
            Namespace::Conditions => "conditions.",
        }
    }
}

/// Kind of a transform or condition node.
///
/// Known kinds have their own variant; any other name inside a known
/// namespace is kept as `Other` so documents using newer kinds survive a
/// read/write cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    Column,
    Value,
    Concat,
    ConcatCombine,
    Hash,
    DateTime,
    Date,
    DateAsDateTime,
    DateTimeAsDate,
    Time,
    ParseInt,
    ParseDouble,
    ParseBool,
    GeographyPoint,
    IsNull,
    ConditionalOr,
    ConditionalAnd,
    Other(Namespace, String),
}

const KNOWN: &[(NodeKind, Namespace, &str)] = &[
    (NodeKind::Column, Namespace::Transforms, "ColumnTransform"),
    (NodeKind::Value, Namespace::Transforms, "ValueTransform"),
    (NodeKind::Concat, Namespace::Transforms, "ConcatTransform"),
    (NodeKind::ConcatCombine, Namespace::Transforms, "ConcatCombineTransform"),
    (NodeKind::Hash, Namespace::Transforms, "HashTransform"),
    (NodeKind::DateTime, Namespace::Transforms, "DateTimeTransform"),
    (NodeKind::Date, Namespace::Transforms, "DateTransform"),
    (NodeKind::DateAsDateTime, Namespace::Transforms, "DateAsDateTimeTransform"),
    (NodeKind::DateTimeAsDate, Namespace::Transforms, "DateTimeAsDateTransform"),
    (NodeKind::Time, Namespace::Transforms, "TimeTransform"),
    (NodeKind::ParseInt, Namespace::Transforms, "ParseIntTransform"),
    (NodeKind::ParseDouble, Namespace::Transforms, "ParseDoubleTransform"),
    (NodeKind::ParseBool, Namespace::Transforms, "ParseBoolTransform"),
    (NodeKind::GeographyPoint, Namespace::Transforms, "GeographyPointTransform"),
    (NodeKind::IsNull, Namespace::Conditions, "BooleanIsNullCondition"),
    (NodeKind::ConditionalOr, Namespace::Conditions, "ConditionalOr"),
    (NodeKind::ConditionalAnd, Namespace::Conditions, "ConditionalAnd"),
];

impl NodeKind {
    /// Parse a kind key such as `transforms.HashTransform`.
    ///
    /// The fully qualified `com.openlattice.shuttle.` form is accepted too.
    /// Returns `None` for keys outside both namespaces.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.strip_prefix(SHUTTLE_PREFIX).unwrap_or(tag);
        let (namespace, name) = if let Some(name) = tag.strip_prefix(Namespace::Transforms.prefix()) {
            (Namespace::Transforms, name)
        } else if let Some(name) = tag.strip_prefix(Namespace::Conditions.prefix()) {
            (Namespace::Conditions, name)
        } else {
            return None;
        };
        if name.is_empty() {
            return None;
        }
        let known = KNOWN
            .iter()
            .find(|(_, ns, known_name)| *ns == namespace && *known_name == name)
            .map(|(kind, _, _)| kind.clone());
        Some(known.unwrap_or_else(|| NodeKind::Other(namespace, name.to_string())))
    }

    pub fn namespace(&self) -> Namespace {
        match self {
            NodeKind::Other(namespace, _) => *namespace,
            known => KNOWN
                .iter()
                .find(|(kind, _, _)| kind == known)
                .map(|(_, namespace, _)| *namespace)
                .unwrap_or(Namespace::Transforms),
        }
    }

    /// Short name without the namespace, e.g. `HashTransform`
    pub fn name(&self) -> &str {
        match self {
            NodeKind::Other(_, name) => name,
            known => KNOWN
                .iter()
                .find(|(kind, _, _)| kind == known)
                .map(|(_, _, name)| *name)
                .unwrap_or_default(),
        }
    }

    /// Full kind key, e.g. `transforms.HashTransform`
    pub fn tag(&self) -> String {
        format!("{}{}", self.namespace().prefix(), self.name())
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag())
    }
}

/// A scalar argument value
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    String(String),
    Bool(bool),
    Integer(i64),
    Float(f64),
    Null,
}

impl Scalar {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::String(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Integer(value)
    }
}

/// A node argument
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// Nested node list, e.g. the `transforms` of a combine
    Nodes(Vec<Node>),
    /// A single source column (keys starting with `column`)
    Column(String),
    /// Several source columns (keys starting with `column`)
    Columns(Vec<String>),
    List(Vec<Scalar>),
    Scalar(Scalar),
    /// Anything else, kept verbatim
    Raw(serde_yaml::Value),
}

impl Arg {
    fn references_columns(&self) -> bool {
        matches!(self, Arg::Column(_) | Arg::Columns(_) | Arg::Nodes(_))
    }
}

/// A transform or condition node
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub args: BTreeMap<String, Arg>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            args: BTreeMap::new(),
        }
    }

    pub fn with_arg(mut self, key: impl Into<String>, arg: Arg) -> Self {
        self.args.insert(key.into(), arg);
        self
    }

    /// `ColumnTransform` reading one column
    pub fn column(column: impl Into<String>) -> Self {
        Self::new(NodeKind::Column).with_arg("column", Arg::Column(column.into()))
    }

    /// `ValueTransform` producing a literal
    pub fn value(value: impl Into<Scalar>) -> Self {
        Self::new(NodeKind::Value).with_arg("value", Arg::Scalar(value.into()))
    }

    /// `ConcatTransform` over `columns`, with an optional separator
    pub fn concat(columns: Vec<String>, separator: Option<&str>) -> Self {
        let node = Self::new(NodeKind::Concat).with_arg("columns", Arg::Columns(columns));
        match separator {
            Some(separator) => node.with_arg("separator", Arg::Scalar(separator.into())),
            None => node,
        }
    }

    /// SHA-256 `HashTransform` over `columns`
    pub fn hash(columns: Vec<String>) -> Self {
        Self::new(NodeKind::Hash)
            .with_arg("columns", Arg::Columns(columns))
            .with_arg("hashFunction", Arg::Scalar("sha256".into()))
    }

    /// `ConcatCombineTransform` wrapping `children`
    pub fn combine(children: Vec<Node>) -> Self {
        Self::new(NodeKind::ConcatCombine).with_arg("transforms", Arg::Nodes(children))
    }

    /// `BooleanIsNullCondition` that passes rows where `column` is present
    pub fn is_not_null(column: impl Into<String>) -> Self {
        Self::new(NodeKind::IsNull)
            .with_arg("column", Arg::Column(column.into()))
            .with_arg("reverse", Arg::Scalar(Scalar::Bool(true)))
    }

    /// The `column` argument, if it is a single column
    pub fn column_arg(&self) -> Option<&str> {
        match self.args.get("column") {
            Some(Arg::Column(column)) => Some(column),
            _ => None,
        }
    }

    pub fn value_arg(&self) -> Option<&Scalar> {
        match self.args.get("value") {
            Some(Arg::Scalar(value)) => Some(value),
            _ => None,
        }
    }

    /// Nested node lists of this node, in argument order
    pub fn children(&self) -> impl Iterator<Item = &Node> {
        self.args.values().flat_map(|arg| match arg {
            Arg::Nodes(nodes) => nodes.as_slice(),
            _ => &[],
        })
    }

    /// Columns referenced anywhere in this node's subtree
    pub fn columns(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns(&self, out: &mut BTreeSet<String>) {
        for arg in self.args.values() {
            match arg {
                Arg::Column(column) => {
                    out.insert(column.clone());
                }
                Arg::Columns(columns) => out.extend(columns.iter().cloned()),
                Arg::Nodes(nodes) => nodes.iter().for_each(|n| n.collect_columns(out)),
                _ => {}
            }
        }
    }

    /// Whether any column, column list or nested node list is left
    pub fn has_sources(&self) -> bool {
        self.args.values().any(Arg::references_columns)
    }
}

/// Columns referenced anywhere in `nodes`
pub fn columns(nodes: &[Node]) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    for node in nodes {
        node.collect_columns(&mut out);
    }
    out
}

/// Every kind used in `nodes`, nested kinds included
pub fn kinds_used(nodes: &[Node]) -> BTreeSet<NodeKind> {
    let mut out = BTreeSet::new();
    let mut stack: Vec<&Node> = nodes.iter().collect();
    while let Some(node) = stack.pop() {
        out.insert(node.kind.clone());
        stack.extend(node.children());
    }
    out
}

/// Whether any node in the tree has an argument whose key contains `key`, ignoring case
pub fn mentions_argument(nodes: &[Node], key: &str) -> bool {
    let key = key.to_lowercase();
    let mut stack: Vec<&Node> = nodes.iter().collect();
    while let Some(node) = stack.pop() {
        if node.args.keys().any(|k| k.to_lowercase().contains(&key)) {
            return true;
        }
        stack.extend(node.children());
    }
    false
}

/// Whether a timezone argument is given anywhere in the tree
pub fn timezone_present(nodes: &[Node]) -> bool {
    mentions_argument(nodes, "timezone")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_round_trip_for_known_kinds() {
        for (kind, _, _) in KNOWN {
            assert_eq!(NodeKind::from_tag(&kind.tag()).as_ref(), Some(kind));
        }
    }

    #[test]
    fn test_from_tag_accepts_qualified_prefix() {
        assert_eq!(
            NodeKind::from_tag("com.openlattice.shuttle.transforms.HashTransform"),
            Some(NodeKind::Hash)
        );
        assert_eq!(
            NodeKind::from_tag("conditions.BooleanIsNullCondition"),
            Some(NodeKind::IsNull)
        );
    }

    #[test]
    fn test_unknown_kind_is_kept() {
        let kind = NodeKind::from_tag("transforms.SplitTransform").unwrap();
        assert_eq!(kind, NodeKind::Other(Namespace::Transforms, "SplitTransform".to_string()));
        assert_eq!(kind.tag(), "transforms.SplitTransform");
        assert!(NodeKind::from_tag("column").is_none());
        assert!(NodeKind::from_tag("transforms.").is_none());
    }

    #[test]
    fn test_columns_and_kinds_are_recursive() {
        let nodes = vec![Node::combine(vec![
            Node::hash(vec!["a".into(), "b".into()]),
            Node::value("suffix"),
        ])];
        let cols: Vec<_> = columns(&nodes).into_iter().collect();
        assert_eq!(cols, vec!["a", "b"]);
        let kinds = kinds_used(&nodes);
        assert!(kinds.contains(&NodeKind::ConcatCombine));
        assert!(kinds.contains(&NodeKind::Hash));
        assert!(kinds.contains(&NodeKind::Value));
    }

    #[test]
    fn test_mentions_argument_ignores_case() {
        let nodes = vec![Node::new(NodeKind::DateTime)
            .with_arg("timeZone", Arg::Scalar("America/New_York".into()))];
        assert!(mentions_argument(&nodes, "timezone"));
        assert!(!mentions_argument(&nodes, "pattern"));
        assert!(timezone_present(&nodes));
    }
}
