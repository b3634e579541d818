//! Property definitions
//!
//! A property definition maps one source column, or a chain of transforms,
//! onto one property type of the target entity.

use super::schema::{PropertySchema, TreeSchema};
use crate::catalog::{self, EdmApi};
use crate::models::{Datatype, PropertyType};
use crate::transforms::{
    self, Arg, Node, NodeKind, Scalar, TransformError, TransformResult, to_scalar,
};
use crate::validation::ValidationReport;
use once_cell::sync::Lazy;
use once_cell::unsync::OnceCell;
use regex::Regex;
use serde_yaml::Value;
use std::collections::BTreeSet;
use tracing::debug;

static DATE_PARSER: Lazy<Regex> = Lazy::new(|| Regex::new(r"Date[A-Za-z]*Transform").unwrap());
static GEO_PARSER: Lazy<Regex> = Lazy::new(|| Regex::new(r"Geo[A-Za-z]+Transform").unwrap());
static TIME_PARSER: Lazy<Regex> = Lazy::new(|| Regex::new(r"Time[A-Za-z]*Transform").unwrap());
static NUMERIC_PARSER: Lazy<Regex> = Lazy::new(|| Regex::new(r"Parse[A-Za-z]+Transform").unwrap());

const TIME_PATTERNS: &[&str] = &["HH:mm:ss", "HH:mm:ss.S", "HH:mm:ss.SS", "HH:mm:ss.SSS"];
const DATETIME_PATTERNS: &[&str] = &[
    "yyyy-MM-dd HH:mm:ss",
    "yyyy-MM-dd HH:mm:ss.S",
    "yyyy-MM-dd HH:mm:ss.SS",
    "yyyy-MM-dd HH:mm:ss.SSS",
];

/// Parser kinds accepted for a datatype; the first is the one added when
/// none is present.
fn required_parsers(datatype: &Datatype) -> &'static [NodeKind] {
    match datatype {
        Datatype::TimeOfDay => &[NodeKind::Time],
        Datatype::Int16 | Datatype::Int32 | Datatype::Int64 => &[NodeKind::ParseInt],
        Datatype::Boolean | Datatype::Binary => &[NodeKind::ParseBool],
        Datatype::Double => &[NodeKind::ParseDouble],
        Datatype::Date => &[NodeKind::DateTimeAsDate, NodeKind::Date],
        Datatype::DateTimeOffset => &[NodeKind::DateTime, NodeKind::DateAsDateTime],
        _ => &[],
    }
}

/// Mapping of a source column or transform chain onto a property type
#[derive(Debug, Clone, Default)]
pub struct PropertyDefinition {
    /// Fqn of the target property type, `namespace.name`
    pub type_fqn: String,
    pub column: Option<String>,
    pub transforms: Vec<Node>,
    property_type: OnceCell<PropertyType>,
}

impl PropertyDefinition {
    pub fn new(type_fqn: impl Into<String>) -> Self {
        Self {
            type_fqn: type_fqn.into(),
            ..Self::default()
        }
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn with_transforms(mut self, transforms: Vec<Node>) -> Self {
        self.transforms = transforms;
        self
    }

    /// Read a property definition from its document form.
    ///
    /// Besides the `{type, column, transforms}` mapping, a bare string or a
    /// `value:` key reads as a `ValueTransform`, and a bare list or a
    /// `columns:` key reads as a `ConcatTransform` joined with `-`.
    pub fn from_value(value: &Value) -> TransformResult<Self> {
        match value {
            Value::String(literal) => {
                debug!("Interpreting {:?} as a ValueTransform", literal);
                Ok(Self::default().with_transforms(vec![Node::value(literal.as_str())]))
            }
            Value::Sequence(_) => Ok(Self::default().with_transforms(vec![concat_of(value)?])),
            Value::Mapping(map) => {
                let text = |key: &str| map.get(key).and_then(Value::as_str).unwrap_or_default();
                let mut definition = Self::new(text("type"));
                let column = text("column");
                if !column.is_empty() {
                    definition.column = Some(column.to_string());
                }
                if let Some(columns) = map.get("columns") {
                    debug!("Coercing columns of {} to a ConcatTransform", definition.type_fqn);
                    definition.transforms = vec![concat_of(columns)?];
                } else if let Some(literal) = map.get("value") {
                    debug!("Coercing value of {} to a ValueTransform", definition.type_fqn);
                    let scalar = to_scalar(literal)
                        .ok_or_else(|| TransformError::MalformedPayload("value".to_string()))?;
                    definition.transforms = vec![Node::value(scalar)];
                } else if let Some(chain) = map.get("transforms") {
                    definition.transforms = transforms::parse(chain)?.nodes;
                }
                Ok(definition)
            }
            other => Err(TransformError::NotAMapping(format!("{:?}", other))),
        }
    }

    /// The resolved property type, looked up on first use.
    ///
    /// A malformed fqn or a failed lookup resolves to the sentinel type.
    pub fn property_type(&self, edm: &dyn EdmApi) -> &PropertyType {
        self.property_type
            .get_or_init(|| catalog::resolve_property_type(edm, &self.type_fqn))
    }

    /// Forget the resolved property type
    pub fn clear_resolved(&mut self) {
        self.property_type = OnceCell::new();
    }

    pub fn get_schema(&self) -> PropertySchema {
        PropertySchema {
            fqn: self.type_fqn.clone(),
            column: self.column.clone(),
            transforms: TreeSchema::of(&self.transforms),
        }
    }

    /// `{column}` for a column-based definition, else the columns the
    /// transform chain reads
    pub fn get_columns(&self) -> BTreeSet<String> {
        match &self.column {
            Some(column) => BTreeSet::from([column.clone()]),
            None => transforms::columns(&self.transforms),
        }
    }

    /// Remove `column` from this definition.
    ///
    /// Returns whether the definition has nothing left and should be dropped.
    pub fn delete_column(&mut self, column: &str) -> bool {
        match &self.column {
            Some(own) => own == column,
            None => transforms::delete_column(&mut self.transforms, column),
        }
    }

    fn kind_names(&self) -> Vec<String> {
        transforms::kinds_used(&self.transforms)
            .iter()
            .map(|kind| kind.name().to_string())
            .collect()
    }

    /// Check that the transform chain parses values into the property's datatype
    pub fn check_datatype_parsers(&self, edm: &dyn EdmApi) -> ValidationReport {
        let mut report = ValidationReport::new(format!("Parser Validation for {}", self.type_fqn));
        let Some(datatype) = self.property_type(edm).datatype.clone() else {
            return report;
        };
        let kinds = self.kind_names();
        let uses = |pattern: &Regex| kinds.iter().any(|name| pattern.is_match(name));

        if datatype.is_date_family() {
            if !uses(&DATE_PARSER) {
                report.fail("No Date(time) parser");
            } else if !transforms::timezone_present(&self.transforms) {
                report.fail("No timezone");
            }
        } else if datatype.is_geography_family() {
            if !uses(&GEO_PARSER) {
                report.fail("No Geography parser");
            }
        } else if datatype.is_boolean() {
            if !kinds.iter().any(|name| name == "ParseBoolTransform") {
                report.fail("No Boolean parser");
            }
        } else if datatype.is_time_of_day() {
            if !uses(&TIME_PARSER) {
                report.fail("No Time parser");
            }
        } else if !datatype.is_string() && !uses(&NUMERIC_PARSER) {
            report.fail("No Numeric parser");
        }
        report.validate();
        report
    }

    /// Append the default parser for the property's datatype unless an
    /// acceptable one is already in the chain.
    ///
    /// Returns whether a parser was added. Date and time parsers get the
    /// default patterns and `timezone` when given.
    pub fn add_datatype_parser_if_needed(&mut self, edm: &dyn EdmApi, timezone: Option<&str>) -> bool {
        let Some(datatype) = self.property_type(edm).datatype.clone() else {
            return false;
        };
        let accepted = required_parsers(&datatype);
        let Some(default) = accepted.first() else {
            return false;
        };
        let used = transforms::kinds_used(&self.transforms);
        if accepted.iter().any(|kind| used.contains(kind)) {
            return false;
        }

        let patterns = match datatype {
            Datatype::TimeOfDay => Some(TIME_PATTERNS),
            Datatype::Date | Datatype::DateTimeOffset => Some(DATETIME_PATTERNS),
            _ => None,
        };
        let mut parser = Node::new(default.clone());
        if let Some(patterns) = patterns {
            let patterns = patterns.iter().map(|p| Scalar::from(*p)).collect();
            parser = parser.with_arg("pattern", Arg::List(patterns));
            if let Some(timezone) = timezone {
                parser = parser.with_arg("timezone", Arg::Scalar(timezone.into()));
            }
        }

        // a definition keeps a single value source
        if let Some(column) = self.column.take() {
            self.transforms.insert(0, Node::column(column));
        }
        self.transforms.push(parser);
        true
    }
}

fn concat_of(value: &Value) -> TransformResult<Node> {
    let malformed = || TransformError::MalformedColumn {
        key: "columns".to_string(),
        kind: NodeKind::Concat.tag(),
    };
    let Value::Sequence(items) = value else {
        return Err(malformed());
    };
    let columns: Option<Vec<String>> = items.iter().map(|v| v.as_str().map(str::to_string)).collect();
    Ok(Node::concat(columns.ok_or_else(malformed)?, Some("-")))
}
