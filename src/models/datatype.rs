//! Property datatypes and their warehouse counterparts

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Datatype of a catalog property type
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Datatype {
    Binary,
    Boolean,
    Byte,
    SByte,
    Date,
    Duration,
    DateTimeOffset,
    TimeOfDay,
    Decimal,
    Single,
    Double,
    Guid,
    Int16,
    Int32,
    Int64,
    String,
    Geography,
    GeographyPoint,
    GeographyLineString,
    GeographyPolygon,
    GeographyMultiPoint,
    GeographyMultiLineString,
    GeographyMultiPolygon,
    GeographyCollection,
    Geometry,
    GeometryPoint,
    GeometryLineString,
    GeometryPolygon,
    GeometryMultiPoint,
    GeometryMultiLineString,
    GeometryMultiPolygon,
    GeometryCollection,
    /// Anything the catalog reports that this crate has no special handling for
    Other(std::string::String),
}

const TEXT_TYPES: &[&str] = &["text", "character varying"];

impl Datatype {
    pub fn as_str(&self) -> &str {
        match self {
            Datatype::Binary => "Binary",
            Datatype::Boolean => "Boolean",
            Datatype::Byte => "Byte",
            Datatype::SByte => "SByte",
            Datatype::Date => "Date",
            Datatype::Duration => "Duration",
            Datatype::DateTimeOffset => "DateTimeOffset",
            Datatype::TimeOfDay => "TimeOfDay",
            Datatype::Decimal => "Decimal",
            Datatype::Single => "Single",
            Datatype::Double => "Double",
            Datatype::Guid => "Guid",
            Datatype::Int16 => "Int16",
            Datatype::Int32 => "Int32",
            Datatype::Int64 => "Int64",
            Datatype::String => "String",
            Datatype::Geography => "Geography",
            Datatype::GeographyPoint => "GeographyPoint",
            Datatype::GeographyLineString => "GeographyLineString",
            Datatype::GeographyPolygon => "GeographyPolygon",
            Datatype::GeographyMultiPoint => "GeographyMultiPoint",
            Datatype::GeographyMultiLineString => "GeographyMultiLineString",
            Datatype::GeographyMultiPolygon => "GeographyMultiPolygon",
            Datatype::GeographyCollection => "GeographyCollection",
            Datatype::Geometry => "Geometry",
            Datatype::GeometryPoint => "GeometryPoint",
            Datatype::GeometryLineString => "GeometryLineString",
            Datatype::GeometryPolygon => "GeometryPolygon",
            Datatype::GeometryMultiPoint => "GeometryMultiPoint",
            Datatype::GeometryMultiLineString => "GeometryMultiLineString",
            Datatype::GeometryMultiPolygon => "GeometryMultiPolygon",
            Datatype::GeometryCollection => "GeometryCollection",
            Datatype::Other(name) => name,
        }
    }

    /// Date, DateTimeOffset and anything else whose name mentions a date
    pub fn is_date_family(&self) -> bool {
        self.as_str().contains("Date")
    }

    pub fn is_geography_family(&self) -> bool {
        self.as_str().contains("Geography")
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, Datatype::Boolean)
    }

    pub fn is_time_of_day(&self) -> bool {
        matches!(self, Datatype::TimeOfDay)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Datatype::String)
    }

    /// Physical warehouse column types that can hold values of this datatype.
    pub fn warehouse_types(&self) -> &'static [&'static str] {
        match self {
            Datatype::Binary | Datatype::Byte | Datatype::SByte => &["bytea"],
            Datatype::Boolean => &["bool"],
            Datatype::Date => &["date"],
            Datatype::Duration => &["interval"],
            Datatype::DateTimeOffset => &["timestamp with time zone"],
            Datatype::TimeOfDay => &["time with time zone"],
            Datatype::Decimal => &["numeric"],
            Datatype::Single => &["real"],
            Datatype::Double => &["double precision"],
            Datatype::Guid => &["uuid"],
            Datatype::Int16 | Datatype::Int32 | Datatype::Int64 => &["bigint"],
            Datatype::String
            | Datatype::Geography
            | Datatype::GeographyPoint
            | Datatype::GeographyLineString
            | Datatype::GeographyPolygon
            | Datatype::GeographyMultiPoint
            | Datatype::GeographyMultiLineString
            | Datatype::GeographyMultiPolygon
            | Datatype::GeographyCollection
            | Datatype::Geometry
            | Datatype::GeometryPoint
            | Datatype::GeometryLineString
            | Datatype::GeometryPolygon
            | Datatype::GeometryMultiPoint
            | Datatype::GeometryMultiLineString
            | Datatype::GeometryMultiPolygon
            | Datatype::GeometryCollection => TEXT_TYPES,
            Datatype::Other(_) => &[],
        }
    }
}

impl FromStr for Datatype {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Datatype::from(s.to_string()))
    }
}

impl From<std::string::String> for Datatype {
    fn from(value: std::string::String) -> Self {
        match value.as_str() {
            "Binary" => Datatype::Binary,
            "Boolean" => Datatype::Boolean,
            "Byte" => Datatype::Byte,
            "SByte" => Datatype::SByte,
            "Date" => Datatype::Date,
            "Duration" => Datatype::Duration,
            "DateTimeOffset" => Datatype::DateTimeOffset,
            "TimeOfDay" => Datatype::TimeOfDay,
            "Decimal" => Datatype::Decimal,
            "Single" => Datatype::Single,
            "Double" => Datatype::Double,
            "Guid" => Datatype::Guid,
            "Int16" => Datatype::Int16,
            "Int32" => Datatype::Int32,
            "Int64" => Datatype::Int64,
            "String" => Datatype::String,
            "Geography" => Datatype::Geography,
            "GeographyPoint" => Datatype::GeographyPoint,
            "GeographyLineString" => Datatype::GeographyLineString,
            "GeographyPolygon" => Datatype::GeographyPolygon,
            "GeographyMultiPoint" => Datatype::GeographyMultiPoint,
            "GeographyMultiLineString" => Datatype::GeographyMultiLineString,
            "GeographyMultiPolygon" => Datatype::GeographyMultiPolygon,
            "GeographyCollection" => Datatype::GeographyCollection,
            "Geometry" => Datatype::Geometry,
            "GeometryPoint" => Datatype::GeometryPoint,
            "GeometryLineString" => Datatype::GeometryLineString,
            "GeometryPolygon" => Datatype::GeometryPolygon,
            "GeometryMultiPoint" => Datatype::GeometryMultiPoint,
            "GeometryMultiLineString" => Datatype::GeometryMultiLineString,
            "GeometryMultiPolygon" => Datatype::GeometryMultiPolygon,
            "GeometryCollection" => Datatype::GeometryCollection,
            _ => Datatype::Other(value),
        }
    }
}

impl From<Datatype> for std::string::String {
    fn from(value: Datatype) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
