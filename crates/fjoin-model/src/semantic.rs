//! Semantic type catalog and join type tags.
//!
//! A column's semantic types describe what its values mean, independent of
//! how they are stored. The classifier maps those tags onto a [`JoinType`],
//! the closed set of matcher families.

use std::fmt;
use std::str::FromStr;

use polars::prelude::DataType;
use serde::{Deserialize, Serialize};

const TEXT_URI: &str = "http://schema.org/Text";
const CATEGORICAL_URI: &str = "https://metadata.datadrivendiscovery.org/types/CategoricalData";
const BOOLEAN_URI: &str = "http://schema.org/Boolean";
const INTEGER_URI: &str = "http://schema.org/Integer";
const FLOAT_URI: &str = "http://schema.org/Float";
const FLOAT_VECTOR_URI: &str = "https://metadata.datadrivendiscovery.org/types/FloatVector";
const BOUNDING_POLYGON_URI: &str = "https://metadata.datadrivendiscovery.org/types/BoundingPolygon";
const DATETIME_URI: &str = "http://schema.org/DateTime";

/// A declared semantic tag for a column.
///
/// Parses both the short names (`text`, `float_vector`, ...) and the schema
/// URIs emitted by dataset metadata. Tags outside the catalog are kept as
/// [`SemanticType::Other`] and play no part in classification.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SemanticType {
    Text,
    Categorical,
    Boolean,
    Integer,
    Float,
    FloatVector,
    BoundingPolygon,
    DateTime,
    Other(String),
}

impl SemanticType {
    /// All catalog entries, in declaration order.
    pub const CATALOG: [SemanticType; 8] = [
        SemanticType::Text,
        SemanticType::Categorical,
        SemanticType::Boolean,
        SemanticType::Integer,
        SemanticType::Float,
        SemanticType::FloatVector,
        SemanticType::BoundingPolygon,
        SemanticType::DateTime,
    ];

    /// Parse a tag from a short name or schema URI.
    pub fn parse(tag: &str) -> Self {
        let trimmed = tag.trim();
        match trimmed {
            TEXT_URI => return Self::Text,
            CATEGORICAL_URI => return Self::Categorical,
            BOOLEAN_URI => return Self::Boolean,
            INTEGER_URI => return Self::Integer,
            FLOAT_URI => return Self::Float,
            FLOAT_VECTOR_URI => return Self::FloatVector,
            BOUNDING_POLYGON_URI => return Self::BoundingPolygon,
            DATETIME_URI => return Self::DateTime,
            _ => {}
        }
        match trimmed.to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "text" | "string" => Self::Text,
            "categorical" | "categorical_data" => Self::Categorical,
            "boolean" | "bool" => Self::Boolean,
            "integer" | "int" => Self::Integer,
            "float" | "real" => Self::Float,
            "float_vector" | "floatvector" | "vector" => Self::FloatVector,
            "bounding_polygon" | "boundingpolygon" | "geo" => Self::BoundingPolygon,
            "datetime" | "date_time" | "timestamp" => Self::DateTime,
            _ => Self::Other(trimmed.to_string()),
        }
    }

    /// Short catalog name.
    pub fn name(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Categorical => "categorical",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::FloatVector => "float_vector",
            Self::BoundingPolygon => "bounding_polygon",
            Self::DateTime => "datetime",
            Self::Other(tag) => tag,
        }
    }

    /// Schema URI, if the tag belongs to the catalog.
    pub fn uri(&self) -> Option<&'static str> {
        match self {
            Self::Text => Some(TEXT_URI),
            Self::Categorical => Some(CATEGORICAL_URI),
            Self::Boolean => Some(BOOLEAN_URI),
            Self::Integer => Some(INTEGER_URI),
            Self::Float => Some(FLOAT_URI),
            Self::FloatVector => Some(FLOAT_VECTOR_URI),
            Self::BoundingPolygon => Some(BOUNDING_POLYGON_URI),
            Self::DateTime => Some(DATETIME_URI),
            Self::Other(_) => None,
        }
    }

    /// The join family this tag belongs to, or `None` for unsupported tags.
    pub fn family(&self) -> Option<JoinType> {
        match self {
            Self::Text | Self::Categorical | Self::Boolean => Some(JoinType::String),
            Self::Integer | Self::Float => Some(JoinType::Numeric),
            Self::FloatVector => Some(JoinType::Vector),
            Self::BoundingPolygon => Some(JoinType::Geo),
            Self::DateTime => Some(JoinType::Datetime),
            Self::Other(_) => None,
        }
    }

    /// Derive a tag from a polars dtype for columns without declared tags.
    pub fn from_dtype(dtype: &DataType) -> Option<Self> {
        match dtype {
            DataType::Boolean => Some(Self::Boolean),
            DataType::String => Some(Self::Text),
            DataType::Float32 | DataType::Float64 => Some(Self::Float),
            DataType::Date | DataType::Datetime(_, _) => Some(Self::DateTime),
            DataType::List(_) | DataType::Array(_, _) => Some(Self::FloatVector),
            dtype if dtype.is_integer() => Some(Self::Integer),
            _ => None,
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<String> for SemanticType {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<&str> for SemanticType {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<SemanticType> for String {
    fn from(value: SemanticType) -> Self {
        value.name().to_string()
    }
}

/// The matcher family resolved for a column pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinType {
    String,
    Numeric,
    Vector,
    Geo,
    Datetime,
}

impl JoinType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Numeric => "numeric",
            Self::Vector => "vector",
            Self::Geo => "geo",
            Self::Datetime => "datetime",
        }
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JoinType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "string" | "text" => Ok(Self::String),
            "numeric" | "number" => Ok(Self::Numeric),
            "vector" => Ok(Self::Vector),
            "geo" | "geo_vector" => Ok(Self::Geo),
            "datetime" => Ok(Self::Datetime),
            other => Err(format!("unknown join type '{other}'")),
        }
    }
}
