//! Portfolio records and the service that loads them
//!
//! Responses arrive either bare or wrapped once in `{ "data": .. }`;
//! [`unwrap_data`] strips that wrapper before records are parsed.

pub mod blog;
pub mod portfolio;
pub mod project;

pub use blog::Blog;
pub use portfolio::{Loaded, Portfolio, PortfolioError};
pub use project::Project;

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Record identifier; the API uses numeric ids or document ids
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{}", n),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

/// Strips one level of `{ "data": .. }` wrapping, if present.
pub fn unwrap_data(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Parses a blog list response
pub fn parse_blogs(value: Value) -> Result<Vec<Blog>, serde_json::Error> {
    serde_json::from_value(unwrap_data(value))
}

/// Parses a single blog response
pub fn parse_blog(value: Value) -> Result<Blog, serde_json::Error> {
    serde_json::from_value(unwrap_data(value))
}

/// Parses a project list response
pub fn parse_projects(value: Value) -> Result<Vec<Project>, serde_json::Error> {
    serde_json::from_value(unwrap_data(value))
}

/// Treats an explicit `null` like a missing field
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
