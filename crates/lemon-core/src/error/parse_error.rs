//! ParseError - a payload did not match the entity it was supposed to describe

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Failure to decode an entity out of a dispatch payload
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid {entity} payload: {source}")]
    Invalid {
        entity: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Missing field `{field}` in {entity} payload")]
    MissingField {
        entity: &'static str,
        field: &'static str,
    },
}

impl ParseError {
    /// Name of the entity that failed to decode
    pub fn entity(&self) -> &'static str {
        match self {
            Self::Invalid { entity, .. } | Self::MissingField { entity, .. } => entity,
        }
    }
}

/// Typed decoding of a JSON payload into an entity
pub trait FromPayload: DeserializeOwned {
    /// Name used in error messages
    const ENTITY: &'static str;

    fn from_value(value: &Value) -> Result<Self, ParseError> {
        Self::deserialize(value).map_err(|source| ParseError::Invalid {
            entity: Self::ENTITY,
            source,
        })
    }

    /// Decode every element of an optional array field; a missing field yields an empty list
    fn list_from_field(value: &Value, field: &str) -> Result<Vec<Self>, ParseError> {
        match value.get(field) {
            Some(Value::Array(items)) => items.iter().map(Self::from_value).collect(),
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(other) => Self::from_value(other).map(|single| vec![single]),
        }
    }
}
