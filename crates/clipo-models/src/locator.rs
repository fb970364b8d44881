//! Source locator validation.

use schemars::gen::SchemaGenerator;
use schemars::schema::Schema;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use crate::error::{ModelError, ModelResult};

/// A validated remote media locator (http or https URL with a host).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SourceLocator(String);

impl SourceLocator {
    /// Parse and validate a locator.
    pub fn parse(raw: &str) -> ModelResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ModelError::invalid_locator("empty URL"));
        }

        let url = Url::parse(trimmed)
            .map_err(|e| ModelError::invalid_locator(format!("{}: {}", trimmed, e)))?;

        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(ModelError::invalid_locator(format!(
                    "unsupported scheme '{}'",
                    other
                )))
            }
        }

        if url.host_str().map_or(true, str::is_empty) {
            return Err(ModelError::invalid_locator("URL has no host"));
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Host portion of the locator, lowercased.
    pub fn host(&self) -> Option<String> {
        Url::parse(&self.0)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
    }
}

impl TryFrom<String> for SourceLocator {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SourceLocator> for String {
    fn from(value: SourceLocator) -> Self {
        value.0
    }
}

impl JsonSchema for SourceLocator {
    fn schema_name() -> String {
        "SourceLocator".to_string()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        String::json_schema(gen)
    }
}

impl fmt::Display for SourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
