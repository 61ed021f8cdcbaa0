use serde::{Deserialize, Serialize};
use std::fmt;

/// NewType wrapper for a model's public identifier (e.g. `"gpt-4o-mini"`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub struct ModelId(String);

impl ModelId {
    /// Create a new ModelId, trimming surrounding whitespace
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.len() == id.len() {
            Self(id)
        } else {
            Self(trimmed.to_string())
        }
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the identifier is empty or whitespace only
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ModelId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for ModelId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<ModelId> for String {
    fn from(id: ModelId) -> Self {
        id.0
    }
}

impl AsRef<str> for ModelId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// NewType wrapper for Request ID
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RequestId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_id_trims() {
        let id = ModelId::from("  gpt-4o  ");
        assert_eq!(id.as_str(), "gpt-4o");
        assert!(!id.is_blank());
        assert!(ModelId::from("   ").is_blank());
    }

    #[test]
    fn test_model_id_serde() {
        let id: ModelId = serde_json::from_str(r#"" claude-sonnet ""#).unwrap();
        assert_eq!(id, ModelId::from("claude-sonnet"));
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""claude-sonnet""#);
    }

    #[test]
    fn test_request_id_display() {
        let id = RequestId::from("req_456");
        assert_eq!(format!("{}", id), "req_456");
    }
}
