//! Error types for transform and condition trees

use thiserror::Error;

/// Structural errors raised while reading a transform or condition tree
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    /// A node carries no `transforms.*` or `conditions.*` key
    #[error("It is not clear what kind of node is meant by {0}")]
    MissingKind(String),

    /// A node carries more than one kind key
    #[error("Node carries more than one kind: {0}")]
    AmbiguousKind(String),

    /// A `column*` argument that is neither a string nor a list of strings
    #[error("Unknown type for argument '{key}' in {kind}")]
    MalformedColumn { key: String, kind: String },

    /// The payload attached to a kind key is neither empty nor a mapping
    #[error("Unexpected payload on {0}")]
    MalformedPayload(String),

    /// A node list was expected
    #[error("Expected a list of nodes, found {0}")]
    NotAList(String),

    /// A node mapping was expected
    #[error("Expected a node mapping, found {0}")]
    NotAMapping(String),

    /// Non-string mapping key
    #[error("Argument keys must be strings, found {0}")]
    InvalidKey(String),

    #[error("YAML error: {0}")]
    Yaml(String),
}

/// Result type for transform tree operations
pub type TransformResult<T> = Result<T, TransformError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TransformError::MalformedColumn {
            key: "columns".to_string(),
            kind: "transforms.ConcatTransform".to_string(),
        };
        assert!(err.to_string().contains("columns"));
        assert!(err.to_string().contains("ConcatTransform"));

        let err = TransformError::MissingKind("{column: a}".to_string());
        assert!(err.to_string().contains("not clear"));
    }
}
