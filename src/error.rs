//! Error types for erpspace-rs.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("function '{0}' is not registered")]
    NotRegistered(String),

    #[error("formula `{expr}` failed: {message}")]
    Formula { expr: String, message: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_registered_names_the_function() {
        let err = Error::NotRegistered("send_digest".to_string());
        assert_eq!(err.to_string(), "function 'send_digest' is not registered");
    }

    #[test]
    fn formula_error_carries_expression() {
        let err = Error::Formula {
            expr: "doc.total >".to_string(),
            message: "unexpected end of input".to_string(),
        };
        assert!(err.to_string().contains("doc.total >"));
    }
}
