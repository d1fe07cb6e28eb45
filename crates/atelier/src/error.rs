use sea_orm::DbErr;
use serde_json::Value;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// A required identifier or field is missing or malformed.
    #[error("{field}: {message}")]
    InvalidInput { field: &'static str, message: String },

    /// The record does not exist or belongs to someone else.
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{context}: {source}")]
    Store {
        context: &'static str,
        #[source]
        source: DbErr,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Error::InvalidInput {
            field,
            message: message.into(),
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            Error::InvalidInput { .. } => 400,
            Error::NotFound(_) => 404,
            Error::Store { .. } | Error::Config(_) => 500,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidInput { .. } => "invalid_input",
            Error::NotFound(_) => "not_found",
            Error::Store { .. } | Error::Config(_) => "internal_error",
        }
    }

    /// Response body for the HTTP layer. Store details never leave the process.
    pub fn to_json(&self) -> Value {
        let mut error = serde_json::json!({
            "code": self.code(),
            "message": match self {
                Error::Store { .. } | Error::Config(_) => "Internal server error".to_string(),
                other => other.to_string(),
            },
        });
        if let Error::InvalidInput { field, .. } = self {
            error["field"] = Value::String((*field).to_string());
        }

        serde_json::json!({
            "success": false,
            "error": error,
        })
    }
}

/// Log a store failure where it happened and wrap it with `context`.
pub(crate) fn store(context: &'static str) -> impl FnOnce(DbErr) -> Error {
    move |source| {
        tracing::error!(error = %source, "{context}");
        Error::Store { context, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_carries_field() {
        let err = Error::invalid("imageUrl", "is required");
        assert_eq!(err.status(), 400);
        let body = err.to_json();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "invalid_input");
        assert_eq!(body["error"]["field"], "imageUrl");
        assert_eq!(body["error"]["message"], "imageUrl: is required");
    }

    #[test]
    fn not_found_is_404() {
        let err = Error::NotFound("folder");
        assert_eq!(err.status(), 404);
        assert_eq!(err.to_json()["error"]["message"], "folder not found");
    }

    #[test]
    fn store_failure_hides_details() {
        let err = store("Failed to load folder")(DbErr::Custom("disk I/O error".into()));
        assert_eq!(err.status(), 500);
        assert_eq!(err.code(), "internal_error");
        let body = err.to_json().to_string();
        assert!(!body.contains("disk I/O"));
        assert!(err.to_string().contains("disk I/O"));
    }
}
