use serde::Serialize;
use thiserror::Error;
use warp::http::StatusCode;
use warp::reject::Reject;

use super::validate::ValidationErrors;

/// Error taxonomy surfaced to callers. Every variant maps to one HTTP status
/// code; nothing is retried internally.
#[derive(Debug, Clone, Error, Serialize)]
#[serde(rename_all = "snake_case", tag = "error", content = "detail")]
pub enum ApiError {
    #[error("validation failed")]
    Validation(ValidationErrors),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Database(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn conflict(info: &str) -> Self {
        Self::Conflict(info.to_string())
    }

    pub fn not_found(info: &str) -> Self {
        Self::NotFound(info.to_string())
    }

    pub fn forbidden(info: &str) -> Self {
        Self::Forbidden(info.to_string())
    }

    pub fn unauthorized(info: &str) -> Self {
        Self::Unauthorized(info.to_string())
    }
}

impl Reject for ApiError {}

impl From<sqlx::Error> for ApiError {
    fn from(value: sqlx::Error) -> Self {
        QueryError::from(value).into()
    }
}

/// Flattened view of an `sqlx::Error`, keeping the SQLSTATE code so that
/// constraint violations can be told apart from plain failures.
pub struct QueryError {
    code: Option<String>,
    info: String,
}

impl QueryError {
    pub fn new(info: String) -> Self {
        Self { code: None, info }
    }
}

impl From<sqlx::Error> for QueryError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::Database(e) => Self {
                code: e.code().map(|c| c.to_string()),
                info: format!("{e}"),
            },
            sqlx::Error::Configuration(e) => Self::new(format!("{e}")),
            sqlx::Error::Io(e) => Self::new(format!("{e}")),
            sqlx::Error::Tls(e) => Self::new(format!("{e}")),
            sqlx::Error::Protocol(e) => Self::new(format!("{e}")),
            sqlx::Error::RowNotFound => Self::new(String::from("RowNotFound")),
            sqlx::Error::TypeNotFound { type_name } => {
                Self::new(format!("Type not found: {type_name}"))
            }
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => {
                Self::new(format!("Column index out of bounds {index} ({len})"))
            }
            sqlx::Error::ColumnNotFound(e) => Self::new(format!("{e}")),
            sqlx::Error::ColumnDecode { index, source } => {
                Self::new(format!("Column decode {index} ({source})"))
            }
            sqlx::Error::Decode(e) => Self::new(format!("{e}")),
            sqlx::Error::PoolTimedOut => Self::new(String::from("Pool timed out")),
            sqlx::Error::PoolClosed => Self::new(String::from("Pool closed")),
            sqlx::Error::WorkerCrashed => Self::new(String::from("Worker crashed")),
            sqlx::Error::Migrate(e) => Self::new(format!("{e}")),
            _ => Self::new(String::from("Unknown error")),
        }
    }
}

impl From<QueryError> for ApiError {
    fn from(value: QueryError) -> Self {
        // Unique and foreign-key violations are caller errors, not ours;
        // uniqueness is enforced here rather than only at validation time so
        // concurrent identical requests cannot both succeed.
        match value.code.as_deref() {
            Some("23505") => ApiError::Conflict(String::from("Already exists")),
            Some("23503") => ApiError::NotFound(String::from("Referenced row does not exist")),
            _ => ApiError::Database(value.info),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_taxonomy() {
        assert_eq!(
            ApiError::conflict("dup").status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::not_found("missing").status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::forbidden("not yours").status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::unauthorized("log in").status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Database(String::from("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn unique_violations_become_conflicts() {
        let err = QueryError {
            code: Some(String::from("23505")),
            info: String::from("duplicate key value violates unique constraint"),
        };
        assert!(matches!(ApiError::from(err), ApiError::Conflict(_)));
    }

    #[test]
    fn errors_serialize_with_tag_and_detail() {
        let value = serde_json::to_value(ApiError::conflict("Already exists")).unwrap();
        assert_eq!(value["error"], "conflict");
        assert_eq!(value["detail"], "Already exists");

        let mut errors = ValidationErrors::default();
        errors.push("tags", "Must not be empty");
        let value = serde_json::to_value(ApiError::Validation(errors)).unwrap();
        assert_eq!(value["error"], "validation");
        assert_eq!(value["detail"]["errors"]["tags"][0], "Must not be empty");
    }

    #[test]
    fn foreign_key_violations_become_not_found() {
        let err = QueryError {
            code: Some(String::from("23503")),
            info: String::from("violates foreign key constraint"),
        };
        assert!(matches!(ApiError::from(err), ApiError::NotFound(_)));
    }
}
