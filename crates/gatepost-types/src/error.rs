//! Workspace-wide error type.

use axum::{http::StatusCode, response::IntoResponse, Json};

pub type GpResult<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
	NotFound,
	PermissionDenied,
	DbError,
	Parse,
	ValidationError(String),
	ServiceUnavailable,
	Internal(String),

	// externals
	Io(std::io::Error),
}

impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Self {
		Self::Io(err)
	}
}

impl std::fmt::Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Error::NotFound => write!(f, "not found"),
			Error::PermissionDenied => write!(f, "permission denied"),
			Error::DbError => write!(f, "database error"),
			Error::Parse => write!(f, "parse error"),
			Error::ValidationError(msg) => write!(f, "validation error: {}", msg),
			Error::ServiceUnavailable => write!(f, "service unavailable"),
			Error::Internal(msg) => write!(f, "internal error: {}", msg),
			Error::Io(err) => write!(f, "io error: {}", err),
		}
	}
}

impl std::error::Error for Error {}

impl IntoResponse for Error {
	fn into_response(self) -> axum::response::Response {
		let (status, code, message) = match &self {
			Error::NotFound => (StatusCode::NOT_FOUND, "E-NOT-FOUND", "Not found".to_string()),
			Error::PermissionDenied => {
				(StatusCode::FORBIDDEN, "E-PERMISSION", "Permission denied".to_string())
			}
			Error::ValidationError(msg) => {
				(StatusCode::UNPROCESSABLE_ENTITY, "E-VALIDATION", msg.clone())
			}
			Error::ServiceUnavailable => (
				StatusCode::SERVICE_UNAVAILABLE,
				"E-UNAVAILABLE",
				"Service temporarily unavailable".to_string(),
			),
			_ => (
				StatusCode::INTERNAL_SERVER_ERROR,
				"E-INTERNAL",
				"Internal server error".to_string(),
			),
		};

		let body = serde_json::json!({
			"error": {
				"code": code,
				"message": message,
			}
		});

		(status, Json(body)).into_response()
	}
}

// vim: ts=4
