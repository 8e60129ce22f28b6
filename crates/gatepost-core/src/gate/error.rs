//! Gate verdict errors.
//!
//! Every rejection carries a stable machine-readable `code` so a client
//! can decide whether to render the CAPTCHA widget (`captcha_required`),
//! show a slow-down message (`rate_limited`, `captcha_blocked`), or a
//! generic retry prompt (`captcha_unavailable`).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

#[derive(Debug, PartialEq, Eq)]
pub enum GateError {
	/// Submission is suspicious and no CAPTCHA proof was supplied.
	ChallengeRequired,
	/// The supplied CAPTCHA proof did not verify.
	CaptchaInvalid,
	/// The key is inside an escalated cool-down.
	Blocked {
		/// Seconds until the block expires
		remaining_secs: i64,
	},
	/// Hard submission-rate cap exceeded.
	RateLimited,
	/// The CAPTCHA verifier was unreachable, errored, or timed out.
	VerifierUnavailable,
	/// The state store or comment log failed; the gate fails closed.
	StoreUnavailable,
}

impl GateError {
	/// Stable machine-readable code, as sent on the wire.
	pub fn code(&self) -> &'static str {
		match self {
			GateError::ChallengeRequired => "captcha_required",
			GateError::CaptchaInvalid => "captcha_invalid",
			GateError::Blocked { .. } => "captcha_blocked",
			GateError::RateLimited => "rate_limited",
			GateError::VerifierUnavailable | GateError::StoreUnavailable => "captcha_unavailable",
		}
	}
}

impl std::fmt::Display for GateError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			GateError::ChallengeRequired => write!(f, "CAPTCHA verification required"),
			GateError::CaptchaInvalid => write!(f, "CAPTCHA verification failed"),
			GateError::Blocked { remaining_secs } => {
				write!(f, "Blocked for {}s after repeated CAPTCHA failures", remaining_secs)
			}
			GateError::RateLimited => write!(f, "Submission rate limit exceeded"),
			GateError::VerifierUnavailable => write!(f, "CAPTCHA verifier unavailable"),
			GateError::StoreUnavailable => write!(f, "Abuse state store unavailable"),
		}
	}
}

impl std::error::Error for GateError {}

impl IntoResponse for GateError {
	fn into_response(self) -> Response {
		let (status, message, retry_after) = match &self {
			GateError::ChallengeRequired => (
				StatusCode::FORBIDDEN,
				"Please complete the CAPTCHA challenge to continue.",
				None,
			),
			GateError::CaptchaInvalid => {
				(StatusCode::FORBIDDEN, "CAPTCHA verification failed. Please try again.", None)
			}
			GateError::Blocked { remaining_secs } => (
				StatusCode::TOO_MANY_REQUESTS,
				"Too many failed CAPTCHA attempts. Please come back later.",
				Some(*remaining_secs),
			),
			GateError::RateLimited => (
				StatusCode::TOO_MANY_REQUESTS,
				"You are commenting too fast. Please slow down.",
				None,
			),
			GateError::VerifierUnavailable | GateError::StoreUnavailable => (
				StatusCode::SERVICE_UNAVAILABLE,
				"CAPTCHA verification is temporarily unavailable. Please try again.",
				None,
			),
		};

		let body = serde_json::json!({
			"error": {
				"code": self.code(),
				"message": message,
				"details": {
					"retryAfter": retry_after,
				}
			}
		});

		let mut response = (status, Json(body)).into_response();
		if let Some(secs) = retry_after {
			if let Ok(val) = secs.to_string().parse() {
				response.headers_mut().insert("Retry-After", val);
			}
		}

		response
	}
}


// vim: ts=4
