//! HTTP CAPTCHA verifier adapter.
//!
//! Speaks the `siteverify` form-POST protocol shared by hCaptcha and
//! reCAPTCHA: the shared secret and the client-supplied proof go in the
//! body, the answer comes back as JSON with a `success` flag. Anything
//! other than a well-formed answer — transport error, timeout, non-2xx
//! status, unparsable body — is reported as a service fault, never as a
//! failed verification.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use gatepost::{captcha_verifier::CaptchaVerifier, prelude::*};

const DEFAULT_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Deserialize)]
struct VerifyResponse {
	success: bool,
	#[serde(default, rename = "error-codes")]
	error_codes: Vec<Box<str>>,
}

#[derive(Debug)]
pub struct CaptchaVerifierHttp {
	client: reqwest::Client,
	verify_url: Box<str>,
	secret: Box<str>,
}

impl CaptchaVerifierHttp {
	pub fn new(
		verify_url: impl Into<Box<str>>,
		secret: impl Into<Box<str>>,
		timeout_ms: Option<u64>,
	) -> GpResult<Self> {
		let client = reqwest::Client::builder()
			.timeout(Duration::from_millis(timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS)))
			.build()
			.map_err(|err| Error::Internal(format!("http client init: {}", err)))?;

		Ok(Self { client, verify_url: verify_url.into(), secret: secret.into() })
	}
}

#[async_trait]
impl CaptchaVerifier for CaptchaVerifierHttp {
	async fn verify(&self, proof: &str) -> GpResult<bool> {
		let res = self
			.client
			.post(self.verify_url.as_ref())
			.form(&[("secret", self.secret.as_ref()), ("response", proof)])
			.send()
			.await
			.inspect_err(|err| warn!("captcha verify request failed: {}", err))
			.map_err(|_| Error::ServiceUnavailable)?;

		if !res.status().is_success() {
			warn!("captcha verify endpoint returned {}", res.status());
			return Err(Error::ServiceUnavailable);
		}

		let body: VerifyResponse = res
			.json()
			.await
			.inspect_err(|err| warn!("captcha verify response unparsable: {}", err))
			.map_err(|_| Error::ServiceUnavailable)?;

		if !body.success && !body.error_codes.is_empty() {
			debug!("captcha rejected: {:?}", body.error_codes);
		}
		Ok(body.success)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_response_parsing() {
		let ok: VerifyResponse = serde_json::from_str(r#"{"success": true}"#).unwrap();
		assert!(ok.success);

		let rejected: VerifyResponse = serde_json::from_str(
			r#"{"success": false, "error-codes": ["invalid-input-response"]}"#,
		)
		.unwrap();
		assert!(!rejected.success);
		assert_eq!(rejected.error_codes.len(), 1);
	}

	#[test]
	fn test_extra_fields_are_ignored() {
		let body = r#"{"success": true, "challenge_ts": "2026-01-01T00:00:00Z", "hostname": "example.org"}"#;
		let parsed: VerifyResponse = serde_json::from_str(body).unwrap();
		assert!(parsed.success);
	}
}

// vim: ts=4
