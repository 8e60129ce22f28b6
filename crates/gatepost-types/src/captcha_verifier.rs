//! External CAPTCHA verifier interface.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::prelude::*;

/// Verifies an opaque CAPTCHA proof against the external challenge
/// service.
///
/// The three outcomes are deliberately distinct: `Ok(true)` is a pass,
/// `Ok(false)` is a genuine failure (charged against the caller), and
/// `Err(_)` is an infrastructure fault — unreachable service, timeout,
/// malformed response — which must never be charged against the caller.
/// Implementations must bound the call with a timeout rather than hang.
#[async_trait]
pub trait CaptchaVerifier: Debug + Send + Sync {
	async fn verify(&self, proof: &str) -> GpResult<bool>;
}

// vim: ts=4
