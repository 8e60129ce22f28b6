//! Abuse decision engine.
//!
//! One verdict per submission attempt: allow, require-challenge, blocked,
//! or rejected. The engine reads the persisted CAPTCHA state and the
//! comment-log windows, calls the external verifier when a proof is
//! supplied, performs the matching state transition, and leaves the
//! comment write itself to the caller.

mod error;

pub use error::GateError;

use std::sync::Arc;

use crate::prelude::*;
use crate::risk::RateWindows;
use crate::schedule::resolve_blocked_until;
use gatepost_types::abuse_adapter::AbuseAdapter;
use gatepost_types::captcha_verifier::CaptchaVerifier;
use gatepost_types::comment_adapter::CommentAdapter;
use gatepost_types::types::CaptchaState;

/// How long a successful verification suppresses further challenges.
pub const VERIFIED_TTL_SECS: i64 = 7200; // 2 hours

#[derive(Debug, Clone)]
pub struct GateConfig {
	pub verified_ttl_secs: i64,
}

impl Default for GateConfig {
	fn default() -> Self {
		Self { verified_ttl_secs: VERIFIED_TTL_SECS }
	}
}

/// Per-request input to the gate
#[derive(Debug)]
pub struct Submission<'a> {
	pub identity_hash: &'a IdentityHash,
	pub device_id: &'a str,
	pub captcha_proof: Option<&'a str>,
	/// The single authoritative clock reading for this decision.
	pub now: Timestamp,
}

#[derive(Debug)]
pub struct CommentGate {
	abuse: Arc<dyn AbuseAdapter>,
	comments: Arc<dyn CommentAdapter>,
	verifier: Arc<dyn CaptchaVerifier>,
	config: GateConfig,
}

impl CommentGate {
	pub fn new(
		abuse: Arc<dyn AbuseAdapter>,
		comments: Arc<dyn CommentAdapter>,
		verifier: Arc<dyn CaptchaVerifier>,
		config: GateConfig,
	) -> Self {
		Self { abuse, comments, verifier, config }
	}

	/// Evaluates one submission attempt.
	///
	/// `Ok(())` means the caller may perform the comment write. Ordering
	/// is load-bearing: the active-block check short-circuits everything,
	/// CAPTCHA verification and its state writes happen before the hard
	/// rate-limit check (so failure history accumulates even for
	/// rate-limited devices), and the hard cap applies to verified
	/// identities too.
	pub async fn evaluate(&self, sub: &Submission<'_>) -> Result<(), GateError> {
		let state = self
			.abuse
			.read_captcha_state(sub.identity_hash, sub.device_id)
			.await
			.map_err(store_fault)?
			.unwrap_or_default();

		if let Some(blocked_until) = state.blocked_until {
			if blocked_until > sub.now {
				debug!(
					identity_hash = %sub.identity_hash,
					device_id = %sub.device_id,
					"submission inside active block"
				);
				return Err(GateError::Blocked { remaining_secs: blocked_until.0 - sub.now.0 });
			}
		}

		let is_verified = state.is_verified(sub.now);
		let windows = RateWindows::measure(self.comments.as_ref(), sub.identity_hash, sub.now)
			.await
			.map_err(store_fault)?;

		let should_challenge =
			!is_verified && (windows.is_captcha_risk() || state.trigger_count > 0);
		if should_challenge && sub.captcha_proof.is_none() {
			return Err(GateError::ChallengeRequired);
		}

		if !is_verified {
			if let Some(proof) = sub.captcha_proof {
				self.resolve_challenge(sub, &state, proof).await?;
			}
		}

		// Evaluated last, on the counts sampled above: a just-passed
		// CAPTCHA must not bypass the hard cap.
		if windows.is_rate_limited() {
			return Err(GateError::RateLimited);
		}

		Ok(())
	}

	/// Runs the external verifier and performs the matching state write.
	async fn resolve_challenge(
		&self,
		sub: &Submission<'_>,
		state: &CaptchaState,
		proof: &str,
	) -> Result<(), GateError> {
		match self.verifier.verify(proof).await {
			Err(err) => {
				// Infrastructure fault: the caller is not penalized.
				warn!("captcha verifier unavailable: {}", err);
				Err(GateError::VerifierUnavailable)
			}
			Ok(false) => {
				let next_count = self
					.abuse
					.register_failure(sub.identity_hash, sub.device_id)
					.await
					.map_err(store_fault)?;
				info!(
					identity_hash = %sub.identity_hash,
					device_id = %sub.device_id,
					trigger_count = next_count,
					"captcha verification failed"
				);

				match resolve_blocked_until(i64::from(next_count), sub.now) {
					Some(blocked_until) => {
						self.abuse
							.set_blocked_until(
								sub.identity_hash,
								sub.device_id,
								next_count,
								blocked_until,
							)
							.await
							.map_err(store_fault)?;
						Err(GateError::Blocked {
							remaining_secs: blocked_until.0 - sub.now.0,
						})
					}
					None => Err(GateError::CaptchaInvalid),
				}
			}
			Ok(true) => {
				let verified_until = sub.now.add_secs(self.config.verified_ttl_secs);
				self.abuse
					.mark_verified(sub.identity_hash, sub.device_id, verified_until)
					.await
					.map_err(store_fault)?;
				if state.trigger_count > 0 {
					info!(
						identity_hash = %sub.identity_hash,
						device_id = %sub.device_id,
						"captcha verified, failure counter reset"
					);
				}
				Ok(())
			}
		}
	}
}

/// Store faults fail closed: never allow, never charge the caller.
fn store_fault(err: Error) -> GateError {
	error!("abuse state store failure: {}", err);
	GateError::StoreUnavailable
}

// vim: ts=4
