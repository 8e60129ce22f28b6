//! Adapter that stores the per-device CAPTCHA risk state.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::prelude::*;
use crate::types::CaptchaState;

/// A Gatepost abuse-state adapter.
///
/// Stores one [`CaptchaState`] row per (identity hash, device id) pair.
/// Rows are created on the first failure or first successful verification
/// and are never deleted by the engine; retention is the deployment's
/// concern.
///
/// # Atomicity contract
///
/// Two concurrent requests for the same key may interleave their reads,
/// but writes must not lose updates:
/// - [`register_failure`](AbuseAdapter::register_failure) must be a single
///   atomic increment — two simultaneous failures yield a count higher by
///   exactly two.
/// - [`set_blocked_until`](AbuseAdapter::set_blocked_until) must only
///   apply while the row still carries `expected_count`, so a racing
///   request that escalated further can never be overwritten with a
///   laxer block.
#[async_trait]
pub trait AbuseAdapter: Debug + Send + Sync {
	/// Reads the state for a key. `Ok(None)` for a never-seen key.
	async fn read_captcha_state(
		&self,
		identity_hash: &IdentityHash,
		device_id: &str,
	) -> GpResult<Option<CaptchaState>>;

	/// Atomically increments the consecutive-failure counter, creating the
	/// row if needed, and returns the counter value after the increment.
	async fn register_failure(
		&self,
		identity_hash: &IdentityHash,
		device_id: &str,
	) -> GpResult<u32>;

	/// Sets `blocked_until`, guarded by the trigger count observed by the
	/// caller. A miss (the count moved on) is not an error.
	async fn set_blocked_until(
		&self,
		identity_hash: &IdentityHash,
		device_id: &str,
		expected_count: u32,
		blocked_until: Timestamp,
	) -> GpResult<()>;

	/// Records a successful verification: resets the failure counter,
	/// stores `verified_until`, and clears any block. Upserts.
	async fn mark_verified(
		&self,
		identity_hash: &IdentityHash,
		device_id: &str,
		verified_until: Timestamp,
	) -> GpResult<()>;
}

// vim: ts=4
