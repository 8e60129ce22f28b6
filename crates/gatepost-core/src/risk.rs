//! Submission rate counter.
//!
//! Computes short- and long-window submission counts for an identity hash
//! from the durable comment log, plus the two derived predicates. The
//! challenge threshold is strictly more sensitive than the hard-reject
//! threshold, so risk always precedes outright limiting.

use crate::prelude::*;
use gatepost_types::comment_adapter::CommentAdapter;

pub const SHORT_WINDOW_SECS: i64 = 60;
pub const LONG_WINDOW_SECS: i64 = 600;

const SHORT_LIMIT: u32 = 3;
const LONG_LIMIT: u32 = 10;
const SHORT_RISK: u32 = 2;
const LONG_RISK: u32 = 6;

/// Prior submission counts over the two trailing windows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateWindows {
	pub short_count: u32,
	pub long_count: u32,
}

impl RateWindows {
	/// Counts submissions from `identity_hash` within the trailing
	/// windows, both anchored at the same `now`.
	pub async fn measure(
		comments: &dyn CommentAdapter,
		identity_hash: &IdentityHash,
		now: Timestamp,
	) -> GpResult<Self> {
		let short_count =
			comments.count_since(identity_hash, now.add_secs(-SHORT_WINDOW_SECS)).await?;
		let long_count =
			comments.count_since(identity_hash, now.add_secs(-LONG_WINDOW_SECS)).await?;

		Ok(Self { short_count, long_count })
	}

	/// Hard-reject threshold. Applies even to verified identities.
	pub fn is_rate_limited(&self) -> bool {
		self.short_count >= SHORT_LIMIT || self.long_count >= LONG_LIMIT
	}

	/// Soft threshold: submission is suspicious enough to demand a
	/// CAPTCHA challenge.
	pub fn is_captcha_risk(&self) -> bool {
		self.short_count >= SHORT_RISK || self.long_count >= LONG_RISK
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn windows(short_count: u32, long_count: u32) -> RateWindows {
		RateWindows { short_count, long_count }
	}

	#[test]
	fn test_quiet_traffic_is_neither() {
		assert!(!windows(0, 0).is_captcha_risk());
		assert!(!windows(1, 5).is_captcha_risk());
		assert!(!windows(1, 5).is_rate_limited());
	}

	#[test]
	fn test_risk_thresholds() {
		assert!(windows(2, 0).is_captcha_risk());
		assert!(windows(0, 6).is_captcha_risk());
	}

	#[test]
	fn test_limit_thresholds() {
		assert!(windows(3, 0).is_rate_limited());
		assert!(windows(0, 10).is_rate_limited());
		assert!(!windows(2, 9).is_rate_limited());
	}

	#[test]
	fn test_risk_strictly_precedes_limit() {
		// Any rate-limited combination must already be captcha risk
		for short in 0..12 {
			for long in 0..16 {
				let w = windows(short, long);
				if w.is_rate_limited() {
					assert!(w.is_captcha_risk(), "limit without risk at {}/{}", short, long);
				}
			}
		}
	}
}

// vim: ts=4
