//! Escalating block schedule.
//!
//! Maps a cumulative CAPTCHA failure count to a cool-down deadline. The
//! first failure is free (the caller just retries the challenge), then
//! cool-downs grow and saturate at 24h.

use crate::prelude::*;

/// Cool-down per 1-indexed cumulative failure count, in seconds.
const BLOCK_SCHEDULE_SECS: [i64; 5] = [0, 120, 600, 3600, 86_400];

/// Resolves the block deadline for a failure count, or `None` when the
/// failure does not (yet) warrant a block.
///
/// Monotone: the resulting duration never decreases as `trigger_count`
/// grows, and saturates at the last schedule entry.
pub fn resolve_blocked_until(trigger_count: i64, now: Timestamp) -> Option<Timestamp> {
	if trigger_count <= 0 {
		return None;
	}

	let index = (trigger_count as usize).min(BLOCK_SCHEDULE_SECS.len()) - 1;
	let duration = BLOCK_SCHEDULE_SECS[index];
	if duration == 0 {
		return None;
	}

	Some(now.add_secs(duration))
}


// vim: ts=4
