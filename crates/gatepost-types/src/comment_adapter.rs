//! Adapter for the durable anonymous-comment log.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::prelude::*;

/// Data needed to persist a gated comment
#[derive(Debug)]
pub struct CreateComment<'a> {
	pub identity_hash: &'a IdentityHash,
	pub device_id: &'a str,
	pub post_id: &'a str,
	pub author: Option<&'a str>,
	pub content: &'a str,
	pub created_at: Timestamp,
}

/// A Gatepost comment-log adapter.
///
/// The engine only reads timestamps from the log (window counting); the
/// write happens after an allow verdict. Counting is read-only and
/// eventually consistent under concurrent writes — it is an advisory risk
/// signal, not the hard boundary.
#[async_trait]
pub trait CommentAdapter: Debug + Send + Sync {
	/// Number of comments from this identity hash with
	/// `created_at >= since`.
	async fn count_since(&self, identity_hash: &IdentityHash, since: Timestamp) -> GpResult<u32>;

	/// Appends a comment to the log and returns its id.
	async fn create_comment(&self, data: &CreateComment<'_>) -> GpResult<i64>;
}

// vim: ts=4
