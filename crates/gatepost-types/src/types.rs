//! Common types used throughout the Gatepost engine.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::net::IpAddr;
use std::time::SystemTime;

// Timestamp //
//***********//

/// Unix timestamp in seconds.
///
/// Every decision uses a single `Timestamp` sampled once per request, so
/// cookie issuance, window counting, and expiry evaluation can never
/// disagree about "now".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(pub i64);

impl Timestamp {
	pub fn now() -> Self {
		let res = SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap_or_default();
		Timestamp(res.as_secs() as i64)
	}

	pub fn from_now(secs: i64) -> Self {
		Timestamp(Self::now().0 + secs)
	}

	pub fn add_secs(self, secs: i64) -> Self {
		Timestamp(self.0 + secs)
	}
}

impl std::fmt::Display for Timestamp {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl Serialize for Timestamp {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		serializer.serialize_i64(self.0)
	}
}

impl<'de> Deserialize<'de> for Timestamp {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		Ok(Timestamp(i64::deserialize(deserializer)?))
	}
}

// IdentityHash //
//**************//

/// One-way, salted hash of the caller's normalized network address.
///
/// Used as a coarse, privacy-preserving actor key. Derived per request,
/// never persisted in plaintext.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IdentityHash(Box<str>);

impl IdentityHash {
	/// Derives the hash from a deployment-wide salt and the client address.
	///
	/// IPv4-mapped IPv6 addresses are canonicalized first so the same
	/// client hashes identically regardless of socket family.
	pub fn derive(salt: &str, addr: &IpAddr) -> Self {
		let mut hasher = Sha256::new();
		hasher.update(salt.as_bytes());
		hasher.update(addr.to_canonical().to_string().as_bytes());
		IdentityHash(URL_SAFE_NO_PAD.encode(hasher.finalize()).into())
	}

	/// Wraps an already-derived hash value (adapter and test use).
	pub fn from_raw(raw: impl Into<Box<str>>) -> Self {
		IdentityHash(raw.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl std::fmt::Display for IdentityHash {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

// CookieConsent //
//***************//

/// Tracking-cookie consent as declared by the submission request.
///
/// Anything other than the two explicit values is treated as `Unknown`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CookieConsent {
	Accepted,
	Declined,
	#[serde(other)]
	Unknown,
}

impl CookieConsent {
	pub fn from_param(param: Option<&str>) -> Self {
		match param {
			Some("accepted") => CookieConsent::Accepted,
			Some("declined") => CookieConsent::Declined,
			_ => CookieConsent::Unknown,
		}
	}
}

// CaptchaState //
//**************//

/// Persisted risk/verification record for one (identity hash, device) pair.
///
/// Invariants maintained by the engine:
/// - an active `blocked_until` always takes precedence over `verified_until`
/// - `trigger_count` resets to 0 exactly when a verification succeeds
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CaptchaState {
	/// Consecutive CAPTCHA failures since the last success.
	pub trigger_count: u32,
	/// While in the future, no CAPTCHA is required.
	pub verified_until: Option<Timestamp>,
	/// While in the future, all submissions from this key are rejected.
	pub blocked_until: Option<Timestamp>,
}

impl CaptchaState {
	pub fn is_verified(&self, now: Timestamp) -> bool {
		self.verified_until.is_some_and(|until| until > now)
	}

	pub fn is_blocked(&self, now: Timestamp) -> bool {
		self.blocked_until.is_some_and(|until| until > now)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::net::Ipv4Addr;

	#[test]
	fn test_identity_hash_is_stable_and_salted() {
		let addr = IpAddr::V4(Ipv4Addr::new(203, 0, 113, 7));
		let a = IdentityHash::derive("salt-1", &addr);
		let b = IdentityHash::derive("salt-1", &addr);
		let c = IdentityHash::derive("salt-2", &addr);

		assert_eq!(a, b);
		assert_ne!(a, c);
		assert!(!a.as_str().contains("203"));
	}

	#[test]
	fn test_identity_hash_canonicalizes_mapped_addresses() {
		let v4: IpAddr = "203.0.113.7".parse().unwrap();
		let mapped: IpAddr = "::ffff:203.0.113.7".parse().unwrap();

		assert_eq!(IdentityHash::derive("s", &v4), IdentityHash::derive("s", &mapped));
	}

	#[test]
	fn test_cookie_consent_from_param() {
		assert_eq!(CookieConsent::from_param(Some("accepted")), CookieConsent::Accepted);
		assert_eq!(CookieConsent::from_param(Some("declined")), CookieConsent::Declined);
		assert_eq!(CookieConsent::from_param(Some("maybe")), CookieConsent::Unknown);
		assert_eq!(CookieConsent::from_param(None), CookieConsent::Unknown);
	}

	#[test]
	fn test_captcha_state_expiry_boundaries() {
		let now = Timestamp(1000);
		let state = CaptchaState {
			trigger_count: 1,
			verified_until: Some(Timestamp(1000)),
			blocked_until: Some(Timestamp(1001)),
		};

		// exactly at the boundary counts as expired
		assert!(!state.is_verified(now));
		assert!(state.is_blocked(now));
		assert!(!state.is_blocked(Timestamp(1001)));
	}
}

// vim: ts=4
