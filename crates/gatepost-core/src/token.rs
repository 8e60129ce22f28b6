//! Signed opaque token utility.
//!
//! A token is `<payload>.<signature>` where the signature is
//! HMAC-SHA256 over the payload, base64url-encoded without padding.
//! Verification uses a constant-time comparison. Independent of any
//! cookie library; the device cookie is its only current user.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::prelude::*;

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct TokenSigner {
	mac: HmacSha256,
}

impl std::fmt::Debug for TokenSigner {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str("TokenSigner")
	}
}

impl TokenSigner {
	pub fn new(secret: &[u8]) -> GpResult<Self> {
		let mac = HmacSha256::new_from_slice(secret)
			.map_err(|_| Error::Internal("invalid signing key".into()))?;
		Ok(Self { mac })
	}

	fn signature(&self, payload: &str) -> String {
		let mut mac = self.mac.clone();
		mac.update(payload.as_bytes());
		URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
	}

	/// Signs a payload, producing `<payload>.<signature>`.
	pub fn sign(&self, payload: &str) -> String {
		format!("{}.{}", payload, self.signature(payload))
	}

	/// Verifies a token and returns its payload, or `None` when the token
	/// is malformed, oversized, or carries a bad signature.
	pub fn verify<'a>(&self, token: &'a str, max_payload_len: usize) -> Option<&'a str> {
		let (payload, signature) = token.split_once('.')?;
		if payload.is_empty() || payload.len() > max_payload_len {
			return None;
		}

		let expected = self.signature(payload);
		if expected.as_bytes().ct_eq(signature.as_bytes()).into() {
			Some(payload)
		} else {
			None
		}
	}
}


// vim: ts=4
