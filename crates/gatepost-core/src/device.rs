//! Device identity resolver.
//!
//! Derives the anonymous device id used to key the CAPTCHA state from a
//! signed cookie, minting or clearing cookies based on tracking consent.
//! Without consent (or without a cookie) all traffic from one identity
//! hash shares the sentinel device bucket — a deliberate
//! privacy/anti-abuse trade-off.
//!
//! The resolver is side-effect free: it never touches the state store,
//! it only returns a device id plus cookie directives for the caller to
//! attach to its response.

use rand::RngCore;

use crate::prelude::*;
use crate::token::TokenSigner;
use gatepost_types::types::CookieConsent;

pub const DEVICE_COOKIE_NAME: &str = "comment_device_id";
pub const DEVICE_COOKIE_MAX_AGE: i64 = 31_536_000; // 1 year

/// Device id used when the caller has no (valid) cookie and has not
/// consented to one.
pub const SENTINEL_DEVICE_ID: &str = "ip-only";

const DEVICE_ID_BYTES: usize = 16;
const DEVICE_ID_MAX_LEN: usize = 64;

/// Cookie action for the caller to perform on its response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieDirective {
	/// Set the device cookie to this signed token.
	Set(Box<str>),
	/// Clear the device cookie.
	Clear,
}

#[derive(Debug)]
pub struct ResolvedDevice {
	pub device_id: Box<str>,
	pub directive: Option<CookieDirective>,
}

impl ResolvedDevice {
	fn sentinel(directive: Option<CookieDirective>) -> Self {
		Self { device_id: SENTINEL_DEVICE_ID.into(), directive }
	}
}

#[derive(Debug, Clone)]
pub struct DeviceResolver {
	signer: TokenSigner,
	secure_cookies: bool,
}

impl DeviceResolver {
	pub fn new(signer: TokenSigner, secure_cookies: bool) -> Self {
		Self { signer, secure_cookies }
	}

	/// Resolves the device id for one request.
	///
	/// A validly signed cookie always wins, regardless of consent; consent
	/// only decides what happens when there is none.
	pub fn resolve(&self, cookie: Option<&str>, consent: CookieConsent) -> ResolvedDevice {
		if let Some(raw) = cookie {
			if let Some(device_id) = self.signer.verify(raw, DEVICE_ID_MAX_LEN) {
				return ResolvedDevice { device_id: device_id.into(), directive: None };
			}
			debug!("rejected device cookie with invalid signature");
		}

		match consent {
			CookieConsent::Declined => {
				// Invalid or unwanted cookie gets cleared
				let directive = cookie.map(|_| CookieDirective::Clear);
				ResolvedDevice::sentinel(directive)
			}
			CookieConsent::Accepted => {
				let device_id = mint_device_id();
				let token = self.signer.sign(&device_id);
				ResolvedDevice {
					device_id: device_id.into(),
					directive: Some(CookieDirective::Set(token.into())),
				}
			}
			CookieConsent::Unknown => ResolvedDevice::sentinel(None),
		}
	}

	/// Renders a directive as a `Set-Cookie` header value.
	pub fn cookie_header(&self, directive: &CookieDirective) -> String {
		let secure = if self.secure_cookies { "; Secure" } else { "" };
		match directive {
			CookieDirective::Set(token) => format!(
				"{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax{}",
				DEVICE_COOKIE_NAME, token, DEVICE_COOKIE_MAX_AGE, secure
			),
			CookieDirective::Clear => format!(
				"{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax{}",
				DEVICE_COOKIE_NAME, secure
			),
		}
	}
}

/// 16 random bytes, hex-encoded
fn mint_device_id() -> String {
	let mut bytes = [0u8; DEVICE_ID_BYTES];
	rand::rng().fill_bytes(&mut bytes);
	bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Extracts a cookie value from a `Cookie` request header.
pub fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
	header.split(';').find_map(|pair| {
		let (key, value) = pair.trim().split_once('=')?;
		(key == name).then_some(value)
	})
}


// vim: ts=4
