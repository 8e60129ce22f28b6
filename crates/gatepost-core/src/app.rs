//! App state type

use std::sync::Arc;

use crate::device::DeviceResolver;
use crate::gate::{CommentGate, GateConfig};
use crate::prelude::*;
use crate::token::TokenSigner;

use gatepost_types::abuse_adapter::AbuseAdapter;
use gatepost_types::captcha_verifier::CaptchaVerifier;
use gatepost_types::comment_adapter::CommentAdapter;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct AppState {
	pub opts: AppBuilderOpts,

	pub abuse_adapter: Arc<dyn AbuseAdapter>,
	pub comment_adapter: Arc<dyn CommentAdapter>,
	pub captcha_verifier: Arc<dyn CaptchaVerifier>,

	pub device_resolver: DeviceResolver,
	pub gate: CommentGate,
}

pub type App = Arc<AppState>;

pub struct Adapters {
	pub abuse_adapter: Arc<dyn AbuseAdapter>,
	pub comment_adapter: Arc<dyn CommentAdapter>,
	pub captcha_verifier: Arc<dyn CaptchaVerifier>,
}

#[derive(Debug)]
pub struct AppBuilderOpts {
	pub listen: Box<str>,
	/// Key for signing device cookies.
	pub cookie_secret: Box<str>,
	/// Salt for the one-way identity hash.
	pub identity_salt: Box<str>,
	/// Mark issued cookies `Secure` (any HTTPS deployment).
	pub secure_cookies: bool,
}

pub fn build_app(opts: AppBuilderOpts, adapters: Adapters) -> GpResult<App> {
	let signer = TokenSigner::new(opts.cookie_secret.as_bytes())?;
	let device_resolver = DeviceResolver::new(signer, opts.secure_cookies);
	let gate = CommentGate::new(
		adapters.abuse_adapter.clone(),
		adapters.comment_adapter.clone(),
		adapters.captcha_verifier.clone(),
		GateConfig::default(),
	);

	Ok(Arc::new(AppState {
		opts,
		abuse_adapter: adapters.abuse_adapter,
		comment_adapter: adapters.comment_adapter,
		captcha_verifier: adapters.captcha_verifier,
		device_resolver,
		gate,
	}))
}

// vim: ts=4
