use std::{env, path, sync::Arc};

use gatepost::{Adapters, AppBuilderOpts};
use gatepost_abuse_adapter_sqlite::AbuseAdapterSqlite;
use gatepost_captcha_verifier_http::CaptchaVerifierHttp;

pub struct Config {
	pub listen: String,
	pub data_dir: path::PathBuf,
	pub cookie_secret: String,
	pub identity_salt: String,
	pub secure_cookies: bool,
	pub captcha_verify_url: String,
	pub captcha_secret: String,
	pub captcha_timeout_ms: Option<u64>,
}

impl Config {
	fn from_env() -> Self {
		Config {
			listen: env::var("GP_LISTEN").unwrap_or("127.0.0.1:8080".to_string()),
			data_dir: path::PathBuf::from(env::var("GP_DATA_DIR").unwrap_or("./data".to_string())),
			cookie_secret: env::var("GP_COOKIE_SECRET").expect("GP_COOKIE_SECRET is not set"),
			identity_salt: env::var("GP_IDENTITY_SALT").expect("GP_IDENTITY_SALT is not set"),
			secure_cookies: env::var("GP_SECURE_COOKIES").map(|v| v == "true").unwrap_or(true),
			captcha_verify_url: env::var("GP_CAPTCHA_VERIFY_URL")
				.unwrap_or("https://hcaptcha.com/siteverify".to_string()),
			captcha_secret: env::var("GP_CAPTCHA_SECRET").expect("GP_CAPTCHA_SECRET is not set"),
			captcha_timeout_ms: env::var("GP_CAPTCHA_TIMEOUT_MS").ok().and_then(|v| v.parse().ok()),
		}
	}
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
	let config = Config::from_env();

	tokio::fs::create_dir_all(&config.data_dir).await.expect("Cannot create data dir");
	let abuse_adapter = Arc::new(
		AbuseAdapterSqlite::new(config.data_dir.join("gatepost.db"))
			.await
			.expect("Failed to open abuse database"),
	);
	let captcha_verifier = Arc::new(
		CaptchaVerifierHttp::new(
			config.captcha_verify_url,
			config.captcha_secret,
			config.captcha_timeout_ms,
		)
		.expect("Failed to build captcha verifier"),
	);

	gatepost::run(
		AppBuilderOpts {
			listen: config.listen.into(),
			cookie_secret: config.cookie_secret.into(),
			identity_salt: config.identity_salt.into(),
			secure_cookies: config.secure_cookies,
		},
		Adapters {
			abuse_adapter: abuse_adapter.clone(),
			comment_adapter: abuse_adapter,
			captcha_verifier,
		},
	)
	.await
	.unwrap();
}

// vim: ts=4
