//! HTTP surface integration tests.
//!
//! Drives the router with `tower::ServiceExt::oneshot` against in-memory
//! adapters: request/response envelopes, cookie issuance, the honeypot,
//! and the gate verdict mapping.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use gatepost::{build_app, routes, Adapters, App, AppBuilderOpts};
use gatepost_types::abuse_adapter::AbuseAdapter;
use gatepost_types::captcha_verifier::CaptchaVerifier;
use gatepost_types::comment_adapter::{CommentAdapter, CreateComment};
use gatepost_types::prelude::*;
use gatepost_types::types::CaptchaState;

#[derive(Debug, Default)]
struct MemoryAbuseStore {
	states: Mutex<HashMap<(String, String), CaptchaState>>,
}

#[async_trait]
impl AbuseAdapter for MemoryAbuseStore {
	async fn read_captcha_state(
		&self,
		identity_hash: &IdentityHash,
		device_id: &str,
	) -> GpResult<Option<CaptchaState>> {
		Ok(self
			.states
			.lock()
			.unwrap()
			.get(&(identity_hash.as_str().to_string(), device_id.to_string()))
			.copied())
	}

	async fn register_failure(
		&self,
		identity_hash: &IdentityHash,
		device_id: &str,
	) -> GpResult<u32> {
		let mut states = self.states.lock().unwrap();
		let state = states
			.entry((identity_hash.as_str().to_string(), device_id.to_string()))
			.or_default();
		state.trigger_count += 1;
		Ok(state.trigger_count)
	}

	async fn set_blocked_until(
		&self,
		identity_hash: &IdentityHash,
		device_id: &str,
		expected_count: u32,
		blocked_until: Timestamp,
	) -> GpResult<()> {
		let mut states = self.states.lock().unwrap();
		if let Some(state) =
			states.get_mut(&(identity_hash.as_str().to_string(), device_id.to_string()))
		{
			if state.trigger_count == expected_count {
				state.blocked_until = Some(blocked_until);
			}
		}
		Ok(())
	}

	async fn mark_verified(
		&self,
		identity_hash: &IdentityHash,
		device_id: &str,
		verified_until: Timestamp,
	) -> GpResult<()> {
		let mut states = self.states.lock().unwrap();
		let state = states
			.entry((identity_hash.as_str().to_string(), device_id.to_string()))
			.or_default();
		state.trigger_count = 0;
		state.verified_until = Some(verified_until);
		state.blocked_until = None;
		Ok(())
	}
}

#[derive(Debug, Default)]
struct MemoryCommentLog {
	entries: Mutex<Vec<(String, i64)>>,
}

#[async_trait]
impl CommentAdapter for MemoryCommentLog {
	async fn count_since(&self, identity_hash: &IdentityHash, since: Timestamp) -> GpResult<u32> {
		let entries = self.entries.lock().unwrap();
		Ok(entries
			.iter()
			.filter(|(hash, at)| hash == identity_hash.as_str() && *at >= since.0)
			.count() as u32)
	}

	async fn create_comment(&self, data: &CreateComment<'_>) -> GpResult<i64> {
		let mut entries = self.entries.lock().unwrap();
		entries.push((data.identity_hash.as_str().to_string(), data.created_at.0));
		Ok(entries.len() as i64)
	}
}

/// Verifier that always answers the same.
#[derive(Debug)]
struct FixedVerifier(bool);

#[async_trait]
impl CaptchaVerifier for FixedVerifier {
	async fn verify(&self, _proof: &str) -> GpResult<bool> {
		Ok(self.0)
	}
}

struct TestServer {
	app: App,
	log: Arc<MemoryCommentLog>,
}

fn test_server(verifier_passes: bool) -> TestServer {
	let log = Arc::new(MemoryCommentLog::default());
	let app = build_app(
		AppBuilderOpts {
			listen: "127.0.0.1:0".into(),
			cookie_secret: "test-cookie-secret".into(),
			identity_salt: "test-salt".into(),
			secure_cookies: false,
		},
		Adapters {
			abuse_adapter: Arc::new(MemoryAbuseStore::default()),
			comment_adapter: log.clone(),
			captcha_verifier: Arc::new(FixedVerifier(verifier_passes)),
		},
	)
	.expect("build_app failed");
	TestServer { app, log }
}

fn comment_request(body: serde_json::Value) -> Request<Body> {
	let mut request = Request::builder()
		.method("POST")
		.uri("/api/comments")
		.header(header::CONTENT_TYPE, "application/json")
		.body(Body::from(body.to_string()))
		.expect("request build failed");
	let addr: SocketAddr = "203.0.113.7:40000".parse().expect("bad addr");
	request.extensions_mut().insert(ConnectInfo(addr));
	request
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
	let bytes = response.into_body().collect().await.expect("body read failed").to_bytes();
	serde_json::from_slice(&bytes).expect("body is not JSON")
}

#[tokio::test]
async fn test_quiet_comment_is_stored() {
	let server = test_server(true);
	let router = routes::init(server.app.clone());

	let response = router
		.oneshot(comment_request(serde_json::json!({
			"postId": "hello-world",
			"content": "First!",
			"author": "alice",
		})))
		.await
		.expect("request failed");

	assert_eq!(response.status(), StatusCode::OK);
	let body = json_body(response).await;
	assert_eq!(body["data"]["commentId"], 1);
	assert_eq!(server.log.entries.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_consent_mints_signed_cookie() {
	let server = test_server(true);
	let router = routes::init(server.app.clone());

	let response = router
		.oneshot(comment_request(serde_json::json!({
			"postId": "hello-world",
			"content": "Hi",
			"cookieConsent": "accepted",
		})))
		.await
		.expect("request failed");

	assert_eq!(response.status(), StatusCode::OK);
	let cookie = response
		.headers()
		.get(header::SET_COOKIE)
		.and_then(|v| v.to_str().ok())
		.expect("no Set-Cookie header");
	assert!(cookie.starts_with("comment_device_id="));
	assert!(cookie.contains("HttpOnly"));
	assert!(cookie.contains('.'), "cookie value must carry a signature");
}

#[tokio::test]
async fn test_no_consent_no_cookie() {
	let server = test_server(true);
	let router = routes::init(server.app.clone());

	let response = router
		.oneshot(comment_request(serde_json::json!({
			"postId": "hello-world",
			"content": "Hi",
		})))
		.await
		.expect("request failed");

	assert_eq!(response.status(), StatusCode::OK);
	assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_honeypot_fakes_success() {
	let server = test_server(true);
	let router = routes::init(server.app.clone());

	let response = router
		.oneshot(comment_request(serde_json::json!({
			"postId": "hello-world",
			"content": "Buy cheap watches",
			"website": "https://spam.example",
		})))
		.await
		.expect("request failed");

	assert_eq!(response.status(), StatusCode::OK, "bots must see a success");
	assert_eq!(server.log.entries.lock().unwrap().len(), 0, "nothing may be stored");
}

#[tokio::test]
async fn test_risky_submission_maps_to_captcha_required() {
	let server = test_server(true);
	let router = routes::init(server.app.clone());

	// Two stored comments put the identity over the short-window risk line
	for _ in 0..2 {
		let response = router
			.clone()
			.oneshot(comment_request(serde_json::json!({
				"postId": "hello-world",
				"content": "chatty",
			})))
			.await
			.expect("request failed");
		assert_eq!(response.status(), StatusCode::OK);
	}

	let response = router
		.oneshot(comment_request(serde_json::json!({
			"postId": "hello-world",
			"content": "chatty",
		})))
		.await
		.expect("request failed");

	assert_eq!(response.status(), StatusCode::FORBIDDEN);
	let body = json_body(response).await;
	assert_eq!(body["error"]["code"], "captcha_required");
}

#[tokio::test]
async fn test_failed_captcha_maps_to_captcha_invalid() {
	let server = test_server(false);
	let router = routes::init(server.app.clone());

	let response = router
		.oneshot(comment_request(serde_json::json!({
			"postId": "hello-world",
			"content": "Hi",
			"captchaVerifyParam": "wrong",
		})))
		.await
		.expect("request failed");

	assert_eq!(response.status(), StatusCode::FORBIDDEN);
	let body = json_body(response).await;
	assert_eq!(body["error"]["code"], "captcha_invalid");
	assert_eq!(server.log.entries.lock().unwrap().len(), 0);
}

#[tokio::test]
async fn test_empty_content_is_rejected() {
	let server = test_server(true);
	let router = routes::init(server.app.clone());

	let response = router
		.oneshot(comment_request(serde_json::json!({
			"postId": "hello-world",
			"content": "   ",
		})))
		.await
		.expect("request failed");

	assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
	assert_eq!(server.log.entries.lock().unwrap().len(), 0);
}

#[tokio::test]
async fn test_health_endpoint() {
	let server = test_server(true);
	let router = routes::init(server.app.clone());

	let response = router
		.oneshot(
			Request::builder()
				.uri("/health")
				.body(Body::empty())
				.expect("request build failed"),
		)
		.await
		.expect("request failed");

	assert_eq!(response.status(), StatusCode::OK);
}

// vim: ts=4
