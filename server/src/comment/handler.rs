use axum::{
	extract::{ConnectInfo, State},
	http::{header, HeaderMap, StatusCode},
	response::{IntoResponse, Response},
	Json,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::{prelude::*, types::ApiResponse};
use gatepost_core::device::{cookie_value, CookieDirective, DEVICE_COOKIE_NAME};
use gatepost_core::gate::Submission;
use gatepost_types::comment_adapter::CreateComment;
use gatepost_types::types::CookieConsent;

const MAX_POST_ID_LEN: usize = 256;
const MAX_AUTHOR_LEN: usize = 128;
const MAX_CONTENT_LEN: usize = 10_000;

/// # POST /api/comments
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentReq {
	post_id: String,
	content: String,
	author: Option<String>,
	captcha_verify_param: Option<String>,
	cookie_consent: Option<CookieConsent>,
	/// Honeypot field; humans leave it empty.
	website: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRes {
	comment_id: i64,
}

pub async fn post_comment(
	State(app): State<App>,
	ConnectInfo(addr): ConnectInfo<SocketAddr>,
	headers: HeaderMap,
	Json(req): Json<CommentReq>,
) -> GpResult<Response> {
	validate(&req)?;

	// Bots that fill the honeypot get a fake success and nothing stored
	if req.website.as_deref().is_some_and(|w| !w.is_empty()) {
		info!("honeypot tripped from {}", addr.ip());
		return Ok(success_response(0));
	}

	let now = Timestamp::now();
	let identity_hash = IdentityHash::derive(&app.opts.identity_salt, &addr.ip());
	let cookie = headers
		.get(header::COOKIE)
		.and_then(|value| value.to_str().ok())
		.and_then(|header| cookie_value(header, DEVICE_COOKIE_NAME));
	let consent = req.cookie_consent.unwrap_or(CookieConsent::Unknown);
	let resolved = app.device_resolver.resolve(cookie, consent);

	let verdict = app
		.gate
		.evaluate(&Submission {
			identity_hash: &identity_hash,
			device_id: &resolved.device_id,
			captcha_proof: req.captcha_verify_param.as_deref(),
			now,
		})
		.await;

	let response = match verdict {
		Ok(()) => {
			let comment_id = app
				.comment_adapter
				.create_comment(&CreateComment {
					identity_hash: &identity_hash,
					device_id: &resolved.device_id,
					post_id: &req.post_id,
					author: req.author.as_deref(),
					content: &req.content,
					created_at: now,
				})
				.await?;
			success_response(comment_id)
		}
		Err(gate_err) => gate_err.into_response(),
	};

	Ok(with_cookie(&app, response, resolved.directive.as_ref()))
}

fn validate(req: &CommentReq) -> GpResult<()> {
	if req.post_id.is_empty() || req.post_id.len() > MAX_POST_ID_LEN {
		return Err(Error::ValidationError("invalid post id".into()));
	}
	if req.content.trim().is_empty() {
		return Err(Error::ValidationError("comment content is empty".into()));
	}
	if req.content.len() > MAX_CONTENT_LEN {
		return Err(Error::ValidationError("comment content too long".into()));
	}
	if req.author.as_deref().is_some_and(|author| author.len() > MAX_AUTHOR_LEN) {
		return Err(Error::ValidationError("author name too long".into()));
	}
	Ok(())
}

fn success_response(comment_id: i64) -> Response {
	(StatusCode::OK, Json(ApiResponse::new(CommentRes { comment_id }))).into_response()
}

/// Attaches the resolver's cookie directive, if any, to the response.
fn with_cookie(app: &App, mut response: Response, directive: Option<&CookieDirective>) -> Response {
	if let Some(directive) = directive {
		match app.device_resolver.cookie_header(directive).parse() {
			Ok(value) => {
				response.headers_mut().insert(header::SET_COOKIE, value);
			}
			Err(err) => warn!("unrepresentable device cookie: {}", err),
		}
	}
	response
}

// vim: ts=4
