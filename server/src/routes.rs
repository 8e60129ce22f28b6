use axum::{
	routing::{get, post},
	Router,
};
use tower_http::trace::TraceLayer;

use crate::comment;
use crate::App;

pub fn init(state: App) -> Router {
	Router::new()
		.route("/api/comments", post(comment::handler::post_comment))
		.route("/health", get(async || "OK\n"))
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}

// vim: ts=4
