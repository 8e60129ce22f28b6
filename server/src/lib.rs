//! Gatepost is an embeddable abuse-prevention gate for public comment
//! forms.
//!
//! # Features
//!
//! - Anonymous rate counting
//!		- salted one-way identity hashing, no plaintext addresses stored
//!		- short and long sliding windows over the comment log
//!	- CAPTCHA escalation
//!		- challenge on risk or prior failures
//!		- escalating block schedule on repeated failures
//!		- verification bypass window after a pass
//!	- Device identity
//!		- HMAC-signed device cookies, consent-aware
//!		- shared sentinel bucket for cookie-less traffic
//!	- Pluggable storage and verifier adapters

#![forbid(unsafe_code)]

pub mod comment;
pub mod prelude;
pub mod routes;
pub mod types;

pub use gatepost_core::{build_app, Adapters, App, AppBuilderOpts, AppState};

use crate::prelude::*;

/// Builds the app, binds the listener, and serves until shutdown.
pub async fn run(opts: AppBuilderOpts, adapters: Adapters) -> GpResult<()> {
	tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.with_target(false)
		.init();

	let app = build_app(opts, adapters)?;
	let router = routes::init(app.clone());

	let listener = tokio::net::TcpListener::bind(app.opts.listen.as_ref()).await?;
	info!("Gatepost v{} listening on {}", gatepost_core::app::VERSION, app.opts.listen);

	axum::serve(
		listener,
		router.into_make_service_with_connect_info::<std::net::SocketAddr>(),
	)
	.with_graceful_shutdown(shutdown_signal())
	.await?;

	Ok(())
}

async fn shutdown_signal() {
	let ctrl_c = async {
		if tokio::signal::ctrl_c().await.is_err() {
			std::future::pending::<()>().await;
		}
	};

	#[cfg(unix)]
	let terminate = async {
		match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
			Ok(mut signal) => {
				signal.recv().await;
			}
			Err(_) => std::future::pending::<()>().await,
		}
	};
	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => {},
		_ = terminate => {},
	}
	info!("Shutdown signal received");
}

// vim: ts=4
