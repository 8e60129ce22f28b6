//! Core engine for the Gatepost comment gate.
//!
//! This crate contains the abuse-prevention logic itself: the signed
//! device-cookie utility, the device identity resolver, the submission
//! rate counter, the escalating block schedule, and the decision engine
//! that ties them together. Storage and the external CAPTCHA service are
//! reached only through the adapter traits in `gatepost-types`.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod app;
pub mod device;
pub mod gate;
pub mod prelude;
pub mod risk;
pub mod schedule;
pub mod token;

pub use app::{build_app, Adapters, App, AppBuilderOpts, AppState};
pub use gate::{CommentGate, GateConfig, GateError, Submission};

// vim: ts=4
