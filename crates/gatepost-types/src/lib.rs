//! Shared types and adapter traits for the Gatepost comment gate.
//!
//! This crate contains the foundational types that are shared between the
//! server crate, the decision engine, and the adapter implementations.
//! Keeping them in a separate crate lets adapter crates compile in
//! parallel with the engine.

pub mod abuse_adapter;
pub mod captcha_verifier;
pub mod comment_adapter;
pub mod error;
pub mod prelude;
pub mod types;

// vim: ts=4
