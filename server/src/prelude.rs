pub use gatepost_core::prelude::*;

// vim: ts=4
