pub use crate::app::App;
pub use gatepost_types::prelude::*;

// vim: ts=4
