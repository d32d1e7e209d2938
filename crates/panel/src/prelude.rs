pub use panel_core::prelude::*;

// vim: ts=4
