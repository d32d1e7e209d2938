pub use panel_types::error::{Error, PnResult};

pub use tracing::{debug, error, info, warn};

// vim: ts=4
