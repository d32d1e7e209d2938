pub use crate::app::App;
pub use panel_types::error::{Error, PnResult};
pub use panel_types::types::{Timestamp, UserId};

pub use tracing::{debug, error, info, warn};

// vim: ts=4
