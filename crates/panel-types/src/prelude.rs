pub use crate::error::{Error, PnResult};
pub use crate::types::{Timestamp, UserId};

pub use tracing::{debug, error, info, warn};

// vim: ts=4
