/// Boxed result used by handlers and bootstrap code
pub type UResult<T = ()> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub use crate::core::*;
pub use crate::errors::{BotError, BotResult};
pub use crate::logger::*;
pub use crate::markup::*;
pub use crate::utility::*;
pub use slog::{crit, debug, error, info, o, warn};
