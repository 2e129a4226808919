pub mod config;
pub mod core;
pub mod errors;
pub mod logger;
pub mod markup;
pub mod prelude;
pub mod utility;
