mod application;
mod context;
mod dispatcher;
mod handler;
mod poller;
mod transport;
mod update;

#[cfg(test)]
pub(crate) mod testing;

pub use application::*;
pub use context::*;
pub use dispatcher::*;
pub use handler::{CallbackHandler, HandlerCategory, MessageHandler};
pub use poller::*;
pub use transport::*;
pub use update::*;
