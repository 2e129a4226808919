use crate::prelude::*;

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

pub type MessageHandler = Box<dyn Fn(&MessageContext<'_>) -> UResult + Send>;
pub type CallbackHandler = Box<dyn Fn(&CallbackContext<'_>) -> UResult + Send>;

/// Registry slot a handler was invoked from, used in failure reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerCategory {
    Command,
    Photo,
    Message,
    Callback,
}

impl fmt::Display for HandlerCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self {
            HandlerCategory::Command => write!(f, "command"),
            HandlerCategory::Photo => write!(f, "photo"),
            HandlerCategory::Message => write!(f, "message"),
            HandlerCategory::Callback => write!(f, "callback"),
        }
    }
}

/// Runs one handler, turning both an `Err` and a panic into an error string
pub(crate) fn invoke_isolated<F>(handler: F) -> Result<(), String>
where
    F: FnOnce() -> UResult,
{
    match panic::catch_unwind(AssertUnwindSafe(handler)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(why)) => Err(why.to_string()),
        Err(payload) => Err(format!("handler panicked: {}", panic_message(&*payload))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "unknown panic payload"
    }
}
