use crate::prelude::*;

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use slog::Logger;

const IDLE: u8 = 0;
const RUNNING: u8 = 1;
const STOP_REQUESTED: u8 = 2;

/// Shared lifecycle flag of a polling loop.
///
/// Clones observe the same flag, so a handler, a signal listener or
/// another thread can request a stop. The request is only noticed between
/// two fetch cycles. A stop requested before the loop starts is kept and
/// makes the next `start` return right away.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    state: Arc<AtomicU8>,
}

impl StopHandle {
    /// Marks the loop as running. Returns `false`, consuming the request,
    /// when a stop was asked for in the meantime.
    pub fn start(&self) -> bool {
        match self
            .state
            .compare_exchange(IDLE, RUNNING, Ordering::SeqCst, Ordering::SeqCst)
        {
            Ok(_) => true,
            Err(RUNNING) => true,
            Err(_) => {
                self.state.store(IDLE, Ordering::SeqCst);
                false
            }
        }
    }

    pub fn stop(&self) {
        self.state.store(STOP_REQUESTED, Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.state.load(Ordering::SeqCst) == RUNNING
    }

    /// Back to idle once the loop has exited
    fn finish(&self) {
        self.state.store(IDLE, Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Stopped,
    Running,
}

/// Long-poll loop feeding `getUpdates` batches into a dispatcher
pub struct Poller {
    dispatcher: Dispatcher,
    lifecycle: StopHandle,
    offset: i64,
    logger: Logger,
}

#[derive(Default)]
pub struct PollerBuilder {
    dispatcher: Option<Dispatcher>,
    logger: Option<Logger>,
}

impl PollerBuilder {
    pub fn dispatcher(self, dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher: Some(dispatcher),
            ..self
        }
    }

    pub fn logger(self, logger: Logger) -> Self {
        Self {
            logger: Some(logger),
            ..self
        }
    }

    pub fn build(self) -> BotResult<Poller> {
        let dispatcher = self
            .dispatcher
            .ok_or_else(|| {
                BotError::Config("Did not provide a dispatcher for the poller".into())
            })?;
        let logger = self
            .logger
            .unwrap_or_else(|| dispatcher.logger().clone());
        Ok(Poller {
            lifecycle: dispatcher.stop_handle(),
            dispatcher,
            offset: 0,
            logger,
        })
    }
}

impl Poller {
    pub fn new() -> PollerBuilder {
        Default::default()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher {
        &mut self.dispatcher
    }

    /// Next `update_id` the loop will ask for
    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn state(&self) -> PollerState {
        if self.lifecycle.is_running() {
            PollerState::Running
        } else {
            PollerState::Stopped
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.lifecycle.clone()
    }

    pub fn stop(&self) {
        self.lifecycle.stop()
    }

    /// Engages the polling loop in the current thread.
    ///
    /// Returns `Ok` once a stop was requested. Any failure of the API or of
    /// the transport is fatal: it is logged as critical and returned, and
    /// the caller is expected to terminate the process. Nothing is retried.
    pub fn start(&mut self, interval: Duration, timeout: u64) -> BotResult<()> {
        if !self.lifecycle.start() {
            info!(self.logger, "Stop requested before polling started"; "offset" => self.offset);
            return Ok(());
        }
        info!(self.logger, "Bot started polling";
            "status" => "success",
            "timeout" => timeout,
            "offset" => self.offset,
        );

        while self.lifecycle.is_running() {
            match self.poll_once(timeout) {
                Ok(0) if !interval.is_zero() => std::thread::sleep(interval),
                Ok(_) => {}
                Err(why) => {
                    crit!(self.logger, "Polling failed, giving up";
                        "reason" => why.to_string(),
                        "offset" => self.offset,
                    );
                    self.lifecycle.finish();
                    return Err(why);
                }
            }
        }

        self.lifecycle.finish();
        info!(self.logger, "Polling stopped"; "offset" => self.offset);
        Ok(())
    }

    /// Fetches one batch and dispatches it, returning the batch size
    pub fn poll_once(&mut self, timeout: u64) -> BotResult<usize> {
        let request = json!({
            "offset": self.offset,
            "timeout": timeout,
            "allowed_updates": ALLOWED_UPDATES,
        });
        let response = self.dispatcher.transport().call("getUpdates", &request)?;

        if response.get("ok").and_then(Value::as_bool) != Some(true) {
            let description = response
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or("Unknown error");
            return Err(BotError::Api(description.to_owned()));
        }

        let batch = match response.get("result") {
            None | Some(Value::Null) => return Ok(0),
            Some(Value::Array(batch)) => batch,
            Some(_) => {
                return Err(BotError::Api(
                    "getUpdates result is not a list".to_owned(),
                ))
            }
        };

        if !batch.is_empty() {
            debug!(self.logger, "Received updates"; "count" => batch.len());
        }
        for raw in batch {
            let update: Update = serde_json::from_value(raw.clone())?;
            self.offset = update.update_id + 1;
            self.dispatcher.process_update(&update);
        }
        Ok(batch.len())
    }
}
