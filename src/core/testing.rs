//! Test doubles shared by the unit tests of the core modules.

use crate::prelude::*;

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use slog::{Drain, Logger, Never, OwnedKVList, Record};

#[derive(Default)]
struct MockState {
    calls: Vec<(String, Value)>,
    replies: HashMap<String, VecDeque<Result<Value, String>>>,
}

/// Records every call and answers with scripted replies, falling back
/// to `{"ok": true, "result": true}`
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn reply(&self, method: &str, response: Value) -> &Self {
        self.push(method, Ok(response))
    }

    pub fn fail(&self, method: &str, reason: &str) -> &Self {
        self.push(method, Err(reason.to_owned()))
    }

    fn push(&self, method: &str, reply: Result<Value, String>) -> &Self {
        self.state
            .lock()
            .unwrap()
            .replies
            .entry(method.to_owned())
            .or_default()
            .push_back(reply);
        self
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn calls_to(&self, method: &str) -> Vec<Value> {
        self.calls()
            .into_iter()
            .filter(|(m, _)| m == method)
            .map(|(_, payload)| payload)
            .collect()
    }

    pub fn last_call(&self, method: &str) -> Option<Value> {
        self.calls_to(method).pop()
    }
}

impl ApiTransport for MockTransport {
    fn call(&self, method: &str, payload: &Value) -> BotResult<Value> {
        let mut state = self.state.lock().unwrap();
        state.calls.push((method.to_owned(), payload.clone()));
        let reply = state
            .replies
            .get_mut(method)
            .and_then(|queue| queue.pop_front());
        match reply {
            Some(Ok(value)) => Ok(value),
            Some(Err(reason)) => Err(BotError::Transport(reason)),
            None => Ok(json!({"ok": true, "result": true})),
        }
    }

    fn file_url(&self, file_path: &str) -> String {
        format!("https://files.test/file/botTOKEN/{}", file_path)
    }
}

/// Drain keeping `LEVEL message` lines in memory
struct CaptureDrain(Arc<Mutex<Vec<String>>>);

impl Drain for CaptureDrain {
    type Ok = ();
    type Err = Never;

    fn log(&self, record: &Record<'_>, _values: &OwnedKVList) -> Result<(), Never> {
        self.0
            .lock()
            .unwrap()
            .push(format!("{} {}", record.level().as_short_str(), record.msg()));
        Ok(())
    }
}

pub fn capture_logger() -> (Logger, Arc<Mutex<Vec<String>>>) {
    let records = Arc::new(Mutex::new(Vec::new()));
    let logger = Logger::root(CaptureDrain(records.clone()), o!());
    (logger, records)
}
