use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Update kinds requested from `getUpdates`
pub const ALLOWED_UPDATES: [&str; 3] = ["message", "callback_query", "photo"];

/// One entry of a `getUpdates` batch. Payloads stay untyped JSON so
/// handlers see exactly what the API sent.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_query: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpdateKind<'a> {
    Message(&'a Value),
    CallbackQuery(&'a Value),
    Other,
}

impl Update {
    pub fn kind(&self) -> UpdateKind<'_> {
        if let Some(ref msg) = self.message {
            UpdateKind::Message(msg)
        } else if let Some(ref query) = self.callback_query {
            UpdateKind::CallbackQuery(query)
        } else {
            UpdateKind::Other
        }
    }
}

/// `chat.id` of a message payload
pub fn message_chat_id(message: &Value) -> Option<i64> {
    message.get("chat")?.get("id")?.as_i64()
}

/// Command token of a message text: `/start@bot arg` gives `start`.
/// Returns `None` when the text is not a command.
pub fn command_token(text: &str) -> Option<&str> {
    let rest = text.strip_prefix('/')?;
    let word = rest.split_whitespace().next().unwrap_or("");
    Some(word.split('@').next().unwrap_or(""))
}
