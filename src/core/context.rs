//! Per-update views handed to handlers.
//!
//! Both contexts borrow the update payload and the dispatcher for the
//! duration of a single handler call. They never mutate dispatcher state
//! themselves; every side effect goes through a dispatcher method.

use crate::prelude::*;

use lazy_static::lazy_static;
use serde_json::{Map, Value};

lazy_static! {
    static ref EMPTY_OBJECT: Value = Value::Object(Map::new());
}

fn str_field<'v>(value: &'v Value, key: &str) -> &'v str {
    value.get(key).and_then(Value::as_str).unwrap_or("")
}

fn object_field<'v>(value: &'v Value, key: &str) -> &'v Value {
    value.get(key).unwrap_or(&*EMPTY_OBJECT)
}

/// View over an incoming message
pub struct MessageContext<'a> {
    message: &'a Value,
    bot: &'a Dispatcher,
}

impl<'a> MessageContext<'a> {
    pub fn new(message: &'a Value, bot: &'a Dispatcher) -> Self {
        Self { message, bot }
    }

    /// The original message object
    pub fn message(&self) -> &'a Value {
        self.message
    }

    pub fn bot(&self) -> &'a Dispatcher {
        self.bot
    }

    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.message.get(key)
    }

    pub fn get_or(&self, key: &str, default: &'a Value) -> &'a Value {
        self.message.get(key).unwrap_or(default)
    }

    pub fn text(&self) -> &'a str {
        str_field(self.message, "text")
    }

    pub fn caption(&self) -> &'a str {
        str_field(self.message, "caption")
    }

    pub fn chat_id(&self) -> Option<i64> {
        message_chat_id(self.message)
    }

    pub fn message_id(&self) -> Option<i64> {
        self.message.get("message_id").and_then(Value::as_i64)
    }

    pub fn from_user(&self) -> &'a Value {
        object_field(self.message, "from")
    }

    /// Photo sizes, smallest first
    pub fn photo(&self) -> &'a [Value] {
        self.message
            .get("photo")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Highest resolution photo size, or an empty mapping
    pub fn best_photo(&self) -> &'a Value {
        self.photo().last().unwrap_or(&*EMPTY_OBJECT)
    }

    /// Download URL of the best photo; empty when there is no photo or the
    /// lookup was refused
    pub fn photo_url(&self) -> BotResult<String> {
        match self.best_photo().get("file_id").and_then(Value::as_str) {
            Some(file_id) => self.bot.resolve_file_url(file_id),
            None => Ok(String::new()),
        }
    }

    /// Sends a text message to this message's chat
    pub fn reply(&self, text: &str) -> BotResult<Value> {
        let mut options = SendOptions::new();
        if let Some(chat_id) = self.chat_id() {
            options = options.chat_id(chat_id);
        }
        self.bot.send_message(text, options)
    }

    /// Deletes the bot's last tracked message in the current chat
    pub fn delete(&self) -> BotResult<Value> {
        self.bot.delete_message(None, None)
    }
}

/// View over a pressed inline keyboard button
pub struct CallbackContext<'a> {
    query: &'a Value,
    bot: &'a Dispatcher,
}

impl<'a> CallbackContext<'a> {
    pub fn new(query: &'a Value, bot: &'a Dispatcher) -> Self {
        Self { query, bot }
    }

    pub fn bot(&self) -> &'a Dispatcher {
        self.bot
    }

    /// Payload chosen by whoever built the keyboard
    pub fn data(&self) -> &'a str {
        str_field(self.query, "data")
    }

    /// Message the keyboard was attached to
    pub fn message(&self) -> &'a Value {
        object_field(self.query, "message")
    }

    pub fn chat_id(&self) -> Option<i64> {
        message_chat_id(self.message())
    }

    pub fn from_user(&self) -> &'a Value {
        object_field(self.query, "from")
    }

    pub fn id(&self) -> &'a str {
        str_field(self.query, "id")
    }

    pub fn answer(&self, answer: CallbackAnswer) -> BotResult<Value> {
        self.bot.answer_callback_query(self.id(), answer)
    }

    pub fn edit_message_reply_markup(&self, reply_markup: Option<Value>) -> BotResult<Value> {
        let message = self.message();
        if message.as_object().map_or(true, Map::is_empty) {
            return Err(BotError::invalid_argument("No message to edit"));
        }
        self.bot.edit_message_reply_markup(EditMarkup {
            chat_id: message_chat_id(message),
            message_id: message.get("message_id").and_then(Value::as_i64),
            reply_markup,
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::MockTransport;
    use serde_json::json;

    fn dispatcher(transport: &MockTransport) -> Dispatcher {
        Dispatcher::new()
            .logger(slog::Logger::root(slog::Discard, o!()))
            .transport(transport.clone())
            .build()
            .unwrap()
    }

    #[test]
    fn message_accessors() {
        let transport = MockTransport::new();
        let bot = dispatcher(&transport);
        let msg = json!({
            "message_id": 5,
            "chat": {"id": 42},
            "from": {"id": 1, "first_name": "Ada"},
            "caption": "look",
        });
        let fallback = json!(0);
        let ctx = MessageContext::new(&msg, &bot);
        assert_eq!(ctx.text(), "");
        assert_eq!(ctx.caption(), "look");
        assert_eq!(ctx.chat_id(), Some(42));
        assert_eq!(ctx.message_id(), Some(5));
        assert_eq!(ctx.from_user()["first_name"], "Ada");
        assert_eq!(ctx.get("caption"), Some(&json!("look")));
        assert_eq!(ctx.get("missing"), None);
        assert_eq!(ctx.get_or("missing", &fallback), &json!(0));
        assert!(ctx.photo().is_empty());
    }

    #[test]
    fn best_photo_is_the_last_size() {
        let transport = MockTransport::new();
        let bot = dispatcher(&transport);
        let msg = json!({"photo": [{"size": "small"}, {"size": "large"}]});
        let ctx = MessageContext::new(&msg, &bot);
        assert_eq!(ctx.best_photo(), &json!({"size": "large"}));

        let msg = json!({"photo": []});
        let ctx = MessageContext::new(&msg, &bot);
        assert_eq!(ctx.best_photo(), &json!({}));
    }

    #[test]
    fn photo_url_resolves_best_photo() {
        let transport = MockTransport::new();
        transport.reply(
            "getFile",
            json!({"ok": true, "result": {"file_id": "big", "file_path": "photos/big.jpg"}}),
        );
        let bot = dispatcher(&transport);
        let msg = json!({"photo": [{"file_id": "small"}, {"file_id": "big"}]});
        let ctx = MessageContext::new(&msg, &bot);

        assert_eq!(
            ctx.photo_url().unwrap(),
            "https://files.test/file/botTOKEN/photos/big.jpg"
        );
        assert_eq!(transport.last_call("getFile"), Some(json!({"file_id": "big"})));
    }

    #[test]
    fn photo_url_without_photo_is_empty() {
        let transport = MockTransport::new();
        let bot = dispatcher(&transport);
        let msg = json!({"text": "no pictures"});
        let ctx = MessageContext::new(&msg, &bot);
        assert_eq!(ctx.photo_url().unwrap(), "");
        assert!(transport.calls().is_empty());
    }

    #[test]
    fn reply_goes_to_the_message_chat() {
        let transport = MockTransport::new();
        let bot = dispatcher(&transport);
        let msg = json!({"chat": {"id": 8}, "text": "ping"});
        MessageContext::new(&msg, &bot).reply("pong").unwrap();
        assert_eq!(
            transport.last_call("sendMessage"),
            Some(json!({"chat_id": 8, "text": "pong"}))
        );
    }

    #[test]
    fn callback_accessors() {
        let transport = MockTransport::new();
        let bot = dispatcher(&transport);
        let query = json!({
            "id": "cb-1",
            "data": "vote:yes",
            "from": {"id": 77},
            "message": {"message_id": 10, "chat": {"id": 42}},
        });
        let ctx = CallbackContext::new(&query, &bot);
        assert_eq!(ctx.id(), "cb-1");
        assert_eq!(ctx.data(), "vote:yes");
        assert_eq!(ctx.chat_id(), Some(42));
        assert_eq!(ctx.from_user()["id"], 77);
        assert_eq!(ctx.message()["message_id"], 10);
    }

    #[test]
    fn callback_answer_uses_own_id() {
        let transport = MockTransport::new();
        let bot = dispatcher(&transport);
        let query = json!({"id": "cb-2", "data": "x"});
        CallbackContext::new(&query, &bot)
            .answer(CallbackAnswer::new().text("Saved"))
            .unwrap();
        assert_eq!(
            transport.last_call("answerCallbackQuery"),
            Some(json!({
                "callback_query_id": "cb-2",
                "text": "Saved",
                "show_alert": false,
                "cache_time": 0
            }))
        );
    }

    #[test]
    fn callback_edit_targets_attached_message() {
        let transport = MockTransport::new();
        let bot = dispatcher(&transport);
        let query = json!({"id": "cb-3", "message": {"message_id": 10, "chat": {"id": 42}}});
        CallbackContext::new(&query, &bot)
            .edit_message_reply_markup(Some(json!({"inline_keyboard": []})))
            .unwrap();
        assert_eq!(
            transport.last_call("editMessageReplyMarkup"),
            Some(json!({
                "chat_id": 42,
                "message_id": 10,
                "reply_markup": {"inline_keyboard": []}
            }))
        );
    }

    #[test]
    fn callback_edit_without_message_is_invalid() {
        let transport = MockTransport::new();
        let bot = dispatcher(&transport);
        let query = json!({"id": "cb-4", "inline_message_id": "abc"});
        let err = CallbackContext::new(&query, &bot)
            .edit_message_reply_markup(None)
            .unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(transport.calls().is_empty());
    }
}
