use crate::core::handler::invoke_isolated;
use crate::prelude::*;

use std::cell::RefCell;
use std::collections::HashMap;

use serde::Serialize;
use serde_json::{json, Map, Value};
use slog::Logger;

/// Maximum length of a callback notification text
pub const CALLBACK_TEXT_LIMIT: usize = 200;

/// Routes updates to registered handlers and performs outbound Bot API calls.
///
/// The dispatcher is the only owner of the handler registry, the table of
/// last sent messages and the current-context slot. Both tables live in
/// `RefCell`s: dispatch is strictly sequential, so the struct is `Send` but
/// deliberately not `Sync`. Concurrent dispatch would need the current
/// context passed explicitly instead of read from the shared slot.
pub struct Dispatcher {
    commands: HashMap<String, MessageHandler>,
    message_handlers: Vec<MessageHandler>,
    photo_handlers: Vec<MessageHandler>,
    callback_handlers: Vec<CallbackHandler>,
    last_messages: RefCell<HashMap<i64, i64>>,
    current: RefCell<Option<Value>>,
    transport: Box<dyn ApiTransport>,
    lifecycle: StopHandle,
    logger: Logger,
}

#[derive(Default)]
pub struct DispatcherBuilder {
    logger: Option<Logger>,
    transport: Option<Box<dyn ApiTransport>>,
}

impl DispatcherBuilder {
    pub fn logger(self, logger: Logger) -> Self {
        Self {
            logger: Some(logger),
            ..self
        }
    }

    pub fn transport<T>(self, transport: T) -> Self
    where
        T: ApiTransport + 'static,
    {
        Self {
            transport: Some(Box::new(transport)),
            ..self
        }
    }

    pub fn build(self) -> BotResult<Dispatcher> {
        let logger = self
            .logger
            .ok_or_else(|| BotError::Config("Did not provide a logger for the dispatcher".into()))?;
        let transport = self.transport.ok_or_else(|| {
            BotError::Config("Did not provide an API transport for the dispatcher".into())
        })?;
        Ok(Dispatcher {
            commands: HashMap::new(),
            message_handlers: Vec::new(),
            photo_handlers: Vec::new(),
            callback_handlers: Vec::new(),
            last_messages: RefCell::new(HashMap::new()),
            current: RefCell::new(None),
            transport,
            lifecycle: StopHandle::default(),
            logger,
        })
    }
}

/// Optional parameters of `sendMessage`
#[derive(Debug, Clone, Default, Serialize)]
pub struct SendOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_web_page_preview: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_notification: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
    /// Any other API parameter; `null` values are dropped
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SendOptions {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn chat_id(self, chat_id: i64) -> Self {
        Self {
            chat_id: Some(chat_id),
            ..self
        }
    }

    pub fn reply_markup(self, markup: Value) -> Self {
        Self {
            reply_markup: Some(markup),
            ..self
        }
    }

    pub fn parse_mode(self, mode: impl Into<String>) -> Self {
        Self {
            parse_mode: Some(mode.into()),
            ..self
        }
    }

    pub fn disable_web_page_preview(self, disable: bool) -> Self {
        Self {
            disable_web_page_preview: Some(disable),
            ..self
        }
    }

    pub fn disable_notification(self, disable: bool) -> Self {
        Self {
            disable_notification: Some(disable),
            ..self
        }
    }

    pub fn reply_to(self, message_id: i64) -> Self {
        Self {
            reply_to_message_id: Some(message_id),
            ..self
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Optional parameters of `sendPhoto`. The caption is always transmitted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PhotoOptions {
    pub caption: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_notification: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PhotoOptions {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn caption(self, caption: impl Into<String>) -> Self {
        Self {
            caption: caption.into(),
            ..self
        }
    }

    pub fn chat_id(self, chat_id: i64) -> Self {
        Self {
            chat_id: Some(chat_id),
            ..self
        }
    }

    pub fn reply_markup(self, markup: Value) -> Self {
        Self {
            reply_markup: Some(markup),
            ..self
        }
    }

    pub fn parse_mode(self, mode: impl Into<String>) -> Self {
        Self {
            parse_mode: Some(mode.into()),
            ..self
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Target and payload of `editMessageReplyMarkup`
#[derive(Debug, Clone, Default, Serialize)]
pub struct EditMarkup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<Value>,
}

/// Parameters of `answerCallbackQuery`
#[derive(Debug, Clone, Default, Serialize)]
pub struct CallbackAnswer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub show_alert: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub cache_time: u32,
}

impl CallbackAnswer {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..self
        }
    }

    pub fn show_alert(self) -> Self {
        Self {
            show_alert: true,
            ..self
        }
    }

    pub fn url(self, url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..self
        }
    }

    pub fn cache_time(self, seconds: u32) -> Self {
        Self {
            cache_time: seconds,
            ..self
        }
    }
}

/// Serializes request parameters, leaving out everything unset
fn into_payload<T: Serialize>(params: &T) -> BotResult<Map<String, Value>> {
    match serde_json::to_value(params)? {
        Value::Object(map) => Ok(map.into_iter().filter(|(_, v)| !v.is_null()).collect()),
        _ => Err(BotError::invalid_argument(
            "request parameters must serialize to an object",
        )),
    }
}

impl Dispatcher {
    pub fn new() -> DispatcherBuilder {
        Default::default()
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub(crate) fn transport(&self) -> &dyn ApiTransport {
        self.transport.as_ref()
    }

    /// Registers the handler of `/name`, replacing any previous one
    pub fn register_command<F>(&mut self, name: &str, handler: F) -> &mut Self
    where
        F: Fn(&MessageContext<'_>) -> UResult + Send + 'static,
    {
        let name = name.trim_start_matches('/').to_owned();
        self.commands.insert(name, Box::new(handler));
        self
    }

    pub fn register_message_handler<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&MessageContext<'_>) -> UResult + Send + 'static,
    {
        self.message_handlers.push(Box::new(handler));
        self
    }

    pub fn register_photo_handler<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&MessageContext<'_>) -> UResult + Send + 'static,
    {
        self.photo_handlers.push(Box::new(handler));
        self
    }

    pub fn register_callback_handler<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&CallbackContext<'_>) -> UResult + Send + 'static,
    {
        self.callback_handlers.push(Box::new(handler));
        self
    }

    pub fn command_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Routes one update to the matching handlers.
    ///
    /// Handler failures are logged and never escape this call.
    pub fn process_update(&self, update: &Update) {
        match update.kind() {
            UpdateKind::Message(message) => self.process_message(message),
            UpdateKind::CallbackQuery(query) => self.process_callback_query(query),
            UpdateKind::Other => {
                debug!(self.logger, "Ignoring update of unsupported kind";
                    "update_id" => update.update_id,
                );
            }
        }
    }

    fn process_message(&self, message: &Value) {
        *self.current.borrow_mut() = Some(message.clone());
        let ctx = MessageContext::new(message, self);

        // Captions count as command text so `/cmd` works on photos too
        let command_text = match ctx.text() {
            "" => ctx.caption(),
            text => text,
        };
        if let Some(command) = command_token(command_text) {
            match self.commands.get(command) {
                Some(handler) => {
                    if let Err(why) = invoke_isolated(|| handler(&ctx)) {
                        error!(self.logger, "In {} handler", HandlerCategory::Command;
                            "category" => %HandlerCategory::Command,
                            "command" => command,
                            "reason" => why,
                        );
                    }
                }
                None => {
                    debug!(self.logger, "Dropping unknown command"; "command" => command);
                }
            }
            return;
        }

        if message.get("photo").is_some() && !self.photo_handlers.is_empty() {
            self.run_handlers(HandlerCategory::Photo, &self.photo_handlers, &ctx);
            return;
        }

        if message.get("text").is_some() && !self.message_handlers.is_empty() {
            self.run_handlers(HandlerCategory::Message, &self.message_handlers, &ctx);
        }
    }

    fn process_callback_query(&self, query: &Value) {
        *self.current.borrow_mut() = query.get("message").cloned();
        let ctx = CallbackContext::new(query, self);
        for handler in &self.callback_handlers {
            if let Err(why) = invoke_isolated(|| handler(&ctx)) {
                error!(self.logger, "In {} handler", HandlerCategory::Callback;
                    "category" => %HandlerCategory::Callback,
                    "reason" => why,
                );
            }
        }
    }

    fn run_handlers(
        &self,
        category: HandlerCategory,
        handlers: &[MessageHandler],
        ctx: &MessageContext<'_>,
    ) {
        for handler in handlers {
            if let Err(why) = invoke_isolated(|| handler(ctx)) {
                error!(self.logger, "In {} handler", category;
                    "category" => %category,
                    "reason" => why,
                );
            }
        }
    }

    /// Chat of the update currently being dispatched
    pub fn current_chat_id(&self) -> Option<i64> {
        self.current.borrow().as_ref().and_then(message_chat_id)
    }

    /// Id of the last text message the bot sent to `chat_id`
    pub fn last_message_id(&self, chat_id: i64) -> Option<i64> {
        self.last_messages.borrow().get(&chat_id).copied()
    }

    fn resolve_chat_id(&self, explicit: Option<i64>) -> BotResult<i64> {
        explicit
            .or_else(|| self.current_chat_id())
            .ok_or_else(|| BotError::invalid_argument("Chat ID must be specified"))
    }

    pub fn send_message(&self, text: &str, options: SendOptions) -> BotResult<Value> {
        let chat_id = self.resolve_chat_id(options.chat_id)?;
        let mut payload = into_payload(&options)?;
        payload.insert("chat_id".into(), chat_id.into());
        payload.insert("text".into(), text.into());

        let response = self.transport.call("sendMessage", &Value::Object(payload))?;
        let sent_id = response
            .get("result")
            .and_then(|r| r.get("message_id"))
            .and_then(Value::as_i64);
        if let Some(message_id) = sent_id {
            self.last_messages.borrow_mut().insert(chat_id, message_id);
        }
        Ok(response)
    }

    /// Shorthand for `send_message` without formatting options
    pub fn send(&self, text: &str, chat_id: Option<i64>) -> BotResult<Value> {
        self.send_message(
            text,
            SendOptions {
                chat_id,
                ..Default::default()
            },
        )
    }

    /// Sends a photo by URL or file id. Does not update the last message table.
    pub fn send_photo(&self, photo: &str, options: PhotoOptions) -> BotResult<Value> {
        let chat_id = self.resolve_chat_id(options.chat_id)?;
        let mut payload = into_payload(&options)?;
        payload.insert("chat_id".into(), chat_id.into());
        payload.insert("photo".into(), photo.into());
        self.transport.call("sendPhoto", &Value::Object(payload))
    }

    pub fn edit_message_reply_markup(&self, edit: EditMarkup) -> BotResult<Value> {
        let has_inline = edit
            .inline_message_id
            .as_deref()
            .map_or(false, |id| !id.is_empty());
        let has_chat_message = edit.chat_id.is_some() && edit.message_id.is_some();
        if !has_inline && !has_chat_message {
            return Err(BotError::invalid_argument(
                "Either inline_message_id or both chat_id and message_id must be specified",
            ));
        }
        let payload = into_payload(&edit)?;
        self.transport
            .call("editMessageReplyMarkup", &Value::Object(payload))
    }

    /// Deletes a message. Without a message id the bot's last tracked
    /// message in the chat is deleted.
    pub fn delete_message(
        &self,
        chat_id: Option<i64>,
        message_id: Option<i64>,
    ) -> BotResult<Value> {
        let chat_id = chat_id.or_else(|| self.current_chat_id());
        let message_id = message_id.or_else(|| chat_id.and_then(|c| self.last_message_id(c)));
        match (chat_id, message_id) {
            (Some(chat_id), Some(message_id)) => self.transport.call(
                "deleteMessage",
                &json!({"chat_id": chat_id, "message_id": message_id}),
            ),
            _ => Err(BotError::invalid_argument(
                "Chat ID and Message ID must be specified",
            )),
        }
    }

    /// Download URL of a file, or an empty string when the API refuses
    /// the lookup
    pub fn resolve_file_url(&self, file_id: &str) -> BotResult<String> {
        let info = self.transport.call("getFile", &json!({ "file_id": file_id }))?;
        if info.get("ok").and_then(Value::as_bool) != Some(true) {
            debug!(self.logger, "File lookup refused";
                "file_id" => file_id,
                "reason" => info.get("description").and_then(Value::as_str).unwrap_or("unknown"),
            );
            return Ok(String::new());
        }
        let path = info
            .get("result")
            .and_then(|r| r.get("file_path"))
            .and_then(Value::as_str);
        Ok(path.map(|p| self.transport.file_url(p)).unwrap_or_default())
    }

    pub fn answer_callback_query(
        &self,
        callback_query_id: &str,
        answer: CallbackAnswer,
    ) -> BotResult<Value> {
        let answer = CallbackAnswer {
            text: answer
                .text
                .filter(|t| !t.is_empty())
                .map(|t| truncate_chars(&t, CALLBACK_TEXT_LIMIT).to_owned()),
            ..answer
        };
        let mut payload = into_payload(&answer)?;
        payload.insert("callback_query_id".into(), callback_query_id.into());
        self.transport
            .call("answerCallbackQuery", &Value::Object(payload))
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.lifecycle.clone()
    }

    /// Asks the polling loop to stop after the current batch
    pub fn stop(&self) {
        self.lifecycle.stop()
    }
}
