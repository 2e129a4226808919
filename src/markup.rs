//! Keyboard and button constructors.
//!
//! Everything here is plain data shaping: the builders produce
//! `serde_json::Value` objects ready to be passed as `reply_markup`.

use serde::Serialize;
use serde_json::{json, Value};

fn is_false(flag: &bool) -> bool {
    !*flag
}

/// Inline keyboard attached to a message
pub fn inline_keyboard<B: Into<Value>>(rows: Vec<Vec<B>>) -> Value {
    json!({ "inline_keyboard": into_rows(rows) })
}

#[derive(Debug, Clone, Copy)]
pub struct ReplyKeyboardOptions {
    pub resize_keyboard: bool,
    pub one_time_keyboard: bool,
    pub selective: bool,
}

impl Default for ReplyKeyboardOptions {
    fn default() -> Self {
        Self {
            resize_keyboard: true,
            one_time_keyboard: false,
            selective: false,
        }
    }
}

/// Custom reply keyboard replacing the user's input keyboard
pub fn reply_keyboard<B: Into<Value>>(rows: Vec<Vec<B>>, options: ReplyKeyboardOptions) -> Value {
    json!({
        "keyboard": into_rows(rows),
        "resize_keyboard": options.resize_keyboard,
        "one_time_keyboard": options.one_time_keyboard,
        "selective": options.selective,
    })
}

/// Asks the client to hide a previously sent reply keyboard
pub fn remove_keyboard(selective: bool) -> Value {
    json!({ "remove_keyboard": true, "selective": selective })
}

fn into_rows<B: Into<Value>>(rows: Vec<Vec<B>>) -> Vec<Vec<Value>> {
    rows.into_iter()
        .map(|row| row.into_iter().map(Into::into).collect())
        .collect()
}

/// Button of a reply keyboard
#[derive(Debug, Clone, Serialize)]
pub struct KeyboardButton {
    text: String,
    #[serde(skip_serializing_if = "is_false")]
    request_contact: bool,
    #[serde(skip_serializing_if = "is_false")]
    request_location: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_poll: Option<Value>,
}

impl KeyboardButton {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            request_contact: false,
            request_location: false,
            request_poll: None,
        }
    }

    pub fn request_contact(self) -> Self {
        Self {
            request_contact: true,
            ..self
        }
    }

    pub fn request_location(self) -> Self {
        Self {
            request_location: true,
            ..self
        }
    }

    pub fn request_poll(self, poll: Value) -> Self {
        Self {
            request_poll: Some(poll).filter(|p| !p.is_null()),
            ..self
        }
    }
}

impl From<KeyboardButton> for Value {
    fn from(button: KeyboardButton) -> Self {
        json!(button)
    }
}

/// Button of an inline keyboard
#[derive(Debug, Clone, Default, Serialize)]
pub struct InlineButton {
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    callback_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(skip_serializing_if = "is_false")]
    pay: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    login_url: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    switch_inline_query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    switch_inline_query_current_chat: Option<String>,
}

fn non_empty(value: impl Into<String>) -> Option<String> {
    Some(value.into()).filter(|v| !v.is_empty())
}

impl InlineButton {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn callback_data(self, data: impl Into<String>) -> Self {
        Self {
            callback_data: non_empty(data),
            ..self
        }
    }

    pub fn url(self, url: impl Into<String>) -> Self {
        Self {
            url: non_empty(url),
            ..self
        }
    }

    pub fn pay(self) -> Self {
        Self { pay: true, ..self }
    }

    pub fn login_url(self, login_url: Value) -> Self {
        Self {
            login_url: Some(login_url).filter(|v| !v.is_null()),
            ..self
        }
    }

    pub fn switch_inline_query(self, query: impl Into<String>) -> Self {
        Self {
            switch_inline_query: non_empty(query),
            ..self
        }
    }

    pub fn switch_inline_query_current_chat(self, query: impl Into<String>) -> Self {
        Self {
            switch_inline_query_current_chat: non_empty(query),
            ..self
        }
    }
}

impl From<InlineButton> for Value {
    fn from(button: InlineButton) -> Self {
        json!(button)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_keyboard_layout() {
        let markup = inline_keyboard(vec![
            vec![
                InlineButton::new("Yes").callback_data("vote:yes"),
                InlineButton::new("No").callback_data("vote:no"),
            ],
            vec![InlineButton::new("Docs").url("https://core.telegram.org/bots/api")],
        ]);
        assert_eq!(
            markup,
            json!({
                "inline_keyboard": [
                    [
                        {"text": "Yes", "callback_data": "vote:yes"},
                        {"text": "No", "callback_data": "vote:no"}
                    ],
                    [{"text": "Docs", "url": "https://core.telegram.org/bots/api"}]
                ]
            })
        );
    }

    #[test]
    fn inline_button_omits_unset_and_empty_fields() {
        let button: Value = InlineButton::new("Go")
            .callback_data("")
            .switch_inline_query("q")
            .into();
        assert_eq!(button, json!({"text": "Go", "switch_inline_query": "q"}));

        let button: Value = InlineButton::new("Buy").pay().into();
        assert_eq!(button, json!({"text": "Buy", "pay": true}));
    }

    #[test]
    fn reply_keyboard_defaults() {
        let markup = reply_keyboard(
            vec![vec![KeyboardButton::new("Share phone").request_contact()]],
            ReplyKeyboardOptions::default(),
        );
        assert_eq!(markup["resize_keyboard"], json!(true));
        assert_eq!(markup["one_time_keyboard"], json!(false));
        assert_eq!(markup["selective"], json!(false));
        assert_eq!(
            markup["keyboard"][0][0],
            json!({"text": "Share phone", "request_contact": true})
        );
    }

    #[test]
    fn plain_keyboard_button_is_text_only() {
        let button: Value = KeyboardButton::new("Hi").into();
        assert_eq!(button, json!({"text": "Hi"}));
        let button: Value = KeyboardButton::new("Where")
            .request_location()
            .request_poll(json!({"type": "quiz"}))
            .into();
        assert_eq!(
            button,
            json!({"text": "Where", "request_location": true, "request_poll": {"type": "quiz"}})
        );
    }

    #[test]
    fn remove_keyboard_shape() {
        assert_eq!(
            remove_keyboard(true),
            json!({"remove_keyboard": true, "selective": true})
        );
    }
}
