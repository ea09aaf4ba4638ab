//! Wire types for the OpenAI-compatible chat-completion endpoint.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

// -- Request ------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: Role,
    pub content: String,
}

impl WireMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub stream: bool,
    pub messages: &'a [WireMessage],
}

// -- Response -----------------------------------------------------------------

/// Pointer to the reply text inside a chat-completion response body.
pub const REPLY_CONTENT_POINTER: &str = "/choices/0/message/content";

/// `choices[0].message.content` as a string, if present.
///
/// Only that path is inspected; anything else in the body may have any shape.
pub fn first_reply_content(body: &serde_json::Value) -> Option<String> {
    body.pointer(REPLY_CONTENT_POINTER)
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_display() {
        assert_eq!(Role::System.to_string(), "system");
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!(Role::Assistant.to_string(), "assistant");
    }

    #[test]
    fn test_request_serializes_wire_shape() {
        let messages = vec![
            WireMessage::new(Role::System, "be brief"),
            WireMessage::new(Role::User, "hi"),
        ];
        let req = ChatCompletionRequest { model: "m", stream: false, messages: &messages };
        let v = serde_json::to_value(&req).expect("serialize");
        assert_eq!(v["model"], "m");
        assert_eq!(v["stream"], false);
        assert_eq!(v["messages"][0]["role"], "system");
        assert_eq!(v["messages"][1]["role"], "user");
        assert_eq!(v["messages"][1]["content"], "hi");
        assert_eq!(v.as_object().map(|o| o.len()), Some(3));
    }

    fn reply(json: &str) -> Option<String> {
        first_reply_content(&serde_json::from_str(json).expect("json"))
    }

    #[test]
    fn test_response_first_content() {
        let json = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"Hi there"}},{"message":{"content":"second"}}]}"#;
        assert_eq!(reply(json).as_deref(), Some("Hi there"));
    }

    #[test]
    fn test_response_other_choices_may_be_malformed() {
        let json = r#"{"choices":[{"message":{"content":"Hi there"}},{"message":"x"}],"usage":"n/a"}"#;
        assert_eq!(reply(json).as_deref(), Some("Hi there"));
    }

    #[test]
    fn test_response_missing_levels() {
        for json in [
            r#"{"object":"error"}"#,
            r#"{"choices":null}"#,
            r#"{"choices":[]}"#,
            r#"{"choices":"nope"}"#,
            r#"{"choices":[{"finish_reason":"length"}]}"#,
            r#"{"choices":[{"message":{"content":null}}]}"#,
            r#"{"choices":[{"message":{"content":42}}]}"#,
            r#"[]"#,
        ] {
            assert!(reply(json).is_none(), "{json}");
        }
    }

    #[test]
    fn test_wire_message_deserializes_roles() {
        let m: WireMessage = serde_json::from_str(r#"{"role":"assistant","content":"ok"}"#).expect("deser");
        assert_eq!(m.role, Role::Assistant);
        assert_eq!(m.content, "ok");
    }
}
