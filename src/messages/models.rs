//! Data model for conversation messages

use serde::{Deserialize, Serialize};

/// Sender role of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// One part of a message's content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ContentPart {
    Text {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    ToolCall {
        tool_call_id: String,
        tool_name: String,
        input: serde_json::Value,
    },
    #[serde(rename_all = "camelCase")]
    ToolResult {
        tool_call_id: String,
        tool_name: String,
        output: String,
    },
    #[serde(rename_all = "camelCase")]
    Image {
        media_type: String,
        data: String,
    },
}

/// A conversation message
///
/// `keep_during_truncation` pins the message: it is never removed or
/// modified by trimming. `tags` are auxiliary annotations that survive any
/// transformation applied to the message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentPart>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub keep_during_truncation: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Message {
    /// A plain text message
    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: vec![ContentPart::Text { text: text.into() }],
            keep_during_truncation: false,
            tags: Vec::new(),
        }
    }

    /// Mark the message as pinned
    pub fn pinned(mut self) -> Self {
        self.keep_during_truncation = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_serde_shape() {
        let message = Message::text(Role::Assistant, "hi").pinned();
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["content"][0]["type"], "text");
        assert_eq!(json["keepDuringTruncation"], true);
    }

    #[test]
    fn test_default_flags_are_omitted() {
        let message = Message::text(Role::User, "hi");
        let json = serde_json::to_string(&message).unwrap();
        assert!(!json.contains("keepDuringTruncation"));
        assert!(!json.contains("tags"));
    }

    #[test]
    fn test_tool_call_roundtrip() {
        let message = Message {
            role: Role::Assistant,
            content: vec![ContentPart::ToolCall {
                tool_call_id: "call-1".to_string(),
                tool_name: "read_files".to_string(),
                input: serde_json::json!({"paths": ["src/main.rs"]}),
            }],
            keep_during_truncation: false,
            tags: vec!["step:1".to_string()],
        };
        let json = serde_json::to_string(&message).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back, message);
    }
}
