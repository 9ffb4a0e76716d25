//! Removal of tool calls that never received a result
//!
//! Runs before trimming so the trimmer never has to reason about dangling
//! tool calls: after this pass, tool-call parts and their paired tool-result
//! messages are either both present or both absent.

use std::collections::HashMap;

use super::models::{ContentPart, Message, Role};

/// Drop assistant tool-call parts with no matching subsequent tool result
///
/// An assistant message is dropped entirely when every one of its content
/// parts was such an orphaned tool call. Consumes the history and retains
/// surviving parts in place, like the trimmer it feeds.
pub fn filter_unfinished_tool_calls(messages: Vec<Message>) -> Vec<Message> {
    // Earliest message index holding a result for each tool call id
    let mut result_index: HashMap<String, usize> = HashMap::new();
    for (i, message) in messages.iter().enumerate() {
        for part in &message.content {
            if let ContentPart::ToolResult { tool_call_id, .. } = part {
                result_index.entry(tool_call_id.clone()).or_insert(i);
            }
        }
    }

    messages
        .into_iter()
        .enumerate()
        .filter_map(|(i, mut message)| {
            if message.role != Role::Assistant {
                return Some(message);
            }

            let had_parts = !message.content.is_empty();
            message.content.retain(|part| match part {
                ContentPart::ToolCall { tool_call_id, .. } => result_index
                    .get(tool_call_id)
                    .is_some_and(|&result_at| result_at > i),
                _ => true,
            });

            if had_parts && message.content.is_empty() {
                None
            } else {
                Some(message)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool_call(id: &str) -> ContentPart {
        ContentPart::ToolCall {
            tool_call_id: id.to_string(),
            tool_name: "run_terminal_command".to_string(),
            input: serde_json::json!({}),
        }
    }

    fn tool_result(id: &str) -> Message {
        Message {
            role: Role::Tool,
            content: vec![ContentPart::ToolResult {
                tool_call_id: id.to_string(),
                tool_name: "run_terminal_command".to_string(),
                output: "ok".to_string(),
            }],
            keep_during_truncation: false,
            tags: Vec::new(),
        }
    }

    #[test]
    fn test_orphaned_call_part_is_dropped() {
        let assistant = Message {
            role: Role::Assistant,
            content: vec![tool_call("a"), tool_call("b")],
            keep_during_truncation: false,
            tags: Vec::new(),
        };
        let messages = vec![assistant, tool_result("a")];

        let filtered = filter_unfinished_tool_calls(messages);
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].content.len(), 1);
        assert!(matches!(
            &filtered[0].content[0],
            ContentPart::ToolCall { tool_call_id, .. } if tool_call_id == "a"
        ));
    }

    #[test]
    fn test_fully_orphaned_assistant_message_is_dropped() {
        let assistant = Message {
            role: Role::Assistant,
            content: vec![tool_call("a")],
            keep_during_truncation: false,
            tags: Vec::new(),
        };
        let filtered = filter_unfinished_tool_calls(vec![assistant]);
        assert!(filtered.is_empty());
    }

    #[test]
    fn test_result_before_the_call_does_not_count() {
        let assistant = Message {
            role: Role::Assistant,
            content: vec![tool_call("a")],
            keep_during_truncation: false,
            tags: Vec::new(),
        };
        let messages = vec![tool_result("a"), assistant];
        let filtered = filter_unfinished_tool_calls(messages);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].role, Role::Tool);
    }

    #[test]
    fn test_text_parts_keep_the_message_alive() {
        let assistant = Message {
            role: Role::Assistant,
            content: vec![
                ContentPart::Text {
                    text: "running the tests".to_string(),
                },
                tool_call("a"),
            ],
            keep_during_truncation: false,
            tags: Vec::new(),
        };
        let filtered = filter_unfinished_tool_calls(vec![assistant]);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].content.len(), 1);
    }

    #[test]
    fn test_non_assistant_messages_pass_through() {
        let messages = vec![
            Message::text(Role::User, "hello"),
            Message::text(Role::System, "rules"),
        ];
        assert_eq!(filter_unfinished_tool_calls(messages.clone()), messages);
    }

    #[test]
    fn test_filter_output_feeds_the_trimmer_directly() {
        let messages = vec![
            Message::text(Role::User, "please run the tests"),
            Message {
                role: Role::Assistant,
                content: vec![tool_call("a"), tool_call("dangling")],
                keep_during_truncation: false,
                tags: Vec::new(),
            },
            tool_result("a"),
        ];

        let counter = crate::tokens::TokenCounter::default();
        let trimmed = crate::messages::trim_messages_to_fit_token_limit(
            filter_unfinished_tool_calls(messages),
            0,
            100_000,
            &counter,
        );
        assert_eq!(trimmed.len(), 3);
        assert_eq!(trimmed[1].content.len(), 1);
    }
}
