//! Recency- and pin-aware trimming of message histories
//!
//! Two-phase reduction under an effective budget of
//! `max_total_tokens - system_prompt_tokens`:
//!
//! - Phase A simplifies old command outputs: all but the most recent
//!   [`RECENT_COMMAND_OUTPUTS_KEPT`] terminal tool results are replaced with
//!   a short placeholder, and only when that placeholder is strictly shorter
//!   than the original (a message is never expanded).
//! - Phase B removes the oldest non-pinned messages until the history fits,
//!   collapsing each maximal contiguous run of removals into one synthetic
//!   placeholder message. The stop condition measures the materialized
//!   output, placeholders included, so inserting one cannot oscillate the
//!   result back over budget.
//!
//! Pinned messages are never removed or modified and split removal runs.

use tracing::{debug, warn};

use super::models::{ContentPart, Message, Role};
use crate::tokens::TokenCounter;

/// Terminal tool results beyond this many recent ones get simplified
pub const RECENT_COMMAND_OUTPUTS_KEPT: usize = 5;

/// Replacement body for simplified command outputs
pub const OUTPUT_OMITTED_PLACEHOLDER: &str = "[Output omitted]";

/// Body of the synthetic message standing in for removed messages
pub const MESSAGES_OMITTED_PLACEHOLDER: &str = "Previous message(s) omitted due to length";

/// Tool names whose results carry command output eligible for simplification
pub const COMMAND_OUTPUT_TOOLS: &[&str] = &["run_terminal_command", "terminal_command", "bash"];

/// Trim a history so it fits a token budget alongside the system prompt
///
/// Returns the input unchanged when it already fits. May return an
/// over-budget history when everything left is pinned.
pub fn trim_messages_to_fit_token_limit(
    messages: Vec<Message>,
    system_prompt_tokens: usize,
    max_total_tokens: usize,
    counter: &TokenCounter,
) -> Vec<Message> {
    if messages.is_empty() {
        return messages;
    }

    let budget = max_total_tokens.saturating_sub(system_prompt_tokens);
    if counter.count_json(&messages) <= budget {
        return messages;
    }

    let messages = simplify_old_command_outputs(messages);
    let simplified_count = counter.count_json(&messages);
    if simplified_count <= budget {
        debug!(tokens = simplified_count, budget, "History fits after output simplification");
        return messages;
    }

    remove_oldest_until_fit(messages, budget, counter)
}

/// Phase A: replace all but the most recent command outputs with a stub
fn simplify_old_command_outputs(mut messages: Vec<Message>) -> Vec<Message> {
    let mut recent_seen = 0;
    for message in messages.iter_mut().rev() {
        if message.keep_during_truncation || !is_command_output(message) {
            continue;
        }
        if recent_seen < RECENT_COMMAND_OUTPUTS_KEPT {
            recent_seen += 1;
            continue;
        }
        for part in &mut message.content {
            if let ContentPart::ToolResult { tool_name, output, .. } = part {
                if COMMAND_OUTPUT_TOOLS.contains(&tool_name.as_str())
                    && output.len() > OUTPUT_OMITTED_PLACEHOLDER.len()
                {
                    *output = OUTPUT_OMITTED_PLACEHOLDER.to_string();
                }
            }
        }
    }
    messages
}

fn is_command_output(message: &Message) -> bool {
    message.role == Role::Tool
        && message.content.iter().any(|part| {
            matches!(
                part,
                ContentPart::ToolResult { tool_name, .. }
                    if COMMAND_OUTPUT_TOOLS.contains(&tool_name.as_str())
            )
        })
}

/// Phase B: oldest-first removal with placeholder collapsing
fn remove_oldest_until_fit(
    messages: Vec<Message>,
    budget: usize,
    counter: &TokenCounter,
) -> Vec<Message> {
    let mut removed = vec![false; messages.len()];

    loop {
        let output = collapse(&messages, &removed);
        let tokens = counter.count_json(&output);
        if tokens <= budget {
            debug!(
                tokens,
                budget,
                kept = output.len(),
                "History fits after message removal"
            );
            return output;
        }

        let oldest = (0..messages.len())
            .find(|&i| !removed[i] && !messages[i].keep_during_truncation);
        match oldest {
            Some(i) => removed[i] = true,
            None => {
                warn!(
                    tokens,
                    budget, "Only pinned messages remain; returning over-budget history"
                );
                return output;
            }
        }
    }
}

enum Segment<'a> {
    Kept(&'a Message),
    Omitted(usize),
}

/// Materialize the kept messages, one placeholder per removal run
fn collapse(messages: &[Message], removed: &[bool]) -> Vec<Message> {
    let mut segments: Vec<Segment<'_>> = Vec::new();
    for (message, &gone) in messages.iter().zip(removed) {
        if gone {
            if let Some(Segment::Omitted(count)) = segments.last_mut() {
                *count += 1;
            } else {
                segments.push(Segment::Omitted(1));
            }
        } else {
            segments.push(Segment::Kept(message));
        }
    }

    segments
        .into_iter()
        .map(|segment| match segment {
            Segment::Kept(message) => message.clone(),
            Segment::Omitted(_) => Message::text(Role::User, MESSAGES_OMITTED_PLACEHOLDER),
        })
        .collect()
}
