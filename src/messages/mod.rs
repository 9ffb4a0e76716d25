//! Conversation message model and budget-aware trimming

pub mod filter;
pub mod models;
pub mod trim;

pub use filter::filter_unfinished_tool_calls;
pub use models::{ContentPart, Message, Role};
pub use trim::{
    trim_messages_to_fit_token_limit, COMMAND_OUTPUT_TOOLS, MESSAGES_OMITTED_PLACEHOLDER,
    OUTPUT_OMITTED_PLACEHOLDER, RECENT_COMMAND_OUTPUTS_KEPT,
};
