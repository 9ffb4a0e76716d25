//! Deterministic context budgeting for AI coding agents
//!
//! Decides what subset of a repository's file tree and what subset of an
//! ongoing conversation can be shown to a language model under a hard token
//! budget, and degrades gracefully when the full context does not fit:
//!
//! - [`tokens`]: token counting for a target tokenizer, with a bounded
//!   process-wide cache
//! - [`tree`]: file-tree rendering and a tiered truncation ladder that fits
//!   a rendered tree under a token budget
//! - [`messages`]: recency- and pin-aware trimming of message histories
//!
//! All operations are synchronous and deterministic given their inputs; the
//! only shared mutable state is the token-count cache.

pub mod error;
pub mod messages;
pub mod tokens;
pub mod tree;

pub use error::{ContextError, Result};
pub use messages::{
    filter_unfinished_tool_calls, trim_messages_to_fit_token_limit, ContentPart, Message, Role,
};
pub use tokens::{count_tokens, count_tokens_json, TokenCountCache, TokenCounter};
pub use tree::{
    truncate_file_tree_to_budget, FileTokenScores, FileTree, FileTreeNode, ProjectFileContext,
    TreeTruncation, TreeTruncator, TruncationLevel,
};
