//! File-tree modelling, rendering, and budgeted truncation

pub mod denylist;
pub mod models;
pub mod render;
pub mod truncate;

pub use models::{FileTokenScores, FileTree, FileTreeNode, ProjectFileContext};
pub use render::render_file_tree;
pub use truncate::{
    truncate_file_tree_to_budget, TreeTruncation, TreeTruncator, TruncationLevel,
    FILE_SAMPLE_SIZE, MAX_DEPTH_ITERATIONS, REMOVAL_ESTIMATE_FACTOR, REMOVAL_ESTIMATE_MARGIN,
    TOKEN_PRUNE_BATCH_DIVISOR, TOKEN_PRUNE_BATCH_MARGIN,
};
