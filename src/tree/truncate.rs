//! Budgeted file-tree truncation with a tiered degradation ladder
//!
//! Tiers, in order of increasing information loss:
//!
//! 1. `none` — the denylist-filtered tree with annotations fits as is
//! 2. `unimportant-files` — annotations fit after denylist filtering alone
//! 3. `tokens` — low-scoring annotation tokens pruned until the render fits
//! 4. `depth-based` — whole files removed, deepest first, by iterative
//!    estimation; best-effort, may still exceed the budget
//!
//! The denylist filter runs unconditionally before any tier is evaluated.
//! Rendered trees are measured as their JSON serialization, matching the
//! accounting of the prompt-assembly layer that embeds them.

use std::cmp::Ordering;
use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::denylist::{is_ignored_directory, is_ignored_file};
use super::models::{FileTokenScores, FileTree, ProjectFileContext};
use super::render::render_file_tree;
use crate::error::Result;
use crate::tokens::{default_counter, TokenCounter};

/// Maximum refinement iterations for depth-based removal
pub const MAX_DEPTH_ITERATIONS: usize = 10;

/// Files sampled per iteration to estimate per-file-name token cost
pub const FILE_SAMPLE_SIZE: usize = 30;

/// Fraction of the over-budget amount attributed to file names (the rest is
/// tree structure the sample cannot see)
pub const REMOVAL_ESTIMATE_FACTOR: f64 = 0.5;

/// Extra files removed per iteration to bias toward overshooting
pub const REMOVAL_ESTIMATE_MARGIN: usize = 100;

/// Divisor of the over-budget amount in the annotation-prune batch size
pub const TOKEN_PRUNE_BATCH_DIVISOR: usize = 5;

/// Base annotation-prune batch size
pub const TOKEN_PRUNE_BATCH_MARGIN: usize = 500;

/// Degradation tier actually applied, ordered by severity
///
/// Reporting is monotonic-minimal: never more severe than the least severe
/// tier that satisfied the budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TruncationLevel {
    None,
    UnimportantFiles,
    Tokens,
    DepthBased,
}

/// Result of fitting a tree under a budget
///
/// `token_count` is advisory: guaranteed `<= budget` for levels up to
/// [`TruncationLevel::Tokens`]; best-effort for
/// [`TruncationLevel::DepthBased`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeTruncation {
    pub printed_tree: String,
    pub token_count: usize,
    pub truncation_level: TruncationLevel,
}

/// Fits a rendered file tree under a token budget
pub struct TreeTruncator<'a> {
    counter: &'a TokenCounter,
    seed: Option<u64>,
}

impl<'a> TreeTruncator<'a> {
    pub fn new(counter: &'a TokenCounter) -> Self {
        Self {
            counter,
            seed: None,
        }
    }

    /// Use a fixed sampling seed instead of deriving one from the file list
    pub fn with_seed(counter: &'a TokenCounter, seed: u64) -> Self {
        Self {
            counter,
            seed: Some(seed),
        }
    }

    /// Apply the tier ladder, stopping at the first tier that fits
    ///
    /// A zero budget still runs every tier and returns the smallest
    /// achievable result.
    pub fn truncate(&self, context: &ProjectFileContext, budget: usize) -> Result<TreeTruncation> {
        let tree = FileTree::from_nodes(&context.file_tree)?;
        let filtered = tree.filtered(
            &|name, _| !is_ignored_file(name),
            &|name| !is_ignored_directory(name),
        );

        if filtered.is_empty() {
            let printed_tree = String::new();
            let token_count = self.counter.count_json(&printed_tree);
            return Ok(TreeTruncation {
                printed_tree,
                token_count,
                truncation_level: TruncationLevel::None,
            });
        }

        let scores = &context.file_token_scores;
        let annotated = render_file_tree(&filtered, Some(scores));
        let annotated_count = self.counter.count_json(&annotated);
        if annotated_count <= budget {
            return Ok(TreeTruncation {
                printed_tree: annotated,
                token_count: annotated_count,
                truncation_level: TruncationLevel::None,
            });
        }

        let plain = render_file_tree(&filtered, None);
        let plain_count = self.counter.count_json(&plain);
        if plain_count <= budget {
            // Dropping unimportant files may have freed enough budget for the
            // annotations after all; re-measure before pruning any of them.
            let annotated_recheck = self.counter.count_json(&annotated);
            if annotated_recheck <= budget {
                return Ok(TreeTruncation {
                    printed_tree: annotated,
                    token_count: annotated_recheck,
                    truncation_level: TruncationLevel::UnimportantFiles,
                });
            }
            if annotated == plain {
                return Ok(TreeTruncation {
                    printed_tree: plain,
                    token_count: plain_count,
                    truncation_level: TruncationLevel::UnimportantFiles,
                });
            }
            return Ok(self.prune_annotations(&filtered, scores, budget, annotated_count));
        }

        Ok(self.remove_files_by_depth(filtered, plain, plain_count, budget))
    }

    /// Delete the lowest-scoring annotation triples in growing batches until
    /// the annotated render fits
    ///
    /// Only reachable when the plain render fits, so the loop converges: once
    /// every triple is gone the render equals the plain one.
    fn prune_annotations(
        &self,
        tree: &FileTree,
        scores: &FileTokenScores,
        budget: usize,
        mut count: usize,
    ) -> TreeTruncation {
        let mut scores = scores.clone();
        let mut triples: Vec<(String, String, f64)> = scores
            .iter()
            .flat_map(|(path, tokens)| {
                tokens
                    .iter()
                    .map(|(token, &score)| (path.clone(), token.clone(), score))
            })
            .collect();
        triples.sort_by(|a, b| {
            a.2.partial_cmp(&b.2)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
                .then_with(|| a.1.cmp(&b.1))
        });

        loop {
            let over = count.saturating_sub(budget);
            let batch = over.div_ceil(TOKEN_PRUNE_BATCH_DIVISOR) + TOKEN_PRUNE_BATCH_MARGIN;
            debug!(over, batch, remaining = triples.len(), "Pruning annotation tokens");

            for (path, token, _) in triples.drain(..batch.min(triples.len())) {
                if let Some(tokens) = scores.get_mut(&path) {
                    tokens.shift_remove(&token);
                    if tokens.is_empty() {
                        scores.shift_remove(&path);
                    }
                }
            }

            let printed_tree = render_file_tree(tree, Some(&scores));
            count = self.counter.count_json(&printed_tree);
            if count <= budget || triples.is_empty() {
                return TreeTruncation {
                    printed_tree,
                    token_count: count,
                    truncation_level: TruncationLevel::Tokens,
                };
            }
        }
    }

    /// Remove whole files, deepest first, until the plain render fits
    ///
    /// Deeply nested files are the least likely to be architecturally
    /// central, so they go first. Removal counts are estimated from a
    /// deterministic sample of file names; the loop is bounded and exits
    /// early when an iteration makes no progress.
    fn remove_files_by_depth(
        &self,
        mut tree: FileTree,
        mut printed: String,
        mut count: usize,
        budget: usize,
    ) -> TreeTruncation {
        for iteration in 0..MAX_DEPTH_ITERATIONS {
            if count <= budget {
                break;
            }

            let mut files = tree.files();
            if files.is_empty() {
                break;
            }

            let avg_name_tokens = self.average_file_name_tokens(&files);
            let over = count - budget;
            let estimated =
                (REMOVAL_ESTIMATE_FACTOR * over as f64 / avg_name_tokens).ceil() as usize;
            let to_remove = (estimated + REMOVAL_ESTIMATE_MARGIN).min(files.len());

            files.sort_by(|a, b| b.depth.cmp(&a.depth).then_with(|| b.path.cmp(a.path)));
            let doomed: HashSet<String> = files
                .iter()
                .take(to_remove)
                .map(|f| f.path.to_string())
                .collect();

            let next_tree = tree.filtered(&|_, path| !doomed.contains(path), &|_| true);
            let next_printed = render_file_tree(&next_tree, None);
            let next_count = self.counter.count_json(&next_printed);

            debug!(
                iteration,
                removed = to_remove,
                tokens = next_count,
                budget,
                "Depth-based removal pass"
            );

            if next_count >= count {
                warn!(
                    iteration,
                    tokens = count,
                    "Depth-based truncation stopped making progress"
                );
                break;
            }

            tree = next_tree;
            printed = next_printed;
            count = next_count;
        }

        if count > budget {
            warn!(
                tokens = count,
                budget, "File tree still over budget after depth-based truncation"
            );
        }

        TreeTruncation {
            printed_tree: printed,
            token_count: count,
            truncation_level: TruncationLevel::DepthBased,
        }
    }

    /// Average token cost of a deterministic sample of file names
    fn average_file_name_tokens(&self, files: &[super::models::FileRef<'_>]) -> f64 {
        let seed = self
            .seed
            .unwrap_or_else(|| derive_seed(files.iter().map(|f| f.path)));
        let mut rng = StdRng::seed_from_u64(seed);

        let sample_size = files.len().min(FILE_SAMPLE_SIZE);
        let total: usize = rand::seq::index::sample(&mut rng, files.len(), sample_size)
            .iter()
            .map(|i| self.counter.count(files[i].name))
            .sum();

        (total as f64 / sample_size as f64).max(1.0)
    }
}

/// Seed derived from the serialized file list, for reproducible sampling
fn derive_seed<'a>(paths: impl Iterator<Item = &'a str>) -> u64 {
    let mut hasher = Sha256::new();
    for path in paths {
        hasher.update(path.as_bytes());
        hasher.update([0]);
    }
    let digest = hasher.finalize();
    u64::from_le_bytes([
        digest[0], digest[1], digest[2], digest[3], digest[4], digest[5], digest[6], digest[7],
    ])
}

/// Fit a project's file tree under a budget using the process-wide counter
pub fn truncate_file_tree_to_budget(
    context: &ProjectFileContext,
    token_budget: usize,
) -> Result<TreeTruncation> {
    TreeTruncator::new(default_counter()).truncate(context, token_budget)
}
