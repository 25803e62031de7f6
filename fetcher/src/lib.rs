//! Acquisition pipeline: paginated listing fetches, post screening and
//! filtered comment-tree construction, plus category-aware run assembly.

pub mod comment_tree;
pub mod paginated;
pub mod runner;

pub use comment_tree::{build, build_forest, count_descendants, ForestStats};
pub use paginated::{screen_post, FetchOptions, FetchStats, PaginatedFetcher, PostVerdict};
pub use runner::{plan_run, OutputDocument, RunPlan, Runner};
