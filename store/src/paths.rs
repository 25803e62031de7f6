use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};

/// What a result file holds, as reflected in its generated name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputTarget<'a> {
    Category(&'a str),
    NoCategory,
    AllCategories,
}

/// Replaces everything outside `[A-Za-z0-9_-]` with `_`.
pub fn sanitize_category(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

pub fn generate_filename(
    data_dir: &Path,
    subreddit: &str,
    target: OutputTarget<'_>,
    now: NaiveDateTime,
) -> PathBuf {
    let timestamp = now.format("%Y%m%d_%H%M%S");
    let name = match target {
        OutputTarget::Category(category) => {
            format!("{}_{}_{}.json", subreddit, sanitize_category(category), timestamp)
        }
        OutputTarget::NoCategory => format!("{}_no_category_{}.json", subreddit, timestamp),
        OutputTarget::AllCategories => {
            format!("{}_all_categories_{}.json", subreddit, timestamp)
        }
    };
    data_dir.join(name)
}

/// Adds a `.json` extension when missing and places the file under
/// `data_dir` unless the name already starts there. Absolute paths are kept.
pub fn normalize_custom(data_dir: &Path, name: &str) -> PathBuf {
    let name = name.trim();
    let file = if name.ends_with(".json") {
        name.to_string()
    } else {
        format!("{}.json", name)
    };

    let path = PathBuf::from(file);
    if path.starts_with(data_dir) {
        path
    } else {
        data_dir.join(path)
    }
}
