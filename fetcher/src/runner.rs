//! Category-aware runs.
//!
//! A run is planned from the configuration and the known categories, then
//! executed against a content source to produce one of three document
//! shapes: `{category, posts}`, `{name: posts, ...}` or `{posts}`.

use crate::paginated::{FetchOptions, PaginatedFetcher};
use rfetcher_core::{Category, ConfigError, ContentSource, FilterSpec, Post, RunConfig};
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::info;

pub const DEFAULT_CATEGORY_PAUSE: Duration = Duration::from_secs(5);

/// Name accepted in the category list to mean every known category.
pub const ALL_CATEGORIES: &str = "all";

#[derive(Debug, Clone, PartialEq)]
pub enum RunPlan {
    Unfiltered { filters: FilterSpec },
    Single { category: String, filters: FilterSpec },
    Multi {
        categories: Vec<Category>,
        comment_unwanted: Vec<String>,
    },
}

impl RunPlan {
    pub fn describe(&self) -> String {
        match self {
            RunPlan::Unfiltered { .. } => "no category".to_string(),
            RunPlan::Single { category, .. } => format!("category '{}'", category),
            RunPlan::Multi { categories, .. } => format!("{} categories", categories.len()),
        }
    }
}

/// Resolves the configured category names against `available`.
pub fn plan_run(config: &RunConfig, available: &[Category]) -> Result<RunPlan, ConfigError> {
    let wants_all = config.all_categories
        || config
            .categories
            .iter()
            .any(|name| name.eq_ignore_ascii_case(ALL_CATEGORIES));

    let mut selected: Vec<Category> = Vec::new();
    if wants_all {
        selected.extend(available.iter().cloned());
    } else {
        for name in &config.categories {
            if selected.iter().any(|category| category.name == *name) {
                continue;
            }
            let category = available
                .iter()
                .find(|category| category.name == *name)
                .ok_or_else(|| ConfigError::UnknownCategory { name: name.clone() })?;
            selected.push(category.clone());
        }
    }

    // Shape follows the number of categories, however they were selected
    let plan = match selected.len() {
        0 if wants_all => {
            return Err(ConfigError::InvalidValue {
                field: "categories".to_string(),
                value: "no categories defined".to_string(),
            })
        }
        0 => RunPlan::Unfiltered {
            filters: config.filter_spec(),
        },
        1 => {
            let category = selected.swap_remove(0);
            RunPlan::Single {
                filters: FilterSpec::new(
                    category.keywords,
                    config.post_unwanted.clone(),
                    config.comment_unwanted.clone(),
                ),
                category: category.name,
            }
        }
        _ => RunPlan::Multi {
            categories: selected,
            comment_unwanted: config.comment_unwanted.clone(),
        },
    };

    Ok(plan)
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutputDocument {
    Unfiltered { posts: Vec<Post> },
    Single { category: String, posts: Vec<Post> },
    Multi(Vec<(String, Vec<Post>)>),
}

impl OutputDocument {
    pub fn post_count(&self) -> usize {
        match self {
            OutputDocument::Unfiltered { posts } | OutputDocument::Single { posts, .. } => {
                posts.len()
            }
            OutputDocument::Multi(groups) => groups.iter().map(|(_, posts)| posts.len()).sum(),
        }
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        let value = match self {
            OutputDocument::Unfiltered { posts } => json!({ "posts": posts }),
            OutputDocument::Single { category, posts } => {
                json!({ "category": category, "posts": posts })
            }
            OutputDocument::Multi(groups) => {
                let mut map = Map::new();
                for (name, posts) in groups {
                    map.insert(name.clone(), serde_json::to_value(posts)?);
                }
                Value::Object(map)
            }
        };
        Ok(value)
    }
}

pub struct Runner<'s, S> {
    fetcher: PaginatedFetcher<'s, S>,
    category_pause: Duration,
}

impl<'s, S: ContentSource> Runner<'s, S> {
    pub fn new(source: &'s S) -> Self {
        Self::with_options(source, FetchOptions::default(), DEFAULT_CATEGORY_PAUSE)
    }

    pub fn with_options(source: &'s S, options: FetchOptions, category_pause: Duration) -> Self {
        Self {
            fetcher: PaginatedFetcher::with_options(source, options),
            category_pause,
        }
    }

    pub async fn run(&self, config: &RunConfig, plan: &RunPlan) -> OutputDocument {
        info!(
            "Starting run on r/{} with {}",
            config.subreddit,
            plan.describe()
        );

        match plan {
            RunPlan::Unfiltered { filters } => {
                let posts = self
                    .fetcher
                    .fetch(&config.subreddit, config.listing, config.limit, filters)
                    .await;
                OutputDocument::Unfiltered { posts }
            }
            RunPlan::Single { category, filters } => {
                let posts = self
                    .fetcher
                    .fetch(&config.subreddit, config.listing, config.limit, filters)
                    .await;
                OutputDocument::Single {
                    category: category.clone(),
                    posts,
                }
            }
            RunPlan::Multi {
                categories,
                comment_unwanted,
            } => {
                let mut groups = Vec::with_capacity(categories.len());
                for (index, category) in categories.iter().enumerate() {
                    info!("Fetching posts for category: {}", category.name);
                    let filters = FilterSpec::new(
                        category.keywords.clone(),
                        Vec::new(),
                        comment_unwanted.clone(),
                    );
                    let mut posts = self
                        .fetcher
                        .fetch(&config.subreddit, config.listing, config.limit, &filters)
                        .await;
                    for post in &mut posts {
                        post.category = Some(category.name.clone());
                    }
                    info!("Collected {} posts for {}", posts.len(), category.name);
                    groups.push((category.name.clone(), posts));

                    if index + 1 < categories.len() {
                        tokio::time::sleep(self.category_pause).await;
                    }
                }
                OutputDocument::Multi(groups)
            }
        }
    }
}
