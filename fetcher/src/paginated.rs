use crate::comment_tree::build_forest;
use rfetcher_core::{
    matches, ContentSource, ErrorExt, FilterSpec, ListingKind, Post, RawPost, DELETED_AUTHOR,
};
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const DEFAULT_PAGE_SIZE: usize = 100;
pub const DEFAULT_EXPAND_BUDGET: usize = 10;
pub const DEFAULT_ITEM_DELAY: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Upper bound on posts requested per listing page.
    pub page_size: usize,
    /// Continuation markers expanded per post.
    pub expand_budget: usize,
    /// Pause after each admitted post.
    pub item_delay: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            expand_budget: DEFAULT_EXPAND_BUDGET,
            item_delay: DEFAULT_ITEM_DELAY,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStats {
    pub processed: usize,
    pub skipped: usize,
    pub pinned: usize,
    pub pages: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostVerdict {
    Admit,
    Pinned,
    Unwanted,
    NotWanted,
}

/// Decides whether a listing item is kept, before any comment work is done.
pub fn screen_post(post: &RawPost, filters: &FilterSpec) -> PostVerdict {
    if post.stickied {
        return PostVerdict::Pinned;
    }

    let blob = format!("{} {}", post.title, post.selftext).to_lowercase();
    if !filters.post_unwanted.is_empty() && matches(&blob, &filters.post_unwanted) {
        return PostVerdict::Unwanted;
    }
    if !filters.post_wanted.is_empty() && !matches(&blob, &filters.post_wanted) {
        return PostVerdict::NotWanted;
    }
    PostVerdict::Admit
}

/// Walks a listing page by page until `limit` posts pass the filters or the
/// source runs dry. Nothing is retried: a failed page ends the walk and a
/// failed comment fetch leaves that post with no comments.
pub struct PaginatedFetcher<'s, S> {
    source: &'s S,
    options: FetchOptions,
}

impl<'s, S: ContentSource> PaginatedFetcher<'s, S> {
    pub fn new(source: &'s S) -> Self {
        Self::with_options(source, FetchOptions::default())
    }

    pub fn with_options(source: &'s S, options: FetchOptions) -> Self {
        Self { source, options }
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    pub async fn fetch(
        &self,
        subreddit: &str,
        kind: ListingKind,
        limit: usize,
        filters: &FilterSpec,
    ) -> Vec<Post> {
        self.fetch_with_stats(subreddit, kind, limit, filters).await.0
    }

    pub async fn fetch_with_stats(
        &self,
        subreddit: &str,
        kind: ListingKind,
        limit: usize,
        filters: &FilterSpec,
    ) -> (Vec<Post>, FetchStats) {
        let mut stats = FetchStats::default();
        let mut collected: Vec<Post> = Vec::new();

        if limit == 0 {
            return (collected, stats);
        }

        if let Err(e) = self.source.probe_subreddit(subreddit).await {
            e.log_error();
            error!("Cannot fetch r/{}: {}", subreddit, e.user_friendly_message());
            return (collected, stats);
        }

        info!(
            "Fetching {} posts from r/{} ({} listing)",
            limit, subreddit, kind
        );

        let page_size = self.options.page_size.max(1);
        let mut after: Option<String> = None;

        'pages: while collected.len() < limit {
            let request = page_size.min(limit - collected.len());
            info!(
                "Fetching up to {} posts... (collected {}/{})",
                request,
                collected.len(),
                limit
            );

            let page = match self
                .source
                .fetch_listing(
                    subreddit,
                    kind,
                    u32::try_from(request).unwrap_or(u32::MAX),
                    after.as_deref(),
                )
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    e.log_warn();
                    warn!("Listing request failed, stopping with {} posts", collected.len());
                    break;
                }
            };

            if page.is_empty() {
                info!("No more posts available, stopping early");
                break;
            }
            stats.pages += 1;
            after = page.last().map(|post| post.fullname.clone());

            for raw in &page {
                stats.processed += 1;

                match screen_post(raw, filters) {
                    PostVerdict::Admit => {}
                    PostVerdict::Pinned => {
                        stats.pinned += 1;
                        debug!("Skipping pinned post {}", raw.id);
                        continue;
                    }
                    PostVerdict::Unwanted | PostVerdict::NotWanted => {
                        stats.skipped += 1;
                        debug!("Skipping filtered post {}", raw.id);
                        continue;
                    }
                }

                info!("Processing post: {}", raw.title);
                let post = self.collect_post(raw, filters).await;
                collected.push(post);

                tokio::time::sleep(self.options.item_delay).await;

                if collected.len() >= limit {
                    break 'pages;
                }
            }
        }

        info!("Total processed: {} posts", stats.processed);
        info!("Skipped {} posts based on keyword filters", stats.skipped);

        (collected, stats)
    }

    async fn collect_post(&self, raw: &RawPost, filters: &FilterSpec) -> Post {
        let mut post = Post {
            id: raw.id.clone(),
            title: raw.title.clone(),
            author: raw
                .author
                .clone()
                .unwrap_or_else(|| DELETED_AUTHOR.to_string()),
            selftext: raw.selftext.clone(),
            score: raw.score,
            url: raw.url.clone(),
            created_utc: raw.created_utc,
            num_comments: raw.num_comments,
            comments: Vec::new(),
            category: None,
        };

        match self
            .source
            .fetch_comments(raw, self.options.expand_budget)
            .await
        {
            Ok(nodes) => {
                let (comments, forest) = build_forest(&nodes, &filters.comment_unwanted);
                info!(
                    "  - Added {} comments ({} top-level skipped)",
                    forest.admitted, forest.rejected
                );
                post.comments = comments;
            }
            Err(e) => {
                e.log_warn();
                warn!("  - Error processing comments for {}: {}", raw.id, e);
            }
        }

        post
    }
}
