pub mod api;
pub mod comments;
pub mod rate_limiter;


use api::{RedditApiClient, RedditUserData};
use comments::{assemble_things, listing_to_nodes, next_marker, replace_marker};
use rfetcher_core::{
    ContentSource, CoreError, ListingKind, RawCommentNode, RawPost, RedditApiError,
    RedditCredentials,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::{Duration, SystemTime};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Tokens are renewed this long before Reddit would reject them.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditToken {
    pub access_token: String,
    pub expires_at: SystemTime,
    pub scope: Vec<String>,
}

impl RedditToken {
    pub fn is_expired(&self) -> bool {
        SystemTime::now() + TOKEN_EXPIRY_MARGIN >= self.expires_at
    }
}

/// Authenticated Reddit access for a script application.
///
/// The token is obtained lazily on first use and renewed with the password
/// grant when it is about to expire.
#[derive(Debug)]
pub struct RedditClient {
    api: RedditApiClient,
    credentials: RedditCredentials,
    token: Mutex<Option<RedditToken>>,
}

impl RedditClient {
    pub fn new(credentials: RedditCredentials) -> Result<Self, CoreError> {
        let api = RedditApiClient::new(credentials.user_agent.clone())?;
        Ok(Self::with_api(credentials, api))
    }

    pub fn with_api(credentials: RedditCredentials, api: RedditApiClient) -> Self {
        Self {
            api,
            credentials,
            token: Mutex::new(None),
        }
    }

    pub fn api(&self) -> &RedditApiClient {
        &self.api
    }

    pub async fn set_token(&self, token: RedditToken) {
        *self.token.lock().await = Some(token);
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token
            .lock()
            .await
            .as_ref()
            .map(|token| !token.is_expired())
            .unwrap_or(false)
    }

    pub async fn authenticate(&self) -> Result<(), CoreError> {
        let response = self.api.request_token(&self.credentials).await?;
        let access_token = response.access_token.ok_or_else(|| {
            CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                reason: "no access token in response".to_string(),
            })
        })?;

        let token = RedditToken {
            access_token,
            expires_at: SystemTime::now()
                + Duration::from_secs(response.expires_in.unwrap_or(3600)),
            scope: response
                .scope
                .unwrap_or_default()
                .split_whitespace()
                .map(str::to_string)
                .collect(),
        };

        info!("Obtained access token with scope {:?}", token.scope);
        self.set_token(token).await;
        Ok(())
    }

    async fn access_token(&self) -> Result<String, CoreError> {
        {
            let token = self.token.lock().await;
            if let Some(token) = token.as_ref().filter(|token| !token.is_expired()) {
                return Ok(token.access_token.clone());
            }
        }

        debug!("Access token missing or expired, authenticating");
        self.authenticate().await?;
        self.token
            .lock()
            .await
            .as_ref()
            .map(|token| token.access_token.clone())
            .ok_or_else(|| {
                CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                    reason: "token unavailable after authentication".to_string(),
                })
            })
    }

    pub async fn get_user_info(&self) -> Result<RedditUserData, CoreError> {
        let token = self.access_token().await?;
        self.api.get_user_info(&token).await
    }
}

impl ContentSource for RedditClient {
    async fn probe_subreddit(&self, subreddit: &str) -> Result<(), CoreError> {
        let token = self.access_token().await?;
        let about = self.api.get_subreddit_info(&token, subreddit).await?;
        debug!("r/{} is accessible: {}", about.display_name, about.title);
        Ok(())
    }

    async fn fetch_listing(
        &self,
        subreddit: &str,
        kind: ListingKind,
        limit: u32,
        after: Option<&str>,
    ) -> Result<Vec<RawPost>, CoreError> {
        let token = self.access_token().await?;
        let listing = self
            .api
            .get_subreddit_posts(&token, subreddit, kind, limit, after)
            .await?;

        Ok(listing
            .data
            .children
            .into_iter()
            .map(|child| RawPost::from(child.data))
            .collect())
    }

    async fn fetch_comments(
        &self,
        post: &RawPost,
        expand_budget: usize,
    ) -> Result<Vec<RawCommentNode>, CoreError> {
        let token = self.access_token().await?;
        let thread = self.api.get_comment_thread(&token, &post.id).await?;
        let mut nodes = listing_to_nodes(thread);

        let mut attempted = HashSet::new();
        let mut expanded = 0;
        while expanded < expand_budget {
            let Some(marker) = next_marker(&nodes, &attempted) else {
                break;
            };
            attempted.insert(marker.id.clone());

            match self
                .api
                .get_more_children(&token, &post.fullname, &marker.children)
                .await
            {
                Ok(things) => {
                    replace_marker(&mut nodes, &marker.id, assemble_things(things));
                    expanded += 1;
                }
                Err(e) => {
                    // Keep the thread as fetched so far
                    warn!("Stopped expanding comments for {}: {}", post.id, e);
                    break;
                }
            }
        }

        debug!(
            "Fetched {} top-level comment nodes for {} ({} continuations expanded)",
            nodes.len(),
            post.id,
            expanded
        );
        Ok(nodes)
    }
}
