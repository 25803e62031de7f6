use crate::comments::{CommentListing, CommentThing, MoreChildrenResponse, MORE_CHILDREN_BATCH};
use crate::rate_limiter::{RateLimitConfig, RateLimiter};
use rfetcher_core::{CoreError, ListingKind, RawPost, RedditApiError, RedditCredentials};
use reqwest::{Client, Method, Response};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

pub const REDDIT_API_BASE: &str = "https://oauth.reddit.com";
pub const REDDIT_TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListing<T> {
    pub kind: String,
    pub data: RedditListingData<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingData<T> {
    pub children: Vec<RedditListingChild<T>>,
    pub after: Option<String>,
    pub before: Option<String>,
    pub dist: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingChild<T> {
    pub kind: String,
    pub data: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditPostData {
    pub id: String,
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub subreddit: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub permalink: String,
    #[serde(default)]
    pub created_utc: f64,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub num_comments: u64,
    #[serde(default)]
    pub stickied: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditUserData {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub created_utc: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditSubredditData {
    pub display_name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subscribers: Option<u64>,
    #[serde(default)]
    pub over18: bool,
}

/// Response body of the OAuth2 token endpoint. Reddit reports bad
/// credentials with a 200 status and an `error` field.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct RedditApiClient {
    http_client: Client,
    rate_limiter: Arc<RateLimiter>,
    user_agent: String,
    api_base: String,
    token_url: String,
}

impl RedditApiClient {
    pub fn new(user_agent: String) -> Result<Self, CoreError> {
        Self::with_endpoints(
            user_agent,
            REDDIT_API_BASE.to_string(),
            REDDIT_TOKEN_URL.to_string(),
        )
    }

    pub fn with_endpoints(
        user_agent: String,
        api_base: String,
        token_url: String,
    ) -> Result<Self, CoreError> {
        let rate_limiter = Arc::new(RateLimiter::new(RateLimitConfig::reddit_oauth()));

        let http_client = Client::builder()
            .user_agent(&user_agent)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http_client,
            rate_limiter,
            user_agent,
            api_base: api_base.trim_end_matches('/').to_string(),
            token_url,
        })
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Password-grant token request for a script application.
    pub async fn request_token(
        &self,
        credentials: &RedditCredentials,
    ) -> Result<TokenResponse, CoreError> {
        let _permit = self.rate_limiter.acquire_permit().await;
        info!("Requesting access token for {}", credentials.username);

        let response = self
            .http_client
            .post(&self.token_url)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(&[
                ("grant_type", "password"),
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
            ])
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            error!("Token request failed with status: {}", status);
            return Err(CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                reason: format!("token endpoint returned {}", status),
            }));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            error!("Failed to parse token response: {}", e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: "Failed to parse token response".to_string(),
            })
        })?;

        if let Some(reason) = token.error.clone() {
            return Err(CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                reason,
            }));
        }
        if token.access_token.is_none() {
            return Err(CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                reason: "no access token in response".to_string(),
            }));
        }

        Ok(token)
    }

    pub async fn make_request(
        &self,
        method: Method,
        endpoint: &str,
        access_token: &str,
        query_params: Option<&[(&str, &str)]>,
    ) -> Result<Response, CoreError> {
        let url = format!("{}{}", self.api_base, endpoint);
        let start_time = Instant::now();

        let permit = self.rate_limiter.acquire_permit().await;
        debug!(
            "Acquired rate limit permit for {} {} after {:?}",
            method, endpoint, permit.queue_wait_time
        );

        let mut request_builder = self
            .http_client
            .request(method.clone(), &url)
            .bearer_auth(access_token)
            .header("User-Agent", &self.user_agent);

        if let Some(params) = query_params {
            request_builder = request_builder.query(params);
        }

        debug!("Making Reddit API request: {} {}", method, endpoint);
        let response = request_builder.send().await.map_err(|e| {
            error!("Network error for {} {}: {}", method, endpoint, e);
            map_transport_error(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            error!("Request failed with status: {} for {}", status, endpoint);
            return Err(CoreError::RedditApi(status_error(
                status.as_u16(),
                endpoint,
                response
                    .headers()
                    .get("retry-after")
                    .and_then(|value| value.to_str().ok())
                    .and_then(|value| value.parse::<u64>().ok()),
            )));
        }

        debug!(
            "Request successful: {} {} in {:?}",
            status,
            endpoint,
            start_time.elapsed()
        );
        Ok(response)
    }

    pub async fn get_user_info(&self, access_token: &str) -> Result<RedditUserData, CoreError> {
        let response = self
            .make_request(Method::GET, "/api/v1/me", access_token, None)
            .await?;

        let user_data: RedditUserData = response.json().await.map_err(|e| {
            error!("Failed to parse user data: {}", e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: "Failed to parse user data".to_string(),
            })
        })?;

        debug!("Retrieved user info for: {}", user_data.name);
        Ok(user_data)
    }

    pub async fn get_subreddit_info(
        &self,
        access_token: &str,
        subreddit: &str,
    ) -> Result<RedditSubredditData, CoreError> {
        let endpoint = format!("/r/{}/about", subreddit);

        let response = self
            .make_request(Method::GET, &endpoint, access_token, None)
            .await
            .map_err(|e| match e {
                CoreError::RedditApi(RedditApiError::InvalidResponse { .. }) => {
                    CoreError::RedditApi(RedditApiError::SubredditNotFound {
                        subreddit: subreddit.to_string(),
                    })
                }
                other => other,
            })?;

        // Unknown names come back as a search listing rather than a t5 thing
        let about: RedditListingChild<serde_json::Value> = response.json().await.map_err(|e| {
            error!("Failed to parse subreddit info: {}", e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Failed to parse info for r/{}", subreddit),
            })
        })?;
        if about.kind != "t5" {
            return Err(CoreError::RedditApi(RedditApiError::SubredditNotFound {
                subreddit: subreddit.to_string(),
            }));
        }

        let data: RedditSubredditData = serde_json::from_value(about.data)?;
        debug!("Retrieved info for r/{}", data.display_name);
        Ok(data)
    }

    pub async fn get_subreddit_posts(
        &self,
        access_token: &str,
        subreddit: &str,
        kind: ListingKind,
        limit: u32,
        after: Option<&str>,
    ) -> Result<RedditListing<RedditPostData>, CoreError> {
        let endpoint = format!("/r/{}/{}", subreddit, kind.as_str());
        let limit_str = limit.to_string();
        let params = listing_params(kind, &limit_str, after);

        let response = self
            .make_request(Method::GET, &endpoint, access_token, Some(params.as_slice()))
            .await?;

        let listing: RedditListing<RedditPostData> = response.json().await.map_err(|e| {
            error!("Failed to parse subreddit posts: {}", e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Failed to parse posts for r/{}", subreddit),
            })
        })?;

        info!(
            "Retrieved {} {} posts from r/{}",
            listing.data.children.len(),
            kind,
            subreddit
        );
        Ok(listing)
    }

    /// The comment listing of a post, without the post itself.
    pub async fn get_comment_thread(
        &self,
        access_token: &str,
        post_id: &str,
    ) -> Result<CommentListing, CoreError> {
        let endpoint = format!("/comments/{}", post_id);

        let response = self
            .make_request(
                Method::GET,
                &endpoint,
                access_token,
                Some(&[("raw_json", "1")][..]),
            )
            .await
            .map_err(|e| match e {
                CoreError::RedditApi(RedditApiError::InvalidResponse { .. }) => {
                    CoreError::RedditApi(RedditApiError::PostNotFound {
                        post_id: post_id.to_string(),
                    })
                }
                other => other,
            })?;

        let (_post, comments): (IgnoredAny, CommentListing) =
            response.json().await.map_err(|e| {
                error!("Failed to parse comments for {}: {}", post_id, e);
                CoreError::RedditApi(RedditApiError::InvalidResponse {
                    details: format!("Failed to parse comments for {}", post_id),
                })
            })?;

        Ok(comments)
    }

    /// Expands the given child ids of a continuation marker. Ids beyond
    /// [`MORE_CHILDREN_BATCH`] are requested in further calls.
    pub async fn get_more_children(
        &self,
        access_token: &str,
        link_fullname: &str,
        children: &[String],
    ) -> Result<Vec<CommentThing>, CoreError> {
        let mut things = Vec::new();

        for batch in children.chunks(MORE_CHILDREN_BATCH) {
            let joined = batch.join(",");
            let params = [
                ("api_type", "json"),
                ("link_id", link_fullname),
                ("children", joined.as_str()),
                ("raw_json", "1"),
            ];

            let response = self
                .make_request(
                    Method::GET,
                    "/api/morechildren",
                    access_token,
                    Some(&params[..]),
                )
                .await?;

            let parsed: MoreChildrenResponse = response.json().await.map_err(|e| {
                error!("Failed to parse morechildren response: {}", e);
                CoreError::RedditApi(RedditApiError::InvalidResponse {
                    details: format!("Failed to parse more comments for {}", link_fullname),
                })
            })?;

            if !parsed.json.errors.is_empty() {
                warn!(
                    "morechildren for {} reported errors: {:?}",
                    link_fullname, parsed.json.errors
                );
            }
            if let Some(data) = parsed.json.data {
                things.extend(data.things);
            }
        }

        debug!(
            "Expanded {} ids into {} things for {}",
            children.len(),
            things.len(),
            link_fullname
        );
        Ok(things)
    }

    pub async fn get_rate_limit_status(&self) -> crate::rate_limiter::RateLimitStatus {
        self.rate_limiter.get_rate_limit_status().await
    }
}

/// Query for one listing page. `top` covers all time rather than Reddit's
/// default of the past day.
fn listing_params<'a>(
    kind: ListingKind,
    limit: &'a str,
    after: Option<&'a str>,
) -> Vec<(&'static str, &'a str)> {
    let mut params = vec![("limit", limit), ("raw_json", "1")];
    if kind == ListingKind::Top {
        params.push(("t", "all"));
    }
    if let Some(after) = after {
        params.push(("after", after));
    }
    params
}

fn map_transport_error(error: reqwest::Error) -> CoreError {
    if error.is_timeout() {
        CoreError::RedditApi(RedditApiError::RequestTimeout)
    } else {
        CoreError::Network(error)
    }
}

fn status_error(status: u16, endpoint: &str, retry_after: Option<u64>) -> RedditApiError {
    match status {
        429 => {
            let retry_after = retry_after.unwrap_or(60);
            warn!("Rate limited, retry after {} seconds", retry_after);
            RedditApiError::RateLimitExceeded { retry_after }
        }
        401 => RedditApiError::AuthenticationFailed {
            reason: "access token rejected".to_string(),
        },
        403 => RedditApiError::Forbidden {
            resource: endpoint.to_string(),
        },
        404 => RedditApiError::InvalidResponse {
            details: "Resource not found".to_string(),
        },
        code if code >= 500 => RedditApiError::ServerError { status_code: code },
        code => RedditApiError::InvalidResponse {
            details: format!("Unexpected status {} for {}", code, endpoint),
        },
    }
}

impl From<RedditPostData> for RawPost {
    fn from(post_data: RedditPostData) -> Self {
        Self {
            id: post_data.id,
            fullname: post_data.name,
            title: post_data.title,
            author: post_data.author,
            selftext: post_data.selftext,
            score: post_data.score,
            url: post_data.url,
            created_utc: post_data.created_utc,
            num_comments: post_data.num_comments,
            stickied: post_data.stickied,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_api_client_creation() {
        let client = RedditApiClient::new("test-user-agent/1.0".to_string()).unwrap();
        assert_eq!(client.user_agent(), "test-user-agent/1.0");

        let status = client.get_rate_limit_status().await;
        assert!(status.available_tokens > 0);
        assert_eq!(status.total_requests, 0);
    }

    #[test]
    fn test_custom_endpoints_trim_trailing_slash() {
        let client = RedditApiClient::with_endpoints(
            "ua".to_string(),
            "http://127.0.0.1:9/".to_string(),
            "http://127.0.0.1:9/token".to_string(),
        )
        .unwrap();
        assert_eq!(client.api_base, "http://127.0.0.1:9");
    }

    #[test]
    fn test_top_listing_covers_all_time() {
        let params = listing_params(ListingKind::Top, "5", Some("t3_abc"));
        assert_eq!(
            params,
            vec![
                ("limit", "5"),
                ("raw_json", "1"),
                ("t", "all"),
                ("after", "t3_abc")
            ]
        );

        for kind in [ListingKind::Hot, ListingKind::New, ListingKind::Rising] {
            let params = listing_params(kind, "100", None);
            assert_eq!(params, vec![("limit", "100"), ("raw_json", "1")]);
        }
    }

    #[test]
    fn test_status_error_mapping() {
        assert!(matches!(
            status_error(429, "/r/rust/hot", Some(12)),
            RedditApiError::RateLimitExceeded { retry_after: 12 }
        ));
        assert!(matches!(
            status_error(429, "/r/rust/hot", None),
            RedditApiError::RateLimitExceeded { retry_after: 60 }
        ));
        assert!(matches!(
            status_error(403, "/r/private/about", None),
            RedditApiError::Forbidden { .. }
        ));
        assert!(matches!(
            status_error(503, "/r/rust/hot", None),
            RedditApiError::ServerError { status_code: 503 }
        ));
        assert!(matches!(
            status_error(401, "/api/v1/me", None),
            RedditApiError::AuthenticationFailed { .. }
        ));
    }

    #[test]
    fn test_reddit_post_conversion() {
        let json = r#"{
            "kind": "Listing",
            "data": {
                "after": "t3_def",
                "before": null,
                "dist": 1,
                "children": [{
                    "kind": "t3",
                    "data": {
                        "id": "abc",
                        "name": "t3_abc",
                        "title": "Test Post",
                        "selftext": "This is test content",
                        "author": "test_user",
                        "subreddit": "test",
                        "url": "https://reddit.com/r/test/comments/abc",
                        "permalink": "/r/test/comments/abc",
                        "created_utc": 1640995200.0,
                        "score": 42,
                        "num_comments": 5,
                        "stickied": true,
                        "over_18": false
                    }
                }]
            }
        }"#;

        let listing: RedditListing<RedditPostData> = serde_json::from_str(json).unwrap();
        assert_eq!(listing.data.after.as_deref(), Some("t3_def"));

        let post: RawPost = listing.data.children[0].data.clone().into();
        assert_eq!(post.id, "abc");
        assert_eq!(post.fullname, "t3_abc");
        assert_eq!(post.title, "Test Post");
        assert_eq!(post.selftext, "This is test content");
        assert_eq!(post.author.as_deref(), Some("test_user"));
        assert_eq!(post.score, 42);
        assert_eq!(post.num_comments, 5);
        assert!(post.stickied);
    }
}
