//! Reddit public JSON API client
//!
//! Reads hot submissions and their top-level comments through the unauthenticated
//! `.json` listing endpoints. Only the fields the ingestion pipeline consumes
//! are deserialized.

use super::{FeedClient, FeedComment, FeedPost};
use crate::config::FeedConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

const REDDIT_BASE_URL: &str = "https://www.reddit.com";

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<Thing>,
}

#[derive(Debug, Deserialize)]
struct Thing {
    kind: String,
    data: ThingData,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ThingData {
    id: String,
    title: String,
    score: i64,
    is_self: bool,
    stickied: bool,
    body: String,
}

pub struct RedditClient {
    client: Client,
    base_url: Url,
}

impl RedditClient {
    pub fn new(config: &FeedConfig) -> Result<Self> {
        Self::with_base_url(config, REDDIT_BASE_URL)
    }

    /// Construct against an alternate base URL (used by tests)
    pub fn with_base_url(config: &FeedConfig, base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: Url::parse(base_url)?,
        })
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| Error::Feed(format!("Invalid feed URL: {}", e)))?;
        let response = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::Feed(e.to_string()))?;
        Ok(response.json::<T>().await?)
    }

    async fn fetch_comments(&self, post_id: &str) -> Result<Vec<FeedComment>> {
        // The comments endpoint answers with two listings: the post itself,
        // then the comment tree. Only top-level t1 entries are taken; "more"
        // placeholders are dropped, matching a flattened tree.
        let listings: Vec<Listing> = self
            .get_json(&format!("/comments/{}.json?depth=1", post_id))
            .await?;

        let comments = listings
            .into_iter()
            .nth(1)
            .map(|listing| {
                listing
                    .data
                    .children
                    .into_iter()
                    .filter(|thing| thing.kind == "t1")
                    .map(|thing| FeedComment {
                        body: thing.data.body,
                        score: thing.data.score,
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(comments)
    }
}

#[async_trait]
impl FeedClient for RedditClient {
    async fn fetch_hot(&self, feed: &str, limit: u32) -> Result<Vec<FeedPost>> {
        debug!("Fetching hot posts from r/{}", feed);

        let listing: Listing = self
            .get_json(&format!("/r/{}/hot.json?limit={}", feed, limit))
            .await?;

        let mut posts = Vec::new();
        for thing in listing.data.children {
            if thing.kind != "t3" {
                continue;
            }
            let comments = self.fetch_comments(&thing.data.id).await?;
            posts.push(FeedPost {
                id: thing.data.id,
                title: thing.data.title,
                score: thing.data.score,
                is_self: thing.data.is_self,
                stickied: thing.data.stickied,
                comments,
            });
        }

        debug!("Fetched {} posts from r/{}", posts.len(), feed);
        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_hot_parses_listing_and_comments() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/r/MovieSuggestions/hot.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {"children": [
                    {"kind": "t3", "data": {
                        "id": "abc", "title": "Movies that feel like autumn",
                        "score": 120, "is_self": true, "stickied": false
                    }},
                    {"kind": "t3", "data": {
                        "id": "def", "title": "Weekly thread",
                        "score": 5, "is_self": true, "stickied": true
                    }}
                ]}
            })))
            .mount(&server)
            .await;

        for id in ["abc", "def"] {
            Mock::given(method("GET"))
                .and(path(format!("/comments/{}.json", id)))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                    {"data": {"children": [{"kind": "t3", "data": {"id": id}}]}},
                    {"data": {"children": [
                        {"kind": "t1", "data": {"body": "Fargo", "score": 42}},
                        {"kind": "more", "data": {}}
                    ]}}
                ])))
                .mount(&server)
                .await;
        }

        let client =
            RedditClient::with_base_url(&FeedConfig::default(), &server.uri()).unwrap();
        let posts = client.fetch_hot("MovieSuggestions", 25).await.unwrap();

        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].id, "abc");
        assert_eq!(posts[0].score, 120);
        assert!(posts[1].stickied);
        assert_eq!(posts[0].comments.len(), 1);
        assert_eq!(posts[0].comments[0].body, "Fargo");
        assert_eq!(posts[0].comments[0].score, 42);
    }

    #[tokio::test]
    async fn test_fetch_hot_http_error_is_feed_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client =
            RedditClient::with_base_url(&FeedConfig::default(), &server.uri()).unwrap();
        let err = client.fetch_hot("MovieSuggestions", 25).await;
        assert!(matches!(err, Err(Error::Feed(_))));
    }
}
