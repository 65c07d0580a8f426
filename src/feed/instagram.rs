//! Instagram Fetcher
//!
//! Fetches a public profile feed over HTTP. The JSON profile endpoint is
//! tried first; the HTML profile page is scraped only when the endpoint
//! answers with a rate limit, a refusal, a login wall or another HTTP error.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::FetchError;
use crate::feed::extract::{extract_embedded_json, posts_from_profile_json, UndatedPolicy};
use crate::feed::{FeedFetcher, Post};

/// Path of the structured profile endpoint.
const PROFILE_API_PATH: &str = "/api/v1/users/web_profile_info/";
/// Public web app id expected by the profile endpoint.
const WEB_APP_ID: &str = "936619743392459";
/// Login gate path prefix.
const LOGIN_PATH: &str = "/accounts/login";

/// Realistic mobile browsers; one is picked per request.
const USER_AGENTS: [&str; 3] = [
    "Mozilla/5.0 (Linux; Android 14; Pixel 8 Pro) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/128.0.0.0 Mobile Safari/537.36",
    "Mozilla/5.0 (Linux; Android 13; SM-S918B) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/127.0.0.0 Mobile Safari/537.36",
    "Mozilla/5.0 (Linux; Android 13; Pixel 7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Mobile Safari/537.36",
];

// == Instagram Fetcher ==
/// reqwest-backed [`FeedFetcher`] with a page-scrape fallback.
#[derive(Debug, Clone)]
pub struct InstagramFetcher {
    client: Client,
    base_url: Url,
    undated_policy: UndatedPolicy,
    jitter_ms: u64,
}

impl InstagramFetcher {
    // == Constructor ==
    /// Builds the HTTP client from the upstream settings in `config`.
    ///
    /// The client timeout equals `config.fetch_timeout`.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let base_url = Url::parse(&config.upstream_base_url)
            .with_context(|| format!("invalid upstream url: {}", config.upstream_base_url))?;
        anyhow::ensure!(
            !base_url.cannot_be_a_base(),
            "upstream url cannot be a base: {}",
            base_url
        );

        let client = Client::builder()
            .timeout(config.fetch_timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url,
            undated_policy: config.undated_policy,
            jitter_ms: config.fetch_jitter_ms,
        })
    }

    // == Profile Endpoint ==
    async fn fetch_profile_api(&self, username: &str, limit: usize) -> Result<Vec<Post>, FetchError> {
        let url = self
            .base_url
            .join(PROFILE_API_PATH)
            .map_err(|e| FetchError::Unknown(format!("invalid profile endpoint url: {}", e)))?;

        let request = self
            .client
            .get(url)
            .query(&[("username", username)])
            .header(ACCEPT, "application/json")
            .header("x-ig-app-id", WEB_APP_ID)
            .header("x-requested-with", "XMLHttpRequest");

        let response = send(with_user_agent(request)).await?;
        classify_response(&response)?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| FetchError::Unknown(format!("invalid profile JSON: {}", e)))?;

        posts_from_profile_json(&body, self.undated_policy, limit)
    }

    // == Profile Page ==
    async fn fetch_profile_page(&self, username: &str, limit: usize) -> Result<Vec<Post>, FetchError> {
        let url = self.profile_page_url(username)?;

        let request = self
            .client
            .get(url)
            .header(
                ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
            )
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.8")
            .header("sec-fetch-mode", "navigate")
            .header("sec-fetch-site", "none")
            .header("sec-fetch-user", "?1")
            .header("upgrade-insecure-requests", "1");

        let response = send(with_user_agent(request)).await?;
        classify_response(&response)?;

        let html = response
            .text()
            .await
            .map_err(|e| FetchError::Unknown(format!("failed to read profile page: {}", e)))?;

        match extract_embedded_json(&html) {
            Some(root) => posts_from_profile_json(&root, self.undated_policy, limit),
            None if html.contains(LOGIN_PATH) => Err(FetchError::LoginWall),
            None => Err(FetchError::NoStructure),
        }
    }

    fn profile_page_url(&self, username: &str) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::Unknown("upstream url cannot be a base".to_string()))?
            .pop_if_empty()
            .push(username)
            .push("");
        Ok(url)
    }

    async fn jitter(&self) {
        if self.jitter_ms == 0 {
            return;
        }
        let delay = rand::thread_rng().gen_range(0..=self.jitter_ms);
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
}

#[async_trait]
impl FeedFetcher for InstagramFetcher {
    async fn fetch_posts(&self, username: &str, limit: usize) -> Result<Vec<Post>, FetchError> {
        self.jitter().await;

        match self.fetch_profile_api(username, limit).await {
            Ok(posts) => {
                debug!(username, count = posts.len(), "profile endpoint succeeded");
                Ok(posts)
            }
            Err(err) if err.allows_page_fallback() => {
                warn!(username, error = %err, "profile endpoint failed, scraping profile page");
                self.fetch_profile_page(username, limit).await
            }
            Err(err) => Err(err),
        }
    }
}

// == Helpers ==
fn with_user_agent(request: RequestBuilder) -> RequestBuilder {
    let agent = USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0]);
    request.header(USER_AGENT, agent)
}

async fn send(request: RequestBuilder) -> Result<Response, FetchError> {
    request.send().await.map_err(|e| {
        if e.is_timeout() {
            FetchError::Unknown("upstream request timed out".to_string())
        } else {
            FetchError::Unknown(format!("upstream request failed: {}", e))
        }
    })
}

/// Maps an upstream response onto the failure taxonomy.
fn classify_response(response: &Response) -> Result<(), FetchError> {
    classify(response.status(), response.url())
}

fn classify(status: StatusCode, final_url: &Url) -> Result<(), FetchError> {
    match status {
        StatusCode::TOO_MANY_REQUESTS => Err(FetchError::RateLimited),
        StatusCode::FORBIDDEN => Err(FetchError::Forbidden),
        _ if final_url.path().starts_with(LOGIN_PATH) => Err(FetchError::LoginWall),
        s if !s.is_success() => Err(FetchError::UpstreamHttp(s.as_u16())),
        _ => Ok(()),
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn url(path: &str) -> Url {
        Url::parse("https://www.instagram.com").unwrap().join(path).unwrap()
    }

    #[test]
    fn test_classify_statuses() {
        let profile = url("/someone/");
        assert_eq!(classify(StatusCode::OK, &profile), Ok(()));
        assert_eq!(
            classify(StatusCode::TOO_MANY_REQUESTS, &profile),
            Err(FetchError::RateLimited)
        );
        assert_eq!(classify(StatusCode::FORBIDDEN, &profile), Err(FetchError::Forbidden));
        assert_eq!(
            classify(StatusCode::INTERNAL_SERVER_ERROR, &profile),
            Err(FetchError::UpstreamHttp(500))
        );
        assert_eq!(
            classify(StatusCode::NOT_FOUND, &profile),
            Err(FetchError::UpstreamHttp(404))
        );
    }

    #[test]
    fn test_classify_login_redirect() {
        let login = url("/accounts/login/?next=/someone/");
        assert_eq!(classify(StatusCode::OK, &login), Err(FetchError::LoginWall));
    }

    #[test]
    fn test_profile_page_url_encodes_username() {
        let fetcher = InstagramFetcher::new(&Config::default()).unwrap();
        assert_eq!(
            fetcher.profile_page_url("some.one").unwrap().as_str(),
            "https://www.instagram.com/some.one/"
        );
        assert_eq!(
            fetcher.profile_page_url("a/b").unwrap().as_str(),
            "https://www.instagram.com/a%2Fb/"
        );
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        let config = Config {
            upstream_base_url: "not a url".to_string(),
            ..Config::default()
        };
        assert!(InstagramFetcher::new(&config).is_err());
    }
}
