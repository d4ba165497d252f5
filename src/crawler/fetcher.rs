//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with a proper user agent string
//! - Building the search URL for a region/page pair
//! - Politeness delays through the shared `PolitenessLimiter`
//! - Retry logic for transient failures and rate limiting
//! - Error classification

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::crawler::rate_limiter::PolitenessLimiter;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::time::{Duration, Instant};
use url::Url;

/// One page of one region's search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub search_term: String,
    pub region: String,
    /// 1-based page number
    pub page: u32,
}

impl SearchRequest {
    pub fn new(search_term: &str, region: &str, page: u32) -> Self {
        Self {
            search_term: search_term.to_string(),
            region: region.to_string(),
            page,
        }
    }
}

/// How a failed fetch should be treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Timeout, connection reset, 5xx; retried with exponential backoff
    Transient,

    /// HTTP 429; retried after the fixed cooldown
    RateLimited,

    /// 4xx or malformed response; never retried
    Permanent,
}

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success {
        /// HTTP status code
        status_code: u16,
        /// Page body content
        body: String,
    },

    /// Page is not HTML (Content-Type mismatch)
    ContentMismatch {
        /// The actual Content-Type received
        content_type: String,
    },

    /// HTTP error status
    HttpError {
        /// The HTTP status code
        status_code: u16,
        /// How this status is handled
        failure: FailureKind,
    },

    /// Network error (connection refused, timeout, etc.)
    NetworkError {
        /// Error description
        error: String,
        /// How this error is handled
        failure: FailureKind,
    },
}

impl FetchResult {
    /// Returns true if the page body was retrieved
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The page body, if the fetch succeeded
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Success { body, .. } => Some(body),
            _ => None,
        }
    }

    /// HTTP status code, if a response was received
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Success { status_code, .. } | Self::HttpError { status_code, .. } => {
                Some(*status_code)
            }
            _ => None,
        }
    }

    /// Failure classification; None for a success
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Success { .. } => None,
            Self::ContentMismatch { .. } => Some(FailureKind::Permanent),
            Self::HttpError { failure, .. } | Self::NetworkError { failure, .. } => Some(*failure),
        }
    }
}

/// Anything that can produce a result page for a search request
///
/// The HTTP fetcher is the production implementation; tests substitute
/// scripted sources so region crawls can run without a network.
#[async_trait]
pub trait PageSource: Send {
    /// Fetches one page, after any retries the source performs internally
    async fn fetch_page(&mut self, request: &SearchRequest) -> FetchResult;
}

/// Bounded retry schedule for a single page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt
    pub max_retries: u32,

    /// Delay before the first transient retry
    pub backoff_base: Duration,

    /// Upper bound on any single transient delay
    pub backoff_cap: Duration,

    /// Delay after a rate-limit response
    pub rate_limit_cooldown: Duration,
}

impl RetryPolicy {
    /// Delay before transient retry number `retry` (0-based)
    ///
    /// `min(base * 2^retry, cap)`; never decreases as `retry` grows.
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.backoff_base
            .checked_mul(factor)
            .unwrap_or(self.backoff_cap)
            .min(self.backoff_cap)
    }

    /// Delay before the next attempt after a failure of the given kind
    ///
    /// Returns None for failures that must not be retried.
    pub fn delay_for(&self, failure: FailureKind, retry: u32) -> Option<Duration> {
        match failure {
            FailureKind::Transient => Some(self.backoff_delay(retry)),
            FailureKind::RateLimited => Some(self.rate_limit_cooldown),
            FailureKind::Permanent => None,
        }
    }
}

impl From<&CrawlerConfig> for RetryPolicy {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff_base: Duration::from_millis(config.backoff_base_ms),
            backoff_cap: Duration::from_millis(config.backoff_cap_ms),
            rate_limit_cooldown: Duration::from_millis(config.rate_limit_cooldown_ms),
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use listing_sweep::config::{CrawlerConfig, UserAgentConfig};
/// use listing_sweep::crawler::build_http_client;
///
/// let agent = UserAgentConfig {
///     crawler_name: "ListingSweep".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
/// };
///
/// let client = build_http_client(&agent, &CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    agent: &UserAgentConfig,
    crawler: &CrawlerConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(agent.header_value())
        .timeout(Duration::from_secs(crawler.request_timeout_secs))
        .connect_timeout(Duration::from_secs(crawler.connect_timeout_secs))
        .redirect(Policy::limited(5))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Builds the search URL for one page of one region
///
/// Page 1 omits the `page` parameter; the site serves the same content
/// either way.
///
/// # Example
///
/// ```
/// use listing_sweep::crawler::build_search_url;
/// use url::Url;
///
/// let base = Url::parse("https://www.example.com/search").unwrap();
/// let url = build_search_url(&base, "pool cleaning", "NJ", 2);
/// assert_eq!(
///     url.as_str(),
///     "https://www.example.com/search?search_terms=pool+cleaning&geo_location_terms=NJ&page=2"
/// );
/// ```
pub fn build_search_url(base: &Url, search_term: &str, region: &str, page: u32) -> Url {
    let mut url = base.clone();
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("search_terms", search_term);
        query.append_pair("geo_location_terms", region);
        if page > 1 {
            query.append_pair("page", &page.to_string());
        }
    }
    url
}

/// Page source backed by real HTTP requests
pub struct HttpFetcher {
    client: Client,
    base_url: Url,
    retry: RetryPolicy,
    limiter: PolitenessLimiter,
}

impl HttpFetcher {
    /// Creates a fetcher; the limiter is owned by this fetcher for the whole run
    pub fn new(client: Client, base_url: Url, retry: RetryPolicy, limiter: PolitenessLimiter) -> Self {
        Self {
            client,
            base_url,
            retry,
            limiter,
        }
    }
}

#[async_trait]
impl PageSource for HttpFetcher {
    /// Fetches a result page with politeness delays and bounded retries
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | HTTP 2xx with HTML | Return Success |
    /// | HTTP 429 | Wait the rate-limit cooldown, retry |
    /// | HTTP 5xx | Exponential backoff, retry |
    /// | Timeout / connection error | Exponential backoff, retry |
    /// | Other HTTP 4xx | Return immediately |
    /// | Non-HTML body | Return immediately |
    ///
    /// At most `1 + max_retries` requests are made for one page; the last
    /// failure is returned once the budget is spent.
    async fn fetch_page(&mut self, request: &SearchRequest) -> FetchResult {
        let url = build_search_url(
            &self.base_url,
            &request.search_term,
            &request.region,
            request.page,
        );
        let mut retry = 0u32;

        loop {
            self.limiter.wait_turn().await;
            let result = fetch_url(&self.client, url.as_str()).await;
            self.limiter.record_finished(Instant::now());

            let Some(failure) = result.failure_kind() else {
                return result;
            };

            let Some(delay) = self.retry.delay_for(failure, retry) else {
                tracing::warn!(
                    "{} page {}: non-retriable failure {:?}",
                    request.region,
                    request.page,
                    result
                );
                return result;
            };

            if retry >= self.retry.max_retries {
                tracing::warn!(
                    "{} page {}: giving up after {} attempts ({:?})",
                    request.region,
                    request.page,
                    retry + 1,
                    result
                );
                return result;
            }

            tracing::warn!(
                "{} page {}: {:?} failure, retry {}/{} in {:?}",
                request.region,
                request.page,
                failure,
                retry + 1,
                self.retry.max_retries,
                delay
            );
            tokio::time::sleep(delay).await;
            retry += 1;
        }
    }
}

/// Performs a single GET and classifies the outcome
pub async fn fetch_url(client: &Client, url: &str) -> FetchResult {
    tracing::debug!("GET {}", url);

    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => return classify_network_error(&e),
    };

    let status = response.status();
    if response.url().as_str() != url {
        tracing::debug!("Redirected to {}", response.url());
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        return FetchResult::HttpError {
            status_code: status.as_u16(),
            failure: FailureKind::RateLimited,
        };
    }

    if status.is_server_error() {
        return FetchResult::HttpError {
            status_code: status.as_u16(),
            failure: FailureKind::Transient,
        };
    }

    if !status.is_success() {
        return FetchResult::HttpError {
            status_code: status.as_u16(),
            failure: FailureKind::Permanent,
        };
    }

    // A missing Content-Type is tolerated; an explicit non-HTML one is not
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !content_type.is_empty() && !content_type.contains("html") {
        return FetchResult::ContentMismatch { content_type };
    }

    match response.text().await {
        Ok(body) => FetchResult::Success {
            status_code: status.as_u16(),
            body,
        },
        Err(e) => classify_network_error(&e),
    }
}

/// Classifies a reqwest error as retriable or not
fn classify_network_error(e: &reqwest::Error) -> FetchResult {
    let failure = if e.is_builder() || e.is_redirect() || e.is_decode() {
        FailureKind::Permanent
    } else {
        FailureKind::Transient
    };

    let error = if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        "Connection failed".to_string()
    } else {
        e.to_string()
    };

    FetchResult::NetworkError { error, failure }
}
