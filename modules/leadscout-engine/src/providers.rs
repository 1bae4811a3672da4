use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use spider_transformations::transformation::content::{
    transform_content_input, ReturnFormat, TransformConfig, TransformInput,
};
use tracing::{info, warn};

// --- SearchProvider trait ---

#[derive(Debug, Clone)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
    pub snippet: String,
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>>;
}

// --- PageFetcher trait ---

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch raw page text. `timeout` bounds this call only, independent of
    /// any client-level default.
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<String>;
}

// --- Serper (Google Search) ---

pub struct SerperSearcher {
    api_key: String,
    client: reqwest::Client,
}

#[derive(Debug, serde::Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SerperResult>,
}

#[derive(Debug, serde::Deserialize)]
struct SerperResult {
    #[serde(default)]
    link: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
}

impl SerperSearcher {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
        }
    }
}

#[async_trait]
impl SearchProvider for SerperSearcher {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        info!(query, limit, "Serper search");

        let body = serde_json::json!({
            "q": query,
            "num": limit,
        });

        let resp = self
            .client
            .post("https://google.serper.dev/search")
            .header("X-API-KEY", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .context("Serper API request failed")?;

        let data: SerperResponse = resp
            .json()
            .await
            .context("Failed to parse Serper response")?;

        let results: Vec<SearchHit> = data
            .organic
            .into_iter()
            .filter(|r| !r.link.is_empty())
            .map(|r| SearchHit {
                url: r.link,
                title: r.title,
                snippet: r.snippet,
            })
            .collect();

        info!(query, count = results.len(), "Serper search complete");
        Ok(results)
    }
}

// --- HTTP page fetcher ---

/// Plain HTTP fetcher returning the raw response body. Candidate pages are
/// company marketing sites; no JS rendering tier is warranted for them.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .user_agent("Mozilla/5.0 (compatible; leadscout/0.1)")
                .build()
                .expect("Failed to build HTTP client"),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<String> {
        let resp = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .with_context(|| format!("Fetch failed for {url}"))?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("Fetch returned {status} for {url}");
        }

        let body = resp
            .text()
            .await
            .with_context(|| format!("Failed to read body for {url}"))?;

        info!(url, bytes = body.len(), "Fetched candidate page");
        Ok(body)
    }
}

// --- Readability extraction ---

/// Reduce raw HTML to clean markdown-ish text for signal detection.
/// Metadata-sensitive checks (classifier, geography) run on the raw body;
/// this strips the navigation noise that inflates keyword hits.
pub fn readable_text(html: &str, url: &str) -> String {
    let parsed_url = url::Url::parse(url).ok();
    let config = TransformConfig {
        readability: true,
        main_content: true,
        return_format: ReturnFormat::Markdown,
        filter_images: true,
        filter_svg: true,
        clean_html: true,
    };
    let input = TransformInput {
        url: parsed_url.as_ref(),
        content: html.as_bytes(),
        screenshot_bytes: None,
        encoding: None,
        selector_config: None,
        ignore_tags: None,
    };

    let text = transform_content_input(input, &config);
    if text.trim().is_empty() {
        warn!(url, "Empty content after Readability extraction, using raw text");
        return html.to_string();
    }
    text
}
