//! `web_search` tool.
//!
//! The search backend sits behind [`SearchProvider`]; results are
//! normalized and rendered as a numbered text list for the LLM.
//! DuckDuckGo needs no key and is the default; Tavily is used when
//! configured.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::WebSearchConfig;

const DEFAULT_MAX_RESULTS: u8 = 5;

pub(crate) struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

pub(crate) struct SearchResults {
    /// Pre-built answer, when the provider returns one.
    pub summary: Option<String>,
    pub hits: Vec<SearchHit>,
}

#[async_trait]
pub(crate) trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> anyhow::Result<SearchResults>;

    fn name(&self) -> &str;
}

pub struct WebSearch {
    provider: Box<dyn SearchProvider>,
}

impl WebSearch {
    /// Keyless default backend.
    pub fn duckduckgo() -> Self {
        Self {
            provider: Box::new(DuckDuckGo::new(DEFAULT_MAX_RESULTS)),
        }
    }

    pub fn from_config(config: &WebSearchConfig) -> anyhow::Result<Self> {
        let provider: Box<dyn SearchProvider> = match config.provider.as_str() {
            "tavily" => {
                if config.api_key.is_empty() {
                    anyhow::bail!("Tavily web search needs tools.web_search.api_key");
                }
                Box::new(Tavily::new(&config.api_key, config.max_results))
            }
            "duckduckgo" => Box::new(DuckDuckGo::new(config.max_results)),
            other => anyhow::bail!(
                "Unsupported web search provider '{other}' (supported: duckduckgo, tavily)"
            ),
        };
        Ok(Self { provider })
    }

    #[cfg(test)]
    pub(crate) fn from_provider(provider: Box<dyn SearchProvider>) -> Self {
        Self { provider }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Searches and renders the results. Provider errors are returned as text
    /// so the LLM can tell the user instead of aborting the turn.
    pub async fn run(&self, query: &str) -> String {
        debug!("web_search ({}): {query}", self.provider.name());
        match self.provider.search(query).await {
            Ok(results) => render(query, &results),
            Err(e) => {
                warn!("web_search failed: {e}");
                format!("Web search failed: {e}")
            }
        }
    }
}

fn render(query: &str, results: &SearchResults) -> String {
    let mut out = format!("Web search results for: {query}\n");

    if let Some(summary) = results.summary.as_deref().filter(|s| !s.is_empty()) {
        out.push_str(&format!("\nSummary: {summary}\n"));
    }

    if results.hits.is_empty() {
        out.push_str("\nNo results found.");
        return out;
    }

    for (i, hit) in results.hits.iter().enumerate() {
        out.push_str(&format!("\n{}. {}\n   {}\n", i + 1, hit.title, hit.url));
        if !hit.snippet.is_empty() {
            out.push_str(&format!("   {}\n", hit.snippet));
        }
    }
    out
}

// ── DuckDuckGo ───────────────────────────────────────────

const DUCKDUCKGO_URL: &str = "https://api.duckduckgo.com/";

/// Instant Answer API response (only the fields used here).
#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DuckDuckGoResponse {
    #[serde(default)]
    abstract_text: String,
    #[serde(default)]
    answer: String,
    #[serde(default)]
    related_topics: Vec<DuckDuckGoTopic>,
}

/// A related topic is either a single link or a named group of links.
#[derive(Deserialize)]
#[serde(untagged)]
enum DuckDuckGoTopic {
    Link {
        #[serde(rename = "Text")]
        text: String,
        #[serde(rename = "FirstURL")]
        first_url: String,
    },
    Group {
        #[serde(rename = "Topics")]
        topics: Vec<DuckDuckGoTopic>,
    },
}

fn flatten_topics(topics: Vec<DuckDuckGoTopic>, hits: &mut Vec<SearchHit>) {
    for topic in topics {
        match topic {
            DuckDuckGoTopic::Link { text, first_url } => hits.push(SearchHit {
                title: text,
                url: first_url,
                snippet: String::new(),
            }),
            DuckDuckGoTopic::Group { topics } => flatten_topics(topics, hits),
        }
    }
}

impl DuckDuckGoResponse {
    fn into_results(self, max_results: usize) -> SearchResults {
        let summary = [self.abstract_text, self.answer]
            .into_iter()
            .find(|s| !s.is_empty());
        let mut hits = Vec::new();
        flatten_topics(self.related_topics, &mut hits);
        hits.truncate(max_results);
        SearchResults { summary, hits }
    }
}

struct DuckDuckGo {
    client: Client,
    max_results: u8,
}

impl DuckDuckGo {
    fn new(max_results: u8) -> Self {
        Self {
            client: Client::new(),
            max_results,
        }
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGo {
    async fn search(&self, query: &str) -> anyhow::Result<SearchResults> {
        let response = self
            .client
            .get(DUCKDUCKGO_URL)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("DuckDuckGo API returned {status}: {body}");
        }

        // Served as application/x-javascript, so parse the body by hand
        let body = response.text().await?;
        let parsed: DuckDuckGoResponse = serde_json::from_str(&body)?;
        Ok(parsed.into_results(self.max_results as usize))
    }

    fn name(&self) -> &str {
        "duckduckgo"
    }
}

// ── Tavily ───────────────────────────────────────────────

const TAVILY_URL: &str = "https://api.tavily.com/search";

#[derive(Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: u8,
    include_answer: bool,
}

#[derive(Deserialize)]
struct TavilyResponse {
    answer: Option<String>,
    #[serde(default)]
    results: Vec<TavilyHit>,
}

#[derive(Deserialize)]
struct TavilyHit {
    title: String,
    url: String,
    content: String,
}

impl From<TavilyResponse> for SearchResults {
    fn from(resp: TavilyResponse) -> Self {
        Self {
            summary: resp.answer,
            hits: resp
                .results
                .into_iter()
                .map(|h| SearchHit {
                    title: h.title,
                    url: h.url,
                    snippet: h.content,
                })
                .collect(),
        }
    }
}

struct Tavily {
    client: Client,
    api_key: String,
    max_results: u8,
}

impl Tavily {
    fn new(api_key: &str, max_results: u8) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            max_results,
        }
    }
}

#[async_trait]
impl SearchProvider for Tavily {
    async fn search(&self, query: &str) -> anyhow::Result<SearchResults> {
        let response = self
            .client
            .post(TAVILY_URL)
            .json(&TavilyRequest {
                api_key: &self.api_key,
                query,
                max_results: self.max_results,
                include_answer: true,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Tavily API returned {status}: {body}");
        }

        let parsed: TavilyResponse = response.json().await?;
        Ok(parsed.into())
    }

    fn name(&self) -> &str {
        "tavily"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingProvider;

    #[async_trait]
    impl SearchProvider for FailingProvider {
        async fn search(&self, _query: &str) -> anyhow::Result<SearchResults> {
            anyhow::bail!("connection refused")
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn config(provider: &str) -> WebSearchConfig {
        WebSearchConfig {
            provider: provider.to_string(),
            api_key: "test-key".to_string(),
            max_results: 3,
        }
    }

    #[test]
    fn test_from_config_tavily() {
        let search = WebSearch::from_config(&config("tavily")).unwrap();
        assert_eq!(search.provider_name(), "tavily");
    }

    #[test]
    fn test_from_config_duckduckgo() {
        let search = WebSearch::from_config(&config("duckduckgo")).unwrap();
        assert_eq!(search.provider_name(), "duckduckgo");
        assert_eq!(WebSearch::duckduckgo().provider_name(), "duckduckgo");
    }

    #[test]
    fn test_tavily_without_key_is_rejected() {
        let mut cfg = config("tavily");
        cfg.api_key.clear();
        let err = WebSearch::from_config(&cfg).err().unwrap();
        assert!(err.to_string().contains("api_key"));
    }

    #[test]
    fn test_duckduckgo_response_mapping() {
        let json = r#"{
            "Heading": "Rust",
            "AbstractText": "Rust is a programming language.",
            "AbstractURL": "https://en.wikipedia.org/wiki/Rust",
            "Answer": "",
            "RelatedTopics": [
                {"Text": "Cargo - package manager", "FirstURL": "https://duckduckgo.com/Cargo"},
                {"Name": "See also", "Topics": [
                    {"Text": "Rustup", "FirstURL": "https://duckduckgo.com/Rustup"},
                    {"Text": "Crates.io", "FirstURL": "https://duckduckgo.com/Crates.io"}
                ]}
            ]
        }"#;
        let parsed: DuckDuckGoResponse = serde_json::from_str(json).unwrap();
        let results = parsed.into_results(2);
        assert_eq!(results.summary.as_deref(), Some("Rust is a programming language."));
        assert_eq!(results.hits.len(), 2);
        assert_eq!(results.hits[1].title, "Rustup");

        let out = render("rust", &results);
        assert!(out.contains("2. Rustup\n   https://duckduckgo.com/Rustup\n"));
    }

    #[test]
    fn test_duckduckgo_empty_response() {
        let parsed: DuckDuckGoResponse =
            serde_json::from_str(r#"{"AbstractText": "", "RelatedTopics": []}"#).unwrap();
        let results = parsed.into_results(5);
        assert!(results.summary.is_none());
        assert!(render("q", &results).ends_with("No results found."));
    }

    #[test]
    fn test_from_config_unsupported() {
        let err = WebSearch::from_config(&config("bing")).err().unwrap();
        assert!(err.to_string().contains("Unsupported web search provider"));
    }

    #[tokio::test]
    async fn test_provider_error_becomes_text() {
        let search = WebSearch {
            provider: Box::new(FailingProvider),
        };
        let out = search.run("rust").await;
        assert_eq!(out, "Web search failed: connection refused");
    }

    #[test]
    fn test_render_with_summary() {
        let results = SearchResults {
            summary: Some("Rust is a systems language.".to_string()),
            hits: vec![SearchHit {
                title: "Rust".to_string(),
                url: "https://www.rust-lang.org".to_string(),
                snippet: "Fast and reliable.".to_string(),
            }],
        };
        let out = render("what is rust", &results);
        assert!(out.starts_with("Web search results for: what is rust\n"));
        assert!(out.contains("Summary: Rust is a systems language."));
        assert!(out.contains("1. Rust\n   https://www.rust-lang.org\n   Fast and reliable."));
    }

    #[test]
    fn test_render_empty_summary_and_no_hits() {
        let results = SearchResults {
            summary: Some(String::new()),
            hits: vec![],
        };
        let out = render("q", &results);
        assert!(!out.contains("Summary:"));
        assert!(out.ends_with("No results found."));
    }

    #[test]
    fn test_tavily_response_mapping() {
        let json = r#"{
            "answer": null,
            "results": [
                {"title": "A", "url": "https://a.example", "content": "first"},
                {"title": "B", "url": "https://b.example", "content": "second"}
            ]
        }"#;
        let parsed: TavilyResponse = serde_json::from_str(json).unwrap();
        let results: SearchResults = parsed.into();
        assert!(results.summary.is_none());
        assert_eq!(results.hits.len(), 2);
        assert_eq!(results.hits[1].snippet, "second");
    }
}
