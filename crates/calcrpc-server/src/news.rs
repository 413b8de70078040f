//! Headline scraping for the `news` role.
//!
//! The page is fetched with `reqwest` and the text of its `<h3>` elements is
//! returned, in document order, up to the configured limit. Fetch failures
//! are not errors on the wire: they come back as a one-element list holding
//! the failure text, like any other headline list.

use std::time::Duration;

use async_trait::async_trait;
use calcrpc_common::config::NewsConfig;
use calcrpc_common::{CalcrpcError, Command, EngineError, OpCode, OperationResult, Result};

use crate::handler::CommandHandler;

/// Reply used when the page has no usable `<h3>` elements.
pub const NO_HEADLINES: &str = "No headlines found";

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetches headlines from a single page.
#[derive(Debug, Clone)]
pub struct HeadlineScraper {
    client: reqwest::Client,
    url: String,
    limit: usize,
}

impl HeadlineScraper {
    pub fn new(url: impl Into<String>, limit: usize) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(concat!("calcrpc/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CalcrpcError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
            limit,
        })
    }

    pub fn from_config(config: &NewsConfig) -> Result<Self> {
        Self::new(config.url.clone(), config.limit)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetches the page and returns its headlines.
    pub async fn headlines(&self) -> Vec<String> {
        match self.fetch_page().await {
            Ok(html) => {
                let headlines = extract_headlines(&html, self.limit);
                if headlines.is_empty() {
                    vec![NO_HEADLINES.to_string()]
                } else {
                    headlines
                }
            }
            Err(e) => {
                tracing::warn!("Failed to fetch headlines from {}: {}", self.url, e);
                vec![format!("Error fetching news: {}", e)]
            }
        }
    }

    async fn fetch_page(&self) -> std::result::Result<String, reqwest::Error> {
        self.client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}

#[async_trait]
impl CommandHandler for HeadlineScraper {
    async fn handle(&self, command: &Command) -> OperationResult {
        match command.op() {
            OpCode::News => OperationResult::Strings(self.headlines().await),
            other => EngineError::UnknownOperation(other.to_string()).into(),
        }
    }
}

/// Returns the non-empty text of up to `limit` `<h3>` elements.
pub fn extract_headlines(html: &str, limit: usize) -> Vec<String> {
    let lower = html.to_ascii_lowercase();
    let mut headlines = Vec::new();
    let mut cursor = 0;

    while headlines.len() < limit {
        let Some(open) = find_open_tag(&lower, cursor) else {
            break;
        };
        let Some(body_start) = lower[open..].find('>').map(|i| open + i + 1) else {
            break;
        };
        let Some(body_end) = lower[body_start..].find("</h3").map(|i| body_start + i) else {
            break;
        };

        let text = element_text(&html[body_start..body_end]);
        if !text.is_empty() {
            headlines.push(text);
        }
        cursor = body_end + "</h3".len();
    }

    headlines
}

/// Finds `<h3` followed by `>` or whitespace, skipping tags like `<h30>`.
fn find_open_tag(lower: &str, from: usize) -> Option<usize> {
    let mut from = from;
    while let Some(i) = lower[from..].find("<h3") {
        let at = from + i;
        match lower.as_bytes().get(at + 3) {
            Some(b'>') | Some(b' ') | Some(b'\t') | Some(b'\n') | Some(b'\r') => return Some(at),
            _ => from = at + 3,
        }
    }
    None
}

/// Strips nested tags, decodes common entities and collapses whitespace.
fn element_text(fragment: &str) -> String {
    let mut text = String::with_capacity(fragment.len());
    let mut in_tag = false;
    for ch in fragment.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                text.push(' ');
            }
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }

    let decoded = decode_entities(&text);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_h3_text_in_order() {
        let html = r#"
            <html><body>
              <h2>Not a headline</h2>
              <h3 class="title">First story</h3>
              <h3><a href="/x">Second <b>story</b></a></h3>
              <H3>Third &amp; final</H3>
            </body></html>
        "#;
        assert_eq!(
            extract_headlines(html, 5),
            vec!["First story", "Second story", "Third & final"]
        );
    }

    #[test]
    fn test_respects_limit_and_skips_empty() {
        let html = "<h3> </h3><h3>a</h3><h3>b</h3><h3>c</h3>";
        assert_eq!(extract_headlines(html, 2), vec!["a", "b"]);
    }

    #[test]
    fn test_ignores_similar_tags() {
        let html = "<h30>nope</h30><h3>yes</h3>";
        assert_eq!(extract_headlines(html, 5), vec!["yes"]);
    }

    #[test]
    fn test_unclosed_element_stops_scan() {
        assert!(extract_headlines("<h3>dangling", 5).is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_page_yields_error_text() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let scraper = HeadlineScraper::new(format!("http://{}/", addr), 5).unwrap();
        let headlines = scraper.headlines().await;
        assert_eq!(headlines.len(), 1);
        assert!(headlines[0].starts_with("Error fetching news"));
    }

    #[tokio::test]
    async fn test_handler_rejects_other_opcodes() {
        let scraper = HeadlineScraper::new("http://127.0.0.1:9/", 5).unwrap();
        let command = Command::parse("sum 1 2").unwrap();
        assert!(scraper.handle(&command).await.is_error());
    }
}
