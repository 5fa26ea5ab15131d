use std::time::{Duration, Instant};

use reqwest::{Client, ClientBuilder};
use scraper::{ElementRef, Html, Node};
use tracing::{debug, info};

use crate::error::{AppError, Result};

/// Upper bound on the extracted excerpt, in characters.
pub const MAX_TEXT_CHARS: usize = 5000;

/// Generic browser identity so basic bot filters let the request through.
pub const USER_AGENT: &str = "Mozilla/5.0";

// Subtrees that never render as visible text
const SKIPPED_TAGS: &[&str] = &["script", "style", "template"];

/// Fetches a page and reduces it to a bounded plain-text excerpt.
#[derive(Clone)]
pub struct PageExtractor {
    client: Client,
}

impl PageExtractor {
    pub fn new() -> Result<Self> {
        let client = ClientBuilder::new()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(5))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| AppError::ClientBuild(e.to_string()))?;

        Ok(Self { client })
    }

    /// Fetch `url` and return its visible text, truncated to [`MAX_TEXT_CHARS`].
    ///
    /// URL syntax is left to the HTTP client; a malformed URL surfaces as
    /// [`AppError::Fetch`] like any other network failure.
    pub async fn extract(&self, url: &str) -> Result<String> {
        let start = Instant::now();
        let html = self.fetch_html(url).await?;
        debug!(url = %url, bytes = html.len(), "Fetched HTML");

        let text = extract_text(&html, MAX_TEXT_CHARS);
        info!(
            url = %url,
            chars = text.chars().count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Extracted page text"
        );
        Ok(text)
    }

    pub async fn fetch_html(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let html = response.text().await?;
        Ok(html)
    }
}

/// Visible text of an HTML document: every text node outside script, style
/// and template elements (head `<title>` included), joined by single spaces,
/// with whitespace collapsed and at most `max_chars` characters.
pub fn extract_text(html: &str, max_chars: usize) -> String {
    let document = Html::parse_document(html);

    let mut text = String::new();
    let mut chars = 0;
    collect_text(document.root_element(), &mut text, &mut chars, max_chars);

    truncate_chars(&text, max_chars).to_string()
}

fn collect_text(element: ElementRef<'_>, buf: &mut String, chars: &mut usize, max_chars: usize) {
    for child in element.children() {
        if *chars >= max_chars {
            return;
        }
        match child.value() {
            Node::Text(text) => {
                for word in text.split_whitespace() {
                    if !buf.is_empty() {
                        buf.push(' ');
                        *chars += 1;
                    }
                    buf.push_str(word);
                    *chars += word.chars().count();
                }
            }
            Node::Element(el) if SKIPPED_TAGS.contains(&el.name()) => {}
            Node::Element(_) => {
                if let Some(child_ref) = ElementRef::wrap(child) {
                    collect_text(child_ref, buf, chars, max_chars);
                }
            }
            _ => {}
        }
    }
}

/// Longest prefix of `text` holding at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
