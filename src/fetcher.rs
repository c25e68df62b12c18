//! Help-center article source.
//!
//! [`HelpCenterFetcher`] pulls published articles from a help-center
//! REST API (`GET {base_url}/articles.json`), following `next_page`
//! links until the page list is exhausted or the configured per-run cap
//! is reached. Draft articles are skipped. Article bodies arrive as
//! HTML; tags are stripped (dropping script/style/nav/aside content
//! entirely) so the rest of the pipeline only ever sees text.
//!
//! Any transport or decode error fails the whole fetch — the sync run
//! aborts rather than trusting a partial article list.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ego_tree::NodeRef;
use scraper::{Html, Node};
use serde::Deserialize;

use crate::config::SourceConfig;
use crate::models::Article;

/// A source of articles for one sync run.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// Fetch the current article batch. Pagination and batch caps are
    /// internal to the implementation.
    async fn fetch_articles(&self) -> Result<Vec<Article>>;
}

/// HTTP fetcher against a help-center articles API.
pub struct HelpCenterFetcher {
    client: reqwest::Client,
    base_url: String,
    max_articles: usize,
}

#[derive(Debug, Deserialize)]
struct ArticlesPage {
    articles: Vec<RawArticle>,
    next_page: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawArticle {
    id: i64,
    title: String,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    draft: bool,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    html_url: Option<String>,
}

impl HelpCenterFetcher {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_articles: config.max_articles,
        })
    }
}

#[async_trait]
impl ArticleSource for HelpCenterFetcher {
    async fn fetch_articles(&self) -> Result<Vec<Article>> {
        let mut articles = Vec::new();
        let mut url = Some(format!("{}/articles.json", self.base_url));

        while let Some(page_url) = url {
            let response = self
                .client
                .get(&page_url)
                .send()
                .await
                .with_context(|| format!("Failed to fetch article page: {}", page_url))?
                .error_for_status()
                .with_context(|| format!("Article page request rejected: {}", page_url))?;

            let page: ArticlesPage = response
                .json()
                .await
                .with_context(|| format!("Failed to decode article page: {}", page_url))?;

            for raw in page.articles {
                if raw.draft {
                    continue;
                }
                if articles.len() >= self.max_articles {
                    return Ok(articles);
                }

                articles.push(Article {
                    id: raw.id,
                    title: raw.title,
                    body: html_to_text(raw.body.as_deref().unwrap_or_default()),
                    updated_at: raw.updated_at,
                    html_url: raw.html_url,
                });
            }

            url = page.next_page;
        }

        Ok(articles)
    }
}

/// Extract readable text from an HTML fragment.
///
/// Script, style, noscript, nav, and aside subtrees are dropped
/// entirely; block-level elements are separated by paragraph breaks so
/// the chunker still sees paragraph boundaries.
pub fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::new();
    collect_text(fragment.tree.root(), &mut out);
    out.trim().to_string()
}

fn collect_text(node: NodeRef<'_, Node>, out: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => out.push_str(&text),
            Node::Element(element) => match element.name() {
                "script" | "style" | "noscript" | "nav" | "aside" => {}
                name => {
                    if is_block(name) && !out.is_empty() && !out.ends_with("\n\n") {
                        out.push_str("\n\n");
                    }
                    collect_text(child, out);
                }
            },
            _ => {}
        }
    }
}

fn is_block(name: &str) -> bool {
    matches!(
        name,
        "p" | "div"
            | "br"
            | "li"
            | "ul"
            | "ol"
            | "table"
            | "tr"
            | "blockquote"
            | "pre"
            | "section"
            | "article"
            | "header"
            | "footer"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_to_text_strips_tags() {
        let text = html_to_text("<p>Hello <strong>world</strong>.</p>");
        assert_eq!(text, "Hello world.");
    }

    #[test]
    fn test_html_to_text_drops_script_and_style() {
        let text = html_to_text(
            "<p>Visible.</p><script>alert('x')</script><style>p{color:red}</style><nav>Menu</nav>",
        );
        assert_eq!(text, "Visible.");
    }

    #[test]
    fn test_html_to_text_preserves_paragraph_breaks() {
        let text = html_to_text("<p>First.</p><p>Second.</p>");
        assert_eq!(text, "First.\n\nSecond.");
    }

    #[test]
    fn test_html_to_text_plain_text_passthrough() {
        assert_eq!(html_to_text("Just plain text"), "Just plain text");
    }
}
