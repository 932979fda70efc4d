//! Wikipedia evidence source.
//!
//! Looks up page summaries through the REST API:
//! `https://<lang>.wikipedia.org/api/rest_v1/page/summary/<title>`.
//! A 404 means the page does not exist and maps to "not found".

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use tracing::debug;

use super::{normalize_title, EvidenceSource};
use crate::domain::truncate_chars;

const USER_AGENT: &str = concat!(
    "HallucinationGuard/",
    env!("CARGO_PKG_VERSION"),
    " (claim verification)"
);

/// Page summary payload (only the fields we read)
#[derive(Debug, Deserialize)]
struct SummaryResponse {
    #[serde(default)]
    extract: String,
    #[serde(rename = "type", default)]
    page_type: String,
}

/// Wikipedia REST client
pub struct WikipediaSource {
    /// Language subdomain, e.g. "en"
    language: String,
    /// HTTP client
    client: reqwest::Client,
}

impl WikipediaSource {
    /// Create a client for the given language edition
    pub fn new(language: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("Failed to build Wikipedia HTTP client")?;

        Ok(Self {
            language: language.into(),
            client,
        })
    }

    /// Build the summary URL for a page title
    fn summary_url(&self, title: &str) -> Result<Url> {
        let mut url = Url::parse(&format!(
            "https://{}.wikipedia.org/api/rest_v1/page/summary/",
            self.language
        ))
        .with_context(|| format!("Invalid Wikipedia language: {}", self.language))?;

        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Wikipedia URL cannot hold a path"))?
            .pop_if_empty()
            .push(&normalize_title(title).replace(' ', "_"));

        Ok(url)
    }
}

#[async_trait]
impl EvidenceSource for WikipediaSource {
    fn name(&self) -> &str {
        "Wikipedia"
    }

    async fn lookup(&self, query: &str, max_chars: usize) -> Result<Option<String>> {
        if normalize_title(query).is_empty() {
            return Ok(None);
        }

        let url = self.summary_url(query)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to query Wikipedia for '{}'", query))?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(%query, "Wikipedia page not found");
            return Ok(None);
        }

        let summary: SummaryResponse = response
            .error_for_status()
            .with_context(|| format!("Wikipedia returned an error for '{}'", query))?
            .json()
            .await
            .context("Failed to parse Wikipedia summary")?;

        if summary.page_type == "disambiguation" || summary.extract.trim().is_empty() {
            debug!(%query, page_type = %summary.page_type, "Wikipedia page has no usable summary");
            return Ok(None);
        }

        let text = truncate_chars(&summary.extract, max_chars);
        debug!(%query, chars = text.chars().count(), "Wikipedia hit");
        Ok(Some(text))
    }
}
