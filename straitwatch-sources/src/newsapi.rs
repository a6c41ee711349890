//! NewsAPI provider - international and business press
//!
//! One `everything` query per category, newest first, summarised to the
//! top articles. An exhausted retry budget or a non-OK payload yields an
//! empty report; the caller records the gap in the category reasoning.

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use straitwatch_core::{Article, Category};

use crate::{create_client, send_with_retry, HttpConfig, SourceError, SourceReport, TextSource};

const NEWS_API_URL: &str = "https://newsapi.org/v2/everything";

/// Articles requested per query
const PAGE_SIZE: u32 = 10;

/// Articles summarised into the corpus
const SUMMARY_LIMIT: usize = 5;

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    #[serde(default)]
    status: String,
    #[serde(rename = "totalResults", default)]
    total_results: u64,
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Deserialize)]
struct NewsApiArticle {
    title: String,
    url: String,
    #[serde(rename = "publishedAt", default)]
    published_at: String,
    source: NewsApiOutlet,
}

#[derive(Debug, Deserialize)]
struct NewsApiOutlet {
    #[serde(default)]
    name: String,
}

/// NewsAPI text source
pub struct NewsApiSource {
    client: Client,
    api_key: String,
    http: HttpConfig,
}

impl NewsApiSource {
    pub fn new(api_key: &str, http: HttpConfig) -> Result<Self, SourceError> {
        let client = create_client(&http)?;
        Ok(Self {
            client,
            api_key: api_key.to_string(),
            http,
        })
    }

    /// Search query per category; local sentiment has no press query
    fn query_for(category: Category) -> Option<&'static str> {
        match category {
            Category::Economic => Some(
                "(Taiwan OR China) AND (economy OR trade OR sanctions OR \"supply chain\" OR semiconductor)",
            ),
            Category::Military => Some(
                "(Taiwan OR China) AND (military OR drill OR PLA OR \"aircraft carrier\" OR \"no-fly\" OR NOTAM)",
            ),
            Category::Political => Some(
                "(Taiwan OR China) AND (diplomacy OR politics OR warning OR evacuation OR \"travel advisory\")",
            ),
            Category::LocalSentiment => None,
        }
    }
}

#[async_trait::async_trait]
impl TextSource for NewsApiSource {
    fn name(&self) -> &str {
        "International & business press"
    }

    fn covers(&self, category: Category) -> bool {
        Self::query_for(category).is_some()
    }

    async fn fetch(&self, category: Category) -> Result<SourceReport, SourceError> {
        let Some(query) = Self::query_for(category) else {
            return Ok(SourceReport::default());
        };

        debug!("querying NewsAPI for {}", category);

        let page_size = PAGE_SIZE.to_string();
        let request = self
            .client
            .get(NEWS_API_URL)
            .header("X-Api-Key", &self.api_key)
            .query(&[
                ("q", query),
                ("language", "en"),
                ("pageSize", page_size.as_str()),
                ("sortBy", "publishedAt"),
                ("searchIn", "title,description"),
            ]);

        let response = send_with_retry(request, &self.http).await?;

        if !response.status().is_success() {
            warn!("NewsAPI returned {} for {}", response.status(), category);
            return Err(SourceError::Status(response.status()));
        }

        let payload: NewsApiResponse = response.json().await?;

        if payload.status != "ok" || payload.total_results == 0 {
            debug!("NewsAPI returned nothing for {}", category);
            return Ok(SourceReport::default());
        }

        let mut report = SourceReport::default();
        for item in payload.articles.into_iter().take(SUMMARY_LIMIT) {
            let date = item.published_at.get(..10).unwrap_or("recent").to_string();
            report
                .text
                .push_str(&format!("- [NewsAPI] {} ({})\n", item.title, date));
            report.articles.push(Article {
                title: item.title,
                source: format!("NewsAPI / {}", item.source.name),
                date,
                url: item.url,
            });
        }

        Ok(report)
    }
}
