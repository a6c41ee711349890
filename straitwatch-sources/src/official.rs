//! Official-source provider - PRC government outlets via Google News RSS
//!
//! Monitors ministry sites, military press and the maritime safety
//! administration through site-scoped Google News queries with a two-day
//! window. Only military and political categories carry official feeds.
//! A failing target is skipped; the remaining targets still contribute.

use chrono::DateTime;
use reqwest::{Client, Url};
use rss::Channel;
use tracing::{debug, warn};

use straitwatch_core::{Article, Category};

use crate::{create_client, send_with_retry, HttpConfig, SourceError, SourceReport, TextSource};

const GOOGLE_NEWS_RSS: &str = "https://news.google.com/rss/search";

/// Entries taken per feed
const ENTRY_LIMIT: usize = 3;

struct FeedTarget {
    name: &'static str,
    query: &'static str,
}

const TARGETS: &[FeedTarget] = &[
    FeedTarget {
        name: "Foreign Ministry / Defense Ministry",
        query: "site:mfa.gov.cn OR site:mod.gov.cn",
    },
    FeedTarget {
        name: "PLA Daily / military press",
        query: "site:81.cn OR site:chinamil.com.cn",
    },
    FeedTarget {
        name: "Maritime Safety Administration",
        query: "site:msa.gov.cn AND (closure OR exercise OR live-fire)",
    },
];

/// Official PRC source monitor
pub struct OfficialFeedSource {
    client: Client,
    http: HttpConfig,
}

impl OfficialFeedSource {
    pub fn new(http: HttpConfig) -> Result<Self, SourceError> {
        let client = create_client(&http)?;
        Ok(Self { client, http })
    }

    fn feed_url(target: &FeedTarget) -> Result<Url, SourceError> {
        let query = format!("{} when:2d", target.query);
        Url::parse_with_params(
            GOOGLE_NEWS_RSS,
            &[("q", query.as_str()), ("hl", "en-US"), ("gl", "US"), ("ceid", "US:en")],
        )
        .map_err(|e| SourceError::InvalidUrl(e.to_string()))
    }

    async fn fetch_target(&self, target: &FeedTarget) -> Result<Vec<(String, String, String)>, SourceError> {
        let url = Self::feed_url(target)?;
        let response = send_with_retry(self.client.get(url), &self.http).await?;

        if !response.status().is_success() {
            return Err(SourceError::Status(response.status()));
        }

        let bytes = response.bytes().await?;
        let channel = Channel::read_from(&bytes[..]).map_err(|e| SourceError::Feed(e.to_string()))?;

        Ok(channel
            .items()
            .iter()
            .take(ENTRY_LIMIT)
            .map(|item| {
                let title = item.title().unwrap_or("(untitled)").to_string();
                let link = item.link().unwrap_or("#").to_string();
                let date = item
                    .pub_date()
                    .map(normalize_pub_date)
                    .unwrap_or_else(|| "recent".to_string());
                (title, link, date)
            })
            .collect())
    }
}

/// Reduce an RFC 2822 feed date to a calendar date, best effort
fn normalize_pub_date(raw: &str) -> String {
    match DateTime::parse_from_rfc2822(raw) {
        Ok(dt) => dt.date_naive().to_string(),
        Err(_) => raw.chars().take(16).collect(),
    }
}

#[async_trait::async_trait]
impl TextSource for OfficialFeedSource {
    fn name(&self) -> &str {
        "Official sources"
    }

    fn covers(&self, category: Category) -> bool {
        matches!(category, Category::Military | Category::Political)
    }

    async fn fetch(&self, category: Category) -> Result<SourceReport, SourceError> {
        if !self.covers(category) {
            return Ok(SourceReport::default());
        }

        let mut report = SourceReport::default();

        for target in TARGETS {
            match self.fetch_target(target).await {
                Ok(entries) if entries.is_empty() => {
                    debug!("no recent entries for {}", target.name);
                }
                Ok(entries) => {
                    report.text.push_str(&format!("\n[{}]:\n", target.name));
                    for (title, link, date) in entries {
                        report.text.push_str(&format!("- {} ({})\n", title, date));
                        report.articles.push(Article {
                            title,
                            source: format!("Official / {}", target.name),
                            date,
                            url: link,
                        });
                    }
                }
                Err(e) => {
                    warn!("official feed fetch failed for {}: {}", target.name, e);
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_url_encodes_query() {
        let url = OfficialFeedSource::feed_url(&TARGETS[0]).unwrap();
        let query = url.query().unwrap();
        assert!(query.contains("when%3A2d") || query.contains("when:2d"));
        assert!(url.as_str().starts_with(GOOGLE_NEWS_RSS));
    }

    #[test]
    fn test_normalize_pub_date() {
        assert_eq!(
            normalize_pub_date("Sun, 01 Jun 2025 08:30:00 GMT"),
            "2025-06-01"
        );
        // unparseable dates are passed through, truncated
        assert_eq!(normalize_pub_date("sometime last week maybe?"), "sometime last we");
    }

    #[test]
    fn test_channel_parsing() {
        let raw = r#"<?xml version="1.0" encoding="UTF-8"?>
            <rss version="2.0"><channel>
                <title>Google News</title>
                <link>https://news.google.com</link>
                <description>search</description>
                <item>
                    <title>MSA issues navigation closure notice</title>
                    <link>https://example.cn/notice</link>
                    <pubDate>Sun, 01 Jun 2025 02:00:00 GMT</pubDate>
                </item>
            </channel></rss>"#;

        let channel = Channel::read_from(raw.as_bytes()).unwrap();
        assert_eq!(channel.items().len(), 1);
        assert_eq!(
            channel.items()[0].title(),
            Some("MSA issues navigation closure notice")
        );
    }

    #[test]
    fn test_coverage() {
        let source = OfficialFeedSource::new(HttpConfig::default()).unwrap();
        assert!(source.covers(Category::Military));
        assert!(source.covers(Category::Political));
        assert!(!source.covers(Category::Economic));
        assert!(!source.covers(Category::LocalSentiment));
    }
}
