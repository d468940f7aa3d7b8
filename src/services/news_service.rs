use async_trait::async_trait;
use chrono::{Days, NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::errors::NewsError;
use crate::models::NewsArticle;

pub const DEFAULT_NEWS_API_URL: &str = "https://newsapi.org/v2/everything";
pub const MAX_PAGE_SIZE: usize = 5;
pub const DEFAULT_WINDOW_DAYS: u64 = 14;
pub const MAX_WINDOW_DAYS: u64 = 365;

/// Configuration for news service
#[derive(Clone)]
pub struct NewsConfig {
    pub api_key: Option<String>,
    pub api_url: String,
    /// Upper bound on returned articles, capped at [`MAX_PAGE_SIZE`].
    pub page_size: usize,
    pub window_days: u64,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_NEWS_API_URL.to_string(),
            page_size: MAX_PAGE_SIZE,
            window_days: DEFAULT_WINDOW_DAYS,
        }
    }
}

impl fmt::Debug for NewsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewsConfig")
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("api_url", &self.api_url)
            .field("page_size", &self.page_size)
            .field("window_days", &self.window_days)
            .finish()
    }
}

impl NewsConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("NEWS_API_KEY").ok().filter(|k| !k.is_empty()),
            api_url: std::env::var("NEWS_API_URL")
                .ok()
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| DEFAULT_NEWS_API_URL.to_string()),
            page_size: parse_page_size(std::env::var("NEWS_PAGE_SIZE").ok().as_deref()),
            window_days: parse_window_days(std::env::var("NEWS_WINDOW_DAYS").ok().as_deref()),
        }
    }
}

/// `NEWS_PAGE_SIZE`: 1 to [`MAX_PAGE_SIZE`], anything else falls back to the maximum.
fn parse_page_size(raw: Option<&str>) -> usize {
    match raw.map(|s| s.trim().parse::<usize>()) {
        None => MAX_PAGE_SIZE,
        Some(Ok(n)) if (1..=MAX_PAGE_SIZE).contains(&n) => n,
        Some(_) => {
            warn!("NEWS_PAGE_SIZE must be between 1 and {}, using {}", MAX_PAGE_SIZE, MAX_PAGE_SIZE);
            MAX_PAGE_SIZE
        }
    }
}

/// `NEWS_WINDOW_DAYS`: 1 to [`MAX_WINDOW_DAYS`], anything else falls back to 14.
fn parse_window_days(raw: Option<&str>) -> u64 {
    match raw.map(|s| s.trim().parse::<u64>()) {
        None => DEFAULT_WINDOW_DAYS,
        Some(Ok(n)) if (1..=MAX_WINDOW_DAYS).contains(&n) => n,
        Some(_) => {
            warn!(
                "NEWS_WINDOW_DAYS must be between 1 and {}, using {}",
                MAX_WINDOW_DAYS, DEFAULT_WINDOW_DAYS
            );
            DEFAULT_WINDOW_DAYS
        }
    }
}

/// Trait for news providers
#[async_trait]
pub trait NewsProvider: Send + Sync {
    /// Search articles published between `from` and `to` (inclusive), newest first.
    async fn fetch_news(
        &self,
        query: &str,
        from: NaiveDate,
        to: NaiveDate,
        page_size: usize,
    ) -> Result<Vec<NewsArticle>, NewsError>;
}

/// newsapi.org `/v2/everything` provider
pub struct NewsApiProvider {
    api_key: String,
    api_url: String,
    client: Client,
}

impl NewsApiProvider {
    pub fn new(api_key: String, api_url: String) -> Self {
        Self {
            api_key,
            api_url,
            client: Client::new(),
        }
    }
}

impl fmt::Debug for NewsApiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewsApiProvider")
            .field("api_key", &"<redacted>")
            .field("api_url", &self.api_url)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    status: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Deserialize)]
struct NewsApiArticle {
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
    source: NewsApiSource,
}

#[derive(Debug, Deserialize)]
struct NewsApiSource {
    name: Option<String>,
}

impl NewsApiArticle {
    fn into_article(self) -> Option<NewsArticle> {
        let title = self.title.filter(|t| !t.trim().is_empty())?;
        let url = self.url.filter(|u| !u.trim().is_empty())?;

        Some(NewsArticle {
            title,
            description: self.description,
            url,
            published_at: self.published_at.unwrap_or_default(),
            source: self.source.name.unwrap_or_default(),
        })
    }
}

#[async_trait]
impl NewsProvider for NewsApiProvider {
    async fn fetch_news(
        &self,
        query: &str,
        from: NaiveDate,
        to: NaiveDate,
        page_size: usize,
    ) -> Result<Vec<NewsArticle>, NewsError> {
        info!("Fetching news from NewsAPI for query: {} ({} to {})", query, from, to);

        let from = from.format("%Y-%m-%d").to_string();
        let to = to.format("%Y-%m-%d").to_string();
        let page_size = page_size.to_string();

        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("q", query),
                ("from", from.as_str()),
                ("to", to.as_str()),
                ("apiKey", self.api_key.as_str()),
                ("language", "en"),
                ("sortBy", "publishedAt"),
                ("pageSize", page_size.as_str()),
            ])
            .send()
            .await
            // The request URL carries the API key.
            .map_err(|e| NewsError::Network(e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| NewsError::Network(e.without_url().to_string()))?;

        // NewsAPI reports auth and quota failures as `status: "error"` bodies,
        // usually with a 4xx code. Those degrade to an empty result.
        let parsed: NewsApiResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(e) if !status.is_success() => {
                error!("NewsAPI returned HTTP {} with an unreadable body: {}", status, e);
                return Err(NewsError::Status(status.as_u16()));
            }
            Err(e) => {
                error!("Failed to parse NewsAPI response: {}", e);
                return Err(NewsError::InvalidResponse(e.to_string()));
            }
        };

        if parsed.status != "ok" {
            warn!(
                "NewsAPI returned status '{}' (code: {}), treating as no results",
                parsed.status,
                parsed.code.as_deref().unwrap_or("none")
            );
            return Ok(Vec::new());
        }

        let articles: Vec<NewsArticle> = parsed
            .articles
            .into_iter()
            .filter_map(NewsApiArticle::into_article)
            .collect();

        info!("Fetched {} news articles from NewsAPI", articles.len());
        Ok(articles)
    }
}

/// Search query sent upstream for a company name
pub fn build_query(company: &str) -> String {
    format!("{} stock", company)
}

/// `(from, to)` covering the `days` days before `today`
pub fn date_window(today: NaiveDate, days: u64) -> Result<(NaiveDate, NaiveDate), NewsError> {
    let from = today
        .checked_sub_days(Days::new(days))
        .ok_or(NewsError::InvalidWindow(days))?;
    Ok((from, today))
}

/// Main news service
pub struct NewsService {
    config: NewsConfig,
    provider: Option<Arc<dyn NewsProvider>>,
}

impl NewsService {
    pub fn new(config: NewsConfig) -> Self {
        let provider: Option<Arc<dyn NewsProvider>> = match &config.api_key {
            Some(api_key) => {
                info!("Initializing NewsAPI provider at {}", config.api_url);
                Some(Arc::new(NewsApiProvider::new(
                    api_key.clone(),
                    config.api_url.clone(),
                )))
            }
            None => {
                warn!("NEWS_API_KEY not configured. News search disabled.");
                None
            }
        };

        Self { config, provider }
    }

    pub fn with_provider(config: NewsConfig, provider: Arc<dyn NewsProvider>) -> Self {
        Self {
            config,
            provider: Some(provider),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    /// Fetch the most recent articles about a company
    pub async fn fetch_news(&self, company: &str) -> Result<Vec<NewsArticle>, NewsError> {
        self.fetch_news_as_of(company, Utc::now().date_naive()).await
    }

    pub async fn fetch_news_as_of(
        &self,
        company: &str,
        today: NaiveDate,
    ) -> Result<Vec<NewsArticle>, NewsError> {
        let provider = self.provider.as_ref().ok_or(NewsError::Disabled)?;

        let query = build_query(company);
        let (from, to) = date_window(today, self.config.window_days)?;
        let page_size = self.config.page_size.clamp(1, MAX_PAGE_SIZE);

        let mut articles = provider
            .fetch_news(&query, from, to, page_size)
            .await?;

        articles.retain(|a| !a.title.is_empty() && !a.url.is_empty());
        articles.truncate(page_size);

        Ok(articles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FixedProvider {
        articles: Vec<NewsArticle>,
        calls: Mutex<Vec<(String, NaiveDate, NaiveDate, usize)>>,
    }

    #[async_trait]
    impl NewsProvider for FixedProvider {
        async fn fetch_news(
            &self,
            query: &str,
            from: NaiveDate,
            to: NaiveDate,
            page_size: usize,
        ) -> Result<Vec<NewsArticle>, NewsError> {
            self.calls
                .lock()
                .unwrap()
                .push((query.to_string(), from, to, page_size));
            Ok(self.articles.clone())
        }
    }

    fn article(title: &str, url: &str) -> NewsArticle {
        NewsArticle {
            title: title.to_string(),
            description: None,
            url: url.to_string(),
            published_at: "2024-06-14T10:00:00Z".to_string(),
            source: "Reuters".to_string(),
        }
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_date_window_covers_two_weeks() {
        let (from, to) = date_window(ymd(2024, 6, 15), 14).unwrap();
        assert_eq!(from.format("%Y-%m-%d").to_string(), "2024-06-01");
        assert_eq!(to.format("%Y-%m-%d").to_string(), "2024-06-15");
    }

    #[test]
    fn test_date_window_crosses_month_boundary() {
        let (from, to) = date_window(ymd(2024, 3, 5), 14).unwrap();
        assert_eq!(from, ymd(2024, 2, 20));
        assert_eq!(to, ymd(2024, 3, 5));
    }

    #[test]
    fn test_date_window_out_of_range_is_error() {
        let result = date_window(ymd(2024, 6, 15), 100_000_000);
        assert!(matches!(result, Err(NewsError::InvalidWindow(100_000_000))));
    }

    #[test]
    fn test_parse_window_days_rejects_out_of_range() {
        assert_eq!(parse_window_days(None), 14);
        assert_eq!(parse_window_days(Some("30")), 30);
        assert_eq!(parse_window_days(Some("0")), 14);
        assert_eq!(parse_window_days(Some("-7")), 14);
        assert_eq!(parse_window_days(Some("100000000")), 14);
        assert_eq!(parse_window_days(Some("two weeks")), 14);
    }

    #[test]
    fn test_parse_page_size_is_capped_at_five() {
        assert_eq!(parse_page_size(None), 5);
        assert_eq!(parse_page_size(Some("3")), 3);
        assert_eq!(parse_page_size(Some("0")), 5);
        assert_eq!(parse_page_size(Some("20")), 5);
        assert_eq!(parse_page_size(Some("")), 5);
    }

    #[test]
    fn test_build_query_appends_stock() {
        assert_eq!(build_query("Acme Corp"), "Acme Corp stock");
    }

    #[test]
    fn test_news_config_default() {
        let config = NewsConfig::default();
        assert!(config.api_key.is_none());
        assert_eq!(config.api_url, DEFAULT_NEWS_API_URL);
        assert_eq!(config.page_size, 5);
        assert_eq!(config.window_days, 14);
    }

    #[test]
    fn test_news_config_debug_redacts_key() {
        let config = NewsConfig {
            api_key: Some("super-secret".to_string()),
            ..NewsConfig::default()
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[tokio::test]
    async fn test_service_disabled_without_key() {
        let service = NewsService::new(NewsConfig::default());
        assert!(!service.is_enabled());

        let result = service.fetch_news("Acme").await;
        assert!(matches!(result, Err(NewsError::Disabled)));
    }

    #[tokio::test]
    async fn test_service_passes_query_and_window() {
        let provider = Arc::new(FixedProvider {
            articles: vec![article("A", "https://a.example")],
            calls: Mutex::new(Vec::new()),
        });
        let service = NewsService::with_provider(NewsConfig::default(), provider.clone());

        let articles = service
            .fetch_news_as_of("Acme Corp", ymd(2024, 6, 15))
            .await
            .unwrap();
        assert_eq!(articles.len(), 1);

        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0],
            (
                "Acme Corp stock".to_string(),
                ymd(2024, 6, 1),
                ymd(2024, 6, 15),
                5
            )
        );
    }

    #[tokio::test]
    async fn test_service_caps_results_and_drops_incomplete_articles() {
        let mut articles: Vec<NewsArticle> = (0..7)
            .map(|i| article(&format!("Title {}", i), &format!("https://n.example/{}", i)))
            .collect();
        articles.insert(1, article("", "https://n.example/untitled"));
        articles.insert(2, article("No link", ""));

        let provider = Arc::new(FixedProvider {
            articles,
            calls: Mutex::new(Vec::new()),
        });
        let service = NewsService::with_provider(NewsConfig::default(), provider);

        let result = service.fetch_news("Acme").await.unwrap();
        assert_eq!(result.len(), 5);
        assert!(result.iter().all(|a| !a.title.is_empty() && !a.url.is_empty()));
        assert_eq!(result[0].title, "Title 0");
        assert_eq!(result[1].title, "Title 1");
    }

    #[tokio::test]
    async fn test_oversized_page_size_still_returns_at_most_five() {
        let articles: Vec<NewsArticle> = (0..20)
            .map(|i| article(&format!("Title {}", i), &format!("https://n.example/{}", i)))
            .collect();
        let provider = Arc::new(FixedProvider {
            articles,
            calls: Mutex::new(Vec::new()),
        });
        let config = NewsConfig {
            page_size: 20,
            ..NewsConfig::default()
        };
        let service = NewsService::with_provider(config, provider.clone());

        let result = service.fetch_news("Acme").await.unwrap();
        assert_eq!(result.len(), 5);
        assert_eq!(provider.calls.lock().unwrap()[0].3, 5);
    }

    #[tokio::test]
    async fn test_huge_window_is_an_error_not_a_panic() {
        let provider = Arc::new(FixedProvider {
            articles: vec![article("A", "https://a.example")],
            calls: Mutex::new(Vec::new()),
        });
        let config = NewsConfig {
            window_days: 100_000_000,
            ..NewsConfig::default()
        };
        let service = NewsService::with_provider(config, provider.clone());

        let result = service.fetch_news("Acme").await;
        assert!(matches!(result, Err(NewsError::InvalidWindow(_))));
        assert!(provider.calls.lock().unwrap().is_empty());
    }
}
