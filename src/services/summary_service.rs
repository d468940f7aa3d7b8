use std::sync::Arc;
use tracing::{debug, info};

use crate::errors::LlmError;
use crate::models::{NewsArticle, Sentiment, SummaryRow};
use crate::services::llm_service::LlmService;

/// Analyst persona sent ahead of every article.
pub const SYSTEM_INSTRUCTION: &str = "
You are an equity research analyst. You need to search news associated with input company name, create a financial summary of news in 200 words, which contains impact on financial metrics e.g. EBITDA, PAT, Revenue, Costs, etc. Also perform a sentiment analysis of the news and categorize it into - Positive, Neutral or Negative depending on its impact on financial metrics.
Please respond in a table format with the following columns: Date, News Source, News Title, News Summary, Sentiment.
";

/// Build the generation prompt for one article.
///
/// The `Company:` line carries the article title, not the searched company
/// name. A missing description becomes an empty line.
pub fn build_prompt(article: &NewsArticle) -> String {
    format!(
        "{}Company: {}\n{}\n",
        SYSTEM_INSTRUCTION,
        article.title,
        article.description.as_deref().unwrap_or_default()
    )
}

/// Naive keyword labelling: "positive" wins over "negative", anything else is neutral.
pub fn classify_sentiment(text: &str) -> Sentiment {
    let lower = text.to_lowercase();
    if lower.contains("positive") {
        Sentiment::Positive
    } else if lower.contains("negative") {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}

/// Turns retrieved articles into summary rows, one generation call each
pub struct SummaryService {
    llm_service: Arc<LlmService>,
}

impl SummaryService {
    pub fn new(llm_service: Arc<LlmService>) -> Self {
        Self { llm_service }
    }

    pub fn is_enabled(&self) -> bool {
        self.llm_service.is_enabled()
    }

    /// Summarize articles in order; the first failed generation aborts the batch.
    pub async fn analyze_news(&self, articles: &[NewsArticle]) -> Result<Vec<SummaryRow>, LlmError> {
        if articles.is_empty() {
            return Ok(Vec::new());
        }

        info!("Summarizing {} articles", articles.len());

        let mut rows = Vec::with_capacity(articles.len());
        for article in articles {
            let generated = self
                .llm_service
                .generate_completion(build_prompt(article))
                .await?;

            let summary = generated.trim().to_string();
            let sentiment = classify_sentiment(&summary);
            debug!("'{}' classified as {}", article.title, sentiment);

            rows.push(SummaryRow {
                date: article.published_at.clone(),
                news_source: article.source.clone(),
                news_title: article.title.clone(),
                news_summary: summary,
                sentiment,
            });
        }

        Ok(rows)
    }
}
