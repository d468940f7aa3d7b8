use serde::{Deserialize, Serialize};

/// A single news article as returned by the news search API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewsArticle {
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    /// Raw upstream timestamp, rendered as-is.
    pub published_at: String,
    pub source: String,
}

/// Sentiment classification for news
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sentiment::Positive => write!(f, "Positive"),
            Sentiment::Neutral => write!(f, "Neutral"),
            Sentiment::Negative => write!(f, "Negative"),
        }
    }
}

/// One row of the results table, derived 1:1 from a [`NewsArticle`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryRow {
    pub date: String,
    pub news_source: String,
    pub news_title: String,
    pub news_summary: String,
    pub sentiment: Sentiment,
}

/// Form body of `POST /search`
#[derive(Debug, Clone, Deserialize)]
pub struct SearchForm {
    pub company: Option<String>,
}
