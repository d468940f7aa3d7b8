mod news;

pub use news::{NewsArticle, SearchForm, Sentiment, SummaryRow};
