use askama::Template;
use axum::extract::State;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Form, Router};
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::{SearchForm, SummaryRow};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/search", post(search))
}

/// Search form, plus the results table once a query has been submitted
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexPage {
    pub query: Option<String>,
    pub rows: Vec<SummaryRow>,
}

fn render(page: &IndexPage) -> Result<Html<String>, AppError> {
    page.render().map(Html).map_err(|e| {
        error!("Template render error: {}", e);
        AppError::from(e)
    })
}

/// GET /
async fn index() -> Result<Html<String>, AppError> {
    info!("GET / - Search form");
    render(&IndexPage {
        query: None,
        rows: Vec::new(),
    })
}

/// POST /search
///
/// Fetches recent news for the submitted `company` and summarizes each
/// article. An empty news result skips generation entirely.
async fn search(
    State(state): State<AppState>,
    Form(form): Form<SearchForm>,
) -> Result<Html<String>, AppError> {
    let company = form
        .company
        .ok_or_else(|| AppError::Validation("Missing form field: company".to_string()))?;

    info!("POST /search - Searching news for '{}'", company);

    let articles = state.news_service.fetch_news(&company).await.map_err(|e| {
        error!("News retrieval failed for '{}': {}", company, e);
        AppError::from(e)
    })?;

    let rows = if articles.is_empty() {
        info!("No recent news for '{}'", company);
        Vec::new()
    } else {
        state
            .summary_service
            .analyze_news(&articles)
            .await
            .map_err(|e| {
                error!("Summary generation failed for '{}': {}", company, e);
                AppError::from(e)
            })?
    };

    info!("Rendering {} rows for '{}'", rows.len(), company);
    render(&IndexPage {
        query: Some(company),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sentiment;

    #[test]
    fn test_empty_form_has_no_results_section() {
        let html = IndexPage {
            query: None,
            rows: Vec::new(),
        }
        .render()
        .unwrap();

        assert!(html.contains("name=\"company\""));
        assert!(!html.contains("result-row"));
        assert!(!html.contains("No recent news"));
    }

    #[test]
    fn test_no_results_message() {
        let html = IndexPage {
            query: Some("Acme".to_string()),
            rows: Vec::new(),
        }
        .render()
        .unwrap();

        assert!(html.contains("No recent news found for Acme"));
        assert!(!html.contains("result-row"));
    }

    #[test]
    fn test_rows_are_escaped() {
        let html = IndexPage {
            query: Some("<script>alert(1)</script>".to_string()),
            rows: vec![SummaryRow {
                date: "2024-06-14T09:30:00Z".to_string(),
                news_source: "Reuters".to_string(),
                news_title: "R&D <spend> up".to_string(),
                news_summary: "Positive".to_string(),
                sentiment: Sentiment::Positive,
            }],
        }
        .render()
        .unwrap();

        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("R&amp;D &lt;spend&gt; up"));
        assert_eq!(html.matches("class=\"result-row\"").count(), 1);
    }
}
