use std::sync::Arc;
use crate::services::news_service::NewsService;
use crate::services::summary_service::SummaryService;

#[derive(Clone)]
pub struct AppState {
    pub news_service: Arc<NewsService>,
    pub summary_service: Arc<SummaryService>,
}
