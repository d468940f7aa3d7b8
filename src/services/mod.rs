pub mod llm_service;
pub mod news_service;
pub mod summary_service;
