use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("failed to parse feed: {0}")]
    FeedParse(String),

    #[error("failed to load actor vocabulary: {0}")]
    VocabularyLoad(String),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vocabulary_load_display() {
        let err = PipelineError::VocabularyLoad("empty actors.csv".to_string());
        let msg = format!("{err}");
        assert!(msg.contains("empty actors.csv"));
    }

    #[test]
    fn other_error_display() {
        let err = PipelineError::Other("custom error".to_string());
        assert_eq!(format!("{err}"), "custom error");
    }

    #[test]
    fn feed_parse_display() {
        let err = PipelineError::FeedParse("bozo exception".to_string());
        assert!(format!("{err}").contains("bozo exception"));
    }
}
