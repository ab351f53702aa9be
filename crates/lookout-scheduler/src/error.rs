use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("invalid cron expression '{expression}': {source}")]
    Cron {
        expression: String,
        source: cron::error::Error,
    },

    #[error("cron expression '{0}' has no next occurrence")]
    NoNextOccurrence(String),

    #[error("pipeline error: {0}")]
    Pipeline(#[from] lookout_core::LookoutError),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
