use thiserror::Error;

use crate::structured_text::Rule;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReconcileError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Parse error: {message}")]
    Parse { message: String, line: Option<usize>, col: Option<usize> },
    #[error("Calendar data error: {0}")]
    Calendar(String),
    #[error("Timephased curve error: {0}")]
    Curve(String),
    #[error("Cannot convert {value:?} to {data_type}")]
    Field { data_type: &'static str, value: String },
    #[error("Task structure error: {0}")]
    Structure(String),
    #[error("Internal invariant violated: {0}")]
    Invariant(String),
}

pub type Result<T> = std::result::Result<T, ReconcileError>;

// Helper conversions
impl From<config::ConfigError> for ReconcileError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}

impl From<pest::error::Error<Rule>> for ReconcileError {
    fn from(e: pest::error::Error<Rule>) -> Self {
        let (line, col) = match e.line_col {
            pest::error::LineColLocation::Pos((l, c)) => (l, c),
            pest::error::LineColLocation::Span((l, c), _) => (l, c),
        };
        Self::Parse { message: e.variant.message().to_string(), line: Some(line), col: Some(col) }
    }
}
