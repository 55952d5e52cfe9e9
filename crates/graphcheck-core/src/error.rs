use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphCheckError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Parse error in {path} at line {line}, column {column}: {message}")]
    Parse {
        path: String,
        line: u32,
        column: u32,
        message: String,
    },

    #[error("Graph write error: {0}")]
    GraphWrite(String),

    #[error("Graph read error: {0}")]
    GraphRead(String),

    #[error("Repository not found: {0}")]
    RepositoryNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl GraphCheckError {
    /// True for per-file parse failures, which skip the file and never abort
    /// a repository ingest.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, GraphCheckError::Parse { .. })
    }
}

pub type Result<T> = std::result::Result<T, GraphCheckError>;
