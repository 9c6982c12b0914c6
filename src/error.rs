pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("{what} not found")]
    NotFound { what: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to render report: {0}")]
    Render(#[from] std::fmt::Error),
}

impl Error {
    pub fn not_found(what: impl Into<String>) -> Self {
        Error::NotFound { what: what.into() }
    }
}
