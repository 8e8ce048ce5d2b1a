pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Nodeset syntax error in `{input}`: {message}")]
    NodesetSyntax { input: String, message: String },

    #[error("Invalid {what} input: {message}")]
    InvalidInput { what: &'static str, message: String },

    #[error("Invalid layout config: {message}")]
    InvalidConfig { message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn nodeset(input: &str, message: impl Into<String>) -> Self {
        Self::NodesetSyntax {
            input: input.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn invalid(what: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            what,
            message: message.into(),
        }
    }
}
