//! Error types for cfgmend-content

/// Result type for cfgmend-content operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a patch. No partial output is produced for any of them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Canonical entry '{id}' was requested but the template has no such entry")]
    MissingCanonicalSource { id: String },

    #[error("Request toggles or restores entries but lists no canonical identifiers")]
    EmptyCanonicalSet,

    #[error("Syntax error in {document} document: {message}")]
    UpstreamSyntax { document: String, message: String },

    #[error(transparent)]
    Meta(#[from] cfgmend_meta::Error),
}

impl Error {
    pub fn syntax(document: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UpstreamSyntax {
            document: document.into(),
            message: message.into(),
        }
    }
}
