use thiserror::Error;

/// Errors surfaced by the assistant core.
///
/// Conversational outcomes (patient not found, ambiguous name, empty
/// retrieval, empty web search) are not errors: they resolve into reply text.
/// Only collaborator failures propagate out of a turn.
#[derive(Error, Debug)]
pub enum AssistError {
    #[error("vector index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("web search unavailable: {0}")]
    WebSearchUnavailable(String),

    #[error("patient directory unavailable: {0}")]
    DirectoryUnavailable(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AssistError>;
