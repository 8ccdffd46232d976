/// Core error type for hibot.
///
/// Adapter crates map their specific errors into this type so the core can
/// handle failures consistently (stale reference vs transient failure).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// A message or channel that no longer exists. Expected race when editing
    /// or retracting a notification that was deleted externally.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("gateway error: {0}")]
    Gateway(String),
}

impl Error {
    /// Stale-reference failures are an expected race, not a bug.
    pub fn is_stale_reference(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
