/// Error type shared by the dispatcher, the poller and the transport.
///
/// Handler code receives `InvalidArgument` synchronously from outbound
/// actions; everything else is infrastructural and ends the polling loop.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("api error: {0}")]
    Api(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Request failures with the URL stripped, since it embeds the token
    #[error("request error: {0}")]
    Request(reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type BotResult<T> = std::result::Result<T, BotError>;

impl BotError {
    pub fn invalid_argument(what: impl Into<String>) -> Self {
        BotError::InvalidArgument(what.into())
    }

    /// Wraps a client error, dropping the request URL
    pub fn request(why: reqwest::Error) -> Self {
        BotError::Request(why.without_url())
    }

    /// Whether the error was raised by argument validation rather than I/O.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, BotError::InvalidArgument(_))
    }
}
