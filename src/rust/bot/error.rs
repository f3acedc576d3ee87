/// Failures of the bot's outbound HTTP calls.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    /// The sentiment API answered with a status other than 200
    #[error("API Error: {body}")]
    Upstream { status: u16, body: String },
    /// The request could not be sent, or the response could not be read or decoded.
    /// Displays the whole cause chain, e.g. down to `Connection refused`.
    #[error("{0:#}")]
    Transport(anyhow::Error),
    /// The Telegram Bot API call failed
    #[error("Telegram request failed: {0}")]
    Telegram(#[from] teloxide::RequestError),
}

impl From<reqwest::Error> for BotError {
    fn from(err: reqwest::Error) -> Self {
        // The request URL carries the user's text; the cause chain is what matters.
        BotError::Transport(anyhow::Error::new(err.without_url()))
    }
}
