use log::{debug, error};
use reqwest::StatusCode;
use serde_json::Value;

use super::error::BotError;

pub const DEFAULT_API_URL: &str = "http://localhost:7860/api/get_analysis";

pub const NOT_RECOGNIZED: &str = "Не удалось распознать";
pub const ANALYSIS_FAILED: &str = "Ошибка при анализе текста";

/// HTTP client for the sentiment service's `get_analysis` endpoint.
#[derive(Debug, Clone)]
pub struct SentimentApiClient {
    http: reqwest::Client,
    api_url: String,
}

impl SentimentApiClient {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    pub fn with_client(http: reqwest::Client, api_url: impl Into<String>) -> Self {
        Self {
            http,
            api_url: api_url.into(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Asks the service to analyse `text`.
    ///
    /// A 200 response without a string `result` field yields [`NOT_RECOGNIZED`].
    ///
    /// # Errors
    /// - `Upstream` for any status other than 200, carrying the raw response body
    /// - `Transport` if the request fails or the body is not JSON
    pub async fn get_analysis(&self, text: &str) -> Result<String, BotError> {
        debug!("Requesting analysis from {}", self.api_url);
        let response = self
            .http
            .get(&self.api_url)
            .query(&[("text", text)])
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await?;
            return Err(BotError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let payload: Value = response.json().await?;
        Ok(payload
            .get("result")
            .and_then(Value::as_str)
            .unwrap_or(NOT_RECOGNIZED)
            .to_string())
    }
}

/// Text the bot sends back for an analysis outcome.
pub fn reply_for(outcome: &Result<String, BotError>) -> String {
    match outcome {
        Ok(result) => result.clone(),
        Err(BotError::Upstream { .. }) => ANALYSIS_FAILED.to_string(),
        Err(e) => format!("Произошла ошибка: {}", e),
    }
}

/// Logs a failed outcome; upstream failures are logged with their raw body.
pub(crate) fn log_failure(outcome: &Result<String, BotError>) {
    if let Err(e) = outcome {
        error!("{}", e);
    }
}
