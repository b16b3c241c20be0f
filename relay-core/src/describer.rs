//! Client for the third-party description service.
//!
//! The service takes a base64 media payload and answers with a JSON body
//! carrying a `description` string. Calls are single-shot (no retries) and
//! bounded by the configured timeout, which surfaces as its own error kind.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::UpstreamConfig;

/// Path appended to the configured base URL.
pub const DESCRIPTIONS_PATH: &str = "/descriptions/base64";

#[derive(Error, Debug)]
pub enum DescribeError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Description service timed out after {}s", .after.as_secs_f64())]
    Timeout { after: Duration },

    #[error("Missing description in response")]
    MissingDescription,
}

#[derive(Debug, Serialize)]
struct DescribeRequest<'a> {
    base64_data: &'a str,
    media_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct DescribeResponse {
    description: Option<String>,
}

/// What the description service said about a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Description(pub String);

impl Description {
    pub fn into_inner(self) -> String {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct DescriptionClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl DescriptionClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, DescribeError> {
        Self::with_base_url(config.base_url.clone(), config.timeout())
    }

    /// Create a client against an explicit base URL (for testing / integration)
    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Result<Self, DescribeError> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, DESCRIPTIONS_PATH)
    }

    pub async fn describe(
        &self,
        media_type: &str,
        base64_data: &str,
    ) -> Result<Description, DescribeError> {
        let request = DescribeRequest {
            base64_data,
            media_type,
        };

        let response = self
            .client
            .post(self.endpoint())
            .json(&request)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::error!(code = status.as_u16(), message = %message, "Description service error");
            return Err(DescribeError::Api {
                code: status.as_u16(),
                message,
            });
        }

        let body: DescribeResponse = response.json().await.map_err(|e| self.classify(e))?;

        body.description
            .map(Description)
            .ok_or(DescribeError::MissingDescription)
    }

    fn classify(&self, err: reqwest::Error) -> DescribeError {
        if err.is_timeout() {
            DescribeError::Timeout {
                after: self.timeout,
            }
        } else {
            DescribeError::Http(err)
        }
    }
}
