use std::time::Duration;

use reqwest::Client;

use crate::error::{Result, ScrapeError};

/// Plain GET client rooted at a base URL.
#[derive(Debug, Clone)]
pub struct PageClient {
    http: Client,
    base_url: String,
}

impl PageClient {
    pub fn new(base_url: &str, user_agent: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder().user_agent(user_agent);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let http = builder.build().map_err(|source| ScrapeError::Request {
            url: base_url.to_string(),
            source,
        })?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch `base_url + path` and return the body. Non-2xx is an error.
    pub async fn fetch(&self, path: &str) -> Result<String> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| ScrapeError::Request {
                url: url.clone(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(ScrapeError::Status {
                url,
                status: response.status(),
            });
        }

        response
            .text()
            .await
            .map_err(|source| ScrapeError::Request { url, source })
    }
}

