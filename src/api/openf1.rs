use std::time::Duration;

use reqwest::{StatusCode, blocking::Client};

use crate::RaceEngineerError;

use super::{FetchError, Query, RaceDataSource};

/// Blocking HTTP client for the OpenF1 REST API.
pub struct OpenF1Client {
    base_url: String,
    client: Client,
}

impl OpenF1Client {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RaceEngineerError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RaceEngineerError::HttpClientError { source: e })?;
        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }
}

impl RaceDataSource for OpenF1Client {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get(&self, query: &Query) -> Result<String, FetchError> {
        let response = self
            .client
            .get(query.url(&self.base_url))
            .send()
            .map_err(|e| FetchError::Transport { source: e })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status {
                code: status.as_u16(),
            });
        }

        response
            .text()
            .map_err(|e| FetchError::Transport { source: e })
    }
}
