use std::time::Duration;

use reqwest::Client as ReqwestClient;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::de::DeserializeOwned;
use url::Url;

use crate::AdapterError;

/// Shared outbound HTTP client for protocol adapters: retrying with
/// exponential backoff, JSON decoding, status mapped to `AdapterError`.
#[derive(Clone, Debug)]
pub struct HttpClient {
    inner: ClientWithMiddleware,
}

impl HttpClient {
    pub fn new() -> Self {
        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(Duration::from_millis(100), Duration::from_secs(1))
            .build_with_max_retries(3);

        let client = ClientBuilder::new(ReqwestClient::new())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Self { inner: client }
    }

    /// GET `{base_url}/{endpoint}` and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        base_url: &str,
        endpoint: &str,
    ) -> Result<T, AdapterError> {
        let url = Url::parse(&format!("{}/{}", base_url.trim_end_matches('/'), endpoint))
            .map_err(|e| AdapterError::Other(e.into()))?;

        let response = self.inner.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AdapterError::from_status(status));
        }

        let data = response.json::<T>().await.map_err(|e| {
            tracing::error!("Failed to deserialize response from {}: {:?}", endpoint, e);
            AdapterError::Decode(e)
        })?;
        Ok(data)
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}
