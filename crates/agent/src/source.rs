//! Data sources that produce inverter samples.
//!
//! The scheduler only sees the [`DataSource`] trait; [`HttpDataSource`]
//! is the production implementation that polls the inverter's local
//! realtime endpoint.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use solax_core::Sample;

use crate::clock::Clock;
use crate::error::SourceError;
use crate::payload;

/// Something that can be asked for the current inverter reading.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch(&self) -> Result<Sample, SourceError>;
}

/// Polls `GET http://{address}/api/realTimeData.htm`.
pub struct HttpDataSource {
    client: reqwest::Client,
    url: String,
    clock: Arc<dyn Clock>,
}

impl HttpDataSource {
    /// Build a source whose requests time out after `timeout`.
    ///
    /// The agent passes its polling interval so a hung request never
    /// outlives the tick that issued it.
    pub fn new(
        url: impl Into<String>,
        timeout: Duration,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            clock,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl DataSource for HttpDataSource {
    async fn fetch(&self) -> Result<Sample, SourceError> {
        let response = self.client.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(SourceError::HttpStatus(response.status().as_u16()));
        }

        let body = response.text().await?;
        tracing::trace!(bytes = body.len(), "Received realtime payload");
        payload::decode(&body, self.clock.now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;

    #[test]
    fn new_does_not_panic() {
        let source = HttpDataSource::new(
            "http://192.168.1.40/api/realTimeData.htm",
            Duration::from_secs(60),
            Arc::new(SystemClock),
        )
        .expect("client should build");
        assert_eq!(source.url(), "http://192.168.1.40/api/realTimeData.htm");
    }
}
