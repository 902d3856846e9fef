/// Failure to obtain a sample from the data source.
///
/// `Transport` and `HttpStatus` are fetch failures; `Parse` means a
/// response arrived but did not have the expected shape. All of them are
/// handled at the polling-tick boundary.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The HTTP request failed (network, DNS, timeout, etc.).
    #[error("Request to inverter failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The inverter answered with a non-2xx status code.
    #[error("Inverter returned HTTP {0}")]
    HttpStatus(u16),

    /// The response body could not be decoded.
    #[error("Malformed inverter payload: {0}")]
    Parse(String),
}

impl SourceError {
    /// `true` for a malformed payload, `false` for fetch failures.
    pub fn is_parse(&self) -> bool {
        matches!(self, SourceError::Parse(_))
    }
}
