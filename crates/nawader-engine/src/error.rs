use thiserror::Error;

/// Failures surfaced by the gateway. An empty model response is not one of them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),
    #[error("request failed: {0}")]
    RequestFailed(String),
}
