pub mod client;

pub use client::HttpActionGateway;

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::ndr::types::ActionRequest;

/// Courier endpoint that executes re-attempt and RTO requests.
///
/// One call per request. Returns the courier's correlation id (UPL ID) on
/// success. Implementations must not retry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActionGateway: Send + Sync {
    async fn submit(&self, request: &ActionRequest) -> Result<String, GatewayError>;
}
