//! Status polling capability

use async_trait::async_trait;

use crate::errors::ConsoleError;
use crate::models::status::StatusSnapshot;

/// Poll-style source of the authoritative deployment status.
///
/// The monitor never trusts the push stream alone; every provisional
/// completion signal is cross-checked against this source.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn deployment_status(&self) -> Result<StatusSnapshot, ConsoleError>;
}
