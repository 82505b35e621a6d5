//! Port for the `service_requests` table.

use async_trait::async_trait;

use crate::domain::auth::Caller;
use crate::domain::service_request::ServiceRequestDraft;

use super::define_port_error;

define_port_error! {
    /// Errors raised by service request adapters.
    pub enum ServiceRequestRepositoryError {
        /// Backend unreachable or timed out.
        Unavailable { message: String } =>
            ServiceUnavailable: "request store unavailable: {message}",
        /// The caller's token was refused.
        Unauthorized { message: String } => Unauthorized: "{message}",
        /// The backend refused the insert; its text is shown verbatim.
        Rejected { message: String } => InvalidRequest: "{message}",
    }
}

/// Write-only port for help requests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ServiceRequestRepository: Send + Sync {
    /// Record a new request.
    async fn insert(
        &self,
        caller: &Caller,
        draft: &ServiceRequestDraft,
    ) -> Result<(), ServiceRequestRepositoryError>;
}
