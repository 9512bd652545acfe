//! Request context carrying the acting user and the request's lifetime.

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

/// Context for the current request.
///
/// The caller has already authorized the user; services only record who
/// acted. Cancelling `cancel` aborts in-flight converter processes.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Identifier of the acting user (e.g. an e-mail address).
    pub user_id: String,
    /// Cancelled when the caller gives up on the request.
    pub cancel: CancellationToken,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Context for `user_id` with a fresh cancellation token.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self::with_cancellation(user_id, CancellationToken::new())
    }

    /// Context tied to an existing cancellation token.
    pub fn with_cancellation(user_id: impl Into<String>, cancel: CancellationToken) -> Self {
        Self {
            user_id: user_id.into(),
            cancel,
            request_time: Utc::now(),
        }
    }
}
