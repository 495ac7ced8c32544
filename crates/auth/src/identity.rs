use serde::Serialize;

use staybook_core::UserId;

/// Identity resolved for exactly one request.
///
/// Produced by the request gate after a successful verification call and
/// handed to the review engine. It is never persisted and never cached across
/// requests; a new request means a new verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallerIdentity {
    user_id: UserId,
}

impl CallerIdentity {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// True when `author` is this caller.
    pub fn is(&self, author: &UserId) -> bool {
        &self.user_id == author
    }
}
