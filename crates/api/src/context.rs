use staybook_auth::CallerIdentity;
use staybook_core::UserId;

/// Caller context for a gated request.
///
/// Inserted into request extensions by the authorization gate and dropped with
/// the request. Handlers behind the gate can rely on it being present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    identity: CallerIdentity,
}

impl CallerContext {
    pub fn new(identity: CallerIdentity) -> Self {
        Self { identity }
    }

    pub fn identity(&self) -> &CallerIdentity {
        &self.identity
    }

    pub fn user_id(&self) -> &UserId {
        self.identity.user_id()
    }
}
