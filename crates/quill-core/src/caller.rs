//! Caller identity, passed explicitly into every service operation.

use uuid::Uuid;

/// The identity associated with an operation invocation.
///
/// The gateway resolves tokens into a `Caller` once per request; the
/// services below it never read ambient request state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    /// No identity present.
    Anonymous,
    /// A validated user identity.
    Authenticated { user_id: Uuid, admin: bool },
}

impl Caller {
    pub fn authenticated(user_id: Uuid, admin: bool) -> Self {
        Self::Authenticated { user_id, admin }
    }

    /// The caller's user id, if any.
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated { user_id, .. } => Some(*user_id),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Authenticated { admin: true, .. })
    }
}
