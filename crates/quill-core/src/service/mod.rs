//! Content and interaction services - the operations behind the API.
//!
//! Services are stateless and persistence-agnostic: they hold trait
//! objects for the repositories and take the caller identity as an
//! explicit argument. They carry no HTTP vocabulary.

mod content;
mod interaction;

pub use content::{ContentService, NewPost, PostPatch};
pub use interaction::InteractionService;

use crate::caller::Caller;
use crate::error::DomainError;
use uuid::Uuid;

/// Admin capability gate for category management.
fn require_admin(caller: &Caller) -> Result<(), DomainError> {
    match caller {
        Caller::Anonymous => Err(DomainError::Unauthenticated),
        Caller::Authenticated { admin: true, .. } => Ok(()),
        Caller::Authenticated { .. } => Err(DomainError::Forbidden),
    }
}

/// Ownership gate: the resource owner or an admin may proceed.
fn require_owner_or_admin(caller: &Caller, owner: Uuid) -> Result<(), DomainError> {
    match caller {
        Caller::Anonymous => Err(DomainError::Unauthenticated),
        Caller::Authenticated { user_id, admin } if *admin || *user_id == owner => Ok(()),
        Caller::Authenticated { .. } => Err(DomainError::Forbidden),
    }
}

#[cfg(test)]
pub(crate) mod stubs;
