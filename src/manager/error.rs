use thiserror::Error;

use crate::types::{ObjectId, Tag};

/// Errors that can occur when registering a transceiver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// The null identity cannot be registered
    #[error("The null object identity cannot be registered")]
    NullIdentity,

    /// Another transceiver already owns this identity
    #[error("Object identity {id} is already registered")]
    DuplicateIdentity { id: ObjectId },

    /// Another transceiver already owns this raw tag
    #[error("Tag {tag} is already registered")]
    DuplicateTag { tag: Tag },

    /// Raw-tag registration is only valid in the unknown-object space
    #[error("Tag {tag} is outside the unknown-object space")]
    ReservedTag { tag: Tag },
}
