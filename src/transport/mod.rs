//! Transport seam.
//!
//! The core never owns a socket. It consumes anything implementing
//! [`Transport`] for the outbound path; inbound frames are handed to
//! [`Manager::receive`](crate::Manager::receive) by the host, from whatever
//! thread the concrete transport delivers on.

pub mod channel;
pub mod error;

use crate::types::AuthorId;

cfg_if! {
    if #[cfg(feature = "transport_udp")] {
        pub mod udp;
    }
}

/// One encoded frame buffer plus the peer that authored its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedMessage {
    pub bytes: Vec<u8>,
    pub author: AuthorId,
}

impl EncodedMessage {
    pub fn new(bytes: Vec<u8>, author: AuthorId) -> Self {
        EncodedMessage { bytes, author }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Best-effort outbound contract the manager consumes.
///
/// Implementations may drop messages; they must not block indefinitely.
pub trait Transport: Send + Sync {
    /// Hands one encoded message to the network. Best-effort.
    fn send(&self, message: &EncodedMessage) -> Result<(), error::SendError>;

    /// The author id this peer stamps on locally produced updates.
    fn local_identifier(&self) -> AuthorId;
}
