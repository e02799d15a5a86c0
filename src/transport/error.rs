use thiserror::Error;

/// The transport could not accept an outbound message.
///
/// Transports are best-effort; the manager logs this and moves on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Transport failed to send the message")]
pub struct SendError;

/// The receive side of a transport is disconnected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Transport receive side is disconnected")]
pub struct RecvError;
