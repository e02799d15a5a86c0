use thiserror::Error;

use crate::transceiver::TransceiverMode;
use crate::types::DateTimeMs;

/// Errors that can occur when setting a transceiver slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UpdateError {
    /// The operation is not allowed in the transceiver's mode
    /// (set_local on ReceiveOnly, set_remote on SendOnly)
    #[error("Operation {operation} is not allowed on a {mode:?} transceiver")]
    ModeViolation {
        mode: TransceiverMode,
        operation: &'static str,
    },

    /// The local update's timestamp is ahead of the wall clock
    #[error("Update timestamp {timestamp} is ahead of the current time {now}")]
    FutureTimestamp {
        timestamp: DateTimeMs,
        now: DateTimeMs,
    },

    /// The local update's timestamp went backward
    #[error("Update timestamp {timestamp} is behind the previous local timestamp {last}")]
    NonMonotonic {
        timestamp: DateTimeMs,
        last: DateTimeMs,
    },
}
