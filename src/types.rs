use std::fmt;
use std::time::SystemTime;

use thiserror::Error;

use crate::constants::{TIME16_SPAN_MS, UNKNOWN_TAG_FLOOR};

/// Errors that can occur when reading the system clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TimeError {
    /// System time is before the UNIX epoch
    #[error("System time is before UNIX epoch")]
    SystemTimeBeforeEpoch,
}

/// Identity of a synchronized object.
///
/// Two updates describe the same object iff their ids are equal. The id is
/// routing-only; it is not a sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ObjectId(pub u64);

impl ObjectId {
    /// The null identity. Rejected by manager registration.
    pub const NULL: ObjectId = ObjectId(0);

    /// Derives an identity from an ASCII name.
    ///
    /// Up to the first 8 bytes of the name are placed, left-padded with
    /// zeros, into a little-endian u64. Names longer than 8 bytes are
    /// silently truncated (kept for compatibility with existing peers).
    pub fn from_name(name: &str) -> Self {
        let bytes = name.as_bytes();
        let take = bytes.len().min(8);
        let mut raw = [0u8; 8];
        raw[8 - take..].copy_from_slice(&bytes[..take]);
        ObjectId(u64::from_le_bytes(raw))
    }

    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Opaque peer identifier stamped on every encoded message.
///
/// Assigned by the transport; the core only echoes it on encode and
/// compares it for equality on receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AuthorId(pub u32);

impl fmt::Display for AuthorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Wire tag of an object frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(pub u64);

impl Tag {
    pub fn raw(&self) -> u64 {
        self.0
    }

    /// Whether this tag lies in the opaque unknown-object space.
    pub fn is_unknown_space(&self) -> bool {
        self.0 >= UNKNOWN_TAG_FLOOR
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Milliseconds since the UNIX epoch.
///
/// All timestamps in the protocol (update times, receive instants, staleness
/// cutoffs) share this representation so they stay directly comparable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct DateTimeMs(pub u64);

impl DateTimeMs {
    /// Reads the current wall-clock time.
    ///
    /// # Errors
    /// Returns `TimeError::SystemTimeBeforeEpoch` if the system clock is
    /// before the UNIX epoch.
    pub fn try_now() -> Result<Self, TimeError> {
        SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| DateTimeMs(d.as_millis() as u64))
            .map_err(|_| TimeError::SystemTimeBeforeEpoch)
    }

    /// Reads the current wall-clock time.
    ///
    /// # Panics
    /// Panics if the system clock is before the UNIX epoch. For the
    /// non-panicking version, use `try_now`.
    pub fn now() -> Self {
        Self::try_now().expect("DateTimeMs::now: system time is before UNIX epoch")
    }

    /// The low 16 bits of the millisecond epoch, as carried on the wire.
    pub fn time16(&self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }

    /// Reconstructs a full timestamp from its on-wire low 16 bits.
    ///
    /// The current wall clock supplies the high bits. If the reconstruction
    /// lands strictly in the future, one 16-bit span is subtracted so the
    /// result lies in the recent past. Assumes the update is less than
    /// ~65 seconds old when first decoded.
    pub fn from_time16(low: u16, now: DateTimeMs) -> DateTimeMs {
        let mut full = (now.0 & !0xFFFF) | u64::from(low);
        if full > now.0 {
            full = full.saturating_sub(TIME16_SPAN_MS);
        }
        DateTimeMs(full)
    }

    pub fn saturating_sub_ms(&self, ms: u64) -> DateTimeMs {
        DateTimeMs(self.0.saturating_sub(ms))
    }

    pub fn saturating_add_ms(&self, ms: u64) -> DateTimeMs {
        DateTimeMs(self.0.saturating_add(ms))
    }
}

impl fmt::Display for DateTimeMs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}
