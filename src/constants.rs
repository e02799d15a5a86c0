// Wire protocol constants

/// Default encoder capacity (in bytes).
///
/// Outbound frames are written into a fixed-size buffer sized to fit a
/// single UDP datagram without IP fragmentation.
pub const MTU_SIZE_BYTES: usize = 1500;

/// Wire tags of the known object variants.
pub const TAG_HEAD1: u64 = 1;
pub const TAG_HAND1: u64 = 2;
pub const TAG_OBJECT1: u64 = 3;
pub const TAG_MESH1: u64 = 4;
pub const TAG_HAND2: u64 = 5;
pub const TAG_HEADIPD1: u64 = 6;

/// First tag of the opaque unknown-object space. Tags below this value that
/// are not assigned to a known variant are reserved and rejected on decode.
pub const UNKNOWN_TAG_FLOOR: u64 = 0x20;

/// Span of the on-wire 16-bit millisecond timestamp (~65 seconds).
///
/// An update must be decoded within this window of being produced for its
/// full timestamp to be reconstructed correctly.
pub const TIME16_SPAN_MS: u64 = 1 << 16;
