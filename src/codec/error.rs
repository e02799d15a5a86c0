use thiserror::Error;

/// Errors that can occur while decoding inbound frames.
///
/// The decoder processes untrusted network data; every malformed shape maps
/// to one of these values and never to a panic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// A fixed-width field ran past the end of the frame
    #[error("Frame truncated while reading {context}: needed {needed} bytes, {remaining} remain")]
    Truncated {
        context: &'static str,
        needed: usize,
        remaining: usize,
    },

    /// A varint ran past the end of the frame
    #[error("Variable-length integer is truncated")]
    TruncatedVarint,

    /// A varint did not fit in 64 bits
    #[error("Variable-length integer overflows 64 bits")]
    VarintOverflow,

    /// The frame tag is in the reserved range (0 or 7..0x20)
    #[error("Tag {tag:#x} is reserved")]
    ReservedTag { tag: u64 },

    /// The declared body length disagrees with the parsed body
    #[error("Tag {tag:#x} declared a {declared}-byte body but {parsed} bytes were parsed")]
    LengthMismatch {
        tag: u64,
        declared: usize,
        parsed: usize,
    },

    /// The nested frame inside a Head1 is not an IPD sub-object
    #[error("Nested frame carries tag {tag:#x}, expected the IPD tag")]
    UnexpectedNestedTag { tag: u64 },

    /// A presence flag byte held something other than 0 or 1
    #[error("Flag byte is {value:#x}, expected 0 or 1")]
    InvalidFlag { value: u8 },

    /// A counted array declared more elements than the body can hold
    #[error("Array of {count} elements ({element_size} bytes each) exceeds the {remaining} remaining body bytes")]
    ArrayOutOfBounds {
        count: u64,
        element_size: usize,
        remaining: usize,
    },

    /// A triangle index did not fit in 32 bits
    #[error("Triangle index {value} exceeds 32 bits")]
    IndexOutOfRange { value: u64 },
}

/// Errors that can occur while encoding outbound frames
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// The frame does not fit in the encoder's remaining buffer space.
    /// The buffer is left unchanged.
    #[error("Frame of {frame} bytes does not fit in the {remaining} remaining buffer bytes")]
    BufferFull { frame: usize, remaining: usize },
}
