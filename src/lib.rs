//! # GameState Sync
//! Distributed game-state synchronization over best-effort transports.
//!
//! Each peer holds authoritative views of a set of tagged objects (head
//! poses, hand poses, generic objects, opaque unknown objects) and exchanges
//! updates with the rest of the fleet. A per-object [`Transceiver`]
//! reconciles locally produced updates with updates observed from other
//! peers, a [`Manager`] multiplexes transceivers over one [`Transport`], and
//! the [`Encoder`]/[`Decoder`] pair maps objects to a compact tagged binary
//! wire format.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

#[macro_use]
extern crate cfg_if;

mod codec;
mod constants;
mod manager;
mod object;
mod transceiver;
mod transport;
mod types;

pub use codec::{Decoder, Encoder, error::{DecodeError, EncodeError}};
pub use constants::{MTU_SIZE_BYTES, TAG_HAND1, TAG_HAND2, TAG_HEAD1, TAG_HEADIPD1, TAG_MESH1, TAG_OBJECT1, UNKNOWN_TAG_FLOOR};
pub use manager::{
    error::RegistrationError,
    timed::{TimedManager, TimedManagerConfig},
    Manager, ManagerEvent,
};
pub use object::{
    geometry::{Finger, Loc1, Loc2, Norm1, Rot1, Rot2, TextureUv1, Thumb, Transform1},
    half::GsHalf,
    variants::{Hand1, Hand2, Head1, HeadIpd1, Mesh1, Object1, UnknownObject},
    AuthoredObject, GsObject,
};
pub use transceiver::{
    error::UpdateError,
    retransmit::{RetransmitCounters, RetransmitReason},
    ConflictAlgorithm, MessageSender, Transceiver, TransceiverConfig, TransceiverMode,
};
pub use transport::{
    channel::{PacketChannel, PacketChannelReceiver, PacketChannelSender},
    error::{RecvError, SendError},
    EncodedMessage, Transport,
};
pub use types::{AuthorId, DateTimeMs, ObjectId, Tag, TimeError};

cfg_if! {
    if #[cfg(feature = "transport_udp")] {
        pub use transport::udp::UdpTransport;
    }
}
