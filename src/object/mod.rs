pub mod geometry;
pub mod half;
pub mod variants;

use crate::constants::{TAG_HAND1, TAG_HAND2, TAG_HEAD1, TAG_HEADIPD1, TAG_MESH1, TAG_OBJECT1};
use crate::types::{AuthorId, DateTimeMs, ObjectId, Tag};

use variants::{Hand1, Hand2, Head1, HeadIpd1, Mesh1, Object1, UnknownObject};

/// The closed sum of everything that can cross the wire.
///
/// Decoded timestamped variants carry their fully reconstructed timestamp
/// directly on the value.
#[derive(Debug, Clone, PartialEq)]
pub enum GsObject {
    Head1(Head1),
    Hand1(Hand1),
    Object1(Object1),
    Mesh1(Mesh1),
    Hand2(Hand2),
    HeadIpd1(HeadIpd1),
    Unknown(UnknownObject),
}

impl GsObject {
    /// The wire tag this value encodes under.
    pub fn tag(&self) -> Tag {
        match self {
            GsObject::Head1(_) => Tag(TAG_HEAD1),
            GsObject::Hand1(_) => Tag(TAG_HAND1),
            GsObject::Object1(_) => Tag(TAG_OBJECT1),
            GsObject::Mesh1(_) => Tag(TAG_MESH1),
            GsObject::Hand2(_) => Tag(TAG_HAND2),
            GsObject::HeadIpd1(_) => Tag(TAG_HEADIPD1),
            GsObject::Unknown(unknown) => unknown.tag,
        }
    }

    /// The object identity, when the variant carries one.
    ///
    /// `HeadIpd1` carries no identity on the wire (it normally rides inside
    /// a `Head1` frame); unknown objects are routed by tag instead.
    pub fn id(&self) -> Option<ObjectId> {
        match self {
            GsObject::Head1(head) => Some(head.id),
            GsObject::Hand1(hand) => Some(hand.id),
            GsObject::Object1(object) => Some(object.id),
            GsObject::Mesh1(mesh) => Some(mesh.id),
            GsObject::Hand2(hand) => Some(hand.id),
            GsObject::HeadIpd1(_) | GsObject::Unknown(_) => None,
        }
    }

    /// The message-carried timestamp, for timestamped variants.
    pub fn timestamp(&self) -> Option<DateTimeMs> {
        match self {
            GsObject::Head1(head) => Some(head.timestamp),
            GsObject::Hand1(hand) => Some(hand.timestamp),
            GsObject::Object1(object) => Some(object.timestamp),
            GsObject::Hand2(hand) => Some(hand.timestamp),
            GsObject::Mesh1(_) | GsObject::HeadIpd1(_) | GsObject::Unknown(_) => None,
        }
    }

    pub fn is_timestamped(&self) -> bool {
        self.timestamp().is_some()
    }
}

/// An update crossing a transceiver boundary: the object plus the peer that
/// authored it.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthoredObject {
    pub object: GsObject,
    pub author: AuthorId,
}

impl AuthoredObject {
    pub fn new(object: GsObject, author: AuthorId) -> Self {
        AuthoredObject { object, author }
    }
}
