use crate::types::{DateTimeMs, ObjectId, Tag};

use super::geometry::{Finger, Loc1, Loc2, Norm1, Rot1, Rot2, TextureUv1, Thumb, Transform1};
use super::half::GsHalf;

/// Head pose: compact location/rotation plus an optional interpupillary
/// distance sub-object.
#[derive(Debug, Clone, PartialEq)]
pub struct Head1 {
    pub id: ObjectId,
    pub timestamp: DateTimeMs,
    pub location: Loc2,
    pub rotation: Rot2,
    pub ipd: Option<HeadIpd1>,
}

/// Hand pose, first generation: a single location/rotation per hand.
#[derive(Debug, Clone, PartialEq)]
pub struct Hand1 {
    pub id: ObjectId,
    pub timestamp: DateTimeMs,
    pub left: bool,
    pub location: Loc2,
    pub rotation: Rot2,
}

/// Generic scene object with full-precision pose, scale, and an optional
/// parent to attach to.
#[derive(Debug, Clone, PartialEq)]
pub struct Object1 {
    pub id: ObjectId,
    pub timestamp: DateTimeMs,
    pub location: Loc1,
    pub rotation: Rot1,
    pub scale: Loc1,
    pub parent: Option<ObjectId>,
}

/// Static mesh geometry. Not timestamped; meshes are replaced wholesale.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh1 {
    pub id: ObjectId,
    pub vertices: Vec<Loc1>,
    pub normals: Vec<Norm1>,
    pub textures: Vec<TextureUv1>,
    pub triangles: Vec<u32>,
}

/// Hand pose, second generation: full joint chains for thumb and fingers.
#[derive(Debug, Clone, PartialEq)]
pub struct Hand2 {
    pub id: ObjectId,
    pub timestamp: DateTimeMs,
    pub left: bool,
    pub location: Loc2,
    pub rotation: Rot2,
    pub wrist: Transform1,
    pub thumb: Thumb,
    pub fingers: [Finger; 4],
}

/// Interpupillary distance in half precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeadIpd1 {
    pub ipd: GsHalf,
}

/// A frame whose tag the decoder does not recognize.
///
/// The stored tag and body are re-emitted verbatim on encode, so unknown
/// variants pass through a decode/encode cycle bit-exact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownObject {
    pub tag: Tag,
    pub bytes: Vec<u8>,
}
