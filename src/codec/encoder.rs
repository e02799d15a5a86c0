use byteorder::{BigEndian, ByteOrder};

use crate::constants::MTU_SIZE_BYTES;
use crate::object::geometry::{Loc1, Loc2, Norm1, Rot1, Rot2, Transform1};
use crate::object::half::GsHalf;
use crate::object::variants::{Hand1, Hand2, Head1, HeadIpd1, Mesh1, Object1};
use crate::object::GsObject;

use super::error::EncodeError;
use super::varint::write_varint;

/// Serializes objects into a fixed-capacity, append-only frame buffer.
///
/// Frames are appended whole: if a frame does not fit in the remaining
/// capacity, `encode` fails and the buffer is unchanged, so a caller can
/// flush and retry. The default capacity fits a single UDP datagram.
pub struct Encoder {
    buffer: Vec<u8>,
    capacity: usize,
    scratch: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::with_capacity(MTU_SIZE_BYTES)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Encoder {
            buffer: Vec::with_capacity(capacity),
            capacity,
            scratch: Vec::new(),
        }
    }

    /// Appends one frame.
    ///
    /// # Errors
    /// Returns `EncodeError::BufferFull` (buffer unchanged) when the frame
    /// exceeds the remaining capacity.
    pub fn encode(&mut self, object: &GsObject) -> Result<(), EncodeError> {
        self.scratch.clear();
        write_frame(&mut self.scratch, object);

        let remaining = self.capacity - self.buffer.len();
        if self.scratch.len() > remaining {
            return Err(EncodeError::BufferFull {
                frame: self.scratch.len(),
                remaining,
            });
        }
        self.buffer.extend_from_slice(&self.scratch);
        Ok(())
    }

    /// The populated region of the buffer.
    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.capacity - self.buffer.len()
    }

    /// Clears the buffer for reuse.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Consumes the encoder, yielding the populated buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Writes one complete frame: tag varint, body-length varint, body.
fn write_frame(out: &mut Vec<u8>, object: &GsObject) {
    let mut body = Vec::new();
    write_body(&mut body, object);
    write_varint(out, object.tag().raw());
    write_varint(out, body.len() as u64);
    out.extend_from_slice(&body);
}

fn write_body(out: &mut Vec<u8>, object: &GsObject) {
    match object {
        GsObject::Head1(head) => write_head1(out, head),
        GsObject::Hand1(hand) => write_hand1(out, hand),
        GsObject::Object1(obj) => write_object1(out, obj),
        GsObject::Mesh1(mesh) => write_mesh1(out, mesh),
        GsObject::Hand2(hand) => write_hand2(out, hand),
        GsObject::HeadIpd1(ipd) => write_head_ipd1(out, ipd),
        GsObject::Unknown(unknown) => out.extend_from_slice(&unknown.bytes),
    }
}

fn write_head1(out: &mut Vec<u8>, head: &Head1) {
    write_varint(out, head.id.0);
    put_u16(out, head.timestamp.time16());
    write_loc2(out, &head.location);
    write_rot2(out, &head.rotation);
    match &head.ipd {
        Some(ipd) => {
            out.push(1);
            write_frame(out, &GsObject::HeadIpd1(*ipd));
        }
        None => out.push(0),
    }
}

fn write_hand1(out: &mut Vec<u8>, hand: &Hand1) {
    write_varint(out, hand.id.0);
    put_u16(out, hand.timestamp.time16());
    out.push(u8::from(hand.left));
    write_loc2(out, &hand.location);
    write_rot2(out, &hand.rotation);
}

fn write_object1(out: &mut Vec<u8>, obj: &Object1) {
    write_varint(out, obj.id.0);
    put_u16(out, obj.timestamp.time16());
    write_loc1(out, &obj.location);
    write_rot1(out, &obj.rotation);
    write_loc1(out, &obj.scale);
    match obj.parent {
        Some(parent) => {
            out.push(1);
            write_varint(out, parent.0);
        }
        None => out.push(0),
    }
}

fn write_mesh1(out: &mut Vec<u8>, mesh: &Mesh1) {
    write_varint(out, mesh.id.0);
    write_varint(out, mesh.vertices.len() as u64);
    for vertex in &mesh.vertices {
        write_loc1(out, vertex);
    }
    write_varint(out, mesh.normals.len() as u64);
    for normal in &mesh.normals {
        write_norm1(out, normal);
    }
    write_varint(out, mesh.textures.len() as u64);
    for texture in &mesh.textures {
        put_f32(out, texture.u);
        put_f32(out, texture.v);
    }
    write_varint(out, mesh.triangles.len() as u64);
    for &index in &mesh.triangles {
        write_varint(out, u64::from(index));
    }
}

fn write_hand2(out: &mut Vec<u8>, hand: &Hand2) {
    write_varint(out, hand.id.0);
    put_u16(out, hand.timestamp.time16());
    out.push(u8::from(hand.left));
    write_loc2(out, &hand.location);
    write_rot2(out, &hand.rotation);
    write_transform1(out, &hand.wrist);
    for joint in &hand.thumb.joints {
        write_transform1(out, joint);
    }
    for finger in &hand.fingers {
        for joint in &finger.joints {
            write_transform1(out, joint);
        }
    }
}

fn write_head_ipd1(out: &mut Vec<u8>, ipd: &HeadIpd1) {
    put_half(out, ipd.ipd);
}

fn write_loc1(out: &mut Vec<u8>, loc: &Loc1) {
    put_f32(out, loc.x);
    put_f32(out, loc.y);
    put_f32(out, loc.z);
}

fn write_rot1(out: &mut Vec<u8>, rot: &Rot1) {
    put_f32(out, rot.x);
    put_f32(out, rot.y);
    put_f32(out, rot.z);
}

fn write_norm1(out: &mut Vec<u8>, norm: &Norm1) {
    put_f32(out, norm.x);
    put_f32(out, norm.y);
    put_f32(out, norm.z);
}

fn write_loc2(out: &mut Vec<u8>, loc: &Loc2) {
    for half in [loc.x, loc.y, loc.z, loc.vx, loc.vy, loc.vz] {
        put_half(out, half);
    }
}

fn write_rot2(out: &mut Vec<u8>, rot: &Rot2) {
    for half in [rot.x, rot.y, rot.z, rot.vx, rot.vy, rot.vz] {
        put_half(out, half);
    }
}

fn write_transform1(out: &mut Vec<u8>, transform: &Transform1) {
    write_loc1(out, &transform.location);
    write_rot1(out, &transform.rotation);
}

fn put_u16(out: &mut Vec<u8>, value: u16) {
    let mut raw = [0u8; 2];
    BigEndian::write_u16(&mut raw, value);
    out.extend_from_slice(&raw);
}

fn put_f32(out: &mut Vec<u8>, value: f32) {
    let mut raw = [0u8; 4];
    BigEndian::write_f32(&mut raw, value);
    out.extend_from_slice(&raw);
}

fn put_half(out: &mut Vec<u8>, value: GsHalf) {
    put_u16(out, value.to_bits());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::variants::UnknownObject;
    use crate::types::{DateTimeMs, ObjectId, Tag};

    fn sample_ipd_head() -> GsObject {
        GsObject::Head1(Head1 {
            id: ObjectId(0),
            timestamp: DateTimeMs(0x0500),
            location: Loc2::from_f32(1.1, 0.2, 30.0, 0.0, 0.0, 0.0),
            rotation: Rot2::default(),
            ipd: Some(HeadIpd1 {
                ipd: GsHalf::from_f32(3.140_625),
            }),
        })
    }

    #[test]
    fn head1_frame_layout_is_pinned() {
        let mut encoder = Encoder::new();
        encoder.encode(&sample_ipd_head()).unwrap();
        let bytes = encoder.bytes();
        // tag, length, id, time16
        assert_eq!(&bytes[..5], &[0x01, 0x20, 0x00, 0x05, 0x00]);
        // trailing presence byte plus nested IPD frame, 3.140625 == 0x4248
        assert_eq!(&bytes[bytes.len() - 5..], &[0x01, 0x06, 0x02, 0x42, 0x48]);
        assert_eq!(bytes.len(), 2 + 0x20);
    }

    #[test]
    fn full_buffer_leaves_state_unchanged() {
        let mut encoder = Encoder::with_capacity(8);
        let unknown = GsObject::Unknown(UnknownObject {
            tag: Tag(0x20),
            bytes: vec![0xAA; 16],
        });
        let err = encoder.encode(&unknown).unwrap_err();
        assert_eq!(
            err,
            EncodeError::BufferFull {
                frame: 18,
                remaining: 8
            }
        );
        assert!(encoder.is_empty());

        // A smaller frame still fits afterwards.
        let small = GsObject::Unknown(UnknownObject {
            tag: Tag(0x20),
            bytes: vec![0x01, 0x02],
        });
        encoder.encode(&small).unwrap();
        assert_eq!(encoder.bytes(), &[0x20, 0x02, 0x01, 0x02]);
    }
}
