use byteorder::{BigEndian, ByteOrder};

use crate::constants::{
    TAG_HAND1, TAG_HAND2, TAG_HEAD1, TAG_HEADIPD1, TAG_MESH1, TAG_OBJECT1, UNKNOWN_TAG_FLOOR,
};
use crate::object::geometry::{Finger, Loc1, Loc2, Norm1, Rot1, Rot2, TextureUv1, Thumb, Transform1};
use crate::object::half::GsHalf;
use crate::object::variants::{Hand1, Hand2, Head1, HeadIpd1, Mesh1, Object1, UnknownObject};
use crate::object::GsObject;
use crate::types::{DateTimeMs, ObjectId, Tag};

use super::error::DecodeError;
use super::varint::read_varint;

/// Streaming decoder over one inbound buffer.
///
/// Yields objects until the buffer is exhausted. The buffer is only
/// borrowed for the decoder's lifetime; decoded values own their fields and
/// may outlive it.
pub struct Decoder<'a> {
    buffer: &'a [u8],
    offset: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Decoder { buffer, offset: 0 }
    }

    /// Decodes the next frame.
    ///
    /// Returns `Ok(None)` once no bytes remain. Timestamped variants have
    /// their 16-bit wire time expanded against the current wall clock.
    ///
    /// # Errors
    /// Any malformed shape (truncation, reserved tag, length mismatch)
    /// surfaces as a `DecodeError`; the decoder should be discarded
    /// afterwards since the stream position is no longer trustworthy.
    pub fn decode(&mut self) -> Result<Option<GsObject>, DecodeError> {
        if self.offset >= self.buffer.len() {
            return Ok(None);
        }
        let now = DateTimeMs::now();
        let mut reader = BodyReader::new(&self.buffer[self.offset..]);
        let object = read_frame(&mut reader, now)?;
        self.offset += reader.offset();
        Ok(Some(object))
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.offset
    }
}

/// Reads one complete frame (tag, declared length, body) from the reader.
fn read_frame(reader: &mut BodyReader<'_>, now: DateTimeMs) -> Result<GsObject, DecodeError> {
    let tag = reader.varint()?;
    let declared = usize::try_from(reader.varint()?).map_err(|_| DecodeError::VarintOverflow)?;
    let body = reader.take(declared, "frame body")?;

    if tag >= UNKNOWN_TAG_FLOOR {
        return Ok(GsObject::Unknown(UnknownObject {
            tag: Tag(tag),
            bytes: body.to_vec(),
        }));
    }

    let mut body_reader = BodyReader::new(body);
    let object = match tag {
        TAG_HEAD1 => GsObject::Head1(read_head1(&mut body_reader, now)?),
        TAG_HAND1 => GsObject::Hand1(read_hand1(&mut body_reader, now)?),
        TAG_OBJECT1 => GsObject::Object1(read_object1(&mut body_reader, now)?),
        TAG_MESH1 => GsObject::Mesh1(read_mesh1(&mut body_reader)?),
        TAG_HAND2 => GsObject::Hand2(read_hand2(&mut body_reader, now)?),
        TAG_HEADIPD1 => GsObject::HeadIpd1(read_head_ipd1(&mut body_reader)?),
        _ => return Err(DecodeError::ReservedTag { tag }),
    };

    if body_reader.remaining() != 0 {
        return Err(DecodeError::LengthMismatch {
            tag,
            declared,
            parsed: body_reader.offset(),
        });
    }
    Ok(object)
}

fn read_head1(reader: &mut BodyReader<'_>, now: DateTimeMs) -> Result<Head1, DecodeError> {
    let id = ObjectId(reader.varint()?);
    let timestamp = DateTimeMs::from_time16(reader.u16("time16")?, now);
    let location = read_loc2(reader)?;
    let rotation = read_rot2(reader)?;
    let ipd = if reader.flag()? {
        Some(read_nested_ipd(reader)?)
    } else {
        None
    };
    Ok(Head1 {
        id,
        timestamp,
        location,
        rotation,
        ipd,
    })
}

/// The optional IPD rides as a complete nested frame after the presence
/// byte.
fn read_nested_ipd(reader: &mut BodyReader<'_>) -> Result<HeadIpd1, DecodeError> {
    let tag = reader.varint()?;
    if tag != TAG_HEADIPD1 {
        return Err(DecodeError::UnexpectedNestedTag { tag });
    }
    let declared = usize::try_from(reader.varint()?).map_err(|_| DecodeError::VarintOverflow)?;
    let body = reader.take(declared, "ipd sub-frame")?;
    if declared != 2 {
        return Err(DecodeError::LengthMismatch {
            tag,
            declared,
            parsed: 2,
        });
    }
    Ok(HeadIpd1 {
        ipd: GsHalf::from_bits(BigEndian::read_u16(body)),
    })
}

fn read_hand1(reader: &mut BodyReader<'_>, now: DateTimeMs) -> Result<Hand1, DecodeError> {
    Ok(Hand1 {
        id: ObjectId(reader.varint()?),
        timestamp: DateTimeMs::from_time16(reader.u16("time16")?, now),
        left: reader.flag()?,
        location: read_loc2(reader)?,
        rotation: read_rot2(reader)?,
    })
}

fn read_object1(reader: &mut BodyReader<'_>, now: DateTimeMs) -> Result<Object1, DecodeError> {
    let id = ObjectId(reader.varint()?);
    let timestamp = DateTimeMs::from_time16(reader.u16("time16")?, now);
    let location = read_loc1(reader)?;
    let rotation = read_rot1(reader)?;
    let scale = read_loc1(reader)?;
    let parent = if reader.flag()? {
        Some(ObjectId(reader.varint()?))
    } else {
        None
    };
    Ok(Object1 {
        id,
        timestamp,
        location,
        rotation,
        scale,
        parent,
    })
}

fn read_mesh1(reader: &mut BodyReader<'_>) -> Result<Mesh1, DecodeError> {
    let id = ObjectId(reader.varint()?);

    let vertex_count = reader.array_count(12)?;
    let mut vertices = Vec::with_capacity(vertex_count);
    for _ in 0..vertex_count {
        vertices.push(read_loc1(reader)?);
    }

    let normal_count = reader.array_count(12)?;
    let mut normals = Vec::with_capacity(normal_count);
    for _ in 0..normal_count {
        normals.push(read_norm1(reader)?);
    }

    let texture_count = reader.array_count(8)?;
    let mut textures = Vec::with_capacity(texture_count);
    for _ in 0..texture_count {
        textures.push(TextureUv1 {
            u: reader.f32("texture u")?,
            v: reader.f32("texture v")?,
        });
    }

    let triangle_count = reader.array_count(1)?;
    let mut triangles = Vec::with_capacity(triangle_count);
    for _ in 0..triangle_count {
        let value = reader.varint()?;
        let index =
            u32::try_from(value).map_err(|_| DecodeError::IndexOutOfRange { value })?;
        triangles.push(index);
    }

    Ok(Mesh1 {
        id,
        vertices,
        normals,
        textures,
        triangles,
    })
}

fn read_hand2(reader: &mut BodyReader<'_>, now: DateTimeMs) -> Result<Hand2, DecodeError> {
    let id = ObjectId(reader.varint()?);
    let timestamp = DateTimeMs::from_time16(reader.u16("time16")?, now);
    let left = reader.flag()?;
    let location = read_loc2(reader)?;
    let rotation = read_rot2(reader)?;
    let wrist = read_transform1(reader)?;

    let mut thumb = Thumb::default();
    for joint in &mut thumb.joints {
        *joint = read_transform1(reader)?;
    }

    let mut fingers = [Finger::default(); 4];
    for finger in &mut fingers {
        for joint in &mut finger.joints {
            *joint = read_transform1(reader)?;
        }
    }

    Ok(Hand2 {
        id,
        timestamp,
        left,
        location,
        rotation,
        wrist,
        thumb,
        fingers,
    })
}

fn read_head_ipd1(reader: &mut BodyReader<'_>) -> Result<HeadIpd1, DecodeError> {
    Ok(HeadIpd1 {
        ipd: reader.half("ipd")?,
    })
}

fn read_loc1(reader: &mut BodyReader<'_>) -> Result<Loc1, DecodeError> {
    Ok(Loc1 {
        x: reader.f32("location x")?,
        y: reader.f32("location y")?,
        z: reader.f32("location z")?,
    })
}

fn read_rot1(reader: &mut BodyReader<'_>) -> Result<Rot1, DecodeError> {
    Ok(Rot1 {
        x: reader.f32("rotation x")?,
        y: reader.f32("rotation y")?,
        z: reader.f32("rotation z")?,
    })
}

fn read_norm1(reader: &mut BodyReader<'_>) -> Result<Norm1, DecodeError> {
    Ok(Norm1 {
        x: reader.f32("normal x")?,
        y: reader.f32("normal y")?,
        z: reader.f32("normal z")?,
    })
}

fn read_loc2(reader: &mut BodyReader<'_>) -> Result<Loc2, DecodeError> {
    Ok(Loc2 {
        x: reader.half("location x")?,
        y: reader.half("location y")?,
        z: reader.half("location z")?,
        vx: reader.half("velocity x")?,
        vy: reader.half("velocity y")?,
        vz: reader.half("velocity z")?,
    })
}

fn read_rot2(reader: &mut BodyReader<'_>) -> Result<Rot2, DecodeError> {
    Ok(Rot2 {
        x: reader.half("rotation x")?,
        y: reader.half("rotation y")?,
        z: reader.half("rotation z")?,
        vx: reader.half("angular velocity x")?,
        vy: reader.half("angular velocity y")?,
        vz: reader.half("angular velocity z")?,
    })
}

fn read_transform1(reader: &mut BodyReader<'_>) -> Result<Transform1, DecodeError> {
    Ok(Transform1 {
        location: read_loc1(reader)?,
        rotation: read_rot1(reader)?,
    })
}

/// Cursor over an untrusted byte slice. Every read is bounds-checked and
/// reports what it was reading when the data ran out.
struct BodyReader<'a> {
    input: &'a [u8],
    offset: usize,
}

impl<'a> BodyReader<'a> {
    fn new(input: &'a [u8]) -> Self {
        BodyReader { input, offset: 0 }
    }

    fn offset(&self) -> usize {
        self.offset
    }

    fn remaining(&self) -> usize {
        self.input.len() - self.offset
    }

    fn take(&mut self, len: usize, context: &'static str) -> Result<&'a [u8], DecodeError> {
        if len > self.remaining() {
            return Err(DecodeError::Truncated {
                context,
                needed: len,
                remaining: self.remaining(),
            });
        }
        let slice = &self.input[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    fn u8(&mut self, context: &'static str) -> Result<u8, DecodeError> {
        Ok(self.take(1, context)?[0])
    }

    fn u16(&mut self, context: &'static str) -> Result<u16, DecodeError> {
        Ok(BigEndian::read_u16(self.take(2, context)?))
    }

    fn f32(&mut self, context: &'static str) -> Result<f32, DecodeError> {
        Ok(BigEndian::read_f32(self.take(4, context)?))
    }

    fn half(&mut self, context: &'static str) -> Result<GsHalf, DecodeError> {
        Ok(GsHalf::from_bits(self.u16(context)?))
    }

    fn flag(&mut self) -> Result<bool, DecodeError> {
        match self.u8("flag byte")? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(DecodeError::InvalidFlag { value }),
        }
    }

    fn varint(&mut self) -> Result<u64, DecodeError> {
        let (value, consumed) = read_varint(&self.input[self.offset..])?;
        self.offset += consumed;
        Ok(value)
    }

    /// Reads an array count and checks it against the space its elements
    /// would occupy, so a hostile count cannot trigger a huge allocation.
    fn array_count(&mut self, element_size: usize) -> Result<usize, DecodeError> {
        let count = self.varint()?;
        let remaining = self.remaining();
        let fits = count
            .checked_mul(element_size as u64)
            .map_or(false, |bytes| bytes <= remaining as u64);
        if !fits {
            return Err(DecodeError::ArrayOutOfBounds {
                count,
                element_size,
                remaining,
            });
        }
        Ok(count as usize)
    }
}
