//! Doodad and object placement records.
//!
//! Both arrays live at tile level and are referenced from chunks by index.
//!
//! Doodad record (36 bytes):
//!
//! | Offset | Size | Field     |
//! |--------|------|-----------|
//! | 0      | 4    | name id   |
//! | 4      | 4    | unique id |
//! | 8      | 12   | position  |
//! | 20     | 12   | rotation  |
//! | 32     | 2    | scale (1024 = 1.0) |
//! | 34     | 2    | flags     |
//!
//! Object record (64 bytes): name id, unique id, position, rotation, two
//! extent corners, then `u16` flags, doodad set, name set and scale.

use glam::Vec3;

use crate::error::{DecodeError, TableKind};
use crate::io::{BlockBuilder, Cursor, Region};

/// Size of a doodad placement record.
pub const DOODAD_PLACEMENT_SIZE: usize = 36;

/// Size of an object placement record.
pub const OBJECT_PLACEMENT_SIZE: usize = 64;

/// Fixed-point scale that represents 1.0.
pub const SCALE_ONE: u16 = 1024;

/// A placed doodad (small model).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoodadPlacement {
    /// Index into the model name table.
    pub name_id: u32,
    pub unique_id: u32,
    pub position: Vec3,
    /// Euler rotation in degrees.
    pub rotation: Vec3,
    /// Uniform scale, 1024 = 1.0.
    pub scale: u16,
    pub flags: u16,
}

impl DoodadPlacement {
    /// Creates an unrotated placement at unit scale.
    pub fn new(name_id: u32, unique_id: u32, position: Vec3) -> Self {
        Self {
            name_id,
            unique_id,
            position,
            rotation: Vec3::ZERO,
            scale: SCALE_ONE,
            flags: 0,
        }
    }

    /// Scale as a float.
    pub fn scale_factor(&self) -> f32 {
        f32::from(self.scale) / f32::from(SCALE_ONE)
    }

    fn read(cursor: &mut Cursor<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            name_id: cursor.u32()?,
            unique_id: cursor.u32()?,
            position: cursor.vec3()?,
            rotation: cursor.vec3()?,
            scale: cursor.u16()?,
            flags: cursor.u16()?,
        })
    }

    fn write(&self, out: &mut BlockBuilder) {
        out.put_u32(self.name_id);
        out.put_u32(self.unique_id);
        out.put_vec3(self.position);
        out.put_vec3(self.rotation);
        out.put_u16(self.scale);
        out.put_u16(self.flags);
    }
}

/// A placed object (large model with its own doodad sets).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectPlacement {
    /// Index into the object name table.
    pub name_id: u32,
    pub unique_id: u32,
    pub position: Vec3,
    pub rotation: Vec3,
    /// Authored bounding box corners used for culling.
    pub extents: [Vec3; 2],
    pub flags: u16,
    pub doodad_set: u16,
    pub name_set: u16,
    pub scale: u16,
}

impl ObjectPlacement {
    fn read(cursor: &mut Cursor<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            name_id: cursor.u32()?,
            unique_id: cursor.u32()?,
            position: cursor.vec3()?,
            rotation: cursor.vec3()?,
            extents: [cursor.vec3()?, cursor.vec3()?],
            flags: cursor.u16()?,
            doodad_set: cursor.u16()?,
            name_set: cursor.u16()?,
            scale: cursor.u16()?,
        })
    }

    fn write(&self, out: &mut BlockBuilder) {
        out.put_u32(self.name_id);
        out.put_u32(self.unique_id);
        out.put_vec3(self.position);
        out.put_vec3(self.rotation);
        out.put_vec3(self.extents[0]);
        out.put_vec3(self.extents[1]);
        out.put_u16(self.flags);
        out.put_u16(self.doodad_set);
        out.put_u16(self.name_set);
        out.put_u16(self.scale);
    }
}

fn check_name(offset: usize, table: TableKind, index: u32, len: usize) -> Result<(), DecodeError> {
    if index as usize >= len {
        return Err(DecodeError::IndexOutOfRange {
            offset,
            table,
            index,
            len,
        });
    }
    Ok(())
}

/// Decodes doodad records, checking each name id against `models`.
pub(crate) fn decode_doodads(
    region: Region<'_>,
    count: usize,
    models: usize,
) -> Result<Vec<DoodadPlacement>, DecodeError> {
    let mut cursor = region.cursor();
    (0..count)
        .map(|_| {
            let offset = cursor.position();
            let doodad = DoodadPlacement::read(&mut cursor)?;
            check_name(offset, TableKind::Models, doodad.name_id, models)?;
            Ok(doodad)
        })
        .collect()
}

/// Decodes object records, checking each name id against `objects`.
pub(crate) fn decode_objects(
    region: Region<'_>,
    count: usize,
    objects: usize,
) -> Result<Vec<ObjectPlacement>, DecodeError> {
    let mut cursor = region.cursor();
    (0..count)
        .map(|_| {
            let offset = cursor.position();
            let object = ObjectPlacement::read(&mut cursor)?;
            check_name(offset, TableKind::Objects, object.name_id, objects)?;
            Ok(object)
        })
        .collect()
}

pub(crate) fn encode_doodads(doodads: &[DoodadPlacement]) -> Vec<u8> {
    let mut out = BlockBuilder::with_capacity(doodads.len() * DOODAD_PLACEMENT_SIZE);
    for doodad in doodads {
        doodad.write(&mut out);
    }
    out.into_inner()
}

pub(crate) fn encode_objects(objects: &[ObjectPlacement]) -> Vec<u8> {
    let mut out = BlockBuilder::with_capacity(objects.len() * OBJECT_PLACEMENT_SIZE);
    for object in objects {
        object.write(&mut out);
    }
    out.into_inner()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_object() -> ObjectPlacement {
        ObjectPlacement {
            name_id: 1,
            unique_id: 900,
            position: Vec3::new(10.0, 20.0, 30.0),
            rotation: Vec3::new(0.0, 90.0, 0.0),
            extents: [Vec3::new(-5.0, -5.0, -1.0), Vec3::new(5.0, 5.0, 8.0)],
            flags: 0x4,
            doodad_set: 2,
            name_set: 3,
            scale: SCALE_ONE,
        }
    }

    #[test]
    fn test_record_sizes() {
        let doodad = DoodadPlacement::new(0, 1, Vec3::ZERO);
        assert_eq!(encode_doodads(&[doodad]).len(), DOODAD_PLACEMENT_SIZE);
        assert_eq!(encode_objects(&[sample_object()]).len(), OBJECT_PLACEMENT_SIZE);
    }

    #[test]
    fn test_doodad_literal_layout() {
        let mut doodad = DoodadPlacement::new(2, 7, Vec3::new(1.0, 0.0, 0.0));
        doodad.scale = 2048;
        doodad.flags = 0x1;
        let bytes = encode_doodads(&[doodad]);
        assert_eq!(&bytes[0..4], &[2, 0, 0, 0]);
        assert_eq!(&bytes[4..8], &[7, 0, 0, 0]);
        assert_eq!(&bytes[8..12], &1.0f32.to_le_bytes());
        assert_eq!(&bytes[32..36], &[0x00, 0x08, 0x01, 0x00]);
        assert_eq!(doodad.scale_factor(), 2.0);
    }

    #[test]
    fn test_placements_roundtrip() {
        let doodads = vec![
            DoodadPlacement::new(0, 1, Vec3::new(1.0, 2.0, 3.0)),
            DoodadPlacement::new(1, 2, Vec3::new(-1.0, 0.5, 9.0)),
        ];
        let bytes = encode_doodads(&doodads);
        assert_eq!(decode_doodads(Region::new(&bytes), 2, 2).unwrap(), doodads);

        let objects = vec![sample_object()];
        let bytes = encode_objects(&objects);
        let decoded = decode_objects(Region::new(&bytes), 1, 2).unwrap();
        assert_eq!(decoded, objects);
        assert_eq!(decoded[0].extents, objects[0].extents);
    }

    #[test]
    fn test_name_id_out_of_range() {
        let doodads = vec![
            DoodadPlacement::new(0, 1, Vec3::ZERO),
            DoodadPlacement::new(5, 2, Vec3::ZERO),
        ];
        let bytes = encode_doodads(&doodads);
        let result = decode_doodads(Region::new(&bytes), 2, 3);
        assert_eq!(
            result,
            Err(DecodeError::IndexOutOfRange {
                offset: DOODAD_PLACEMENT_SIZE,
                table: TableKind::Models,
                index: 5,
                len: 3,
            })
        );
    }

    #[test]
    fn test_truncated_records() {
        let bytes = encode_objects(&[sample_object()]);
        let result = decode_objects(Region::new(&bytes[..40]), 1, 2);
        assert!(matches!(result, Err(DecodeError::TruncatedBuffer { .. })));
    }
}
