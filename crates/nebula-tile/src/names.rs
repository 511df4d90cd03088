//! Tile-level name tables (texture, model and object paths).
//!
//! Names are stored as a blob of NUL-terminated strings. Textures are
//! addressed by their position in the blob; models and objects go through an
//! id table of `u32` byte offsets into their blob, and placement records index
//! that id table.

use crate::error::{DecodeError, EncodeError, TableKind};
use crate::io::{BlockBuilder, Region, to_u32};

/// Resolves table indices to paths.
///
/// The codec only needs the lengths to validate references; the editor uses
/// the path lookups.
pub trait NameResolver {
    /// Number of texture names.
    fn texture_count(&self) -> usize;
    /// Number of model names.
    fn model_count(&self) -> usize;
    /// Number of object names.
    fn object_count(&self) -> usize;
    /// Texture path for an index.
    fn texture_path(&self, index: u32) -> Option<&str>;
    /// Model path for an index.
    fn model_path(&self, index: u32) -> Option<&str>;
    /// Object path for an index.
    fn object_path(&self, index: u32) -> Option<&str>;
}

/// The three name tables of a tile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameTables {
    /// Texture paths, indexed by layer texture ids.
    pub textures: Vec<String>,
    /// Model paths, indexed by doodad placement name ids.
    pub models: Vec<String>,
    /// Object paths, indexed by object placement name ids.
    pub objects: Vec<String>,
}

impl NameTables {
    /// Rejects names that would split in the NUL-terminated blob.
    pub(crate) fn check_names(&self) -> Result<(), EncodeError> {
        let tables = [
            (TableKind::Textures, &self.textures),
            (TableKind::Models, &self.models),
            (TableKind::Objects, &self.objects),
        ];
        for (table, names) in tables {
            if let Some(index) = names.iter().position(|name| name.contains('\0')) {
                return Err(EncodeError::InvalidName { table, index });
            }
        }
        Ok(())
    }
}

impl NameResolver for NameTables {
    fn texture_count(&self) -> usize {
        self.textures.len()
    }

    fn model_count(&self) -> usize {
        self.models.len()
    }

    fn object_count(&self) -> usize {
        self.objects.len()
    }

    fn texture_path(&self, index: u32) -> Option<&str> {
        self.textures.get(index as usize).map(String::as_str)
    }

    fn model_path(&self, index: u32) -> Option<&str> {
        self.models.get(index as usize).map(String::as_str)
    }

    fn object_path(&self, index: u32) -> Option<&str> {
        self.objects.get(index as usize).map(String::as_str)
    }
}

/// Splits a blob into its NUL-terminated strings. A trailing unterminated
/// string is kept.
pub(crate) fn decode_name_blob(blob: Region<'_>) -> Vec<String> {
    let bytes = blob.bytes();
    if bytes.is_empty() {
        return Vec::new();
    }
    bytes
        .strip_suffix(&[0])
        .unwrap_or(bytes)
        .split(|&b| b == 0)
        .map(|s| String::from_utf8_lossy(s).into_owned())
        .collect()
}

/// Resolves an id table of blob offsets into names.
pub(crate) fn decode_id_table(
    blob: Region<'_>,
    ids: Region<'_>,
    count: usize,
) -> Result<Vec<String>, DecodeError> {
    let mut cursor = ids.cursor();
    let mut names = Vec::with_capacity(count);
    for _ in 0..count {
        let offset = cursor.usize32()?;
        let tail = blob.tail(offset, "name id")?;
        if tail.len() == 0 {
            return Err(DecodeError::InvalidOffset {
                offset: tail.base(),
                what: "name id",
            });
        }
        let bytes = tail.bytes();
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        names.push(String::from_utf8_lossy(&bytes[..end]).into_owned());
    }
    Ok(names)
}

/// Concatenates names into a NUL-terminated blob.
pub(crate) fn encode_name_blob(names: &[String]) -> Vec<u8> {
    let mut blob = BlockBuilder::new();
    for name in names {
        blob.put_bytes(name.as_bytes());
        blob.put_u8(0);
    }
    blob.into_inner()
}

/// Builds the id table for a blob produced by [`encode_name_blob`].
pub(crate) fn encode_id_table(names: &[String]) -> Result<Vec<u8>, EncodeError> {
    let mut ids = BlockBuilder::with_capacity(names.len() * 4);
    let mut offset = 0usize;
    for name in names {
        ids.put_u32(to_u32(offset, "name blob")?);
        offset += name.len() + 1;
    }
    Ok(ids.into_inner())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
