//! Error types for tile decoding and encoding.
//!
//! Every [`DecodeError`] carries the absolute byte offset into the tile buffer
//! where the problem was detected. Encode errors are produced by validation
//! before any output is written.

/// Which table an out-of-range index referred to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    /// Texture name table.
    Textures,
    /// Model (doodad) name table.
    Models,
    /// Object name table.
    Objects,
    /// Tile-level doodad placement list.
    DoodadPlacements,
    /// Tile-level object placement list.
    ObjectPlacements,
}

/// What is wrong with a chunk's texture layer table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerIssue {
    /// The first layer is marked as using an alpha map.
    BaseLayerUsesAlpha,
    /// A layer after the first has no alpha map.
    MissingAlpha,
    /// More layers than the format allows. Carries the count found.
    TooManyLayers(usize),
}

impl std::fmt::Display for LayerIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BaseLayerUsesAlpha => write!(f, "base layer marked as using an alpha map"),
            Self::MissingAlpha => write!(f, "blend layer without an alpha map"),
            Self::TooManyLayers(n) => write!(f, "{n} layers present"),
        }
    }
}

/// Errors that can occur while decoding a tile buffer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    /// A read ran past the end of the buffer.
    #[error("truncated buffer at {offset}: needed {needed} bytes, {available} available")]
    TruncatedBuffer {
        /// Absolute offset of the read.
        offset: usize,
        /// Bytes the read required.
        needed: usize,
        /// Bytes left in the containing region.
        available: usize,
    },
    /// The buffer does not start with the tile magic.
    #[error("invalid tile magic")]
    InvalidMagic,
    /// The container version is not supported.
    #[error("unsupported tile version {0}")]
    UnsupportedVersion(u32),
    /// An index entry or sub-block offset points outside its containing region.
    #[error("{what} at {offset} points outside its containing region")]
    InvalidOffset {
        /// Absolute offset the reference resolves to.
        offset: usize,
        /// Name of the referenced block.
        what: &'static str,
    },
    /// Unrecognized liquid vertex format tag.
    #[error("unknown liquid vertex format {tag} at {offset}")]
    UnknownFormatTag {
        /// Absolute offset of the tag field.
        offset: usize,
        /// The tag value.
        tag: u16,
    },
    /// A liquid coverage rectangle reaches past the 8×8 unit grid.
    #[error("liquid coverage rectangle at {offset} exceeds the unit grid")]
    InvalidCoverage {
        /// Absolute offset of the information record.
        offset: usize,
    },
    /// A run-length alpha run writes past the declared raster size.
    #[error("alpha stream overrun at {offset}: raster holds {expected} cells")]
    AlphaStreamOverrun {
        /// Absolute offset of the offending control byte.
        offset: usize,
        /// Declared raster size in cells.
        expected: usize,
    },
    /// A run-length alpha stream ends before filling the raster.
    #[error("alpha stream underrun at {offset}: decoded {actual} of {expected} cells")]
    AlphaStreamUnderrun {
        /// Absolute offset where the stream ended.
        offset: usize,
        /// Declared raster size in cells.
        expected: usize,
        /// Cells decoded before the stream ended.
        actual: usize,
    },
    /// A record references a table slot beyond the table's length.
    #[error("index {index} into {table:?} (len {len}) at {offset}")]
    IndexOutOfRange {
        /// Absolute offset of the referencing record.
        offset: usize,
        /// Table being indexed.
        table: TableKind,
        /// The index found.
        index: u32,
        /// Table length.
        len: usize,
    },
    /// The layer table violates the alpha flag rules or the layer limit.
    #[error("inconsistent layer table at {offset} (layer {layer}): {issue}")]
    InconsistentLayerFlags {
        /// Absolute offset of the layer entry (or table).
        offset: usize,
        /// Layer position within the table.
        layer: usize,
        /// What is wrong.
        issue: LayerIssue,
    },
}

impl DecodeError {
    /// Returns the absolute byte offset associated with this error.
    pub fn offset(&self) -> usize {
        match self {
            Self::InvalidMagic | Self::UnsupportedVersion(_) => 0,
            Self::TruncatedBuffer { offset, .. }
            | Self::InvalidOffset { offset, .. }
            | Self::UnknownFormatTag { offset, .. }
            | Self::InvalidCoverage { offset }
            | Self::AlphaStreamOverrun { offset, .. }
            | Self::AlphaStreamUnderrun { offset, .. }
            | Self::IndexOutOfRange { offset, .. }
            | Self::InconsistentLayerFlags { offset, .. } => *offset,
        }
    }
}

/// Errors that reject a tile before encoding.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EncodeError {
    /// The tile does not hold exactly 256 chunks.
    #[error("tile holds {0} chunks, expected 256")]
    ChunkCount(usize),
    /// A fixed-size block has the wrong element count.
    #[error("chunk {chunk}: {block} holds {actual} entries, expected {expected}")]
    BlockSize {
        /// Chunk slot index (or `usize::MAX` for tile-level blocks).
        chunk: usize,
        /// Name of the block.
        block: &'static str,
        /// Required element count.
        expected: usize,
        /// Element count found.
        actual: usize,
    },
    /// The layer list violates the alpha flag rules or the layer limit.
    #[error("chunk {chunk} layer {layer}: {issue}")]
    InconsistentLayerFlags {
        /// Chunk slot index.
        chunk: usize,
        /// Layer position.
        layer: usize,
        /// What is wrong.
        issue: LayerIssue,
    },
    /// A chunk carries modern liquid while its legacy liquid flags are set.
    #[error("chunk {chunk} carries modern liquid with legacy liquid flags set")]
    InconsistentLiquid {
        /// Chunk slot index.
        chunk: usize,
    },
    /// A reference points past the end of its table.
    #[error("chunk {chunk}: index {index} into {table:?} (len {len})")]
    IndexOutOfRange {
        /// Chunk slot index (or `usize::MAX` for tile-level records).
        chunk: usize,
        /// Table being indexed.
        table: TableKind,
        /// The index found.
        index: u32,
        /// Table length.
        len: usize,
    },
    /// A name contains a NUL byte, which the name blob uses as terminator.
    #[error("{table:?} name {index} contains a NUL byte")]
    InvalidName {
        /// Table holding the name.
        table: TableKind,
        /// Position of the name in its table.
        index: usize,
    },
    /// A block grew beyond what a 32-bit offset can address.
    #[error("{0} exceeds the 32-bit offset range")]
    TooLarge(&'static str),
}

/// Chunk marker used by [`EncodeError`] for tile-level records.
pub const TILE_LEVEL: usize = usize::MAX;
