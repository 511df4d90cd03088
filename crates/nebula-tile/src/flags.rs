//! Named views over the packed flag words stored in tile, chunk, layer,
//! texture and legacy liquid records.
//!
//! Each type unpacks a raw integer into booleans and small enums, and packs it
//! back at the exact same bit positions. Bits without a name are kept in an
//! `other` field so unknown data survives a round trip.

// ---------------------------------------------------------------------------
// Tile flags
// ---------------------------------------------------------------------------

const TILE_GLOBAL_OBJECT: u32 = 0x0001;
const TILE_VERTEX_SHADING: u32 = 0x0002;
const TILE_BIG_ALPHA: u32 = 0x0004;
const TILE_DOODADS_SORTED: u32 = 0x0008;
const TILE_LIGHTING_VERTICES: u32 = 0x0010;
const TILE_UPSIDE_DOWN_GROUND: u32 = 0x0020;
const TILE_HEIGHT_TEXTURING: u32 = 0x0080;
const TILE_HAS_NAME_MAP: u32 = 0x0200;
const TILE_NAMED: u32 = TILE_GLOBAL_OBJECT
    | TILE_VERTEX_SHADING
    | TILE_BIG_ALPHA
    | TILE_DOODADS_SORTED
    | TILE_LIGHTING_VERTICES
    | TILE_UPSIDE_DOWN_GROUND
    | TILE_HEIGHT_TEXTURING
    | TILE_HAS_NAME_MAP;

/// Tile-wide flags word.
///
/// `big_alpha` selects the alpha-map decoder. On encode it is rewritten to
/// match the configured [`AlphaFormat`](crate::AlphaFormat).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileFlags {
    /// The map is a single global object rather than terrain.
    pub global_object: bool,
    /// Vertex shading is baked into the terrain.
    pub vertex_shading: bool,
    /// Alpha maps use the packed 4-bit encoding.
    pub big_alpha: bool,
    /// Doodad references are sorted by size category.
    pub doodads_sorted: bool,
    /// Per-chunk lighting vertices are present.
    pub lighting_vertices: bool,
    /// Terrain is rendered upside down.
    pub upside_down_ground: bool,
    /// Texture blending uses height maps.
    pub height_texturing: bool,
    /// An external name-table map accompanies this tile.
    pub has_name_map: bool,
    /// Unnamed bits, preserved verbatim.
    pub other: u32,
}

impl TileFlags {
    /// Unpacks a raw flags word.
    pub fn unpack(raw: u32) -> Self {
        Self {
            global_object: raw & TILE_GLOBAL_OBJECT != 0,
            vertex_shading: raw & TILE_VERTEX_SHADING != 0,
            big_alpha: raw & TILE_BIG_ALPHA != 0,
            doodads_sorted: raw & TILE_DOODADS_SORTED != 0,
            lighting_vertices: raw & TILE_LIGHTING_VERTICES != 0,
            upside_down_ground: raw & TILE_UPSIDE_DOWN_GROUND != 0,
            height_texturing: raw & TILE_HEIGHT_TEXTURING != 0,
            has_name_map: raw & TILE_HAS_NAME_MAP != 0,
            other: raw & !TILE_NAMED,
        }
    }

    /// Packs the flags back into a raw word.
    pub fn pack(&self) -> u32 {
        let mut raw = self.other & !TILE_NAMED;
        set_bit(&mut raw, TILE_GLOBAL_OBJECT, self.global_object);
        set_bit(&mut raw, TILE_VERTEX_SHADING, self.vertex_shading);
        set_bit(&mut raw, TILE_BIG_ALPHA, self.big_alpha);
        set_bit(&mut raw, TILE_DOODADS_SORTED, self.doodads_sorted);
        set_bit(&mut raw, TILE_LIGHTING_VERTICES, self.lighting_vertices);
        set_bit(&mut raw, TILE_UPSIDE_DOWN_GROUND, self.upside_down_ground);
        set_bit(&mut raw, TILE_HEIGHT_TEXTURING, self.height_texturing);
        set_bit(&mut raw, TILE_HAS_NAME_MAP, self.has_name_map);
        raw
    }
}

// ---------------------------------------------------------------------------
// Chunk flags
// ---------------------------------------------------------------------------

const CHUNK_HAS_SHADOW: u32 = 0x0001;
const CHUNK_IMPASSABLE: u32 = 0x0002;
const CHUNK_RIVER: u32 = 0x0004;
const CHUNK_OCEAN: u32 = 0x0008;
const CHUNK_MAGMA: u32 = 0x0010;
const CHUNK_SLIME: u32 = 0x0020;
const CHUNK_HAS_VERTEX_COLORS: u32 = 0x0040;
const CHUNK_DO_NOT_FIX_ALPHA: u32 = 0x8000;
const CHUNK_HIGH_RES_HOLES: u32 = 0x1_0000;
const CHUNK_NAMED: u32 = CHUNK_HAS_SHADOW
    | CHUNK_IMPASSABLE
    | CHUNK_RIVER
    | CHUNK_OCEAN
    | CHUNK_MAGMA
    | CHUNK_SLIME
    | CHUNK_HAS_VERTEX_COLORS
    | CHUNK_DO_NOT_FIX_ALPHA
    | CHUNK_HIGH_RES_HOLES;

/// Per-chunk flags word.
///
/// `has_shadow`, `has_vertex_colors` and `high_res_holes` describe which
/// optional blocks are present; the encoder recomputes them from the chunk's
/// contents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunkFlags {
    /// A shadow block is present.
    pub has_shadow: bool,
    /// Terrain cannot be walked on.
    pub impassable: bool,
    /// Legacy liquid: river.
    pub river: bool,
    /// Legacy liquid: ocean.
    pub ocean: bool,
    /// Legacy liquid: magma.
    pub magma: bool,
    /// Legacy liquid: slime.
    pub slime: bool,
    /// A vertex color block is present.
    pub has_vertex_colors: bool,
    /// Alpha maps are stored at full 64×64 without edge fix-up.
    pub do_not_fix_alpha_map: bool,
    /// The hole mask uses the 8×8 layout.
    pub high_res_holes: bool,
    /// Unnamed bits, preserved verbatim.
    pub other: u32,
}

impl ChunkFlags {
    /// Unpacks a raw flags word.
    pub fn unpack(raw: u32) -> Self {
        Self {
            has_shadow: raw & CHUNK_HAS_SHADOW != 0,
            impassable: raw & CHUNK_IMPASSABLE != 0,
            river: raw & CHUNK_RIVER != 0,
            ocean: raw & CHUNK_OCEAN != 0,
            magma: raw & CHUNK_MAGMA != 0,
            slime: raw & CHUNK_SLIME != 0,
            has_vertex_colors: raw & CHUNK_HAS_VERTEX_COLORS != 0,
            do_not_fix_alpha_map: raw & CHUNK_DO_NOT_FIX_ALPHA != 0,
            high_res_holes: raw & CHUNK_HIGH_RES_HOLES != 0,
            other: raw & !CHUNK_NAMED,
        }
    }

    /// Packs the flags back into a raw word.
    pub fn pack(&self) -> u32 {
        let mut raw = self.other & !CHUNK_NAMED;
        set_bit(&mut raw, CHUNK_HAS_SHADOW, self.has_shadow);
        set_bit(&mut raw, CHUNK_IMPASSABLE, self.impassable);
        set_bit(&mut raw, CHUNK_RIVER, self.river);
        set_bit(&mut raw, CHUNK_OCEAN, self.ocean);
        set_bit(&mut raw, CHUNK_MAGMA, self.magma);
        set_bit(&mut raw, CHUNK_SLIME, self.slime);
        set_bit(&mut raw, CHUNK_HAS_VERTEX_COLORS, self.has_vertex_colors);
        set_bit(&mut raw, CHUNK_DO_NOT_FIX_ALPHA, self.do_not_fix_alpha_map);
        set_bit(&mut raw, CHUNK_HIGH_RES_HOLES, self.high_res_holes);
        raw
    }

    /// Returns `true` if any legacy liquid type bit is set.
    pub fn has_legacy_liquid(&self) -> bool {
        self.river || self.ocean || self.magma || self.slime
    }

    /// Clears all legacy liquid type bits.
    pub fn clear_legacy_liquid(&mut self) {
        self.river = false;
        self.ocean = false;
        self.magma = false;
        self.slime = false;
    }
}

// ---------------------------------------------------------------------------
// Layer flags
// ---------------------------------------------------------------------------

const LAYER_ROTATION_MASK: u32 = 0x0007;
const LAYER_SPEED_SHIFT: u32 = 3;
const LAYER_SPEED_MASK: u32 = 0x0038;
const LAYER_ANIMATED: u32 = 0x0040;
const LAYER_OVERBRIGHT: u32 = 0x0080;
const LAYER_USE_ALPHA: u32 = 0x0100;
const LAYER_ALPHA_COMPRESSED: u32 = 0x0200;
const LAYER_CUBE_MAP_REFLECTION: u32 = 0x0400;
const LAYER_NAMED: u32 = LAYER_ROTATION_MASK
    | LAYER_SPEED_MASK
    | LAYER_ANIMATED
    | LAYER_OVERBRIGHT
    | LAYER_USE_ALPHA
    | LAYER_ALPHA_COMPRESSED
    | LAYER_CUBE_MAP_REFLECTION;

/// Texture layer flags.
///
/// `use_alpha_map` and `alpha_compressed` mirror the layer's alpha map and the
/// encode-time alpha format; the encoder rewrites both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayerFlags {
    /// Animation direction in 45° steps (0–7).
    pub rotation: u8,
    /// Animation speed (0–7).
    pub speed: u8,
    /// Texture animation is enabled.
    pub animated: bool,
    /// Overbright rendering (glowing lava and similar).
    pub overbright: bool,
    /// The layer blends through an alpha map.
    pub use_alpha_map: bool,
    /// The alpha map is run-length compressed.
    pub alpha_compressed: bool,
    /// The layer reflects the sky cube map.
    pub cube_map_reflection: bool,
    /// Unnamed bits, preserved verbatim.
    pub other: u32,
}

impl LayerFlags {
    /// Unpacks a raw flags word.
    pub fn unpack(raw: u32) -> Self {
        Self {
            rotation: (raw & LAYER_ROTATION_MASK) as u8,
            speed: ((raw & LAYER_SPEED_MASK) >> LAYER_SPEED_SHIFT) as u8,
            animated: raw & LAYER_ANIMATED != 0,
            overbright: raw & LAYER_OVERBRIGHT != 0,
            use_alpha_map: raw & LAYER_USE_ALPHA != 0,
            alpha_compressed: raw & LAYER_ALPHA_COMPRESSED != 0,
            cube_map_reflection: raw & LAYER_CUBE_MAP_REFLECTION != 0,
            other: raw & !LAYER_NAMED,
        }
    }

    /// Packs the flags back into a raw word. Rotation and speed are masked to 3 bits.
    pub fn pack(&self) -> u32 {
        let mut raw = self.other & !LAYER_NAMED;
        raw |= u32::from(self.rotation) & LAYER_ROTATION_MASK;
        raw |= (u32::from(self.speed) << LAYER_SPEED_SHIFT) & LAYER_SPEED_MASK;
        set_bit(&mut raw, LAYER_ANIMATED, self.animated);
        set_bit(&mut raw, LAYER_OVERBRIGHT, self.overbright);
        set_bit(&mut raw, LAYER_USE_ALPHA, self.use_alpha_map);
        set_bit(&mut raw, LAYER_ALPHA_COMPRESSED, self.alpha_compressed);
        set_bit(&mut raw, LAYER_CUBE_MAP_REFLECTION, self.cube_map_reflection);
        raw
    }
}

// ---------------------------------------------------------------------------
// Legacy liquid tile flags
// ---------------------------------------------------------------------------

const TILE_LIQUID_TYPE_MASK: u8 = 0x07;
const TILE_DONT_RENDER: u8 = 0x08;
const TILE_UNKNOWN_0X10: u8 = 0x10;
const TILE_UNKNOWN_0X20: u8 = 0x20;
const TILE_FISHABLE: u8 = 0x40;
const TILE_FATIGUE: u8 = 0x80;

/// One cell of the legacy 8×8 liquid tile grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LiquidTileFlags {
    /// Liquid type (3 bits); the low two bits give the basic kind.
    pub liquid_type: u8,
    /// The cell is not rendered.
    pub dont_render: bool,
    /// Unnamed bit 0x10.
    pub unknown_0x10: bool,
    /// Unnamed bit 0x20.
    pub unknown_0x20: bool,
    /// Fishing is possible in this cell.
    pub fishable: bool,
    /// Swimming here causes fatigue.
    pub fatigue: bool,
}

impl LiquidTileFlags {
    /// Unpacks a raw tile byte.
    pub fn unpack(raw: u8) -> Self {
        Self {
            liquid_type: raw & TILE_LIQUID_TYPE_MASK,
            dont_render: raw & TILE_DONT_RENDER != 0,
            unknown_0x10: raw & TILE_UNKNOWN_0X10 != 0,
            unknown_0x20: raw & TILE_UNKNOWN_0X20 != 0,
            fishable: raw & TILE_FISHABLE != 0,
            fatigue: raw & TILE_FATIGUE != 0,
        }
    }

    /// Packs the tile back into a byte.
    pub fn pack(&self) -> u8 {
        let mut raw = self.liquid_type & TILE_LIQUID_TYPE_MASK;
        for (bit, on) in [
            (TILE_DONT_RENDER, self.dont_render),
            (TILE_UNKNOWN_0X10, self.unknown_0x10),
            (TILE_UNKNOWN_0X20, self.unknown_0x20),
            (TILE_FISHABLE, self.fishable),
            (TILE_FATIGUE, self.fatigue),
        ] {
            if on {
                raw |= bit;
            }
        }
        raw
    }
}

// ---------------------------------------------------------------------------
// Texture flags
// ---------------------------------------------------------------------------

const TEXTURE_USE_CUBE_MAP: u32 = 0x0001;

/// Per-texture flags from the optional texture-flag table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextureFlags {
    /// The texture is sampled as an environment cube map.
    pub use_cube_map: bool,
    /// Unnamed bits, preserved verbatim.
    pub other: u32,
}

impl TextureFlags {
    /// Unpacks a raw flags word.
    pub fn unpack(raw: u32) -> Self {
        Self {
            use_cube_map: raw & TEXTURE_USE_CUBE_MAP != 0,
            other: raw & !TEXTURE_USE_CUBE_MAP,
        }
    }

    /// Packs the flags back into a raw word.
    pub fn pack(&self) -> u32 {
        let mut raw = self.other & !TEXTURE_USE_CUBE_MAP;
        set_bit(&mut raw, TEXTURE_USE_CUBE_MAP, self.use_cube_map);
        raw
    }
}

fn set_bit(raw: &mut u32, bit: u32, on: bool) {
    if on {
        *raw |= bit;
    } else {
        *raw &= !bit;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
