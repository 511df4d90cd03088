//! Flight bounds: the height planes that cap and floor flying over a tile.
//!
//! Present only when header flag `0x1` is set. The block is 36 bytes: a 3×3
//! grid of `i16` maximum heights followed by a 3×3 grid of `i16` minimum
//! heights, both row-major.

use crate::error::DecodeError;
use crate::io::{BlockBuilder, Region};

/// Size of the flight-bounds block in bytes.
pub const FLIGHT_BOUNDS_SIZE: usize = 36;

/// Samples along one side of a flight-bounds plane.
pub const FLIGHT_BOUNDS_SIDE: usize = 3;

/// Upper and lower flight planes for a tile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlightBounds {
    pub max: [[i16; FLIGHT_BOUNDS_SIDE]; FLIGHT_BOUNDS_SIDE],
    pub min: [[i16; FLIGHT_BOUNDS_SIDE]; FLIGHT_BOUNDS_SIDE],
}

impl FlightBounds {
    /// Both planes flat at the given heights.
    pub fn flat(max: i16, min: i16) -> Self {
        Self {
            max: [[max; FLIGHT_BOUNDS_SIDE]; FLIGHT_BOUNDS_SIDE],
            min: [[min; FLIGHT_BOUNDS_SIDE]; FLIGHT_BOUNDS_SIDE],
        }
    }
}

pub(crate) fn decode_flight_bounds(block: Region<'_>) -> Result<FlightBounds, DecodeError> {
    let mut c = block.cursor();
    let mut bounds = FlightBounds::default();
    for plane in [&mut bounds.max, &mut bounds.min] {
        for value in plane.iter_mut().flatten() {
            *value = c.u16()? as i16;
        }
    }
    Ok(bounds)
}

pub(crate) fn encode_flight_bounds(bounds: &FlightBounds) -> Vec<u8> {
    let mut out = BlockBuilder::with_capacity(FLIGHT_BOUNDS_SIZE);
    for plane in [&bounds.max, &bounds.min] {
        for &value in plane.iter().flatten() {
            out.put_u16(value as u16);
        }
    }
    out.into_inner()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
