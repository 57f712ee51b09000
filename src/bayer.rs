//! Bayer mosaic definitions.

use byteorder::{ByteOrder, LittleEndian};
use serde::Deserialize;

use crate::{FrameError, FrameResult};

/// The 2x2 colour filter array (CFA) pattern of a sensor.
///
/// The sequence of R, G, B describe the colours of the top-left,
/// top-right, bottom-left, and bottom-right pixels in the 2x2 block,
/// in that order.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CFA {
    BGGR,
    GBRG,
    GRBG,
    RGGB,
}

/// Which 2x2 sampling layout the replication demosaic assumes.
///
/// In phase `A` the blue sample sits at (even row, even col) and red at
/// (odd row, odd col). Phase `B` is the same pattern shifted down one
/// row: blue at (odd row, even col), red at (even row, odd col).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BayerPhase {
    A,
    B,
}

/// Byte order of the three colour bytes in packed output.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChannelOrder {
    Rgb,
    Bgr,
}

impl ChannelOrder {
    pub fn swapped(self) -> Self {
        match self {
            ChannelOrder::Rgb => ChannelOrder::Bgr,
            ChannelOrder::Bgr => ChannelOrder::Rgb,
        }
    }
}

impl CFA {
    /// The 2x2 pixel block obtained when moving right 1 column.
    pub fn next_x(self) -> Self {
        match self {
            CFA::BGGR => CFA::GBRG,
            CFA::GBRG => CFA::BGGR,
            CFA::GRBG => CFA::RGGB,
            CFA::RGGB => CFA::GRBG,
        }
    }

    /// The 2x2 pixel block obtained when moving down 1 row.
    pub fn next_y(self) -> Self {
        match self {
            CFA::BGGR => CFA::GRBG,
            CFA::GBRG => CFA::RGGB,
            CFA::GRBG => CFA::BGGR,
            CFA::RGGB => CFA::GBRG,
        }
    }

    /// The pattern seen by a region of interest starting at (`x`, `y`)
    /// on a sensor whose full frame starts with `self`.
    pub fn shifted(self, x: u32, y: u32) -> Self {
        let mut cfa = self;
        if x % 2 == 1 {
            cfa = cfa.next_x();
        }
        if y % 2 == 1 {
            cfa = cfa.next_y();
        }
        cfa
    }

    /// Replication phase and output order that produce `order` for this
    /// physical pattern.
    ///
    /// When the phase's "blue" positions actually carry red samples the
    /// planes come out swapped, so the requested order is flipped to
    /// compensate.
    pub fn replication_params(self, order: ChannelOrder) -> (BayerPhase, ChannelOrder) {
        match self {
            CFA::BGGR => (BayerPhase::A, order),
            CFA::RGGB => (BayerPhase::A, order.swapped()),
            CFA::GRBG => (BayerPhase::B, order),
            CFA::GBRG => (BayerPhase::B, order.swapped()),
        }
    }
}

/// Decode little-endian 16-bit samples from raw sensor bytes.
pub fn read_samples_u16le(src: &[u8], dst: &mut [u16]) -> FrameResult<()> {
    let needed = 2 * dst.len();
    if src.len() < needed {
        return Err(FrameError::OutOfBounds(needed, src.len()));
    }
    LittleEndian::read_u16_into(&src[..needed], dst);
    Ok(())
}
