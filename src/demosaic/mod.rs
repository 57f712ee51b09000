//! Bayer demosaicing.
//!
//! Each algorithm fills three full-resolution colour planes from the
//! mosaic; the planes are then shifted down to 8 bits and packed into a
//! 4-byte-per-pixel buffer.

#[cfg(feature = "rayon")]
use rayon::prelude::*;
use serde::Deserialize;
use tracing::trace;

use crate::bayer::read_samples_u16le;
use crate::{BayerPhase, ChannelOrder, FrameError, FrameResult, PixelBuffer, RasterMut};

mod linear;
mod nearestneighbour;

/// Bytes per pixel of the packed colour output.
pub const OUTPUT_DEPTH: usize = 4;

/// The demosaicing algorithm to use to fill in the missing data.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Demosaic {
    /// Copy each sample into its neighbours.
    #[default]
    NearestNeighbour,
    /// Average the nearest samples of each colour.
    Linear,
}

/// Per-pixel scratch planes, kept between frames of the same size.
#[derive(Debug, Default)]
pub(crate) struct Planes {
    pub(crate) r: Vec<u16>,
    pub(crate) g: Vec<u16>,
    pub(crate) b: Vec<u16>,
}

impl Planes {
    /// Size the planes for `n` pixels and zero them.
    fn prepare(&mut self, n: usize) {
        if self.r.len() != n {
            trace!(pixels = n, "resizing demosaic planes");
            self.r.resize(n, 0);
            self.g.resize(n, 0);
            self.b.resize(n, 0);
        }
        self.r.fill(0);
        self.g.fill(0);
        self.b.fill(0);
    }
}

/// Demosaic with reusable scratch memory.
///
/// Apart from the selected algorithm, holds no state that affects
/// results; reusing one instance across frames only avoids reallocating
/// the intermediate planes.
#[derive(Debug, Default)]
pub struct Debayer {
    algorithm: Demosaic,
    planes: Planes,
    samples: Vec<u16>,
}

impl Debayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_algorithm(algorithm: Demosaic) -> Self {
        Debayer {
            algorithm,
            ..Self::default()
        }
    }

    pub fn algorithm(&self) -> Demosaic {
        self.algorithm
    }

    pub fn set_algorithm(&mut self, algorithm: Demosaic) {
        self.algorithm = algorithm;
    }

    /// Demosaic a 16-bit mosaic held in a [`PixelBuffer`].
    ///
    /// `out` is resized to the input's width and height at 4 bytes per
    /// pixel. On error `out` is left untouched.
    ///
    /// # Examples
    ///
    /// ```
    /// use camframe::{BayerPhase, ChannelOrder, Debayer, PixelBuffer};
    ///
    /// let mut raw = PixelBuffer::with_size(2, 2, 2);
    /// raw.set_pixels(&[0, 1, 0, 2, 0, 3, 0, 4]).unwrap();
    ///
    /// let mut rgb = PixelBuffer::new();
    /// Debayer::new()
    ///     .process(&mut rgb, &raw, 12, BayerPhase::A, ChannelOrder::Rgb)
    ///     .unwrap();
    /// assert_eq!(rgb.depth(), 4);
    /// // Blue sample 0x0100 >> 4; no red or green reaches the corner.
    /// assert_eq!(&rgb.pixels()[..4], &[0, 0, 16, 0]);
    /// ```
    pub fn process(
        &mut self,
        out: &mut PixelBuffer,
        input: &PixelBuffer,
        bit_depth: u32,
        phase: BayerPhase,
        order: ChannelOrder,
    ) -> FrameResult<()> {
        if input.depth() != 2 {
            return Err(FrameError::UnsupportedFormat(input.depth()));
        }
        let shift = check_bit_depth(bit_depth)?;
        let (w, h) = (input.width(), input.height());
        check_resolution(w, h)?;

        self.samples.resize(w * h, 0);
        read_samples_u16le(input.pixels(), &mut self.samples)?;

        out.resize_depth(w, h, OUTPUT_DEPTH);
        run(
            self.algorithm,
            &self.samples,
            w,
            h,
            shift,
            phase,
            order,
            &mut self.planes,
            &mut out.raster_mut(),
        );
        Ok(())
    }

    /// Demosaic samples that are already decoded to `u16`.
    #[allow(clippy::too_many_arguments)]
    pub fn process_samples(
        &mut self,
        out: &mut PixelBuffer,
        samples: &[u16],
        width: usize,
        height: usize,
        bit_depth: u32,
        phase: BayerPhase,
        order: ChannelOrder,
    ) -> FrameResult<()> {
        let shift = check_bit_depth(bit_depth)?;
        check_resolution(width, height)?;
        let n = width * height;
        if samples.len() < n {
            return Err(FrameError::OutOfBounds(2 * n, 2 * samples.len()));
        }

        out.resize_depth(width, height, OUTPUT_DEPTH);
        run(
            self.algorithm,
            &samples[..n],
            width,
            height,
            shift,
            phase,
            order,
            &mut self.planes,
            &mut out.raster_mut(),
        );
        Ok(())
    }
}

#[allow(clippy::too_many_arguments)]
fn run(
    algorithm: Demosaic,
    src: &[u16],
    w: usize,
    h: usize,
    shift: u32,
    phase: BayerPhase,
    order: ChannelOrder,
    planes: &mut Planes,
    dst: &mut RasterMut,
) {
    debug_assert_eq!(src.len(), w * h);
    debug_assert_eq!((dst.width(), dst.height()), (w, h));

    planes.prepare(w * h);
    match algorithm {
        Demosaic::NearestNeighbour => nearestneighbour::run(src, w, h, phase, planes),
        Demosaic::Linear => linear::run(src, w, h, phase, planes),
    }
    pack(planes, w, shift, order, dst);
}

/// First row holding blue samples and first row holding red samples.
fn chroma_rows(phase: BayerPhase) -> (usize, usize) {
    match phase {
        BayerPhase::A => (0, 1),
        BayerPhase::B => (1, 0),
    }
}

/// Shift down to 8 bits, keeping the low byte of out-of-range values.
#[inline]
fn to_u8(v: u16, shift: u32) -> u8 {
    (v >> shift) as u8
}

fn pack_row(row: &mut [u8], r: &[u16], g: &[u16], b: &[u16], shift: u32, order: ChannelOrder) {
    for (i, px) in row.chunks_exact_mut(4).enumerate() {
        let (red, green, blue) = (to_u8(r[i], shift), to_u8(g[i], shift), to_u8(b[i], shift));
        let (c0, c2) = match order {
            ChannelOrder::Rgb => (red, blue),
            ChannelOrder::Bgr => (blue, red),
        };
        px[0] = c0;
        px[1] = green;
        px[2] = c2;
        px[3] = 0;
    }
}

#[cfg(feature = "rayon")]
fn pack(planes: &Planes, w: usize, shift: u32, order: ChannelOrder, dst: &mut RasterMut) {
    dst.par_rows_mut()
        .zip(planes.r.par_chunks(w))
        .zip(planes.g.par_chunks(w))
        .zip(planes.b.par_chunks(w))
        .for_each(|(((row, r), g), b)| pack_row(row, r, g, b, shift, order));
}

#[cfg(not(feature = "rayon"))]
fn pack(planes: &Planes, w: usize, shift: u32, order: ChannelOrder, dst: &mut RasterMut) {
    let rows = planes
        .r
        .chunks(w)
        .zip(planes.g.chunks(w))
        .zip(planes.b.chunks(w));
    for (row, ((r, g), b)) in dst.rows_mut().zip(rows) {
        pack_row(row, r, g, b, shift, order);
    }
}

/// Returns the right shift that brings a `bit_depth` sample to 8 bits.
fn check_bit_depth(bit_depth: u32) -> FrameResult<u32> {
    if (8..=16).contains(&bit_depth) {
        Ok(bit_depth - 8)
    } else {
        Err(FrameError::WrongDepth(bit_depth))
    }
}

fn check_resolution(w: usize, h: usize) -> FrameResult<()> {
    if w == 0 || h == 0 {
        return Err(FrameError::WrongResolution);
    }
    w.checked_mul(h)
        .and_then(|n| n.checked_mul(OUTPUT_DEPTH))
        .map(|_| ())
        .ok_or(FrameError::WrongResolution)
}

#[cfg(test)]
mod tests {
    use super::{Debayer, Demosaic};
    use crate::{BayerPhase, ChannelOrder, FrameError, PixelBuffer};

    fn mosaic(w: usize, h: usize, samples: &[u16]) -> PixelBuffer {
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        let mut buf = PixelBuffer::with_size(w, h, 2);
        buf.set_pixels(&bytes).unwrap();
        buf
    }

    #[test]
    fn test_rejects_8bit_input() {
        let input = PixelBuffer::with_size(4, 4, 1);
        let mut out = PixelBuffer::with_size(3, 3, 1);
        out.pixels_mut().fill(9);

        let res = Debayer::new().process(&mut out, &input, 10, BayerPhase::A, ChannelOrder::Rgb);
        assert!(matches!(res, Err(FrameError::UnsupportedFormat(1))));
        assert_eq!((out.width(), out.height(), out.depth()), (3, 3, 1));
        assert!(out.pixels().iter().all(|&b| b == 9));
    }

    #[test]
    fn test_rejects_bad_bit_depth() {
        let input = mosaic(2, 2, &[0; 4]);
        let mut out = PixelBuffer::new();
        let mut debayer = Debayer::new();

        for depth in [0, 7, 17, 32] {
            let res = debayer.process(&mut out, &input, depth, BayerPhase::A, ChannelOrder::Rgb);
            assert!(matches!(res, Err(FrameError::WrongDepth(d)) if d == depth));
        }
        assert!(out.is_empty());
    }

    #[test]
    fn test_rejects_short_samples() {
        let mut out = PixelBuffer::new();
        let res = Debayer::new().process_samples(
            &mut out,
            &[1, 2, 3],
            2,
            2,
            8,
            BayerPhase::A,
            ChannelOrder::Rgb,
        );
        assert!(matches!(res, Err(FrameError::OutOfBounds(8, 6))));
    }

    #[test]
    fn test_rejects_empty_frame() {
        let mut out = PixelBuffer::new();
        let res =
            Debayer::new().process_samples(&mut out, &[], 0, 4, 8, BayerPhase::B, ChannelOrder::Rgb);
        assert!(matches!(res, Err(FrameError::WrongResolution)));
    }

    #[test]
    fn test_planes_reused_for_same_size() {
        let input = mosaic(4, 2, &[1; 8]);
        let mut out = PixelBuffer::new();
        let mut debayer = Debayer::new();

        debayer
            .process(&mut out, &input, 8, BayerPhase::A, ChannelOrder::Bgr)
            .unwrap();
        let ptrs = (
            debayer.planes.r.as_ptr(),
            debayer.planes.g.as_ptr(),
            debayer.planes.b.as_ptr(),
        );
        let out_ptr = out.as_ptr();

        debayer
            .process(&mut out, &input, 8, BayerPhase::B, ChannelOrder::Rgb)
            .unwrap();
        assert_eq!(
            ptrs,
            (
                debayer.planes.r.as_ptr(),
                debayer.planes.g.as_ptr(),
                debayer.planes.b.as_ptr()
            )
        );
        assert_eq!(out.as_ptr(), out_ptr);
    }

    #[test]
    fn test_algorithm_selection() {
        let input = mosaic(4, 4, &[100; 16]);
        let mut nearest = PixelBuffer::new();
        let mut linear = PixelBuffer::new();
        let mut debayer = Debayer::new();
        assert_eq!(debayer.algorithm(), Demosaic::NearestNeighbour);

        debayer
            .process(&mut nearest, &input, 8, BayerPhase::A, ChannelOrder::Rgb)
            .unwrap();
        debayer.set_algorithm(Demosaic::Linear);
        debayer
            .process(&mut linear, &input, 8, BayerPhase::A, ChannelOrder::Rgb)
            .unwrap();

        // Interior pixels agree on a flat field; the far corner does not,
        // since linear averages in samples beyond the frame edge as 0.
        assert_eq!(&nearest.pixels()[20..24], &linear.pixels()[20..24]);
        assert_ne!(&nearest.pixels()[60..], &linear.pixels()[60..]);
    }
}
