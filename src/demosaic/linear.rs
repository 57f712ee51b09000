//! Demosaicing using linear interpolation.
//!
//! ```text
//!   blue/red, from the sample s at (x, y):
//!       (x, y)     = s
//!       (x+1, y)   = (s + right) / 2
//!       (x, y+1)   = (s + below) / 2
//!       (x+1, y+1) = (s + right + below + diagonal) / 4
//!
//!   green, from the sample s at (x, y):
//!       (x, y)     = s
//!       (x+1, y)   = (s + right + above-right + below-right) / 4
//! ```
//!
//! Neighbours are the nearest samples of the same colour. Samples beyond
//! the frame read as 0, so the last row and column darken. Writes beyond
//! the frame are dropped.

use crate::demosaic::{chroma_rows, Planes};
use crate::BayerPhase;

struct Mosaic<'a> {
    src: &'a [u16],
    w: usize,
    h: usize,
}

impl Mosaic<'_> {
    /// Sample at (x, y), or 0 outside the frame. `y` may wrap below zero.
    #[inline]
    fn at(&self, x: usize, y: usize) -> u32 {
        if x < self.w && y < self.h {
            u32::from(self.src[y * self.w + x])
        } else {
            0
        }
    }

    #[inline]
    fn put(&self, plane: &mut [u16], x: usize, y: usize, v: u32) {
        if x < self.w && y < self.h {
            plane[y * self.w + x] = v as u16;
        }
    }

    fn chroma(&self, plane: &mut [u16], x: usize, y: usize) {
        let s = self.at(x, y);
        let right = self.at(x + 2, y);
        let below = self.at(x, y + 2);
        let diagonal = self.at(x + 2, y + 2);

        self.put(plane, x, y, s);
        self.put(plane, x + 1, y, (s + right) / 2);
        self.put(plane, x, y + 1, (s + below) / 2);
        self.put(plane, x + 1, y + 1, (s + right + below + diagonal) / 4);
    }

    fn green(&self, plane: &mut [u16], x: usize, y: usize) {
        let s = self.at(x, y);
        let right = self.at(x + 2, y);
        let below = self.at(x + 1, y + 1);
        let above = self.at(x + 1, y.wrapping_sub(1));

        self.put(plane, x, y, s);
        self.put(plane, x + 1, y, (s + right + below + above) / 4);
    }
}

pub(crate) fn run(src: &[u16], w: usize, h: usize, phase: BayerPhase, planes: &mut Planes) {
    let m = Mosaic { src, w, h };
    let (blue_y, red_y) = chroma_rows(phase);

    for y in (blue_y..h).step_by(2) {
        for x in (0..w).step_by(2) {
            m.chroma(&mut planes.b, x, y);
        }
        for x in (1..w).step_by(2) {
            m.green(&mut planes.g, x, y);
        }
    }

    for y in (red_y..h).step_by(2) {
        for x in (1..w).step_by(2) {
            m.chroma(&mut planes.r, x, y);
        }
        for x in (0..w).step_by(2) {
            m.green(&mut planes.g, x, y);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{BayerPhase, ChannelOrder, Debayer, Demosaic, PixelBuffer};

    fn debayer(src: &[u16], w: usize, h: usize, phase: BayerPhase) -> Vec<u8> {
        let mut out = PixelBuffer::new();
        Debayer::with_algorithm(Demosaic::Linear)
            .process_samples(&mut out, src, w, h, 8, phase, ChannelOrder::Rgb)
            .unwrap();
        out.pixels().to_vec()
    }

    #[test]
    fn test_phase_a_2x2() {
        let src = [
            10, 20,
            30, 40 ];

        // Every neighbour outside the frame counts as 0.
        let expected = [
             0, 0,10,0,    0,20, 5,0,
             0,30, 5,0,   40,12, 2,0 ];

        assert_eq!(&debayer(&src, 2, 2, BayerPhase::A)[..], &expected[..]);
    }

    #[test]
    fn test_phase_b_2x2() {
        let src = [
            10, 20,
            30, 40 ];

        // Red 20 at (1, 0), blue 30 at (0, 1). Green at (1, 0) averages 10
        // with the 40 below-right; 40 has nothing to its right.
        let expected = [
             0,10, 0,0,   20,12, 0,0,
             0, 0,30,0,   10,40,15,0 ];

        assert_eq!(&debayer(&src, 2, 2, BayerPhase::B)[..], &expected[..]);
    }

    #[test]
    fn test_flat_field() {
        let buf = debayer(&[100; 16], 4, 4, BayerPhase::A);
        let px = |x: usize, y: usize| &buf[(y * 4 + x) * 4..(y * 4 + x) * 4 + 4];

        for (x, y) in [(1, 1), (2, 1), (1, 2), (2, 2)] {
            assert_eq!(px(x, y), &[100, 100, 100, 0]);
        }
        // Blue at (3, 3) averages one real sample with three outside.
        assert_eq!(px(3, 3), &[100, 50, 25, 0]);
    }

    #[test]
    fn test_gradient_is_interpolated() {
        let src = [
            0, 0, 40, 0,
            0, 0,  0, 0,
            0, 0,  0, 0,
            0, 0,  0, 0 ];

        // Blue 40 at (2, 0) halves into (1, 0) and (2, 1), quarters into
        // (1, 1).
        let buf = debayer(&src, 4, 4, BayerPhase::A);
        assert_eq!(buf[4 + 2], 20);
        assert_eq!(buf[(4 + 2) * 4 + 2], 20);
        assert_eq!(buf[5 * 4 + 2], 10);
        assert_eq!(buf[2 * 4 + 2], 40);
    }
}
