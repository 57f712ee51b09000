//! Row-oriented views over packed pixel memory.

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Mutable raster over a packed, row-major pixel buffer.
pub struct RasterMut<'a> {
    w: usize,
    h: usize,
    bytes_per_pixel: usize,
    buf: &'a mut [u8],
}

impl<'a> RasterMut<'a> {
    /// Wrap a destination buffer with tightly packed rows.
    ///
    /// # Examples
    ///
    /// ```
    /// const IMG_W: usize = 320;
    /// const IMG_H: usize = 200;
    /// let mut buf = [0; 4 * IMG_W * IMG_H];
    ///
    /// camframe::RasterMut::new(IMG_W, IMG_H, 4, &mut buf);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the buffer is too small for the requested geometry.
    pub fn new(w: usize, h: usize, bytes_per_pixel: usize, buf: &'a mut [u8]) -> Self {
        let row_bytes = w.checked_mul(bytes_per_pixel).expect("overflow");
        assert!(bytes_per_pixel > 0);
        assert!(row_bytes.checked_mul(h).expect("overflow") <= buf.len());

        RasterMut {
            w,
            h,
            bytes_per_pixel,
            buf,
        }
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn height(&self) -> usize {
        self.h
    }

    fn row_bytes(&self) -> usize {
        self.bytes_per_pixel * self.w
    }

    /// Split into independent row slices, top to bottom.
    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut [u8]> + '_ {
        let row_bytes = self.row_bytes();
        self.buf[..row_bytes * self.h].chunks_mut(row_bytes.max(1))
    }

    /// Parallel counterpart of [`rows_mut`](RasterMut::rows_mut).
    #[cfg(feature = "rayon")]
    pub fn par_rows_mut(&mut self) -> impl IndexedParallelIterator<Item = &mut [u8]> + '_ {
        let row_bytes = self.row_bytes();
        self.buf[..row_bytes * self.h].par_chunks_mut(row_bytes.max(1))
    }
}
