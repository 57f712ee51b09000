//! Owned pixel storage for a single 2-D frame.
//!
//! A [`PixelBuffer`] separates its *logical* size (`width * height *
//! depth`) from its *allocated capacity*. Resizing only reallocates when
//! the new logical size no longer fits, so a camera that toggles between
//! ROIs or binning modes settles on one allocation.

use tracing::debug;

use crate::{FrameError, FrameResult, RasterMut};

/// Raw pixel bytes plus width, height and bytes per pixel.
///
/// Not internally synchronized; share across threads behind a lock.
#[derive(Clone, Debug, Default)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    depth: usize,
    // len() is the allocated capacity, never the logical size.
    data: Vec<u8>,
}

fn logical_size(width: usize, height: usize, depth: usize) -> usize {
    width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(depth))
        .expect("overflow")
}

impl PixelBuffer {
    /// An empty buffer with no allocation.
    pub fn new() -> Self {
        Self::default()
    }

    /// A zero-filled buffer of the given dimensions.
    ///
    /// # Examples
    ///
    /// ```
    /// let buf = camframe::PixelBuffer::with_size(4, 2, 2);
    /// assert_eq!(buf.len(), 16);
    /// assert!(buf.pixels().iter().all(|&b| b == 0));
    /// ```
    pub fn with_size(width: usize, height: usize, depth: usize) -> Self {
        PixelBuffer {
            width,
            height,
            depth,
            data: vec![0; logical_size(width, height, depth)],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Bytes per pixel.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Logical size in bytes.
    pub fn len(&self) -> usize {
        self.width * self.height * self.depth
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Allocated size in bytes. Never decreases.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn pixels(&self) -> &[u8] {
        &self.data[..self.len()]
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        let len = self.len();
        &mut self.data[..len]
    }

    /// Start of the underlying allocation, for identity comparisons.
    pub fn as_ptr(&self) -> *const u8 {
        self.data.as_ptr()
    }

    /// Row view over the logical region.
    pub fn raster_mut(&mut self) -> RasterMut<'_> {
        let (w, h, d) = (self.width, self.height, self.depth);
        RasterMut::new(w, h, d, self.pixels_mut())
    }

    /// Change all three dimensions.
    ///
    /// Reallocates only if the new logical size exceeds the current
    /// capacity. Contents are unspecified afterwards; use [`resize`] when
    /// a zeroed buffer is required.
    ///
    /// [`resize`]: PixelBuffer::resize
    pub fn resize_depth(&mut self, width: usize, height: usize, depth: usize) {
        let size = logical_size(width, height, depth);
        if size > self.data.len() {
            debug!(
                old_capacity = self.data.len(),
                new_capacity = size,
                "reallocating pixel buffer"
            );
            self.data = vec![0; size];
        }

        self.width = width;
        self.height = height;
        self.depth = depth;
    }

    /// Change width and height, keep depth, and zero the logical region.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.resize_depth(width, height, self.depth);
        self.reset();
    }

    /// Copy exactly `len()` bytes from `src`.
    ///
    /// Fails with `OutOfBounds`, leaving the buffer untouched, if `src` is
    /// shorter than the logical region. Extra trailing bytes are ignored.
    pub fn set_pixels(&mut self, src: &[u8]) -> FrameResult<()> {
        let len = self.len();
        if src.len() < len {
            return Err(FrameError::OutOfBounds(len, src.len()));
        }

        self.data[..len].copy_from_slice(&src[..len]);
        Ok(())
    }

    /// Zero the logical region.
    pub fn reset(&mut self) {
        self.pixels_mut().fill(0);
    }

    /// True if width, height and depth all match.
    pub fn compatible(&self, other: &PixelBuffer) -> bool {
        self.width == other.width && self.height == other.height && self.depth == other.depth
    }

    /// Take on `other`'s dimensions if needed, then copy its pixels.
    pub fn copy_from(&mut self, other: &PixelBuffer) {
        if !self.compatible(other) {
            self.resize_depth(other.width, other.height, other.depth);
        }
        self.pixels_mut().copy_from_slice(other.pixels());
    }
}

#[cfg(test)]
mod tests {
    use super::PixelBuffer;
    use crate::FrameError;

    #[test]
    fn test_capacity_monotonic() {
        let mut buf = PixelBuffer::with_size(8, 8, 2);
        let mut last = buf.capacity();

        for &(w, h, d) in &[(4, 4, 2), (16, 16, 1), (2, 2, 4), (32, 8, 2), (1, 1, 1)] {
            buf.resize_depth(w, h, d);
            assert!(buf.capacity() >= last);
            assert!(buf.capacity() >= buf.len());
            last = buf.capacity();
        }
        assert_eq!(last, 32 * 8 * 2);
    }

    #[test]
    fn test_shrink_keeps_allocation() {
        let mut buf = PixelBuffer::with_size(64, 64, 2);
        let ptr = buf.as_ptr();

        buf.resize_depth(32, 32, 2);
        assert_eq!(buf.as_ptr(), ptr);
        buf.resize(64, 32);
        assert_eq!(buf.as_ptr(), ptr);
        buf.resize_depth(64, 64, 2);
        assert_eq!(buf.as_ptr(), ptr);
        assert_eq!(buf.capacity(), 64 * 64 * 2);
    }

    #[test]
    fn test_resize_zero_fills() {
        let mut buf = PixelBuffer::with_size(4, 4, 1);
        buf.pixels_mut().fill(0xAB);

        buf.resize(2, 3);
        assert_eq!(buf.len(), 6);
        assert!(buf.pixels().iter().all(|&b| b == 0));

        buf.pixels_mut().fill(0xCD);
        buf.resize(8, 8);
        assert!(buf.pixels().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_resize_depth_does_not_zero_within_capacity() {
        let mut buf = PixelBuffer::with_size(4, 4, 2);
        buf.pixels_mut().fill(7);

        buf.resize_depth(4, 4, 1);
        assert!(buf.pixels().iter().all(|&b| b == 7));
    }

    #[test]
    fn test_set_pixels() {
        let mut buf = PixelBuffer::with_size(2, 2, 1);
        buf.set_pixels(&[1, 2, 3, 4, 5]).unwrap();
        assert_eq!(buf.pixels(), &[1, 2, 3, 4]);

        match buf.set_pixels(&[9, 9]) {
            Err(FrameError::OutOfBounds(4, 2)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(buf.pixels(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_copy_independent() {
        let mut a = PixelBuffer::new();
        let mut b = PixelBuffer::with_size(3, 2, 2);
        b.pixels_mut().copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);

        a.copy_from(&b);
        assert!(a.compatible(&b));
        assert_eq!(a.pixels(), b.pixels());

        b.pixels_mut().fill(0);
        assert_eq!(a.pixels()[11], 12);
    }

    #[test]
    fn test_clone_is_deep() {
        let mut a = PixelBuffer::with_size(4, 1, 1);
        a.set_pixels(&[1, 2, 3, 4]).unwrap();
        a.resize_depth(2, 1, 1);

        let b = a.clone();
        assert_ne!(a.as_ptr(), b.as_ptr());
        assert_eq!(b.capacity(), a.capacity());
        assert_eq!(b.pixels(), &[1, 2]);

        a.reset();
        assert_eq!(b.pixels(), &[1, 2]);
    }

    #[test]
    fn test_compatible() {
        let a = PixelBuffer::with_size(4, 4, 2);
        assert!(a.compatible(&PixelBuffer::with_size(4, 4, 2)));
        assert!(!a.compatible(&PixelBuffer::with_size(4, 4, 1)));
        assert!(!a.compatible(&PixelBuffer::with_size(2, 8, 2)));
    }
}
