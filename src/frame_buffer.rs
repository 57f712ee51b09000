//! Multi-frame container addressed by (channel, slice).

use std::collections::HashMap;

use tracing::debug;

use crate::{FrameError, FrameResult, PixelBuffer};

/// Pack a (channel, slice) pair into a slot key.
///
/// Slice occupies the high half, channel the low half, so every pair in
/// the u16 x u16 range maps to a distinct key.
#[inline]
pub fn slot_key(channel: u16, slice: u16) -> u32 {
    (u32::from(slice) << 16) | u32::from(channel)
}

/// A set of equally sized [`PixelBuffer`]s, one per (channel, slice) slot.
///
/// Slots are created on first write and only destroyed by [`clear`] or
/// [`resize`].
///
/// [`clear`]: FrameBuffer::clear
/// [`resize`]: FrameBuffer::resize
#[derive(Clone, Debug, Default)]
pub struct FrameBuffer {
    width: usize,
    height: usize,
    depth: usize,
    slots: HashMap<u32, PixelBuffer>,
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize, depth: usize) -> Self {
        FrameBuffer {
            width,
            height,
            depth,
            slots: HashMap::new(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn contains(&self, channel: u16, slice: u16) -> bool {
        self.slots.contains_key(&slot_key(channel, slice))
    }

    /// Drop every slot and adopt new dimensions.
    pub fn resize(&mut self, width: usize, height: usize, depth: usize) {
        self.clear();
        self.width = width;
        self.height = height;
        self.depth = depth;
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Ensure a slot exists for every pair in `0..channels` x `0..slices`.
    /// Existing slots keep their contents.
    pub fn preallocate(&mut self, channels: u16, slices: u16) {
        for slice in 0..slices {
            for channel in 0..channels {
                self.slot_mut(channel, slice);
            }
        }
    }

    /// Copy `img` into the slot, creating it if needed.
    ///
    /// `img` must match this buffer's dimensions.
    pub fn set_image(&mut self, channel: u16, slice: u16, img: &PixelBuffer) -> FrameResult<()> {
        if img.width() != self.width || img.height() != self.height || img.depth() != self.depth {
            return Err(FrameError::IncompatibleBuffer);
        }
        self.slot_mut(channel, slice).copy_from(img);
        Ok(())
    }

    /// Copy raw bytes into the slot, creating it if needed.
    pub fn set_pixels(&mut self, channel: u16, slice: u16, pixels: &[u8]) -> FrameResult<()> {
        let needed = self.width * self.height * self.depth;
        if pixels.len() < needed {
            return Err(FrameError::OutOfBounds(needed, pixels.len()));
        }
        self.slot_mut(channel, slice).set_pixels(pixels)
    }

    /// Copy the slot into `out`. Returns `false` if the slot was never written.
    pub fn get_image(&self, channel: u16, slice: u16, out: &mut PixelBuffer) -> bool {
        match self.slots.get(&slot_key(channel, slice)) {
            Some(img) => {
                out.copy_from(img);
                true
            }
            None => false,
        }
    }

    pub fn get_pixels(&self, channel: u16, slice: u16) -> Option<&[u8]> {
        self.slots
            .get(&slot_key(channel, slice))
            .map(PixelBuffer::pixels)
    }

    fn slot_mut(&mut self, channel: u16, slice: u16) -> &mut PixelBuffer {
        let (w, h, d) = (self.width, self.height, self.depth);
        self.slots.entry(slot_key(channel, slice)).or_insert_with(|| {
            debug!(channel, slice, width = w, height = h, depth = d, "creating frame slot");
            PixelBuffer::with_size(w, h, d)
        })
    }
}
