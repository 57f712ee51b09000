//! Double-buffered handoff between a camera driver and its consumer.
//!
//! The producer (driver callback or polling loop) either writes into the
//! source's own [`PixelBuffer`] through a [`WriteLease`] (internal mode),
//! or hands over frames that live in driver memory by identity only
//! (external mode). Committing a new external frame moves the previously
//! committed one into a LIFO pool of unused buffers, from which the driver
//! can take buffers back for reuse.
//!
//! # Buffer states
//!
//! Every buffer is in at most one of these states at a time:
//!
//! - checked out to the producer (internal mode only, at most one lease),
//! - committed and visible to the consumer,
//! - pooled in the unused list (external mode only).
//!
//! External buffers are never owned here. A driver that frees a buffer
//! must call [`invalidate_external`] first so no stale id is handed back.
//!
//! [`invalidate_external`]: DoubleBufferedFrameSource::invalidate_external

use std::fmt;
use std::ops::{Deref, DerefMut};

use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, trace, warn};

use crate::{FrameError, FrameHeader, FrameResult, PixelBuffer};

/// Opaque identity of a driver-owned pixel buffer.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct BufferId(u64);

impl BufferId {
    pub const fn new(raw: u64) -> Self {
        BufferId(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Opaque identity of a driver-owned frame header.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct HeaderId(u64);

impl HeaderId {
    pub const fn new(raw: u64) -> Self {
        HeaderId(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Non-owning reference to a frame living in driver memory.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct ExternalFrame {
    pub buffer: BufferId,
    pub header: HeaderId,
}

impl ExternalFrame {
    pub const fn new(buffer: BufferId, header: HeaderId) -> Self {
        ExternalFrame { buffer, header }
    }
}

/// Where the committed frame lives.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FrameRef {
    Internal,
    External(ExternalFrame),
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum BufferMode {
    #[default]
    Internal,
    External,
}

/// Snapshot of the most recent commit.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CommittedFrame {
    pub frame: FrameRef,
    pub header: FrameHeader,
}

#[derive(Debug, Default)]
struct SourceState {
    mode: BufferMode,
    checked_out: bool,
    committed: Option<FrameRef>,
    header: FrameHeader,
    unused: Vec<ExternalFrame>,
}

impl SourceState {
    fn commit(&mut self, frame: FrameRef, header: &FrameHeader) {
        if let Some(FrameRef::External(prev)) = self.committed {
            if FrameRef::External(prev) != frame {
                if self.unused.contains(&prev) {
                    warn!(buffer = prev.buffer.raw(), "superseded buffer already pooled");
                } else {
                    self.unused.push(prev);
                }
            }
        }

        if let FrameRef::External(ext) = frame {
            let before = self.unused.len();
            self.unused.retain(|e| *e != ext);
            if self.unused.len() != before {
                warn!(buffer = ext.buffer.raw(), "committed a buffer that was still pooled");
            }
        }

        self.committed = Some(frame);
        self.header = *header;
        trace!(?frame, timestamp_ms = header.timestamp_ms(), "frame committed");
    }
}

/// Buffer-handoff manager guarded by a single mutex.
///
/// All state transitions happen with the state lock held for the duration
/// of the call; commits are therefore totally ordered and a consumer never
/// observes a half-updated frame/header pair.
pub struct DoubleBufferedFrameSource {
    state: Mutex<SourceState>,
    pixels: Mutex<PixelBuffer>,
}

impl fmt::Debug for DoubleBufferedFrameSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DoubleBufferedFrameSource")
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}

impl Default for DoubleBufferedFrameSource {
    fn default() -> Self {
        Self::new(FrameHeader::default())
    }
}

/// Result of [`DoubleBufferedFrameSource::acquire`].
pub enum Acquired<'a> {
    /// Exclusive write access to the internal buffer.
    Internal(WriteLease<'a>),
    /// External mode: the driver supplies its own buffer.
    External,
}

impl DoubleBufferedFrameSource {
    /// Create a source in internal mode whose buffer matches `header`.
    pub fn new(header: FrameHeader) -> Self {
        let pixels = PixelBuffer::with_size(
            header.width as usize,
            header.height as usize,
            header.pixel_type.bytes_per_pixel(),
        );

        DoubleBufferedFrameSource {
            state: Mutex::new(SourceState {
                header,
                ..SourceState::default()
            }),
            pixels: Mutex::new(pixels),
        }
    }

    pub fn buffer_mode(&self) -> BufferMode {
        self.state.lock().mode
    }

    /// Switch modes. Nothing is reclaimed or freed.
    pub fn set_buffer_mode(&self, mode: BufferMode) {
        let mut st = self.state.lock();
        if st.mode != mode {
            debug!(from = ?st.mode, to = ?mode, "buffer mode changed");
            st.mode = mode;
        }
    }

    /// Resize the internal buffer to match `header`.
    ///
    /// Fails with `BufferBusy` while a lease is out.
    pub fn configure(&self, header: &FrameHeader) -> FrameResult<()> {
        let mut st = self.state.lock();
        if st.checked_out {
            return Err(FrameError::BufferBusy);
        }
        let mut pixels = self.pixels.try_lock().ok_or(FrameError::BufferBusy)?;
        pixels.resize_depth(
            header.width as usize,
            header.height as usize,
            header.pixel_type.bytes_per_pixel(),
        );
        st.header = *header;
        if st.committed == Some(FrameRef::Internal) {
            st.committed = None;
        }
        Ok(())
    }

    /// Check out a buffer for the producer.
    ///
    /// In internal mode this hands out the only [`WriteLease`]; a second
    /// call before the lease is committed or aborted fails with
    /// `BufferBusy`. The previously committed internal frame is withdrawn,
    /// since the lease overwrites it in place. In external mode it is a
    /// no-op.
    pub fn acquire(&self) -> FrameResult<Acquired<'_>> {
        let mut st = self.state.lock();
        if st.mode == BufferMode::External {
            return Ok(Acquired::External);
        }
        if st.checked_out {
            return Err(FrameError::BufferBusy);
        }

        let pixels = self.pixels.try_lock().ok_or(FrameError::BufferBusy)?;
        st.checked_out = true;
        if st.committed == Some(FrameRef::Internal) {
            st.committed = None;
        }
        Ok(Acquired::Internal(WriteLease {
            source: self,
            pixels: Some(pixels),
            header: st.header,
        }))
    }

    /// Publish a frame held in driver memory.
    ///
    /// The previously committed external frame, if different, moves into
    /// the unused pool. The header contents are copied into the source's
    /// own header.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if the source is in internal mode.
    pub fn commit_external(&self, frame: ExternalFrame, header: &FrameHeader) {
        let mut st = self.state.lock();
        debug_assert!(
            st.mode == BufferMode::External,
            "external frame committed in internal mode"
        );
        st.commit(FrameRef::External(frame), header);
    }

    /// Pop the most recently pooled external frame.
    pub fn get_unused_external_buffer(&self) -> Option<ExternalFrame> {
        self.state.lock().unused.pop()
    }

    pub fn unused_count(&self) -> usize {
        self.state.lock().unused.len()
    }

    /// Forget every reference to `buffer` before the driver frees it.
    pub fn invalidate_external(&self, buffer: BufferId) {
        let mut st = self.state.lock();
        st.unused.retain(|e| e.buffer != buffer);
        if let Some(FrameRef::External(ext)) = st.committed {
            if ext.buffer == buffer {
                warn!(buffer = buffer.raw(), "invalidated committed buffer");
                st.committed = None;
            }
        }
    }

    pub fn committed(&self) -> Option<CommittedFrame> {
        let st = self.state.lock();
        st.committed.map(|frame| CommittedFrame {
            frame,
            header: st.header,
        })
    }

    /// Read the committed internal frame.
    ///
    /// Returns `None` if the latest commit is not internal or a lease is
    /// currently out. The state lock is held while `f` runs.
    pub fn read_internal<R>(&self, f: impl FnOnce(&PixelBuffer, &FrameHeader) -> R) -> Option<R> {
        let st = self.state.lock();
        if st.checked_out || st.committed != Some(FrameRef::Internal) {
            return None;
        }
        let pixels = self.pixels.try_lock()?;
        Some(f(&pixels, &st.header))
    }

    fn end_lease(&self, commit: Option<&FrameHeader>) {
        let mut st = self.state.lock();
        match commit {
            Some(header) => {
                debug_assert!(
                    st.mode == BufferMode::Internal,
                    "internal buffer committed in external mode"
                );
                st.commit(FrameRef::Internal, header);
            }
            None => trace!("lease aborted"),
        }
        st.checked_out = false;
    }
}

/// Exclusive write access to the internal buffer.
///
/// Dereferences to the [`PixelBuffer`]. Dropping the lease without
/// calling [`commit`](WriteLease::commit) aborts it.
pub struct WriteLease<'a> {
    source: &'a DoubleBufferedFrameSource,
    pixels: Option<MutexGuard<'a, PixelBuffer>>,
    header: FrameHeader,
}

impl<'a> WriteLease<'a> {
    pub fn header(&self) -> &FrameHeader {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut FrameHeader {
        &mut self.header
    }

    /// Publish the buffer and its header to the consumer.
    pub fn commit(mut self) {
        self.pixels = None;
        self.source.end_lease(Some(&self.header));
    }

    /// Release the buffer without publishing anything.
    pub fn abort(self) {}
}

impl Drop for WriteLease<'_> {
    fn drop(&mut self) {
        // Release the pixel lock before the state so a racing acquire
        // never sees an idle state with the buffer still locked.
        if self.pixels.take().is_some() {
            self.source.end_lease(None);
        }
    }
}

impl Deref for WriteLease<'_> {
    type Target = PixelBuffer;

    fn deref(&self) -> &PixelBuffer {
        self.pixels.as_deref().expect("lease already ended")
    }
}

impl DerefMut for WriteLease<'_> {
    fn deref_mut(&mut self) -> &mut PixelBuffer {
        self.pixels.as_deref_mut().expect("lease already ended")
    }
}
