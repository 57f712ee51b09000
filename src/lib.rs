//! Frame storage, frame handoff and Bayer demosaicing for camera adapters.
//!
//! - [`PixelBuffer`]: one 2-D frame with allocation-avoiding resize.
//! - [`FrameBuffer`]: several frames addressed by (channel, slice).
//! - [`DoubleBufferedFrameSource`]: hands frames from a driver callback to
//!   the host thread, recycling driver-owned buffers.
//! - [`Debayer`]: replication or bilinear demosaic to packed 8-bit colour.
//!
//! Only `DoubleBufferedFrameSource` synchronizes internally; the buffer
//! types expect callers to provide their own locking when shared.

extern crate byteorder;
extern crate libc;

pub use bayer::read_samples_u16le;
pub use bayer::BayerPhase;
pub use bayer::ChannelOrder;
pub use bayer::CFA;
pub use config::ColorConfig;
pub use context::AdapterContext;
pub use demosaic::Debayer;
pub use demosaic::Demosaic;
pub use demosaic::OUTPUT_DEPTH;
pub use double_buffer::{
    Acquired, BufferId, BufferMode, CommittedFrame, DoubleBufferedFrameSource, ExternalFrame,
    FrameRef, HeaderId, WriteLease,
};
pub use errcode::FrameError;
pub use errcode::FrameResult;
pub use frame_buffer::{slot_key, FrameBuffer};
pub use header::{FrameHeader, PixelType};
pub use pixel_buffer::PixelBuffer;
pub use raster::RasterMut;

pub mod demosaic;
pub mod ffi;

mod bayer;
mod config;
mod context;
mod double_buffer;
mod errcode;
mod frame_buffer;
mod header;
mod pixel_buffer;
mod raster;
