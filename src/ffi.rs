//! Foreign function interface.
//!
//! Lets a C or C++ camera adapter own an [`AdapterContext`] through an
//! opaque handle and run the demosaic on its own memory. Functions return
//! `CAMFRAME_OK` or a non-zero status code (see [`FrameError::code`]).

use std::ptr;
use std::slice;

use libc::{c_int, c_uchar, c_uint, size_t};
use tracing::error;

use crate::{
    AdapterContext, BayerPhase, ChannelOrder, ColorConfig, Debayer, FrameError, FrameHeader,
    PixelBuffer, PixelType,
};

pub const CAMFRAME_OK: c_int = 0;
pub const CAMFRAME_ERR_INVALID_PARAM: c_int = 1;
/// `camframe_context_render_color` found no committed frame.
pub const CAMFRAME_NO_FRAME: c_int = -1;

/// Dummy opaque structure, equivalent to AdapterContext.
pub struct CAdapterContext;

// Log with "file:line - " prefix, for more informative error messages.
macro_rules! logerror {
    ($e:expr) => {
        error!("{}:{} - {}", file!(), line!(), $e)
    };
}

fn status(res: Result<(), FrameError>) -> c_int {
    match res {
        Ok(()) => CAMFRAME_OK,
        Err(e) => {
            logerror!(e);
            e.code()
        }
    }
}

fn phase_from_c(phase: c_uint) -> Option<BayerPhase> {
    match phase {
        0 => Some(BayerPhase::A),
        1 => Some(BayerPhase::B),
        _ => None,
    }
}

fn order_from_c(order: c_uint) -> Option<ChannelOrder> {
    match order {
        0 => Some(ChannelOrder::Rgb),
        1 => Some(ChannelOrder::Bgr),
        _ => None,
    }
}

unsafe fn context_ref<'a>(ctx: *const CAdapterContext) -> Option<&'a AdapterContext> {
    (ctx as *const AdapterContext).as_ref()
}

/// Allocate a new adapter context using the default colour settings.
///
/// `pixel_type` is a frame-header pixel-type code (1, 2 or 4).
#[no_mangle]
pub extern "C" fn camframe_context_alloc(
    width: c_uint,
    height: c_uint,
    pixel_type: c_uint,
) -> *mut CAdapterContext {
    let pixel_type = match PixelType::from_code(pixel_type) {
        Some(t) => t,
        None => {
            logerror!("bad input parameters");
            return ptr::null_mut();
        }
    };

    let header = FrameHeader::new(width, height, pixel_type);
    match AdapterContext::new(header, ColorConfig::default()) {
        Ok(ctx) => Box::into_raw(Box::new(ctx)) as *mut CAdapterContext,
        Err(e) => {
            logerror!(e);
            ptr::null_mut()
        }
    }
}

/// Free a previously allocated context.
///
/// # Safety
///
/// `ctx` must come from `camframe_context_alloc` and not be used again.
#[no_mangle]
pub unsafe extern "C" fn camframe_context_free(ctx: *mut CAdapterContext) {
    if ctx.is_null() {
        return;
    }
    drop(Box::from_raw(ctx as *mut AdapterContext));
}

/// Copy one raw frame into the context and commit it.
///
/// # Safety
///
/// `ctx` must be a live context and `pixels` must point to `len`
/// readable bytes.
#[no_mangle]
pub unsafe extern "C" fn camframe_context_push_frame(
    ctx: *const CAdapterContext,
    pixels: *const c_uchar,
    len: size_t,
    timestamp_ms: u64,
) -> c_int {
    let ctx = match context_ref(ctx) {
        Some(ctx) if !pixels.is_null() => ctx,
        _ => {
            logerror!("bad input parameters");
            return CAMFRAME_ERR_INVALID_PARAM;
        }
    };

    let src = slice::from_raw_parts(pixels, len);
    status(ctx.push_frame(src, timestamp_ms))
}

/// Demosaic the latest committed frame into `out` as 4-byte pixels.
///
/// # Safety
///
/// `ctx` must be a live context and `out` must point to `out_len`
/// writable bytes.
#[no_mangle]
pub unsafe extern "C" fn camframe_context_render_color(
    ctx: *const CAdapterContext,
    out: *mut c_uchar,
    out_len: size_t,
) -> c_int {
    let ctx = match context_ref(ctx) {
        Some(ctx) if !out.is_null() => ctx,
        _ => {
            logerror!("bad input parameters");
            return CAMFRAME_ERR_INVALID_PARAM;
        }
    };

    let mut rgb = PixelBuffer::new();
    match ctx.render_color(&mut rgb) {
        Ok(Some(_)) => {}
        Ok(None) => return CAMFRAME_NO_FRAME,
        Err(e) => return status(Err(e)),
    }
    if out_len < rgb.len() {
        return status(Err(FrameError::OutOfBounds(rgb.len(), out_len)));
    }

    let dst = slice::from_raw_parts_mut(out, rgb.len());
    dst.copy_from_slice(rgb.pixels());
    CAMFRAME_OK
}

/// One-shot demosaic of 16-bit little-endian samples.
///
/// `phase` is 0 for A, 1 for B; `order` is 0 for RGB, 1 for BGR. `out`
/// receives `width * height * 4` bytes.
///
/// # Safety
///
/// `input` must point to `width * height * 2` readable bytes and `out` to
/// `out_len` writable bytes.
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn camframe_debayer(
    input: *const c_uchar,
    width: size_t,
    height: size_t,
    bit_depth: c_uint,
    phase: c_uint,
    order: c_uint,
    out: *mut c_uchar,
    out_len: size_t,
) -> c_int {
    let (phase, order) = match (phase_from_c(phase), order_from_c(order)) {
        (Some(p), Some(o)) if !input.is_null() && !out.is_null() => (p, o),
        _ => {
            logerror!("bad input parameters");
            return CAMFRAME_ERR_INVALID_PARAM;
        }
    };
    let in_len = match width.checked_mul(height).and_then(|n| n.checked_mul(2)) {
        Some(n) => n,
        None => return status(Err(FrameError::WrongResolution)),
    };

    let mut raw = PixelBuffer::new();
    raw.resize_depth(width, height, 2);
    if let Err(e) = raw.set_pixels(slice::from_raw_parts(input, in_len)) {
        return status(Err(e));
    }

    let mut rgb = PixelBuffer::new();
    if let Err(e) = Debayer::new().process(&mut rgb, &raw, bit_depth, phase, order) {
        return status(Err(e));
    }
    if out_len < rgb.len() {
        return status(Err(FrameError::OutOfBounds(rgb.len(), out_len)));
    }

    slice::from_raw_parts_mut(out, rgb.len()).copy_from_slice(rgb.pixels());
    CAMFRAME_OK
}
