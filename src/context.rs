//! Per-adapter state shared between the driver and host threads.
//!
//! One [`AdapterContext`] is created when a camera adapter initialises and
//! dropped when it shuts down. Everything the adapter's callbacks need is
//! reached through it rather than through process-wide statics.

use parking_lot::Mutex;
use tracing::debug;

use crate::{
    Acquired, ColorConfig, Debayer, DoubleBufferedFrameSource, FrameError, FrameHeader,
    FrameResult, PixelBuffer,
};

#[derive(Debug)]
pub struct AdapterContext {
    source: DoubleBufferedFrameSource,
    debayer: Mutex<Debayer>,
    config: Mutex<ColorConfig>,
}

impl AdapterContext {
    pub fn new(header: FrameHeader, config: ColorConfig) -> FrameResult<Self> {
        config.validate()?;
        debug!(
            width = header.width,
            height = header.height,
            pixel_type = ?header.pixel_type,
            "adapter context created"
        );

        Ok(AdapterContext {
            source: DoubleBufferedFrameSource::new(header),
            debayer: Mutex::new(Debayer::new()),
            config: Mutex::new(config),
        })
    }

    pub fn source(&self) -> &DoubleBufferedFrameSource {
        &self.source
    }

    pub fn config(&self) -> ColorConfig {
        *self.config.lock()
    }

    pub fn set_config(&self, config: ColorConfig) -> FrameResult<()> {
        config.validate()?;
        *self.config.lock() = config;
        Ok(())
    }

    /// Copy one frame of sensor bytes into the internal buffer and commit it.
    ///
    /// Only valid in internal buffer mode. On error nothing is committed,
    /// and the previous internal frame is no longer readable.
    pub fn push_frame(&self, bytes: &[u8], timestamp_ms: u64) -> FrameResult<()> {
        match self.source.acquire()? {
            Acquired::Internal(mut lease) => {
                lease.set_pixels(bytes)?;
                lease.header_mut().set_timestamp_ms(timestamp_ms);
                lease.commit();
                Ok(())
            }
            Acquired::External => Err(FrameError::WrongMode),
        }
    }

    /// Demosaic the committed internal frame into `out`.
    ///
    /// Returns the frame's header, or `None` if no internal frame is
    /// available to read.
    pub fn render_color(&self, out: &mut PixelBuffer) -> FrameResult<Option<FrameHeader>> {
        let config = self.config();
        let mut debayer = self.debayer.lock();

        self.source
            .read_internal(|raw, header| {
                demosaic(&mut debayer, &config, raw, out).map(|()| *header)
            })
            .transpose()
    }

    /// Demosaic an arbitrary raw frame with the current settings.
    pub fn render_raw(&self, raw: &PixelBuffer, out: &mut PixelBuffer) -> FrameResult<()> {
        let config = self.config();
        demosaic(&mut self.debayer.lock(), &config, raw, out)
    }
}

fn demosaic(
    debayer: &mut Debayer,
    config: &ColorConfig,
    raw: &PixelBuffer,
    out: &mut PixelBuffer,
) -> FrameResult<()> {
    let (phase, order) = config.resolve();
    debayer.set_algorithm(config.algorithm);
    debayer.process(out, raw, config.bit_depth, phase, order)
}
