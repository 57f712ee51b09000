//! Frame metadata supplied by the driver alongside each frame.

/// Pixel layout of a frame, identified on the wire by a small code.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum PixelType {
    Mono8,
    #[default]
    Mono16,
    Rgb32,
}

impl PixelType {
    /// Decode a driver pixel-type code.
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(PixelType::Mono8),
            2 => Some(PixelType::Mono16),
            4 => Some(PixelType::Rgb32),
            _ => None,
        }
    }

    pub fn code(self) -> u32 {
        self.bytes_per_pixel() as u32
    }

    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelType::Mono8 => 1,
            PixelType::Mono16 => 2,
            PixelType::Rgb32 => 4,
        }
    }
}

/// Fixed-layout metadata for one captured frame.
///
/// The timestamp is carried as two 32-bit halves, in milliseconds since
/// the Unix epoch.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FrameHeader {
    pub width: u32,
    pub height: u32,
    pub pixel_type: PixelType,
    pub timestamp_high: u32,
    pub timestamp_low: u32,
}

impl FrameHeader {
    pub fn new(width: u32, height: u32, pixel_type: PixelType) -> Self {
        FrameHeader {
            width,
            height,
            pixel_type,
            timestamp_high: 0,
            timestamp_low: 0,
        }
    }

    /// Builder-style timestamp setter.
    pub fn with_timestamp_ms(mut self, ms: u64) -> Self {
        self.set_timestamp_ms(ms);
        self
    }

    pub fn set_timestamp_ms(&mut self, ms: u64) {
        self.timestamp_high = (ms >> 32) as u32;
        self.timestamp_low = ms as u32;
    }

    pub fn timestamp_ms(&self) -> u64 {
        (u64::from(self.timestamp_high) << 32) | u64::from(self.timestamp_low)
    }

    /// Number of bytes a frame described by this header occupies.
    pub fn frame_bytes(&self) -> usize {
        self.width as usize * self.height as usize * self.pixel_type.bytes_per_pixel()
    }
}
