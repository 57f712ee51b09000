//! Frame error codes.

use quick_error::quick_error;

pub type FrameResult<T> = Result<T, FrameError>;

quick_error! {
    #[derive(Debug)]
    pub enum FrameError {
        UnsupportedFormat(bytes_per_pixel: usize) {
            display("Unsupported format: {} bytes per pixel", bytes_per_pixel)
        }

        OutOfBounds(needed: usize, got: usize) {
            display("Out of bounds: need {} bytes, got {}", needed, got)
        }
        WrongResolution {
            display("Wrong resolution")
        }
        WrongDepth(bit_depth: u32) {
            display("Wrong depth: {} bits", bit_depth)
        }
        IncompatibleBuffer {
            display("Buffer dimensions do not match")
        }
        BufferBusy {
            display("Buffer already checked out")
        }
        WrongMode {
            display("Not available in the current buffer mode")
        }

        Config(msg: String) {
            display("Config error: {}", msg)
        }
    }
}

impl FrameError {
    /// Stable status code for hosts that only understand integers.
    pub fn code(&self) -> i32 {
        match *self {
            FrameError::UnsupportedFormat(_) => 2,
            FrameError::OutOfBounds(..) => 3,
            FrameError::WrongResolution => 4,
            FrameError::WrongDepth(_) => 5,
            FrameError::IncompatibleBuffer => 6,
            FrameError::BufferBusy => 7,
            FrameError::WrongMode => 8,
            FrameError::Config(_) => 9,
        }
    }
}

impl From<toml::de::Error> for FrameError {
    fn from(err: toml::de::Error) -> Self {
        FrameError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::FrameError;

    #[test]
    fn test_codes_are_distinct() {
        let errs = [
            FrameError::UnsupportedFormat(1),
            FrameError::OutOfBounds(4, 2),
            FrameError::WrongResolution,
            FrameError::WrongDepth(20),
            FrameError::IncompatibleBuffer,
            FrameError::BufferBusy,
            FrameError::WrongMode,
            FrameError::Config(String::new()),
        ];

        let mut codes: Vec<i32> = errs.iter().map(FrameError::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errs.len());
        assert!(codes.iter().all(|&c| c != 0));
    }

    #[test]
    fn test_display() {
        let e = FrameError::OutOfBounds(16, 8);
        assert_eq!(e.to_string(), "Out of bounds: need 16 bytes, got 8");
    }
}
