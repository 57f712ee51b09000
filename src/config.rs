//! Colour reconstruction settings.
//!
//! Loaded from TOML, e.g.
//!
//! ```toml
//! cfa = "RGGB"
//! bit_depth = 12
//! order = "BGR"
//! roi_x = 1
//! roi_y = 0
//! auto_mask = true
//! algorithm = "linear"
//! ```
//!
//! Every key is optional.

use serde::Deserialize;

use crate::{BayerPhase, ChannelOrder, Demosaic, FrameError, FrameResult, CFA};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorConfig {
    /// Sensor pattern at the full-frame origin.
    pub cfa: CFA,
    /// Significant bits per sample.
    pub bit_depth: u32,
    /// Requested byte order of the packed output.
    pub order: ChannelOrder,
    pub roi_x: u32,
    pub roi_y: u32,
    /// Shift the pattern to follow the ROI origin.
    pub auto_mask: bool,
    pub algorithm: Demosaic,
}

impl Default for ColorConfig {
    fn default() -> Self {
        ColorConfig {
            cfa: CFA::RGGB,
            bit_depth: 12,
            order: ChannelOrder::Bgr,
            roi_x: 0,
            roi_y: 0,
            auto_mask: true,
            algorithm: Demosaic::NearestNeighbour,
        }
    }
}

impl ColorConfig {
    pub fn from_toml_str(s: &str) -> FrameResult<Self> {
        let config: ColorConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> FrameResult<()> {
        if !(8..=16).contains(&self.bit_depth) {
            return Err(FrameError::Config(format!(
                "bit_depth must be within 8..=16, got {}",
                self.bit_depth
            )));
        }
        Ok(())
    }

    /// The pattern in effect for the current ROI.
    pub fn effective_cfa(&self) -> CFA {
        if self.auto_mask {
            self.cfa.shifted(self.roi_x, self.roi_y)
        } else {
            self.cfa
        }
    }

    /// Phase and output order to pass to the demosaic.
    pub fn resolve(&self) -> (BayerPhase, ChannelOrder) {
        self.effective_cfa().replication_params(self.order)
    }
}

#[cfg(test)]
mod tests {
    use super::ColorConfig;
    use crate::{BayerPhase, ChannelOrder, Demosaic, FrameError, CFA};

    #[test]
    fn test_defaults_from_empty() {
        let config = ColorConfig::from_toml_str("").unwrap();
        assert_eq!(config, ColorConfig::default());
        assert_eq!(config.resolve(), (BayerPhase::A, ChannelOrder::Rgb));
    }

    #[test]
    fn test_parse() {
        let config = ColorConfig::from_toml_str(
            r#"
            cfa = "GRBG"
            bit_depth = 10
            order = "RGB"
            roi_x = 3
            algorithm = "linear"
            "#,
        )
        .unwrap();

        assert_eq!(config.bit_depth, 10);
        assert_eq!(config.algorithm, Demosaic::Linear);
        assert_eq!(config.effective_cfa(), CFA::RGGB);
        assert_eq!(config.resolve(), (BayerPhase::A, ChannelOrder::Bgr));
    }

    #[test]
    fn test_auto_mask_off() {
        let config = ColorConfig {
            cfa: CFA::BGGR,
            roi_y: 1,
            auto_mask: false,
            ..ColorConfig::default()
        };
        assert_eq!(config.effective_cfa(), CFA::BGGR);
    }

    #[test]
    fn test_rejects_bad_bit_depth() {
        assert!(matches!(
            ColorConfig::from_toml_str("bit_depth = 20"),
            Err(FrameError::Config(_))
        ));
    }

    #[test]
    fn test_rejects_unknown_algorithm() {
        assert!(matches!(
            ColorConfig::from_toml_str(r#"algorithm = "smooth_hue""#),
            Err(FrameError::Config(_))
        ));
    }

    #[test]
    fn test_rejects_unknown_key() {
        assert!(matches!(
            ColorConfig::from_toml_str("gamma = 2.2"),
            Err(FrameError::Config(_))
        ));
    }
}
