use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

/// Scale applied to radians before orientation angles are reported.
///
/// Truncated from -180/pi; kept so reported values match existing recordings.
pub const DEFAULT_DEGREES_SCALE: f32 = -57.0;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Complementary filter configuration.
    pub fusion: FusionConfig,
    /// Where sensor samples come from.
    pub source: SourceConfig,
}

impl AppConfig {
    /// Parse and validate a TOML document. Missing sections fall back to defaults.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let alpha = self.fusion.alpha;
        ensure!(
            alpha.is_finite() && (0.0..=1.0).contains(&alpha),
            "fusion.alpha must be within [0, 1], got {alpha}"
        );
        ensure!(
            self.fusion.degrees_scale.is_finite(),
            "fusion.degrees_scale must be finite"
        );
        ensure!(
            self.source.print_interval_ms > 0,
            "source.print_interval_ms must be positive"
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Weight of the gyro trajectory in the blend. Higher = smoother, slower drift correction.
    pub alpha: f32,
    /// Radians-to-degrees factor applied to every reported angle.
    pub degrees_scale: f32,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            alpha: 0.995,
            degrees_scale: DEFAULT_DEGREES_SCALE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// TCP address of a sensor bridge streaming sample lines.
    pub address: String,
    /// How often the app logs the latest fused orientation.
    pub print_interval_ms: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:5555".to_string(),
            print_interval_ms: 250,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.fusion.alpha, 0.995);
        assert_eq!(config.fusion.degrees_scale, -57.0);
        assert_eq!(config.source.address, "127.0.0.1:5555");
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config = AppConfig::from_toml("[fusion]\nalpha = 0.98\n").unwrap();
        assert!((config.fusion.alpha - 0.98).abs() < 1e-6);
        assert_eq!(config.fusion.degrees_scale, DEFAULT_DEGREES_SCALE);
        assert_eq!(config.source.print_interval_ms, 250);
    }

    #[test]
    fn rejects_alpha_out_of_range() {
        assert!(AppConfig::from_toml("[fusion]\nalpha = 1.5\n").is_err());
        assert!(AppConfig::from_toml("[fusion]\nalpha = -0.1\n").is_err());
    }

    #[test]
    fn rejects_zero_print_interval() {
        assert!(AppConfig::from_toml("[source]\nprint_interval_ms = 0\n").is_err());
    }

    #[test]
    fn pretty_output_parses_back() {
        let mut config = AppConfig::default();
        config.source.address = "10.0.0.7:6000".into();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed = AppConfig::from_toml(&text).unwrap();
        assert_eq!(parsed.source.address, "10.0.0.7:6000");
    }
}
