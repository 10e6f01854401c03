//! Pipeline configuration.
//!
//! Every section has working defaults, so a JSON file only needs the keys it
//! overrides:
//!
//! ```json
//! {
//!   "measurement": { "unit": "centimeters", "circumference_factor": 2.3 },
//!   "resolver": { "fallback_indices": { "left_shoulder": 11, "right_shoulder": 12,
//!                                       "left_hip": 23, "right_hip": 24 } }
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationConfig;
use crate::error::{Error, Result};
use crate::measurement::MeasurementConfig;
use crate::resolver::ResolverConfig;
use crate::sizing::{default_bands, SizeBand, SizeChart};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub calibration: CalibrationConfig,
    pub resolver: ResolverConfig,
    pub measurement: MeasurementConfig,
    pub size_chart: Vec<SizeBand>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            calibration: CalibrationConfig::default(),
            resolver: ResolverConfig::default(),
            measurement: MeasurementConfig::default(),
            size_chart: default_bands(),
        }
    }
}

impl Config {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn with_calibration(mut self, calibration: CalibrationConfig) -> Self {
        self.calibration = calibration;
        self
    }

    pub fn with_resolver(mut self, resolver: ResolverConfig) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_measurement(mut self, measurement: MeasurementConfig) -> Self {
        self.measurement = measurement;
        self
    }

    pub fn with_size_chart(mut self, bands: Vec<SizeBand>) -> Self {
        self.size_chart = bands;
        self
    }

    /// Check every section and build the size chart once to validate it.
    pub fn validate(&self) -> Result<()> {
        self.calibration.validate()?;
        self.resolver.validate()?;
        self.measurement.validate()?;
        self.size_chart()?;
        Ok(())
    }

    pub fn size_chart(&self) -> Result<SizeChart> {
        SizeChart::new(self.size_chart.clone())
    }
}

pub(crate) fn require_positive(key: &str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!("{key} must be positive, got {value}")))
    }
}

pub(crate) fn require_unit_interval(key: &str, value: f32) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!("{key} must be within [0, 1], got {value}")))
    }
}
