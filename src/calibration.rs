//! Real-world scale calibration.
//!
//! A photo is calibrated by measuring, in pixels, something whose physical size is
//! known: the distance between the pupils, or the short edge of a standard sheet
//! held in frame. The ratio gives a centimeters-per-pixel scale for the whole image.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{require_positive, require_unit_interval};
use crate::error::{Error, Result};
use crate::types::{Landmark, LandmarkSet, Point};

/// Average adult interpupillary distance in centimeters.
pub const INTERPUPILLARY_CM: f32 = 6.3;

/// Short edge of an A4 sheet in centimeters.
pub const REFERENCE_SHORT_EDGE_CM: f32 = 21.0;

/// Pixel spans at or below this length are treated as degenerate.
pub const MIN_PIXEL_DISTANCE: f32 = 1e-3;

pub const LEFT_EYE: &str = "left_eye";
pub const RIGHT_EYE: &str = "right_eye";

/// Corner names of the reference rectangle, in winding order.
pub const REFERENCE_CORNERS: [&str; 4] = [
    "reference_top_left",
    "reference_top_right",
    "reference_bottom_right",
    "reference_bottom_left",
];

/// Which object of known size the scale is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    /// Left and right eye landmarks.
    Interpupillary,
    /// Four corners of a standard-size sheet.
    ReferenceRectangle,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interpupillary => write!(f, "interpupillary reference"),
            Self::ReferenceRectangle => write!(f, "reference rectangle"),
        }
    }
}

/// Centimeters represented by one image pixel. Always finite and positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScaleFactor {
    cm_per_pixel: f32,
}

impl ScaleFactor {
    /// Returns `None` unless `cm_per_pixel` is finite and strictly positive.
    pub fn new(cm_per_pixel: f32) -> Option<Self> {
        (cm_per_pixel.is_finite() && cm_per_pixel > 0.0).then_some(Self { cm_per_pixel })
    }

    pub fn cm_per_pixel(&self) -> f32 {
        self.cm_per_pixel
    }

    pub fn to_cm(&self, pixels: f32) -> f32 {
        pixels * self.cm_per_pixel
    }
}

/// Physical reference sizes and acceptance thresholds for calibration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Real-world distance between the pupils (cm).
    pub interpupillary_cm: f32,
    /// Real-world length of the reference sheet's short edge (cm).
    pub reference_short_edge_cm: f32,
    /// Reference landmarks scored below this are treated as not detected.
    pub min_confidence: f32,
    /// Pixel distances at or below this fail as degenerate.
    pub min_pixel_distance: f32,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            interpupillary_cm: INTERPUPILLARY_CM,
            reference_short_edge_cm: REFERENCE_SHORT_EDGE_CM,
            min_confidence: 0.3,
            min_pixel_distance: MIN_PIXEL_DISTANCE,
        }
    }
}

impl CalibrationConfig {
    pub fn with_interpupillary_cm(mut self, cm: f32) -> Self {
        self.interpupillary_cm = cm;
        self
    }

    pub fn with_reference_short_edge_cm(mut self, cm: f32) -> Self {
        self.reference_short_edge_cm = cm;
        self
    }

    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    pub fn validate(&self) -> Result<()> {
        require_positive("calibration.interpupillary_cm", self.interpupillary_cm)?;
        require_positive("calibration.reference_short_edge_cm", self.reference_short_edge_cm)?;
        require_positive("calibration.min_pixel_distance", self.min_pixel_distance)?;
        require_unit_interval("calibration.min_confidence", self.min_confidence)
    }
}

/// Converts a reference measurement into a [`ScaleFactor`].
#[derive(Debug, Clone, Default)]
pub struct Calibrator {
    config: CalibrationConfig,
}

impl Calibrator {
    /// Fails with [`Error::InvalidConfig`] unless every size and threshold is in range.
    pub fn new(config: CalibrationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CalibrationConfig {
        &self.config
    }

    /// Derive the image scale from the given reference.
    ///
    /// # Errors
    ///
    /// * [`Error::NoReferenceDetected`] if a required landmark is missing or
    ///   scored below `min_confidence`.
    /// * [`Error::DegenerateGeometry`] if the measured pixel span is not finite or
    ///   not longer than `min_pixel_distance`.
    pub fn calibrate(&self, landmarks: &LandmarkSet, reference: ReferenceKind) -> Result<ScaleFactor> {
        let (pixels, known_cm) = match reference {
            ReferenceKind::Interpupillary => {
                let left = self.reference_point(landmarks, LEFT_EYE, reference)?;
                let right = self.reference_point(landmarks, RIGHT_EYE, reference)?;
                (left.distance(&right), self.config.interpupillary_cm)
            }
            ReferenceKind::ReferenceRectangle => {
                let mut corners = [Point::new(0.0, 0.0); 4];
                for (corner, name) in corners.iter_mut().zip(REFERENCE_CORNERS) {
                    *corner = self.reference_point(landmarks, name, reference)?;
                }
                // The sheet may be portrait or landscape: the short edge is the
                // shorter of the two edges meeting at the first corner.
                let top = corners[0].distance(&corners[1]);
                let side = corners[1].distance(&corners[2]);
                (top.min(side), self.config.reference_short_edge_cm)
            }
        };

        // Negated comparison so NaN spans are rejected too.
        if !(pixels > self.config.min_pixel_distance) {
            return Err(Error::DegenerateGeometry {
                context: "reference span",
                pixels,
            });
        }

        let scale = ScaleFactor::new(known_cm / pixels).ok_or(Error::DegenerateGeometry {
            context: "reference span",
            pixels,
        })?;

        debug!(
            reference = %reference,
            pixels,
            cm_per_pixel = scale.cm_per_pixel(),
            "calibrated image scale"
        );
        Ok(scale)
    }

    /// Try each reference in order and return the first successful calibration.
    ///
    /// When every reference fails, the error from the last one is returned.
    pub fn calibrate_any(
        &self,
        landmarks: &LandmarkSet,
        references: &[ReferenceKind],
    ) -> Result<ScaleFactor> {
        let mut last_err = Error::InvalidConfig("no calibration reference requested".into());
        for &reference in references {
            match self.calibrate(landmarks, reference) {
                Ok(scale) => return Ok(scale),
                Err(e) => {
                    debug!(reference = %reference, error = %e, "calibration reference rejected");
                    last_err = e;
                }
            }
        }
        Err(last_err)
    }

    fn reference_point(
        &self,
        landmarks: &LandmarkSet,
        name: &str,
        reference: ReferenceKind,
    ) -> Result<Point> {
        landmarks
            .get(name)
            .filter(|l| l.confidence() >= self.config.min_confidence)
            .map(|l: &Landmark| l.point)
            .ok_or(Error::NoReferenceDetected { reference })
    }
}
