//! Body measurements from resolved torso landmarks.
//!
//! Widths are measured between landmark pairs in pixels, converted to centimeters
//! with the calibrated scale, and turned into circumference estimates with an
//! empirical correction factor. There is no waist landmark, so the waist line is
//! placed part-way down the torso and its width is derived from the narrower of
//! the shoulder and hip spans.
//!
//! The correction factors are empirical calibration parameters, not derived
//! quantities; tune them against ground-truth tape measurements.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calibration::{ScaleFactor, MIN_PIXEL_DISTANCE};
use crate::config::{require_positive, require_unit_interval};
use crate::error::{Error, Result};
use crate::resolver::{ResolvedTorso, TorsoRole};
use crate::types::Point;

pub const CM_PER_INCH: f32 = 2.54;

/// Width-to-circumference correction for a front-facing torso.
pub const CIRCUMFERENCE_FACTOR: f32 = 2.2;

/// Waist height as a fraction of the shoulder-to-hip drop.
pub const WAIST_HEIGHT_RATIO: f32 = 0.6;

/// Waist width relative to the narrower of shoulders and hips.
pub const WAIST_WIDTH_FACTOR: f32 = 0.8;

/// f32 holds about seven significant digits.
const MAX_DECIMALS: u32 = 6;

/// Unit of the reported (rounded) measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthUnit {
    Centimeters,
    #[default]
    Inches,
}

impl LengthUnit {
    pub fn from_cm(self, cm: f32) -> f32 {
        match self {
            Self::Centimeters => cm,
            Self::Inches => cm / CM_PER_INCH,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Centimeters => "cm",
            Self::Inches => "in",
        }
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasurementConfig {
    pub circumference_factor: f32,
    pub waist_height_ratio: f32,
    pub waist_width_factor: f32,
    /// Unit of `chest`, `waist`, `hip` and `torso_length` in the result.
    pub unit: LengthUnit,
    /// Decimal places kept in reported values.
    pub decimals: u32,
    /// Shoulder or hip spans at or below this many pixels are degenerate.
    pub min_pixel_distance: f32,
}

impl Default for MeasurementConfig {
    fn default() -> Self {
        Self {
            circumference_factor: CIRCUMFERENCE_FACTOR,
            waist_height_ratio: WAIST_HEIGHT_RATIO,
            waist_width_factor: WAIST_WIDTH_FACTOR,
            unit: LengthUnit::Inches,
            decimals: 2,
            min_pixel_distance: MIN_PIXEL_DISTANCE,
        }
    }
}

impl MeasurementConfig {
    pub fn with_unit(mut self, unit: LengthUnit) -> Self {
        self.unit = unit;
        self
    }

    pub fn with_circumference_factor(mut self, factor: f32) -> Self {
        self.circumference_factor = factor;
        self
    }

    pub fn with_waist(mut self, height_ratio: f32, width_factor: f32) -> Self {
        self.waist_height_ratio = height_ratio;
        self.waist_width_factor = width_factor;
        self
    }

    pub fn with_decimals(mut self, decimals: u32) -> Self {
        self.decimals = decimals;
        self
    }

    pub fn validate(&self) -> Result<()> {
        require_positive("measurement.circumference_factor", self.circumference_factor)?;
        require_positive("measurement.waist_width_factor", self.waist_width_factor)?;
        require_positive("measurement.min_pixel_distance", self.min_pixel_distance)?;
        require_unit_interval("measurement.waist_height_ratio", self.waist_height_ratio)?;
        if self.decimals > MAX_DECIMALS {
            return Err(Error::InvalidConfig(format!(
                "measurement.decimals must be at most {MAX_DECIMALS}, got {}",
                self.decimals
            )));
        }
        Ok(())
    }
}

/// Points needed to draw the measurement lines over the photo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Keypoints {
    pub left_shoulder: Point,
    pub right_shoulder: Point,
    pub left_hip: Point,
    pub right_hip: Point,
    pub waist_left: Point,
    pub waist_right: Point,
}

/// Unrounded intermediate values, always in centimeters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RawMeasurements {
    pub shoulder_width_cm: f32,
    pub hip_width_cm: f32,
    /// Estimated, not measured.
    pub waist_width_cm: f32,
    pub chest_circumference_cm: f32,
    pub waist_circumference_cm: f32,
    pub hip_circumference_cm: f32,
    /// Left shoulder to left hip.
    pub torso_length_cm: f32,
}

/// Measurements for one photo.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementResult {
    /// Unit of `chest`, `waist`, `hip` and `torso_length`.
    pub unit: LengthUnit,
    /// Chest circumference, rounded.
    pub chest: f32,
    /// Waist circumference, rounded.
    pub waist: f32,
    /// Hip circumference, rounded.
    pub hip: f32,
    /// Shoulder-to-hip length, rounded.
    pub torso_length: f32,
    pub keypoints: Keypoints,
    /// Score of the landmark used for each role.
    pub confidence: BTreeMap<TorsoRole, f32>,
    pub raw: RawMeasurements,
}

#[derive(Debug, Clone, Default)]
pub struct MeasurementEngine {
    config: MeasurementConfig,
}

impl MeasurementEngine {
    /// Fails with [`Error::InvalidConfig`] unless every factor is positive and
    /// the waist height lies within the torso.
    pub fn new(config: MeasurementConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MeasurementConfig {
        &self.config
    }

    /// Estimate chest, waist and hip circumference and torso length.
    ///
    /// Fails with [`Error::DegenerateGeometry`] when the shoulder, hip or derived
    /// waist span is too short to measure.
    pub fn measure(&self, torso: &ResolvedTorso, scale: ScaleFactor) -> Result<MeasurementResult> {
        let cfg = &self.config;
        let ls = torso.left_shoulder.point;
        let rs = torso.right_shoulder.point;
        let lh = torso.left_hip.point;
        let rh = torso.right_hip.point;

        let shoulder_px = self.span(ls, rs, "shoulder width")?;
        let hip_px = self.span(lh, rh, "hip width")?;

        let shoulder_mid = ls.midpoint(&rs);
        let hip_mid = lh.midpoint(&rh);
        let waist_y = shoulder_mid.y + (hip_mid.y - shoulder_mid.y) * cfg.waist_height_ratio;
        let waist_px = self.checked_span(shoulder_px.min(hip_px) * cfg.waist_width_factor, "waist width")?;

        let center_x = (ls.x + rs.x + lh.x + rh.x) / 4.0;
        let half = waist_px / 2.0;
        // Keep waist_left on the same side of the image as the left landmarks,
        // whether or not the photo is mirrored.
        let left_is_lower_x = ls.x + lh.x <= rs.x + rh.x;
        let (waist_left, waist_right) = if left_is_lower_x {
            (Point::new(center_x - half, waist_y), Point::new(center_x + half, waist_y))
        } else {
            (Point::new(center_x + half, waist_y), Point::new(center_x - half, waist_y))
        };

        let shoulder_width_cm = scale.to_cm(shoulder_px);
        let hip_width_cm = scale.to_cm(hip_px);
        let waist_width_cm = scale.to_cm(waist_px);
        let raw = RawMeasurements {
            shoulder_width_cm,
            hip_width_cm,
            waist_width_cm,
            chest_circumference_cm: shoulder_width_cm * cfg.circumference_factor,
            waist_circumference_cm: waist_width_cm * cfg.circumference_factor,
            hip_circumference_cm: hip_width_cm * cfg.circumference_factor,
            torso_length_cm: scale.to_cm(ls.distance(&lh)),
        };

        let confidence = TorsoRole::ALL
            .iter()
            .map(|&role| (role, torso.get(role).score))
            .collect();

        let result = MeasurementResult {
            unit: cfg.unit,
            chest: self.report(raw.chest_circumference_cm),
            waist: self.report(raw.waist_circumference_cm),
            hip: self.report(raw.hip_circumference_cm),
            torso_length: self.report(raw.torso_length_cm),
            keypoints: Keypoints {
                left_shoulder: ls,
                right_shoulder: rs,
                left_hip: lh,
                right_hip: rh,
                waist_left,
                waist_right,
            },
            confidence,
            raw,
        };

        debug!(
            shoulder_px,
            hip_px,
            waist_px,
            chest = result.chest,
            waist = result.waist,
            hip = result.hip,
            unit = %result.unit,
            "measured torso"
        );
        Ok(result)
    }

    fn span(&self, a: Point, b: Point, context: &'static str) -> Result<f32> {
        self.checked_span(a.distance(&b), context)
    }

    fn checked_span(&self, pixels: f32, context: &'static str) -> Result<f32> {
        if pixels.is_finite() && pixels > self.config.min_pixel_distance {
            Ok(pixels)
        } else {
            Err(Error::DegenerateGeometry { context, pixels })
        }
    }

    fn report(&self, cm: f32) -> f32 {
        round_to(self.config.unit.from_cm(cm), self.config.decimals)
    }
}

fn round_to(value: f32, decimals: u32) -> f32 {
    let factor = 10f32.powi(decimals as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{LandmarkSource, ResolvedLandmark};
    use proptest::prelude::*;

    fn at(x: f32, y: f32) -> ResolvedLandmark {
        ResolvedLandmark {
            point: Point::new(x, y),
            score: 0.9,
            source: LandmarkSource::Named,
        }
    }

    fn torso(ls: (f32, f32), rs: (f32, f32), lh: (f32, f32), rh: (f32, f32)) -> ResolvedTorso {
        ResolvedTorso {
            left_shoulder: at(ls.0, ls.1),
            right_shoulder: at(rs.0, rs.1),
            left_hip: at(lh.0, lh.1),
            right_hip: at(rh.0, rh.1),
        }
    }

    fn reference_torso() -> ResolvedTorso {
        torso((100.0, 100.0), (300.0, 100.0), (120.0, 300.0), (280.0, 300.0))
    }

    fn scale(cpp: f32) -> ScaleFactor {
        ScaleFactor::new(cpp).unwrap()
    }

    #[test]
    fn reference_scenario_in_inches() {
        let result = MeasurementEngine::default()
            .measure(&reference_torso(), scale(0.1))
            .unwrap();

        assert_eq!(result.unit, LengthUnit::Inches);
        assert!((result.raw.chest_circumference_cm - 44.0).abs() < 1e-4);
        assert!((result.raw.hip_circumference_cm - 35.2).abs() < 1e-4);
        assert!((result.raw.waist_circumference_cm - 28.16).abs() < 1e-4);
        assert_eq!(format!("{:.2}", result.chest), "17.32");
        assert_eq!(format!("{:.2}", result.hip), "13.86");
        assert_eq!(format!("{:.2}", result.waist), "11.09");
    }

    #[test]
    fn centimeter_reporting() {
        let engine =
            MeasurementEngine::new(MeasurementConfig::default().with_unit(LengthUnit::Centimeters)).unwrap();
        let result = engine.measure(&reference_torso(), scale(0.1)).unwrap();

        assert_eq!(format!("{:.2}", result.chest), "44.00");
        assert_eq!(format!("{:.2}", result.waist), "28.16");
        assert_eq!(format!("{:.2}", result.torso_length), "20.10");
    }

    #[test]
    fn waist_line_geometry() {
        let result = MeasurementEngine::default()
            .measure(&reference_torso(), scale(0.1))
            .unwrap();
        let kp = result.keypoints;

        // 60% of the way from y=100 to y=300, 128 px wide, centered on x=200.
        assert!((kp.waist_left.y - 220.0).abs() < 1e-4);
        assert!((kp.waist_right.y - 220.0).abs() < 1e-4);
        assert!((kp.waist_left.x - 136.0).abs() < 1e-4);
        assert!((kp.waist_right.x - 264.0).abs() < 1e-4);
        assert_eq!(kp.left_shoulder, Point::new(100.0, 100.0));
    }

    #[test]
    fn mirrored_photo_keeps_waist_sides() {
        let mirrored = torso((300.0, 100.0), (100.0, 100.0), (280.0, 300.0), (120.0, 300.0));
        let result = MeasurementEngine::default().measure(&mirrored, scale(0.1)).unwrap();
        assert!(result.keypoints.waist_left.x > result.keypoints.waist_right.x);
        assert_eq!(format!("{:.2}", result.waist), "11.09");
    }

    #[test]
    fn confidence_map_covers_all_roles() {
        let mut t = reference_torso();
        t.right_hip.score = 0.42;
        let result = MeasurementEngine::default().measure(&t, scale(0.1)).unwrap();

        assert_eq!(result.confidence.len(), 4);
        assert_eq!(result.confidence[&TorsoRole::RightHip], 0.42);
        assert_eq!(result.confidence[&TorsoRole::LeftShoulder], 0.9);
    }

    #[test]
    fn coincident_shoulders_are_degenerate() {
        let t = torso((200.0, 100.0), (200.0, 100.0), (120.0, 300.0), (280.0, 300.0));
        let err = MeasurementEngine::default().measure(&t, scale(0.1)).unwrap_err();
        assert!(matches!(
            err,
            Error::DegenerateGeometry {
                context: "shoulder width",
                ..
            }
        ));
    }

    #[test]
    fn coincident_hips_are_degenerate() {
        let t = torso((100.0, 100.0), (300.0, 100.0), (200.0, 300.0), (200.0, 300.0));
        assert!(matches!(
            MeasurementEngine::default().measure(&t, scale(0.1)),
            Err(Error::DegenerateGeometry { context: "hip width", .. })
        ));
    }

    #[test]
    fn narrow_waist_estimate_is_degenerate() {
        // 1 px shoulders give a 0.8 px waist, below a 0.9 px floor.
        let config = MeasurementConfig {
            min_pixel_distance: 0.9,
            ..MeasurementConfig::default()
        };
        let t = torso((100.0, 100.0), (101.0, 100.0), (120.0, 300.0), (280.0, 300.0));
        let err = MeasurementEngine::new(config).unwrap().measure(&t, scale(0.1)).unwrap_err();
        assert!(matches!(
            err,
            Error::DegenerateGeometry {
                context: "waist width",
                ..
            }
        ));
    }

    #[test]
    fn rejects_invalid_config() {
        for config in [
            MeasurementConfig::default().with_waist(0.6, 0.0),
            MeasurementConfig::default().with_waist(1.5, 0.8),
            MeasurementConfig::default().with_circumference_factor(-2.2),
            MeasurementConfig::default().with_circumference_factor(f32::NAN),
            MeasurementConfig::default().with_decimals(40),
        ] {
            assert!(matches!(MeasurementEngine::new(config), Err(Error::InvalidConfig(_))));
        }
        assert!(MeasurementEngine::new(MeasurementConfig::default().with_decimals(MAX_DECIMALS)).is_ok());
    }

    #[test]
    fn serializes_roles_by_name() {
        let result = MeasurementEngine::default()
            .measure(&reference_torso(), scale(0.1))
            .unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["unit"], "inches");
        assert!(json["confidence"].get("left_shoulder").is_some());
        assert!(json["keypoints"].get("waist_right").is_some());
    }

    #[test]
    fn rounding() {
        assert_eq!(round_to(17.322_834, 2), 17.32);
        assert_eq!(round_to(11.086_614, 2), 11.09);
        assert_eq!(round_to(2.5, 0), 3.0);
    }

    proptest! {
        #[test]
        fn measure_is_deterministic(
            lsx in 0.0f32..400.0, lsy in 0.0f32..400.0,
            rsx in 500.0f32..900.0, rsy in 0.0f32..400.0,
            lhx in 0.0f32..400.0, lhy in 500.0f32..900.0,
            rhx in 500.0f32..900.0, rhy in 500.0f32..900.0,
            cpp in 0.01f32..1.0,
        ) {
            let t = torso((lsx, lsy), (rsx, rsy), (lhx, lhy), (rhx, rhy));
            let engine = MeasurementEngine::default();
            let first = engine.measure(&t, scale(cpp)).unwrap();
            let second = engine.measure(&t, scale(cpp)).unwrap();
            prop_assert_eq!(&first, &second);
            prop_assert!(first.raw.waist_width_cm <= first.raw.shoulder_width_cm);
            prop_assert!(first.raw.waist_width_cm <= first.raw.hip_width_cm);
        }
    }
}
