//! End-to-end measurement of one photo.

use serde::Serialize;
use tracing::info;

use crate::calibration::{Calibrator, ReferenceKind, ScaleFactor};
use crate::config::Config;
use crate::error::Result;
use crate::measurement::{MeasurementEngine, MeasurementResult};
use crate::resolver::LandmarkResolver;
use crate::sizing::{SizeChart, SizeLabel};
use crate::types::LandmarkSet;

/// Everything derived from one photo's landmarks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    pub scale: ScaleFactor,
    pub measurement: MeasurementResult,
    pub size: SizeLabel,
}

/// Calibrates, resolves, measures and classifies.
///
/// Holds only configuration, so a single pipeline can serve many photos, from
/// several threads, without any per-photo state carried between calls.
#[derive(Debug, Clone)]
pub struct Pipeline {
    calibrator: Calibrator,
    resolver: LandmarkResolver,
    engine: MeasurementEngine,
    chart: SizeChart,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self {
            calibrator: Calibrator::default(),
            resolver: LandmarkResolver::default(),
            engine: MeasurementEngine::default(),
            chart: SizeChart::default(),
        }
    }
}

impl Pipeline {
    pub fn new(config: Config) -> Result<Self> {
        let chart = config.size_chart()?;
        Ok(Self {
            calibrator: Calibrator::new(config.calibration)?,
            resolver: LandmarkResolver::new(config.resolver)?,
            engine: MeasurementEngine::new(config.measurement)?,
            chart,
        })
    }

    pub fn calibrator(&self) -> &Calibrator {
        &self.calibrator
    }

    pub fn resolver(&self) -> &LandmarkResolver {
        &self.resolver
    }

    pub fn engine(&self) -> &MeasurementEngine {
        &self.engine
    }

    pub fn chart(&self) -> &SizeChart {
        &self.chart
    }

    /// Measure one photo using a single calibration reference.
    pub fn run(&self, landmarks: &LandmarkSet, reference: ReferenceKind) -> Result<Assessment> {
        let scale = self.calibrator.calibrate(landmarks, reference)?;
        self.measure_with_scale(landmarks, scale)
    }

    /// Measure one photo, calibrating from the first reference that succeeds.
    pub fn run_any(&self, landmarks: &LandmarkSet, references: &[ReferenceKind]) -> Result<Assessment> {
        let scale = self.calibrator.calibrate_any(landmarks, references)?;
        self.measure_with_scale(landmarks, scale)
    }

    /// Measure one photo with a scale obtained elsewhere.
    pub fn measure_with_scale(&self, landmarks: &LandmarkSet, scale: ScaleFactor) -> Result<Assessment> {
        let torso = self.resolver.resolve(landmarks)?;
        let measurement = self.engine.measure(&torso, scale)?;
        let raw = &measurement.raw;
        let size = self.chart.classify(
            raw.chest_circumference_cm,
            raw.waist_circumference_cm,
            raw.torso_length_cm,
        );

        info!(
            cm_per_pixel = scale.cm_per_pixel(),
            fallback = torso.used_fallback(),
            %size,
            "photo measured"
        );
        Ok(Assessment {
            scale,
            measurement,
            size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::measurement::MeasurementConfig;
    use crate::types::Landmark;

    fn photo() -> LandmarkSet {
        vec![
            Landmark::new("left_eye", 170.0, 40.0).with_score(0.95),
            Landmark::new("right_eye", 233.0, 40.0).with_score(0.95),
            Landmark::new("left_shoulder", 100.0, 100.0).with_score(0.9),
            Landmark::new("right_shoulder", 300.0, 100.0).with_score(0.9),
            Landmark::new("left_hip", 120.0, 300.0).with_score(0.9),
            Landmark::new("right_hip", 280.0, 300.0).with_score(0.9),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn runs_end_to_end() {
        let assessment = Pipeline::default()
            .run(&photo(), ReferenceKind::Interpupillary)
            .unwrap();
        assert!((assessment.scale.cm_per_pixel() - 0.1).abs() < 1e-6);
        assert_eq!(format!("{:.2}", assessment.measurement.chest), "17.32");
        assert_eq!(assessment.size, SizeLabel::Unknown);
    }

    #[test]
    fn errors_are_propagated_typed() {
        let err = Pipeline::default()
            .run(&photo(), ReferenceKind::ReferenceRectangle)
            .unwrap_err();
        assert!(matches!(err, Error::NoReferenceDetected { .. }));

        let eyes_only: LandmarkSet = photo().iter().take(2).cloned().collect();
        let err = Pipeline::default()
            .run(&eyes_only, ReferenceKind::Interpupillary)
            .unwrap_err();
        assert!(matches!(err, Error::InsufficientLandmarks { .. }));
    }

    #[test]
    fn classifies_from_centimeters() {
        // 82 px shoulders and hips at 0.5 cm/px: chest 90.2 cm, waist 72.16 cm,
        // torso length 67 cm. Size S, even though the reported values are inches.
        let set: LandmarkSet = vec![
            Landmark::new("left_shoulder", 100.0, 100.0),
            Landmark::new("right_shoulder", 182.0, 100.0),
            Landmark::new("left_hip", 100.0, 234.0),
            Landmark::new("right_hip", 182.0, 234.0),
        ]
        .into_iter()
        .collect();
        let scale = ScaleFactor::new(0.5).unwrap();
        let assessment = Pipeline::default().measure_with_scale(&set, scale).unwrap();

        let raw = &assessment.measurement.raw;
        assert!((raw.chest_circumference_cm - 90.2).abs() < 1e-3);
        assert!((raw.waist_circumference_cm - 72.16).abs() < 1e-3);
        assert!((raw.torso_length_cm - 67.0).abs() < 1e-3);
        assert_eq!(assessment.size, SizeLabel::S);
    }

    #[test]
    fn rejects_invalid_config() {
        let config = Config::default()
            .with_measurement(MeasurementConfig::default().with_circumference_factor(0.0));
        assert!(matches!(Pipeline::new(config), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn pipeline_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Pipeline>();
    }
}
