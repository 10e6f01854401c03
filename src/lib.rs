//! # percent-body
//!
//! Body measurement estimation from a single front-facing photo.
//!
//! This crate provides:
//! - **Scale Calibration**: centimeters-per-pixel from the interpupillary distance
//!   or a standard-size reference sheet
//! - **Landmark Resolution**: picks trusted shoulder and hip landmarks, falling back
//!   to a provider-specific keypoint layout when names are missing or unreliable
//! - **Measurements**: chest, waist and hip circumference plus torso length
//! - **Sizing**: maps measurements onto a garment size chart
//!
//! Landmark detection itself happens elsewhere: any pose model that reports named
//! 2D points with confidence scores can feed a [`LandmarkSet`].
//!
//! ## Algorithm Overview
//!
//! 1. Measure a reference of known size in pixels and derive the image scale
//! 2. Resolve the four torso landmarks (by name, then by raw index)
//! 3. Measure shoulder and hip widths, estimate the waist line between them
//! 4. Convert widths to circumferences with an empirical correction factor
//! 5. Optionally look the centimeter values up in a size chart
//!
//! ## Quick Start
//!
//! ```rust
//! use percent_body::{Landmark, LandmarkSet, Pipeline, ReferenceKind};
//!
//! let landmarks: LandmarkSet = vec![
//!     Landmark::new("left_eye", 170.0, 40.0).with_score(0.95),
//!     Landmark::new("right_eye", 233.0, 40.0).with_score(0.95),
//!     Landmark::new("left_shoulder", 100.0, 100.0).with_score(0.9),
//!     Landmark::new("right_shoulder", 300.0, 100.0).with_score(0.9),
//!     Landmark::new("left_hip", 120.0, 300.0).with_score(0.9),
//!     Landmark::new("right_hip", 280.0, 300.0).with_score(0.9),
//! ]
//! .into_iter()
//! .collect();
//!
//! let assessment = Pipeline::default()
//!     .run(&landmarks, ReferenceKind::Interpupillary)
//!     .unwrap();
//!
//! let m = &assessment.measurement;
//! println!("chest {:.2} {}", m.chest, m.unit);
//! println!("size {}", assessment.size);
//! ```
//!
//! ## Custom Providers
//!
//! Providers enumerate keypoints differently. Inject the raw index of each torso
//! role so unnamed or low-confidence output can still be used:
//!
//! ```rust
//! use percent_body::{FallbackIndexMap, LandmarkResolver, ResolverConfig};
//!
//! let resolver = LandmarkResolver::new(
//!     ResolverConfig::default().with_fallback_indices(FallbackIndexMap::blazepose33()),
//! )?;
//! # let _ = resolver;
//! # Ok::<(), percent_body::Error>(())
//! ```

pub mod calibration;
pub mod config;
mod error;
pub mod measurement;
pub mod pipeline;
pub mod resolver;
pub mod sizing;
mod types;

pub use calibration::{CalibrationConfig, Calibrator, ReferenceKind, ScaleFactor};
pub use config::Config;
pub use error::{Error, Result};
pub use measurement::{
    Keypoints, LengthUnit, MeasurementConfig, MeasurementEngine, MeasurementResult,
    RawMeasurements,
};
pub use pipeline::{Assessment, Pipeline};
pub use resolver::{
    FallbackIndexMap, LandmarkResolver, LandmarkSource, ResolvedLandmark, ResolvedTorso,
    ResolverConfig, TorsoRole,
};
pub use sizing::{SizeBand, SizeChart, SizeLabel};
pub use types::{Landmark, LandmarkSet, Point};
