//! Garment size lookup.

use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SizeLabel {
    S,
    M,
    L,
    XL,
    #[serde(rename = "2XL")]
    XXL,
    Unknown,
}

impl fmt::Display for SizeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::S => "S",
            Self::M => "M",
            Self::L => "L",
            Self::XL => "XL",
            Self::XXL => "2XL",
            Self::Unknown => "Unknown",
        })
    }
}

/// Inclusive centimeter ranges a body must fall within for one label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeBand {
    pub label: SizeLabel,
    pub chest_cm: RangeInclusive<f32>,
    pub waist_cm: RangeInclusive<f32>,
    pub length_cm: RangeInclusive<f32>,
}

impl SizeBand {
    pub fn new(
        label: SizeLabel,
        chest_cm: RangeInclusive<f32>,
        waist_cm: RangeInclusive<f32>,
        length_cm: RangeInclusive<f32>,
    ) -> Self {
        Self {
            label,
            chest_cm,
            waist_cm,
            length_cm,
        }
    }

    pub fn contains(&self, chest_cm: f32, waist_cm: f32, length_cm: f32) -> bool {
        self.chest_cm.contains(&chest_cm)
            && self.waist_cm.contains(&waist_cm)
            && self.length_cm.contains(&length_cm)
    }

    fn overlaps(&self, other: &SizeBand) -> bool {
        fn ranges_overlap(a: &RangeInclusive<f32>, b: &RangeInclusive<f32>) -> bool {
            a.start() <= b.end() && b.start() <= a.end()
        }
        ranges_overlap(&self.chest_cm, &other.chest_cm)
            && ranges_overlap(&self.waist_cm, &other.waist_cm)
            && ranges_overlap(&self.length_cm, &other.length_cm)
    }
}

/// The standard men's chart.
pub fn default_bands() -> Vec<SizeBand> {
    vec![
        SizeBand::new(SizeLabel::S, 86.0..=91.0, 71.0..=76.0, 66.0..=69.0),
        SizeBand::new(SizeLabel::M, 96.0..=101.0, 81.0..=86.0, 69.0..=72.0),
        SizeBand::new(SizeLabel::L, 106.0..=111.0, 91.0..=96.0, 72.0..=75.0),
        SizeBand::new(SizeLabel::XL, 116.0..=121.0, 101.0..=106.0, 75.0..=78.0),
        SizeBand::new(SizeLabel::XXL, 127.0..=132.0, 111.0..=116.0, 78.0..=81.0),
    ]
}

/// Ordered table of non-overlapping size bands.
#[derive(Debug, Clone, PartialEq)]
pub struct SizeChart {
    bands: Vec<SizeBand>,
}

impl Default for SizeChart {
    fn default() -> Self {
        Self {
            bands: default_bands(),
        }
    }
}

impl SizeChart {
    /// Build a chart, rejecting empty or inverted ranges and overlapping bands.
    pub fn new(bands: Vec<SizeBand>) -> Result<Self> {
        for band in &bands {
            let ranges = [&band.chest_cm, &band.waist_cm, &band.length_cm];
            if ranges.iter().any(|r| !(r.start() <= r.end())) {
                return Err(Error::InvalidConfig(format!(
                    "size band {} has an empty range",
                    band.label
                )));
            }
        }
        for (i, a) in bands.iter().enumerate() {
            if let Some(b) = bands[i + 1..].iter().find(|b| a.overlaps(b)) {
                return Err(Error::InvalidConfig(format!(
                    "size bands {} and {} overlap",
                    a.label, b.label
                )));
            }
        }
        Ok(Self { bands })
    }

    pub fn bands(&self) -> &[SizeBand] {
        &self.bands
    }

    /// Label of the band containing all three measurements, or
    /// [`SizeLabel::Unknown`] if none does.
    pub fn classify(&self, chest_cm: f32, waist_cm: f32, length_cm: f32) -> SizeLabel {
        self.bands
            .iter()
            .find(|band| band.contains(chest_cm, waist_cm, length_cm))
            .map_or(SizeLabel::Unknown, |band| band.label)
    }
}
