//! Torso landmark resolution.
//!
//! Providers disagree on naming and ordering, and on hard photos they return
//! low-confidence points. The resolver picks one trusted landmark for each of the
//! four torso roles, first by canonical name and then by the provider's raw
//! keypoint index, and refuses to answer unless all four are found.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::require_unit_interval;
use crate::error::{Error, Result};
use crate::types::{Landmark, LandmarkSet, Point};

/// The four landmarks every torso measurement is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TorsoRole {
    LeftShoulder,
    RightShoulder,
    LeftHip,
    RightHip,
}

impl TorsoRole {
    pub const ALL: [TorsoRole; 4] = [
        TorsoRole::LeftShoulder,
        TorsoRole::RightShoulder,
        TorsoRole::LeftHip,
        TorsoRole::RightHip,
    ];

    /// Canonical landmark name for this role.
    pub const fn name(self) -> &'static str {
        match self {
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
        }
    }
}

impl fmt::Display for TorsoRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Provider-specific raw keypoint index for each role.
///
/// This is the only place a provider's output layout is known; swap the map to
/// support a different pose model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FallbackIndexMap(BTreeMap<TorsoRole, usize>);

impl FallbackIndexMap {
    /// No positional fallback; only named landmarks are used.
    pub fn empty() -> Self {
        Self::default()
    }

    /// COCO 17-keypoint layout (MoveNet, YOLO pose).
    pub fn coco17() -> Self {
        Self::from_pairs([
            (TorsoRole::LeftShoulder, 5),
            (TorsoRole::RightShoulder, 6),
            (TorsoRole::LeftHip, 11),
            (TorsoRole::RightHip, 12),
        ])
    }

    /// BlazePose 33-keypoint layout.
    pub fn blazepose33() -> Self {
        Self::from_pairs([
            (TorsoRole::LeftShoulder, 11),
            (TorsoRole::RightShoulder, 12),
            (TorsoRole::LeftHip, 23),
            (TorsoRole::RightHip, 24),
        ])
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (TorsoRole, usize)>) -> Self {
        Self(pairs.into_iter().collect())
    }

    pub fn get(&self, role: TorsoRole) -> Option<usize> {
        self.0.get(&role).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Thresholds and provider layout for resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Landmarks scored below this are not used.
    pub min_confidence: f32,
    /// Raw index lookup used when a named landmark is absent or untrusted.
    pub fallback_indices: FallbackIndexMap,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.3,
            fallback_indices: FallbackIndexMap::coco17(),
        }
    }
}

impl ResolverConfig {
    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    pub fn with_fallback_indices(mut self, indices: FallbackIndexMap) -> Self {
        self.fallback_indices = indices;
        self
    }

    pub fn validate(&self) -> Result<()> {
        require_unit_interval("resolver.min_confidence", self.min_confidence)
    }
}

/// How a role's landmark was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum LandmarkSource {
    Named,
    Fallback { index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolvedLandmark {
    pub point: Point,
    pub score: f32,
    pub source: LandmarkSource,
}

/// One trusted landmark for every torso role.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolvedTorso {
    pub left_shoulder: ResolvedLandmark,
    pub right_shoulder: ResolvedLandmark,
    pub left_hip: ResolvedLandmark,
    pub right_hip: ResolvedLandmark,
}

impl ResolvedTorso {
    pub fn get(&self, role: TorsoRole) -> &ResolvedLandmark {
        match role {
            TorsoRole::LeftShoulder => &self.left_shoulder,
            TorsoRole::RightShoulder => &self.right_shoulder,
            TorsoRole::LeftHip => &self.left_hip,
            TorsoRole::RightHip => &self.right_hip,
        }
    }

    /// True if any role had to be filled from the positional fallback.
    pub fn used_fallback(&self) -> bool {
        TorsoRole::ALL
            .iter()
            .any(|&r| matches!(self.get(r).source, LandmarkSource::Fallback { .. }))
    }
}

/// Selects torso landmarks under confidence and fallback rules.
#[derive(Debug, Clone, Default)]
pub struct LandmarkResolver {
    config: ResolverConfig,
}

impl LandmarkResolver {
    pub fn new(config: ResolverConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve all four torso roles.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidCoordinates`] if a selected landmark has a NaN, infinite or
    ///   negative coordinate.
    /// * [`Error::InsufficientLandmarks`] listing every role that neither lookup
    ///   could fill.
    pub fn resolve(&self, landmarks: &LandmarkSet) -> Result<ResolvedTorso> {
        let mut found = [None; 4];
        let mut missing = Vec::new();

        for (slot, role) in found.iter_mut().zip(TorsoRole::ALL) {
            match self.resolve_role(landmarks, role)? {
                Some(resolved) => *slot = Some(resolved),
                None => missing.push(role),
            }
        }

        match found {
            [Some(left_shoulder), Some(right_shoulder), Some(left_hip), Some(right_hip)] => {
                Ok(ResolvedTorso {
                    left_shoulder,
                    right_shoulder,
                    left_hip,
                    right_hip,
                })
            }
            _ => {
                debug!(?missing, "torso resolution failed");
                Err(Error::InsufficientLandmarks { missing })
            }
        }
    }

    fn resolve_role(&self, landmarks: &LandmarkSet, role: TorsoRole) -> Result<Option<ResolvedLandmark>> {
        if let Some(landmark) = self.trusted(landmarks.get(role.name())) {
            debug!(%role, score = landmark.confidence(), "resolved by name");
            return accept(landmark, LandmarkSource::Named).map(Some);
        }

        let Some(index) = self.config.fallback_indices.get(role) else {
            return Ok(None);
        };
        match self.trusted(landmarks.get_index(index)) {
            Some(landmark) => {
                warn!(%role, index, score = landmark.confidence(), "resolved by fallback index");
                accept(landmark, LandmarkSource::Fallback { index }).map(Some)
            }
            None => Ok(None),
        }
    }

    fn trusted<'a>(&self, landmark: Option<&'a Landmark>) -> Option<&'a Landmark> {
        landmark.filter(|l| l.confidence() >= self.config.min_confidence)
    }
}

fn accept(landmark: &Landmark, source: LandmarkSource) -> Result<ResolvedLandmark> {
    if !landmark.is_valid() {
        return Err(Error::InvalidCoordinates {
            name: landmark.name.clone(),
            x: landmark.point.x,
            y: landmark.point.y,
        });
    }
    Ok(ResolvedLandmark {
        point: landmark.point,
        score: landmark.confidence(),
        source,
    })
}
