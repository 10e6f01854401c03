use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A 2D point in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn midpoint(&self, other: &Point) -> Point {
        (*self + *other) * 0.5
    }

    /// Finite and inside the image quadrant (no negative coordinates).
    pub fn is_valid(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.x >= 0.0 && self.y >= 0.0
    }
}

impl std::ops::Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Mul<f32> for Point {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self::Output {
        Self {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

/// A named point reported by a landmark provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub name: String,
    #[serde(flatten)]
    pub point: Point,
    /// Detector confidence in [0, 1]. Reference-object corners usually carry none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl Landmark {
    pub fn new(name: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            name: name.into(),
            point: Point::new(x, y),
            score: None,
        }
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }

    /// Confidence of this landmark; unscored landmarks are fully trusted.
    ///
    /// A score outside [0, 1] (or NaN) is not a probability and yields 0.0, so
    /// the landmark never clears a confidence floor.
    pub fn confidence(&self) -> f32 {
        match self.score {
            None => 1.0,
            Some(score) if (0.0..=1.0).contains(&score) => score,
            Some(_) => 0.0,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.point.is_valid()
    }
}

/// Landmarks from one photo, kept in the provider's raw order and indexed by name.
///
/// Positional lookups (`get_index`) see every keypoint as delivered. Named lookups
/// (`get`) see at most one landmark per name: a later keypoint with the same name
/// replaces the earlier one in the index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "KeypointList", into = "KeypointList")]
pub struct LandmarkSet {
    keypoints: Vec<Landmark>,
    by_name: HashMap<String, usize>,
}

#[derive(Serialize, Deserialize)]
struct KeypointList {
    keypoints: Vec<Landmark>,
}

impl TryFrom<KeypointList> for LandmarkSet {
    type Error = String;

    fn try_from(list: KeypointList) -> Result<Self, Self::Error> {
        if let Some(bad) = list
            .keypoints
            .iter()
            .find(|l| l.score.is_some_and(|s| !(0.0..=1.0).contains(&s)))
        {
            return Err(format!(
                "keypoint {} has score {:?}, expected a value in [0, 1]",
                bad.name, bad.score
            ));
        }
        Ok(list.keypoints.into_iter().collect())
    }
}

impl From<LandmarkSet> for KeypointList {
    fn from(set: LandmarkSet) -> Self {
        Self {
            keypoints: set.keypoints,
        }
    }
}

impl LandmarkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, landmark: Landmark) {
        self.by_name
            .insert(landmark.name.clone(), self.keypoints.len());
        self.keypoints.push(landmark);
    }

    pub fn get(&self, name: &str) -> Option<&Landmark> {
        self.by_name.get(name).map(|&i| &self.keypoints[i])
    }

    /// Keypoint at `index` in the provider's raw ordering.
    pub fn get_index(&self, index: usize) -> Option<&Landmark> {
        self.keypoints.get(index)
    }

    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Landmark> {
        self.keypoints.iter()
    }
}

impl FromIterator<Landmark> for LandmarkSet {
    fn from_iter<T: IntoIterator<Item = Landmark>>(iter: T) -> Self {
        let mut set = Self::new();
        for landmark in iter {
            set.push(landmark);
        }
        set
    }
}
