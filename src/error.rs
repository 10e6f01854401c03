use thiserror::Error;

use crate::calibration::ReferenceKind;
use crate::resolver::TorsoRole;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No {reference} detected in landmarks")]
    NoReferenceDetected { reference: ReferenceKind },

    #[error("Degenerate geometry: {context} spans {pixels} px")]
    DegenerateGeometry { context: &'static str, pixels: f32 },

    #[error("Insufficient landmarks: missing {}", format_roles(.missing))]
    InsufficientLandmarks { missing: Vec<TorsoRole> },

    #[error("Invalid coordinates for landmark '{name}': ({x}, {y})")]
    InvalidCoordinates { name: String, x: f32, y: f32 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Corrective instruction suitable for showing to the person being measured.
    pub fn hint(&self) -> &'static str {
        match self {
            Self::NoReferenceDetected {
                reference: ReferenceKind::Interpupillary,
            } => "Face the camera so both eyes are clearly visible",
            Self::NoReferenceDetected {
                reference: ReferenceKind::ReferenceRectangle,
            } => "Make sure the whole reference sheet is visible",
            Self::DegenerateGeometry { .. } => "Move closer to the camera and retake the photo",
            Self::InsufficientLandmarks { .. } => "Make sure your full torso is visible",
            Self::InvalidCoordinates { .. } => "Retake the photo with your body inside the frame",
            Self::InvalidConfig(_) | Self::Io(_) | Self::Json(_) => {
                "Check the input and configuration files"
            }
        }
    }
}

fn format_roles(roles: &[TorsoRole]) -> String {
    roles
        .iter()
        .map(|r| r.name())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, Error>;
