// THEORY:
// Every failure the augmentation engine can report flows through one enum,
// `AugmentError`. The pipeline has no partial-success mode: a call either
// applies every registered transform in order or returns the first error it
// met. Callers (a training loop, a data loader) should treat any of these as a
// configuration or data bug, never as something to retry.

use crate::core_modules::identity_key::IdentityKey;
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AugmentError>;

/// Which of the two paired collections a key failed to resolve against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionSide {
    Input,
    Target,
}

impl fmt::Display for CollectionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionSide::Input => f.write_str("input"),
            CollectionSide::Target => f.write_str("target"),
        }
    }
}

#[derive(Debug, Error)]
pub enum AugmentError {
    /// A registered key has no element in one of the collections.
    #[error("no element for {key} in the {side} collection")]
    KeyNotFound { key: IdentityKey, side: CollectionSide },

    /// A transform received a tensor whose shape it cannot handle.
    #[error("{transform}: {detail}")]
    InvalidShape { transform: String, detail: String },

    #[error("tensor shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse pipeline configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// The worker pool could not accept or answer a task.
    #[error("augmentation worker unavailable")]
    WorkerUnavailable,
}

impl AugmentError {
    pub(crate) fn invalid_shape(transform: &str, detail: impl Into<String>) -> Self {
        AugmentError::InvalidShape {
            transform: transform.to_string(),
            detail: detail.into(),
        }
    }
}
