// THEORY:
// `PipelineConfig` is the declarative form of a `PairedPipeline`: an ordered
// list of steps, each naming the slot it targets and the transform to run,
// plus the knobs the parallel runner needs (base seed, worker count). It is
// plain serde data so an experiment can keep its augmentation recipe in a
// JSON file next to the rest of its training settings.
//
// Building a pipeline from a config is where validation happens: bad
// probabilities and empty resize targets are rejected before any sample is
// touched.

use crate::core_modules::flip::{FlipAxis, PairedRandomFlip};
use crate::core_modules::identity_key::IdentityKey;
use crate::core_modules::paired_transform::{ImageLayout, LabelEncoding};
use crate::core_modules::resize::{CoordinateUnits, PairedResize};
use crate::error::Result;
use crate::pipeline::PairedPipeline;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

fn default_flip_probability() -> f64 {
    0.5
}

/// The transform run by one configured step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransformConfig {
    Flip {
        axis: FlipAxis,
        #[serde(default = "default_flip_probability")]
        probability: f64,
        #[serde(default)]
        layout: ImageLayout,
        #[serde(default)]
        encoding: LabelEncoding,
    },
    Resize {
        width: usize,
        height: usize,
        #[serde(default)]
        layout: ImageLayout,
        #[serde(default)]
        units: CoordinateUnits,
        #[serde(default)]
        encoding: LabelEncoding,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepConfig {
    /// Slot the step applies to; the first element when absent.
    #[serde(default)]
    pub key: Option<IdentityKey>,
    pub transform: TransformConfig,
}

/// Declarative description of a paired augmentation pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub steps: Vec<StepConfig>,
    /// Base seed for reproducible batch augmentation.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Worker tasks for batch augmentation; one per CPU when absent.
    #[serde(default)]
    pub workers: Option<usize>,
}

impl PipelineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Validates every step and registers it, in order.
    pub fn build(&self) -> Result<PairedPipeline> {
        let mut pipeline = PairedPipeline::new();
        for step in &self.steps {
            let key = step.key.clone().unwrap_or_default();
            pipeline = match &step.transform {
                TransformConfig::Flip {
                    axis,
                    probability,
                    layout,
                    encoding,
                } => pipeline.add_at(
                    key,
                    PairedRandomFlip::new(*axis)
                        .with_probability(*probability)?
                        .with_layout(*layout)
                        .with_encoding(*encoding),
                ),
                TransformConfig::Resize {
                    width,
                    height,
                    layout,
                    units,
                    encoding,
                } => pipeline.add_at(
                    key,
                    PairedResize::new(*width, *height)?
                        .with_layout(*layout)
                        .with_units(*units)
                        .with_encoding(*encoding),
                ),
            };
        }
        debug!(steps = pipeline.len(), "built paired pipeline from config");
        Ok(pipeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AugmentError;

    const RECIPE: &str = r#"{
        "seed": 7,
        "workers": 2,
        "steps": [
            { "transform": { "kind": "resize", "width": 640, "height": 284 } },
            { "key": "boxes", "transform": { "kind": "flip", "axis": "horizontal" } },
            { "key": 1, "transform": { "kind": "flip", "axis": "vertical", "probability": 0.25,
                                       "encoding": "class_prefixed", "layout": "chw" } }
        ]
    }"#;

    #[test]
    fn parses_recipe() {
        let config = PipelineConfig::from_json_str(RECIPE).unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.workers, Some(2));
        assert_eq!(config.steps.len(), 3);
        assert_eq!(config.steps[0].key, None);
        assert_eq!(config.steps[1].key, Some(IdentityKey::named("boxes")));
        assert_eq!(
            config.steps[1].transform,
            TransformConfig::Flip {
                axis: FlipAxis::Horizontal,
                probability: 0.5,
                layout: ImageLayout::Hwc,
                encoding: LabelEncoding::CoordinatePairs,
            }
        );
        assert_eq!(config.steps[2].key, Some(IdentityKey::indexed(1)));
    }

    #[test]
    fn builds_steps_in_order() {
        let pipeline = PipelineConfig::from_json_str(RECIPE).unwrap().build().unwrap();
        let keys: Vec<_> = pipeline.keys().cloned().collect();
        assert_eq!(
            keys,
            vec![IdentityKey::indexed(0), IdentityKey::named("boxes"), IdentityKey::indexed(1)]
        );
    }

    #[test]
    fn rejects_bad_probability() {
        let json = r#"{ "steps": [ { "transform": { "kind": "flip", "axis": "vertical", "probability": 2.0 } } ] }"#;
        let err = PipelineConfig::from_json_str(json).unwrap().build().unwrap_err();
        assert!(matches!(err, AugmentError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_empty_resize() {
        let json = r#"{ "steps": [ { "transform": { "kind": "resize", "width": 0, "height": 3 } } ] }"#;
        let err = PipelineConfig::from_json_str(json).unwrap().build().unwrap_err();
        assert!(matches!(err, AugmentError::InvalidConfig(_)));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = PipelineConfig::from_json_str("{ \"steps\": 3 }").unwrap_err();
        assert!(matches!(err, AugmentError::ConfigParse(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = PipelineConfig::from_path("/nonexistent/augment.json").unwrap_err();
        assert!(matches!(err, AugmentError::Io(_)));
    }

    #[test]
    fn empty_config_builds_identity_pipeline() {
        let pipeline = PipelineConfig::default().build().unwrap();
        assert!(pipeline.is_empty());
    }
}
