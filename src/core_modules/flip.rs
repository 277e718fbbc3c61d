// THEORY:
// `PairedRandomFlip` is the reference geometric variant. With a configurable
// probability (0.5 by default) it mirrors the image along one spatial axis and
// reflects the matching label coordinates with `v -> 1 - v`, so a box drawn on
// the flipped image still frames the same object.
//
// Key architectural principles:
// 1.  **One Decision Per Call**: A single Bernoulli draw from the injected
//     generator decides whether both tensors change. The image and its label
//     are never flipped independently.
// 2.  **Mixed Update Policy**: The image is replaced by a freshly reversed
//     tensor, while the label is rewritten in place through a strided column
//     range and handed back. The pipeline adopts both as returned.
// 3.  **Explicit Label Convention**: Which label columns hold coordinates of the
//     flip axis is decided by `LabelEncoding`, never guessed. Labels are assumed
//     normalised to `[0, 1]`. Min/max pairs are reflected but not reordered.

use crate::core_modules::paired_transform::{
    CoordinateAxis, ImageLayout, LabelEncoding, PairedTransform, map_label_coordinates,
};
use crate::core_modules::tensor::tensor::Tensor;
use crate::error::{AugmentError, Result};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

const NAME: &str = "paired_random_flip";
const DEFAULT_FLIP_PROBABILITY: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlipAxis {
    /// Top to bottom: image rows reversed, label y coordinates reflected.
    Vertical,
    /// Left to right: image columns reversed, label x coordinates reflected.
    Horizontal,
}

impl FlipAxis {
    pub fn coordinate_axis(self) -> CoordinateAxis {
        match self {
            FlipAxis::Vertical => CoordinateAxis::Y,
            FlipAxis::Horizontal => CoordinateAxis::X,
        }
    }
}

/// Randomly mirrors an (image, label) pair along one axis.
#[derive(Debug, Clone)]
pub struct PairedRandomFlip {
    axis: FlipAxis,
    probability: f64,
    layout: ImageLayout,
    encoding: LabelEncoding,
}

impl PairedRandomFlip {
    pub fn new(axis: FlipAxis) -> Self {
        Self {
            axis,
            probability: DEFAULT_FLIP_PROBABILITY,
            layout: ImageLayout::default(),
            encoding: LabelEncoding::default(),
        }
    }

    pub fn top_bottom() -> Self {
        Self::new(FlipAxis::Vertical)
    }

    pub fn left_right() -> Self {
        Self::new(FlipAxis::Horizontal)
    }

    /// Sets the chance of flipping; must lie in `[0, 1]`.
    pub fn with_probability(mut self, probability: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(AugmentError::InvalidConfig(format!(
                "flip probability must be within [0, 1], got {probability}"
            )));
        }
        self.probability = probability;
        Ok(self)
    }

    pub fn with_layout(mut self, layout: ImageLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_encoding(mut self, encoding: LabelEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn axis(&self) -> FlipAxis {
        self.axis
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    /// Flips unconditionally.
    pub fn flip(&self, input: Tensor, mut target: Tensor) -> Result<(Tensor, Tensor)> {
        let coordinate = self.axis.coordinate_axis();
        let image_axis = self
            .layout
            .spatial_axis(coordinate, input.ndim())
            .ok_or_else(|| {
                AugmentError::invalid_shape(
                    NAME,
                    format!("cannot flip a {}-D image with {:?} layout", input.ndim(), self.layout),
                )
            })?;

        map_label_coordinates(&mut target, self.encoding, coordinate, NAME, |v| v * -1.0 + 1.0)?;
        Ok((input.flip(image_axis), target))
    }
}

impl PairedTransform for PairedRandomFlip {
    fn apply(
        &self,
        input: Tensor,
        target: Tensor,
        rng: &mut dyn RngCore,
    ) -> Result<(Tensor, Tensor)> {
        if rng.gen_bool(self.probability) {
            self.flip(input, target)
        } else {
            Ok((input, target))
        }
    }

    fn name(&self) -> &str {
        match self.axis {
            FlipAxis::Vertical => "paired_random_flip_top_bottom",
            FlipAxis::Horizontal => "paired_random_flip_left_right",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    fn always_flip() -> StepRng {
        StepRng::new(0, 0)
    }

    fn never_flip() -> StepRng {
        StepRng::new(u64::MAX, 0)
    }

    fn assert_close(actual: &[f32], expected: &[f32]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-6, "{actual:?} != {expected:?}");
        }
    }

    fn image_3x2() -> Tensor {
        Tensor::from_shape_vec(&[3, 2], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap()
    }

    #[test]
    fn vertical_flip_reflects_y_columns_only() {
        let label = Tensor::from_shape_vec(&[1, 4], vec![0.2, 0.3, 0.8, 0.9]).unwrap();
        let (image, label) = PairedRandomFlip::top_bottom()
            .apply(image_3x2(), label, &mut always_flip())
            .unwrap();
        assert_close(&label.to_vec(), &[0.2, 0.7, 0.8, 0.1]);
        assert_eq!(image.to_vec(), vec![5.0, 6.0, 3.0, 4.0, 1.0, 2.0]);
    }

    #[test]
    fn horizontal_flip_reflects_x_columns_only() {
        let label =
            Tensor::from_shape_vec(&[2, 4], vec![0.2, 0.3, 0.8, 0.9, 0.0, 0.5, 0.25, 1.0])
                .unwrap();
        let (image, label) = PairedRandomFlip::left_right()
            .apply(image_3x2(), label, &mut always_flip())
            .unwrap();
        assert_close(&label.to_vec(), &[0.8, 0.3, 0.2, 0.9, 1.0, 0.5, 0.75, 1.0]);
        assert_eq!(image.to_vec(), vec![2.0, 1.0, 4.0, 3.0, 6.0, 5.0]);
    }

    #[test]
    fn class_prefixed_labels_keep_class_column() {
        let label = Tensor::from_shape_vec(&[1, 5], vec![7.0, 0.2, 0.3, 0.8, 0.9]).unwrap();
        let flip = PairedRandomFlip::top_bottom().with_encoding(LabelEncoding::ClassPrefixed);
        let (_, label) = flip.apply(image_3x2(), label, &mut always_flip()).unwrap();
        assert_close(&label.to_vec(), &[7.0, 0.2, 0.7, 0.8, 0.1]);
    }

    #[test]
    fn chw_layout_flips_rows_at_axis_one() {
        let image = Tensor::from_shape_vec(&[1, 2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let label = Tensor::from_shape_vec(&[4], vec![0.1, 0.2, 0.3, 0.4]).unwrap();
        let flip = PairedRandomFlip::top_bottom().with_layout(ImageLayout::Chw);
        let (image, _) = flip.apply(image, label, &mut always_flip()).unwrap();
        assert_eq!(image.to_vec(), vec![3.0, 4.0, 1.0, 2.0]);
    }

    #[test]
    fn no_flip_leaves_both_unchanged() {
        let label = Tensor::from_shape_vec(&[1, 4], vec![0.2, 0.3, 0.8, 0.9]).unwrap();
        let (image, label) = PairedRandomFlip::top_bottom()
            .apply(image_3x2(), label, &mut never_flip())
            .unwrap();
        assert_eq!(label.to_vec(), vec![0.2, 0.3, 0.8, 0.9]);
        assert_eq!(image.to_vec(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn probability_bounds_are_enforced() {
        assert!(PairedRandomFlip::left_right().with_probability(1.5).is_err());
        assert!(PairedRandomFlip::left_right().with_probability(-0.1).is_err());
        let certain = PairedRandomFlip::left_right().with_probability(1.0).unwrap();
        let label = Tensor::from_shape_vec(&[2], vec![0.25, 0.5]).unwrap();
        let (_, label) = certain.apply(image_3x2(), label, &mut never_flip()).unwrap();
        assert_close(&label.to_vec(), &[0.75, 0.5]);
    }

    #[test]
    fn one_dimensional_image_is_rejected() {
        let image = Tensor::from_shape_vec(&[3], vec![1.0, 2.0, 3.0]).unwrap();
        let label = Tensor::from_shape_vec(&[1, 4], vec![0.0; 4]).unwrap();
        let err = PairedRandomFlip::top_bottom()
            .apply(image, label, &mut always_flip())
            .unwrap_err();
        assert!(matches!(err, AugmentError::InvalidShape { .. }));
    }
}
