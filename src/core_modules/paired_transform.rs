// THEORY:
// A `PairedTransform` is one unit of augmentation logic that consumes an
// image-like tensor and a label-like tensor together and returns the
// replacement pair, keeping the two geometrically consistent. Flip, resize and
// any user-supplied closure are independent values behind this single trait;
// the pipeline neither knows nor cares which one it is running.
//
// Key architectural principles:
// 1.  **Replacement Wins**: Both tensors are moved into `apply`. Whatever comes
//     back is the authoritative post-state, whether the transform rewrote a
//     sub-range of the target in place or built fresh tensors.
// 2.  **Injected Randomness**: Randomised variants draw from the `rng` they are
//     handed. No transform builds or shares a generator of its own, which keeps
//     concurrent callers isolated and lets tests force outcomes.
// 3.  **Shared Label Conventions**: `ImageLayout` and `LabelEncoding` live here
//     because every geometric variant has to agree on where the spatial axes of
//     the image are and which label columns hold x and y coordinates.

use crate::core_modules::tensor::tensor::{Element, Tensor};
use crate::error::{AugmentError, Result};
use ndarray::Slice;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// The joint (image, label) transform contract.
pub trait PairedTransform: Send + Sync {
    fn apply(
        &self,
        input: Tensor,
        target: Tensor,
        rng: &mut dyn RngCore,
    ) -> Result<(Tensor, Tensor)>;

    /// Short label used in logs and error messages.
    fn name(&self) -> &str {
        "paired_transform"
    }
}

/// Adapts a closure into a `PairedTransform`.
pub struct FnTransform<F> {
    name: &'static str,
    f: F,
}

pub fn from_fn<F>(name: &'static str, f: F) -> FnTransform<F>
where
    F: Fn(Tensor, Tensor, &mut dyn RngCore) -> Result<(Tensor, Tensor)> + Send + Sync,
{
    FnTransform { name, f }
}

impl<F> PairedTransform for FnTransform<F>
where
    F: Fn(Tensor, Tensor, &mut dyn RngCore) -> Result<(Tensor, Tensor)> + Send + Sync,
{
    fn apply(
        &self,
        input: Tensor,
        target: Tensor,
        rng: &mut dyn RngCore,
    ) -> Result<(Tensor, Tensor)> {
        (self.f)(input, target, rng)
    }

    fn name(&self) -> &str {
        self.name
    }
}

/// A spatial axis, as seen from the label's coordinate system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateAxis {
    X,
    Y,
}

/// Where the spatial axes sit in an image tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageLayout {
    /// Height, width, channels. Also covers plain `HW` grayscale.
    #[default]
    Hwc,
    /// Channels, height, width.
    Chw,
}

impl ImageLayout {
    /// The tensor axis holding `axis` for an image of rank `ndim`.
    pub fn spatial_axis(self, axis: CoordinateAxis, ndim: usize) -> Option<usize> {
        let (y, x) = match (self, ndim) {
            (_, 2) => (0, 1),
            (ImageLayout::Hwc, 3) => (0, 1),
            (ImageLayout::Chw, 3) => (1, 2),
            _ => return None,
        };
        Some(match axis {
            CoordinateAxis::Y => y,
            CoordinateAxis::X => x,
        })
    }
}

/// Column convention of a label tensor (one row per object).
///
/// `CoordinatePairs`: `x0, y0, x1, y1, ...` starting at column 0. Covers
/// boxes and polygon vertices.
/// `ClassPrefixed`: column 0 is a class id, the pairs start at column 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelEncoding {
    #[default]
    CoordinatePairs,
    ClassPrefixed,
}

impl LabelEncoding {
    /// First label column holding a coordinate of `axis`.
    pub fn first_column(self, axis: CoordinateAxis) -> usize {
        let prefix = match self {
            LabelEncoding::CoordinatePairs => 0,
            LabelEncoding::ClassPrefixed => 1,
        };
        prefix
            + match axis {
                CoordinateAxis::X => 0,
                CoordinateAxis::Y => 1,
            }
    }

    /// Every column holding a coordinate of `axis`, as a strided slice.
    pub fn columns(self, axis: CoordinateAxis) -> Slice {
        Slice::new(self.first_column(axis) as isize, None, 2)
    }
}

/// The axis holding label columns. Labels are 1-D (a single object) or 2-D
/// (objects x columns); every geometric variant rejects anything else.
pub(crate) fn label_column_axis(target: &Tensor, transform: &str) -> Result<usize> {
    match target.ndim() {
        1 => Ok(0),
        2 => Ok(1),
        n => Err(AugmentError::invalid_shape(
            transform,
            format!("label tensor must be 1-D or 2-D, got {n}-D"),
        )),
    }
}

/// Rewrites, in place, every coordinate of `axis` in a label tensor.
///
/// Labels too narrow to hold any coordinate of `axis` are left as they are.
pub(crate) fn map_label_coordinates<F>(
    target: &mut Tensor,
    encoding: LabelEncoding,
    axis: CoordinateAxis,
    transform: &str,
    f: F,
) -> Result<()>
where
    F: FnMut(Element) -> Element,
{
    let column_axis = label_column_axis(target, transform)?;
    let columns = target.shape()[column_axis];
    if encoding.first_column(axis) >= columns {
        return Ok(());
    }
    target.map_range_inplace(column_axis, encoding.columns(axis), f);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    #[test]
    fn encodings_pick_expected_columns() {
        assert_eq!(LabelEncoding::CoordinatePairs.first_column(CoordinateAxis::X), 0);
        assert_eq!(LabelEncoding::CoordinatePairs.first_column(CoordinateAxis::Y), 1);
        assert_eq!(LabelEncoding::ClassPrefixed.first_column(CoordinateAxis::X), 1);
        assert_eq!(LabelEncoding::ClassPrefixed.first_column(CoordinateAxis::Y), 2);
    }

    #[test]
    fn layouts_locate_spatial_axes() {
        assert_eq!(ImageLayout::Hwc.spatial_axis(CoordinateAxis::Y, 3), Some(0));
        assert_eq!(ImageLayout::Chw.spatial_axis(CoordinateAxis::X, 3), Some(2));
        assert_eq!(ImageLayout::Chw.spatial_axis(CoordinateAxis::Y, 2), Some(0));
        assert_eq!(ImageLayout::Hwc.spatial_axis(CoordinateAxis::Y, 4), None);
    }

    #[test]
    fn class_prefixed_y_columns() {
        let mut label = Tensor::from_shape_vec(&[1, 5], vec![3.0, 0.1, 0.2, 0.3, 0.4]).unwrap();
        let encoding = LabelEncoding::ClassPrefixed;
        map_label_coordinates(&mut label, encoding, CoordinateAxis::Y, "test", |v| v + 1.0)
            .unwrap();
        assert_eq!(label.to_vec(), vec![3.0, 0.1, 1.2, 0.3, 1.4]);
    }

    #[test]
    fn narrow_label_is_untouched() {
        let mut label = Tensor::from_shape_vec(&[2, 1], vec![0.5, 0.6]).unwrap();
        let encoding = LabelEncoding::CoordinatePairs;
        map_label_coordinates(&mut label, encoding, CoordinateAxis::Y, "test", |_| 9.0).unwrap();
        assert_eq!(label.to_vec(), vec![0.5, 0.6]);
    }

    #[test]
    fn rank_three_label_is_rejected() {
        let label = Tensor::zeros(&[1, 1, 4]);
        let err = label_column_axis(&label, "test").unwrap_err();
        assert!(matches!(err, AugmentError::InvalidShape { .. }));
    }

    #[test]
    fn closures_become_transforms() {
        let swap = from_fn("swap", |input, target, _rng| Ok((target, input)));
        let a = Tensor::from_shape_vec(&[1], vec![1.0]).unwrap();
        let b = Tensor::from_shape_vec(&[1], vec![2.0]).unwrap();
        let (x, y) = swap.apply(a, b, &mut StepRng::new(0, 0)).unwrap();
        assert_eq!(swap.name(), "swap");
        assert_eq!((x.to_vec(), y.to_vec()), (vec![2.0], vec![1.0]));
    }
}
