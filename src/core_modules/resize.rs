// THEORY:
// `PairedResize` rescales the image to a fixed width and height with bilinear
// interpolation and keeps the label in step with it. It is deterministic and
// ignores the random source.
//
// Labels come in two units. Normalised coordinates (fractions of the image
// size) describe the same relative position at any resolution, so they pass
// through untouched. Pixel coordinates are multiplied by the per-axis scale
// factor, x columns by `new_w / old_w` and y columns by `new_h / old_h`, using
// the same column convention as the flip.

use crate::core_modules::paired_transform::{
    CoordinateAxis, ImageLayout, LabelEncoding, PairedTransform, label_column_axis,
    map_label_coordinates,
};
use crate::core_modules::tensor::tensor::{Element, Tensor};
use crate::error::{AugmentError, Result};
use rand::RngCore;
use serde::{Deserialize, Serialize};

const NAME: &str = "paired_resize";

/// Units of the coordinates stored in a label tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateUnits {
    #[default]
    Normalized,
    Pixels,
}

#[derive(Debug, Clone)]
pub struct PairedResize {
    width: usize,
    height: usize,
    layout: ImageLayout,
    units: CoordinateUnits,
    encoding: LabelEncoding,
}

/// Spatial geometry of an image tensor.
struct ImageGeometry {
    channels: usize,
    height: usize,
    width: usize,
}

impl PairedResize {
    pub fn new(width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(AugmentError::InvalidConfig(format!(
                "resize target must be non-empty, got {width}x{height}"
            )));
        }
        Ok(Self {
            width,
            height,
            layout: ImageLayout::default(),
            units: CoordinateUnits::default(),
            encoding: LabelEncoding::default(),
        })
    }

    pub fn with_layout(mut self, layout: ImageLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_units(mut self, units: CoordinateUnits) -> Self {
        self.units = units;
        self
    }

    pub fn with_encoding(mut self, encoding: LabelEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    fn geometry(&self, input: &Tensor) -> Result<ImageGeometry> {
        let shape = input.shape();
        let (channels, height, width) = match (self.layout, shape.len()) {
            (_, 2) => (1, shape[0], shape[1]),
            (ImageLayout::Hwc, 3) => (shape[2], shape[0], shape[1]),
            (ImageLayout::Chw, 3) => (shape[0], shape[1], shape[2]),
            (layout, n) => {
                return Err(AugmentError::invalid_shape(
                    NAME,
                    format!("cannot resize a {n}-D image with {layout:?} layout"),
                ));
            }
        };
        if height == 0 || width == 0 {
            return Err(AugmentError::invalid_shape(NAME, "cannot resize an empty image"));
        }
        Ok(ImageGeometry { channels, height, width })
    }

    fn resize_image(&self, input: &Tensor, geometry: &ImageGeometry) -> Result<Tensor> {
        let data = input.data();
        let rank = input.ndim();
        let layout = self.layout;
        let pixel = |c: usize, y: usize, x: usize| -> Element {
            match (layout, rank) {
                (_, 2) => data[&[y, x][..]],
                (ImageLayout::Hwc, _) => data[&[y, x, c][..]],
                (ImageLayout::Chw, _) => data[&[c, y, x][..]],
            }
        };

        let scale_h = geometry.height as f32 / self.height as f32;
        let scale_w = geometry.width as f32 / self.width as f32;
        let sample = |c: usize, y: usize, x: usize| -> Element {
            let src_y = y as f32 * scale_h;
            let src_x = x as f32 * scale_w;

            let y0 = (src_y.floor() as usize).min(geometry.height - 1);
            let y1 = (y0 + 1).min(geometry.height - 1);
            let x0 = (src_x.floor() as usize).min(geometry.width - 1);
            let x1 = (x0 + 1).min(geometry.width - 1);

            let dy = src_y - y0 as f32;
            let dx = src_x - x0 as f32;

            pixel(c, y0, x0) * (1.0 - dx) * (1.0 - dy)
                + pixel(c, y0, x1) * dx * (1.0 - dy)
                + pixel(c, y1, x0) * (1.0 - dx) * dy
                + pixel(c, y1, x1) * dx * dy
        };

        let mut values = Vec::with_capacity(geometry.channels * self.height * self.width);
        let shape = match (layout, rank) {
            (_, 2) => {
                for y in 0..self.height {
                    for x in 0..self.width {
                        values.push(sample(0, y, x));
                    }
                }
                vec![self.height, self.width]
            }
            (ImageLayout::Hwc, _) => {
                for y in 0..self.height {
                    for x in 0..self.width {
                        for c in 0..geometry.channels {
                            values.push(sample(c, y, x));
                        }
                    }
                }
                vec![self.height, self.width, geometry.channels]
            }
            (ImageLayout::Chw, _) => {
                for c in 0..geometry.channels {
                    for y in 0..self.height {
                        for x in 0..self.width {
                            values.push(sample(c, y, x));
                        }
                    }
                }
                vec![geometry.channels, self.height, self.width]
            }
        };

        let mut resized = Tensor::from_shape_vec(&shape, values)?;
        resized.set_name(input.name().map(str::to_string));
        Ok(resized)
    }
}

impl PairedTransform for PairedResize {
    fn apply(
        &self,
        input: Tensor,
        mut target: Tensor,
        _rng: &mut dyn RngCore,
    ) -> Result<(Tensor, Tensor)> {
        let geometry = self.geometry(&input)?;
        label_column_axis(&target, NAME)?;
        let resized = self.resize_image(&input, &geometry)?;

        if self.units == CoordinateUnits::Pixels {
            let scale_x = self.width as Element / geometry.width as Element;
            let scale_y = self.height as Element / geometry.height as Element;
            let encoding = self.encoding;
            map_label_coordinates(&mut target, encoding, CoordinateAxis::X, NAME, |v| v * scale_x)?;
            map_label_coordinates(&mut target, encoding, CoordinateAxis::Y, NAME, |v| v * scale_y)?;
        }
        Ok((resized, target))
    }

    fn name(&self) -> &str {
        NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    fn rng() -> StepRng {
        StepRng::new(0, 1)
    }

    #[test]
    fn zero_sized_target_is_rejected() {
        assert!(PairedResize::new(0, 4).is_err());
        assert!(PairedResize::new(4, 0).is_err());
    }

    #[test]
    fn upscale_hwc_shape_and_corner() {
        let image = Tensor::from_shape_vec(&[2, 2, 1], vec![0.0, 1.0, 2.0, 3.0]).unwrap();
        let label = Tensor::from_shape_vec(&[1, 4], vec![0.1, 0.2, 0.3, 0.4]).unwrap();
        let (resized, label) = PairedResize::new(4, 4)
            .unwrap()
            .apply(image, label, &mut rng())
            .unwrap();
        assert_eq!(resized.shape(), &[4, 4, 1]);
        assert_eq!(resized.data()[&[0, 0, 0][..]], 0.0);
        // Halfway between the two top pixels.
        assert!((resized.data()[&[0, 1, 0][..]] - 0.5).abs() < 1e-6);
        // Normalised labels are untouched.
        assert_eq!(label.to_vec(), vec![0.1, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn downscale_chw_keeps_channels_first() {
        let image = Tensor::zeros(&[3, 8, 6]);
        let label = Tensor::zeros(&[0, 4]);
        let resize = PairedResize::new(3, 4).unwrap().with_layout(ImageLayout::Chw);
        let (resized, _) = resize.apply(image, label, &mut rng()).unwrap();
        assert_eq!(resized.shape(), &[3, 4, 3]);
    }

    #[test]
    fn pixel_labels_scale_per_axis() {
        let image = Tensor::zeros(&[10, 20]);
        let label = Tensor::from_shape_vec(&[1, 4], vec![2.0, 5.0, 10.0, 8.0]).unwrap();
        let resize = PairedResize::new(40, 5).unwrap().with_units(CoordinateUnits::Pixels);
        let (resized, label) = resize.apply(image, label, &mut rng()).unwrap();
        assert_eq!(resized.shape(), &[5, 40]);
        assert_eq!(label.to_vec(), vec![4.0, 2.5, 20.0, 4.0]);
    }

    #[test]
    fn name_survives_resize() {
        let image = Tensor::zeros(&[2, 2]).with_name("image");
        let (resized, _) = PairedResize::new(1, 1)
            .unwrap()
            .apply(image, Tensor::zeros(&[4]), &mut rng())
            .unwrap();
        assert_eq!(resized.name(), Some("image"));
    }

    #[test]
    fn rank_three_label_is_rejected_in_any_units() {
        for units in [CoordinateUnits::Normalized, CoordinateUnits::Pixels] {
            let err = PairedResize::new(2, 2)
                .unwrap()
                .with_units(units)
                .apply(Tensor::zeros(&[4, 4]), Tensor::zeros(&[1, 1, 4]), &mut rng())
                .unwrap_err();
            assert!(matches!(err, AugmentError::InvalidShape { .. }));
        }
    }

    #[test]
    fn rank_four_image_is_rejected() {
        let err = PairedResize::new(2, 2)
            .unwrap()
            .apply(Tensor::zeros(&[1, 2, 2, 3]), Tensor::zeros(&[4]), &mut rng())
            .unwrap_err();
        assert!(matches!(err, AugmentError::InvalidShape { .. }));
    }
}
