// Adapters between `image` buffers and tensors. Decoding and encoding stay
// outside the pipeline; these helpers only move pixel data in and out of the
// `[0, 1]` float representation the transforms work on.

pub mod image_helper {
    use crate::core_modules::paired_transform::ImageLayout;
    use crate::core_modules::tensor::tensor::{Element, Tensor};
    use crate::error::{AugmentError, Result};
    use image::{ImageEncoder, RgbImage};
    use std::path::Path;

    const CHANNELS: usize = 3;

    /// Converts an RGB image to a normalised `[0, 1]` tensor.
    pub fn image_to_tensor(image: &RgbImage, layout: ImageLayout) -> Result<Tensor> {
        let (width, height) = (image.width() as usize, image.height() as usize);
        let raw = image.as_raw();
        match layout {
            ImageLayout::Hwc => {
                let values = raw.iter().map(|&b| b as Element / 255.0).collect();
                Tensor::from_shape_vec(&[height, width, CHANNELS], values)
            }
            ImageLayout::Chw => {
                let mut values = Vec::with_capacity(raw.len());
                for c in 0..CHANNELS {
                    let channel = raw.iter().skip(c).step_by(CHANNELS);
                    values.extend(channel.map(|&b| b as Element / 255.0));
                }
                Tensor::from_shape_vec(&[CHANNELS, height, width], values)
            }
        }
    }

    /// Converts a normalised tensor back to an RGB image. Values are clamped to
    /// `[0, 1]`; a 2-D tensor is treated as grayscale.
    pub fn tensor_to_image(tensor: &Tensor, layout: ImageLayout) -> Result<RgbImage> {
        let data = tensor.data();
        let shape = tensor.shape();
        let (height, width) = match (layout, shape) {
            (_, [h, w]) => (*h, *w),
            (ImageLayout::Hwc, [h, w, CHANNELS]) => (*h, *w),
            (ImageLayout::Chw, [CHANNELS, h, w]) => (*h, *w),
            _ => {
                return Err(AugmentError::invalid_shape(
                    "tensor_to_image",
                    format!("expected an RGB image in {layout:?} layout, got shape {shape:?}"),
                ));
            }
        };

        let to_byte = |v: Element| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        let mut raw = Vec::with_capacity(height * width * CHANNELS);
        for y in 0..height {
            for x in 0..width {
                for c in 0..CHANNELS {
                    let v = match (layout, shape.len()) {
                        (_, 2) => data[&[y, x][..]],
                        (ImageLayout::Hwc, _) => data[&[y, x, c][..]],
                        (ImageLayout::Chw, _) => data[&[c, y, x][..]],
                    };
                    raw.push(to_byte(v));
                }
            }
        }

        RgbImage::from_raw(width as u32, height as u32, raw).ok_or_else(|| {
            AugmentError::invalid_shape("tensor_to_image", "pixel buffer does not match image size")
        })
    }

    /// Encodes `tensor` as a PNG file.
    pub fn save(path: impl AsRef<Path>, tensor: &Tensor, layout: ImageLayout) -> Result<()> {
        let image = tensor_to_image(tensor, layout)?;
        let output = std::fs::File::create(path)?;
        let encoder = image::codecs::png::PngEncoder::new(output);

        encoder.write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgb8,
        )?;

        Ok(())
    }
}
