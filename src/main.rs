// Example runner: augments one image a few times and writes the results.
//
// Usage: paired_augment <input_image> <output_dir> [config.json] [variants]

use anyhow::Context;
use paired_augment::config::{StepConfig, TransformConfig};
use paired_augment::core_modules::paired_transform::{ImageLayout, LabelEncoding};
use paired_augment::core_modules::resize::CoordinateUnits;
use paired_augment::core_modules::utils::image_helper::image_helper;
use paired_augment::pipeline::FlipAxis;
use paired_augment::{KeyedCollection, ParallelPipeline, PipelineConfig, Sample, Tensor};
use std::env;
use std::path::Path;
use tracing_subscriber::EnvFilter;

const DEFAULT_VARIANTS: u64 = 4;

fn default_config() -> PipelineConfig {
    let flip = |axis| StepConfig {
        key: None,
        transform: TransformConfig::Flip {
            axis,
            probability: 0.5,
            layout: ImageLayout::Hwc,
            encoding: LabelEncoding::CoordinatePairs,
        },
    };
    PipelineConfig {
        steps: vec![
            StepConfig {
                key: None,
                transform: TransformConfig::Resize {
                    width: 640,
                    height: 284,
                    layout: ImageLayout::Hwc,
                    units: CoordinateUnits::Normalized,
                    encoding: LabelEncoding::CoordinatePairs,
                },
            },
            flip(FlipAxis::Horizontal),
            flip(FlipAxis::Vertical),
        ],
        seed: Some(0),
        workers: None,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- 1. Argument Parsing & Setup ---
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        println!("Usage: paired_augment <input_image> <output_dir> [config.json] [variants]");
        return Ok(());
    }
    let input_path = &args[1];
    let output_dir = Path::new(&args[2]);
    let config = match args.get(3) {
        Some(path) => PipelineConfig::from_path(path)
            .with_context(|| format!("loading config {path}"))?,
        None => default_config(),
    };
    let variants = match args.get(4) {
        Some(raw) => raw.parse::<u64>().with_context(|| format!("invalid variant count {raw:?}"))?,
        None => DEFAULT_VARIANTS,
    };

    // --- 2. Image Decode (outside the pipeline) ---
    let image = image::open(input_path)
        .with_context(|| format!("opening {input_path}"))?
        .to_rgb8();
    let image = image_helper::image_to_tensor(&image, ImageLayout::Hwc)?.with_name("image");
    // One box around the centre of the frame, normalised x0, y0, x1, y1.
    let boxes = Tensor::from_shape_vec(&[1, 4], vec![0.25, 0.25, 0.75, 0.5])?.with_name("boxes");

    // --- 3. Batch Augmentation ---
    let parallel = ParallelPipeline::from_config(&config)?;
    let samples = (0..variants)
        .map(|id| {
            Sample::new(
                id,
                KeyedCollection::from(image.clone()),
                KeyedCollection::from(boxes.clone()),
            )
        })
        .collect();
    let augmented = parallel.augment_batch(samples).await?;

    // --- 4. Output ---
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("creating {}", output_dir.display()))?;
    for sample in &augmented {
        let Some(image) = sample.input.get(0) else { continue };
        let path = output_dir.join(format!("augmented_{}.png", sample.id));
        image_helper::save(&path, image, ImageLayout::Hwc)?;
        if let Some(label) = sample.target.get(0) {
            println!("{} -> boxes {:?}", path.display(), label.to_vec());
        }
    }

    parallel.shutdown().await;
    Ok(())
}
