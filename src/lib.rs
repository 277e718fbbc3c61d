// THEORY:
// This file is the main entry point for the `paired_augment` library crate.
// It exposes the `PairedPipeline` and the types needed to drive it as the
// public API, for use by a dataset loader or training loop that augments
// (image, label) samples before they reach a model.
//
// The engine is layered bottom-up:
// - `core_modules` holds the tensor collaborator, the keyed collections, the
//   identity keys and the paired transform variants (flip, resize).
// - `pipeline` orchestrates an ordered, keyed registry of transforms over a
//   pair of collections.
// - `parallel_pipeline` fans batches of samples out over tokio workers.
// - `config` and `error` carry the declarative recipe and the failure modes.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod parallel_pipeline;
pub mod pipeline;

pub use config::PipelineConfig;
pub use core_modules::keyed_collection::KeyedCollection;
pub use core_modules::paired_transform::{PairedTransform, from_fn};
pub use core_modules::tensor::tensor::Tensor;
pub use error::{AugmentError, CollectionSide, Result};
pub use parallel_pipeline::{ParallelPipeline, Sample};
pub use pipeline::{IdentityKey, PairedPipeline};
