// THEORY:
// The `pipeline` module is the top-level API of the augmentation engine. A
// `PairedPipeline` is an ordered registry of (IdentityKey, PairedTransform)
// entries. It is configured once and then called for every training sample
// with an (input, target) pair of `KeyedCollection`s.
//
// Key architectural principles:
// 1.  **Ordered Registry**: Registration order is application order. The same
//     key may appear many times, and entries can be appended or inserted at any
//     registry position. Registration never fails.
// 2.  **Late Resolution**: Keys are resolved at call time against both
//     collections. A `Named` key follows the tensor carrying that name, an
//     `Indexed` key follows its position, and one key always drives the same
//     logical slot on the image side and the label side.
// 3.  **Threaded State**: Each step sees the outputs of the previous steps, so
//     transforms compose. The pipeline re-applies slot names after every
//     replacement; transforms never do name bookkeeping.
// 4.  **Fail Loudly**: A key that does not resolve aborts the whole call with
//     `KeyNotFound`. Skipping a step would silently desynchronise an image from
//     its labels.
// 5.  **Call-Local State**: `transform` takes `&self`. Resolution maps and the
//     working arrays live on the stack of one call and the random source is
//     passed in, so one pipeline can serve many worker threads at once.

use crate::core_modules::keyed_collection::KeyedCollection;
use crate::core_modules::paired_transform::PairedTransform;
use crate::core_modules::tensor::tensor::Tensor;
use crate::error::{AugmentError, CollectionSide, Result};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

// Re-export key data structures for the public API.
pub use crate::core_modules::flip::{FlipAxis, PairedRandomFlip};
pub use crate::core_modules::identity_key::IdentityKey;
pub use crate::core_modules::paired_transform::{ImageLayout, LabelEncoding};
pub use crate::core_modules::resize::{CoordinateUnits, PairedResize};

/// An ordered, keyed registry of paired transforms.
#[derive(Clone, Default)]
pub struct PairedPipeline {
    transforms: Vec<(IdentityKey, Arc<dyn PairedTransform>)>,
}

impl PairedPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every transform against the first element of the collections.
    pub fn with_transforms<I>(transforms: I) -> Self
    where
        I: IntoIterator<Item = Box<dyn PairedTransform>>,
    {
        Self {
            transforms: transforms
                .into_iter()
                .map(|t| (IdentityKey::default(), Arc::from(t)))
                .collect(),
        }
    }

    /// Appends `transform` for the first element of the collections.
    pub fn add(self, transform: impl PairedTransform + 'static) -> Self {
        self.add_at(IdentityKey::default(), transform)
    }

    /// Appends `transform` for the element selected by `key` (an index or a name).
    pub fn add_at(
        mut self,
        key: impl Into<IdentityKey>,
        transform: impl PairedTransform + 'static,
    ) -> Self {
        self.transforms.push((key.into(), Arc::new(transform)));
        self
    }

    /// Inserts `transform` for the first element at `position` in the registry.
    pub fn insert(self, position: usize, transform: impl PairedTransform + 'static) -> Self {
        self.insert_at(position, IdentityKey::default(), transform)
    }

    /// Inserts `transform` for the element selected by `key` at `position` in
    /// the registry. Positions past the end append.
    pub fn insert_at(
        mut self,
        position: usize,
        key: impl Into<IdentityKey>,
        transform: impl PairedTransform + 'static,
    ) -> Self {
        let len = self.transforms.len();
        if position > len {
            warn!(position, len, "insert position past end of registry, appending");
        }
        self.transforms
            .insert(position.min(len), (key.into(), Arc::new(transform)));
        self
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Registered keys, in application order.
    pub fn keys(&self) -> impl Iterator<Item = &IdentityKey> {
        self.transforms.iter().map(|(key, _)| key)
    }

    /// Applies every registered transform, in order, to the paired collections.
    ///
    /// Returns the inputs unchanged when the registry or either collection is
    /// empty. Fails with `KeyNotFound` as soon as a key does not resolve on
    /// either side; no partial result is returned.
    pub fn transform(
        &self,
        input: KeyedCollection,
        target: KeyedCollection,
        rng: &mut dyn RngCore,
    ) -> Result<(KeyedCollection, KeyedCollection)> {
        if self.transforms.is_empty() || input.is_empty() || target.is_empty() {
            debug!(
                registered = self.transforms.len(),
                inputs = input.len(),
                targets = target.len(),
                "nothing to augment, returning collections unchanged"
            );
            return Ok((input, target));
        }

        let _span =
            tracing::debug_span!("paired_pipeline", steps = self.transforms.len()).entered();

        let input_map = input.resolution_map();
        let target_map = target.resolution_map();
        let mut inputs = input.into_vec();
        let mut targets = target.into_vec();

        for (step, (key, transform)) in self.transforms.iter().enumerate() {
            let input_index = resolve(&input_map, key, CollectionSide::Input)?;
            let target_index = resolve(&target_map, key, CollectionSide::Target)?;

            let input_tensor = std::mem::take(&mut inputs[input_index]);
            let target_tensor = std::mem::take(&mut targets[target_index]);
            let input_name = input_tensor.name().map(str::to_string);
            let target_name = target_tensor.name().map(str::to_string);

            let (mut new_input, mut new_target) =
                transform.apply(input_tensor, target_tensor, rng)?;
            new_input.set_name(input_name);
            new_target.set_name(target_name);

            inputs[input_index] = new_input;
            targets[target_index] = new_target;

            trace!(
                step,
                %key,
                transform = transform.name(),
                input_index,
                target_index,
                "applied paired transform"
            );
        }

        Ok((KeyedCollection::new(inputs), KeyedCollection::new(targets)))
    }

    /// `transform` with a fresh generator seeded from `seed`.
    pub fn transform_seeded(
        &self,
        input: KeyedCollection,
        target: KeyedCollection,
        seed: u64,
    ) -> Result<(KeyedCollection, KeyedCollection)> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.transform(input, target, &mut rng)
    }

    /// Single-tensor convenience: runs the pipeline on one image and one label.
    ///
    /// Both tensors sit at index 0, so only entries keyed by index 0 or by the
    /// tensor's own name resolve; any other key fails with `KeyNotFound`.
    pub fn transform_pair(
        &self,
        input: Tensor,
        target: Tensor,
        rng: &mut dyn RngCore,
    ) -> Result<(Tensor, Tensor)> {
        let (inputs, targets) = self.transform(input.into(), target.into(), rng)?;
        // `transform` never changes a collection's length.
        match (inputs.into_iter().next(), targets.into_iter().next()) {
            (Some(input), Some(target)) => Ok((input, target)),
            (input, _) => Err(AugmentError::invalid_shape(
                "paired_pipeline",
                format!(
                    "pipeline returned an empty {} collection for a single pair",
                    if input.is_none() { CollectionSide::Input } else { CollectionSide::Target }
                ),
            )),
        }
    }
}

fn resolve(
    map: &HashMap<IdentityKey, usize>,
    key: &IdentityKey,
    side: CollectionSide,
) -> Result<usize> {
    map.get(key).copied().ok_or_else(|| AugmentError::KeyNotFound {
        key: key.clone(),
        side,
    })
}

impl fmt::Debug for PairedPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(
                self.transforms
                    .iter()
                    .map(|(key, transform)| format!("{key} => {}", transform.name())),
            )
            .finish()
    }
}
