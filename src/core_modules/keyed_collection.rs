// THEORY:
// A `KeyedCollection` is the ordered list of tensors that makes up one side of
// a training sample: the "input" side usually holds the image(s), the
// "target" side the label geometry. Elements are read by position, and any
// element that carries a name can also be addressed by that name.
//
// Positions are stable for the duration of one pipeline call. Names should be
// unique within a collection; this is not enforced, and when a name repeats
// the last element carrying it wins resolution.

use crate::core_modules::identity_key::IdentityKey;
use crate::core_modules::tensor::tensor::Tensor;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct KeyedCollection {
    tensors: Vec<Tensor>,
}

impl KeyedCollection {
    pub fn new(tensors: Vec<Tensor>) -> Self {
        Self { tensors }
    }

    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Tensor> {
        self.tensors.get(index)
    }

    /// Finds the element carrying `name`.
    pub fn get_named(&self, name: &str) -> Option<&Tensor> {
        self.tensors.iter().rev().find(|t| t.name() == Some(name))
    }

    pub fn push(&mut self, tensor: Tensor) {
        self.tensors.push(tensor);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tensor> {
        self.tensors.iter()
    }

    pub fn names(&self) -> Vec<Option<&str>> {
        self.tensors.iter().map(Tensor::name).collect()
    }

    pub fn into_vec(self) -> Vec<Tensor> {
        self.tensors
    }

    /// Builds the lookup from key to current position: every element is
    /// reachable as `Indexed(i)`, named elements additionally as `Named(name)`.
    pub fn resolution_map(&self) -> HashMap<IdentityKey, usize> {
        let mut map = HashMap::with_capacity(self.tensors.len() * 2);
        for (i, tensor) in self.tensors.iter().enumerate() {
            if let Some(name) = tensor.name() {
                map.insert(IdentityKey::named(name), i);
            }
            map.insert(IdentityKey::indexed(i), i);
        }
        map
    }
}

impl From<Vec<Tensor>> for KeyedCollection {
    fn from(tensors: Vec<Tensor>) -> Self {
        Self::new(tensors)
    }
}

impl From<Tensor> for KeyedCollection {
    fn from(tensor: Tensor) -> Self {
        Self::new(vec![tensor])
    }
}

impl FromIterator<Tensor> for KeyedCollection {
    fn from_iter<I: IntoIterator<Item = Tensor>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl IntoIterator for KeyedCollection {
    type Item = Tensor;
    type IntoIter = std::vec::IntoIter<Tensor>;

    fn into_iter(self) -> Self::IntoIter {
        self.tensors.into_iter()
    }
}
