// THEORY:
// An `IdentityKey` names one slot of a `KeyedCollection`, either by the name a
// tensor carries or by its position. The same key is resolved against both the
// input and the target collection, which is how one registration addresses
// the same logical slot in image-space and label-space.
//
// The two discriminants never compare equal to each other, even when they
// would resolve to the same position: `Named("boxes")` and `Indexed(1)` are
// different registry keys. The key carries no behaviour of its own.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdentityKey {
    /// Selects the element whose name equals this string.
    Named(String),
    /// Selects the element at this position.
    Indexed(usize),
}

impl IdentityKey {
    pub fn named(name: impl Into<String>) -> Self {
        IdentityKey::Named(name.into())
    }

    pub fn indexed(index: usize) -> Self {
        IdentityKey::Indexed(index)
    }
}

impl Default for IdentityKey {
    /// The first element of a collection.
    fn default() -> Self {
        IdentityKey::Indexed(0)
    }
}

impl From<usize> for IdentityKey {
    fn from(index: usize) -> Self {
        IdentityKey::Indexed(index)
    }
}

impl From<&str> for IdentityKey {
    fn from(name: &str) -> Self {
        IdentityKey::Named(name.to_string())
    }
}

impl From<String> for IdentityKey {
    fn from(name: String) -> Self {
        IdentityKey::Named(name)
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityKey::Named(name) => write!(f, "name {name:?}"),
            IdentityKey::Indexed(index) => write!(f, "index {index}"),
        }
    }
}
