//! Map types.

use indexmap::IndexMap;
use std::{
    collections::{HashMap, HashSet},
    hash::BuildHasherDefault,
};

pub use rustc_hash::{self, FxBuildHasher, FxHasher};

/// A [`HashMap`] using [`FxHasher`] as its hasher.
pub type FxHashMap<K, V> = HashMap<K, V, BuildHasherDefault<FxHasher>>;
/// A [`HashSet`] using [`FxHasher`] as its hasher.
pub type FxHashSet<V> = HashSet<V, BuildHasherDefault<FxHasher>>;
/// An [`IndexMap`] using [`FxHasher`] as its hasher.
pub type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;
