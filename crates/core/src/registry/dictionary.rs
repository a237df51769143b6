use std::fmt;

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use crate::types::{Reflect, TypeKey};

/// Ordered `(from, to)` type pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypePair {
	pub from: TypeKey,
	pub to: TypeKey,
}

impl TypePair {
	pub fn new(from: TypeKey, to: TypeKey) -> Self {
		Self { from, to }
	}

	pub fn of<F: Reflect, T: Reflect>() -> Self {
		Self::new(TypeKey::of::<F>(), TypeKey::of::<T>())
	}
}

impl fmt::Display for TypePair {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} to {}", self.from, self.to)
	}
}

/// Insertion-ordered map keyed by [`TypePair`].
pub(crate) struct TypeDictionary<V> {
	entries: IndexMap<TypePair, V, FxBuildHasher>,
}

impl<V> Default for TypeDictionary<V> {
	fn default() -> Self {
		Self {
			entries: IndexMap::default(),
		}
	}
}

impl<V> TypeDictionary<V> {
	pub(crate) fn get(&self, pair: &TypePair) -> Option<&V> {
		self.entries.get(pair)
	}

	pub(crate) fn contains(&self, pair: &TypePair) -> bool {
		self.entries.contains_key(pair)
	}

	pub(crate) fn insert(&mut self, pair: TypePair, value: V) -> Option<V> {
		self.entries.insert(pair, value)
	}

	pub(crate) fn get_or_insert_with(&mut self, pair: TypePair, f: impl FnOnce() -> V) -> &mut V {
		self.entries.entry(pair).or_insert_with(f)
	}

	pub(crate) fn iter(&self) -> impl Iterator<Item = (&TypePair, &V)> {
		self.entries.iter()
	}

	pub(crate) fn values(&self) -> impl Iterator<Item = &V> {
		self.entries.values()
	}

	pub(crate) fn len(&self) -> usize {
		self.entries.len()
	}
}
