//! Priority-banded ordered collection used for member resolvers and consumers.

use std::any::TypeId;
use std::cmp::Ordering;

/// Placement band of an item in a [`PriorityList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Priority {
	/// Ahead of every other item. Later insertions run earlier.
	RunFirst,
	/// In insertion order.
	#[default]
	Normal,
	/// After every other item, in insertion order.
	RunLast,
}

/// Items that can report the concrete type they were created from.
///
/// Enables [`PriorityList::remove_all_of_type`] on lists of trait objects.
pub trait EntryType {
	fn entry_type(&self) -> TypeId;
}

#[derive(Debug, Clone)]
struct Entry<T> {
	item: T,
	priority: Priority,
	insertion: u64,
}

impl<T> Entry<T> {
	fn order(&self, other: &Self) -> Ordering {
		let band = |p: Priority| match p {
			Priority::RunFirst => 0,
			Priority::Normal => 1,
			Priority::RunLast => 2,
		};
		band(self.priority)
			.cmp(&band(other.priority))
			.then_with(|| match self.priority {
				Priority::RunFirst => other.insertion.cmp(&self.insertion),
				Priority::Normal | Priority::RunLast => self.insertion.cmp(&other.insertion),
			})
	}
}

/// Ordered collection partitioned into [`Priority`] bands.
///
/// Cloning copies every entry and the insertion counter, so items added to the
/// clone keep sorting correctly against the copied ones.
#[derive(Debug, Clone)]
pub struct PriorityList<T> {
	entries: Vec<Entry<T>>,
	next_insertion: u64,
}

impl<T> Default for PriorityList<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T> PriorityList<T> {
	pub fn new() -> Self {
		Self {
			entries: Vec::new(),
			next_insertion: 0,
		}
	}

	/// Adds an item with [`Priority::Normal`].
	pub fn add(&mut self, item: T) -> &mut Self {
		self.add_with(Priority::Normal, item)
	}

	/// Adds an item in the given band.
	pub fn add_with(&mut self, priority: Priority, item: T) -> &mut Self {
		let entry = Entry {
			item,
			priority,
			insertion: self.next_insertion,
		};
		self.next_insertion += 1;
		let at = self
			.entries
			.partition_point(|e| e.order(&entry) == Ordering::Less);
		self.entries.insert(at, entry);
		self
	}

	pub fn clear(&mut self) {
		self.entries.clear();
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Items in priority order.
	pub fn iter(&self) -> impl Iterator<Item = &T> {
		self.entries.iter().map(|e| &e.item)
	}
}

impl<T: EntryType> PriorityList<T> {
	/// Removes every item whose concrete type is `U`.
	pub fn remove_all_of_type<U: 'static>(&mut self) -> &mut Self {
		let target = TypeId::of::<U>();
		self.entries.retain(|e| e.item.entry_type() != target);
		self
	}
}

#[cfg(test)]
mod tests;
