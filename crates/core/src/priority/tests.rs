use std::any::{Any, TypeId};

use proptest::prelude::*;

use super::*;

fn collect<T: Copy>(list: &PriorityList<T>) -> Vec<T> {
	list.iter().copied().collect()
}

/// Bands order RunFirst newest-first, then Normal and RunLast in insertion order.
#[test]
fn test_mixed_bands_enumerate_in_priority_order() {
	let mut list = PriorityList::new();
	list.add_with(Priority::Normal, 'a')
		.add_with(Priority::RunFirst, 'b')
		.add_with(Priority::Normal, 'c')
		.add_with(Priority::RunLast, 'd')
		.add_with(Priority::RunFirst, 'e');

	assert_eq!(collect(&list), vec!['e', 'b', 'a', 'c', 'd']);
}

/// Plain adds keep insertion order and later RunFirst items jump the queue.
#[test]
fn test_run_first_inserts_ahead_of_normal_items() {
	let mut list = PriorityList::new();
	list.add(1).add(2).add(3).add(4);
	list.add_with(Priority::RunFirst, 5);
	list.add_with(Priority::RunFirst, 6);

	assert_eq!(collect(&list), vec![6, 5, 1, 2, 3, 4]);
}

/// RunLast items stay behind Normal items added after them.
#[test]
fn test_run_last_stays_behind_later_normal_items() {
	let mut list = PriorityList::new();
	list.add_with(Priority::RunLast, 1).add_with(Priority::RunLast, 2).add(3);

	assert_eq!(collect(&list), vec![3, 1, 2]);
}

/// A cloned list continues the insertion counter of its origin.
#[test]
fn test_clone_continues_insertion_order() {
	let mut parent = PriorityList::new();
	parent.add(1).add_with(Priority::RunFirst, 2);

	let mut child = parent.clone();
	child.add_with(Priority::RunFirst, 3).add(4);

	assert_eq!(collect(&child), vec![3, 2, 1, 4]);
	assert_eq!(collect(&parent), vec![2, 1]);
}

/// Clear empties the list.
#[test]
fn test_clear_removes_everything() {
	let mut list = PriorityList::new();
	list.add(1).add_with(Priority::RunLast, 2);
	list.clear();

	assert!(list.is_empty());
	assert_eq!(list.len(), 0);
}

trait Named: Any {
	fn name(&self) -> &'static str;
}

struct Alpha;
struct Beta;

impl Named for Alpha {
	fn name(&self) -> &'static str {
		"alpha"
	}
}

impl Named for Beta {
	fn name(&self) -> &'static str {
		"beta"
	}
}

impl EntryType for Box<dyn Named> {
	fn entry_type(&self) -> TypeId {
		let any: &dyn Any = &**self;
		any.type_id()
	}
}

/// Type-based removal drops every item of the given concrete type.
#[test]
fn test_remove_all_of_type_drops_matching_items() {
	let mut list: PriorityList<Box<dyn Named>> = PriorityList::new();
	list.add(Box::new(Alpha))
		.add(Box::new(Beta))
		.add_with(Priority::RunFirst, Box::new(Alpha));

	list.remove_all_of_type::<Alpha>();

	let names: Vec<_> = list.iter().map(|n| n.name()).collect();
	assert_eq!(names, vec!["beta"]);
}

fn priority_strategy() -> impl Strategy<Value = Priority> {
	prop_oneof![
		Just(Priority::RunFirst),
		Just(Priority::Normal),
		Just(Priority::RunLast),
	]
}

proptest! {
	/// Every RunFirst item precedes every Normal item, which precede every RunLast item,
	/// and Normal items keep their insertion order.
	#[test]
	fn test_bands_never_interleave(priorities in prop::collection::vec(priority_strategy(), 0..40)) {
		let mut list = PriorityList::new();
		for (i, p) in priorities.iter().enumerate() {
			list.add_with(*p, (*p, i));
		}

		let ordered: Vec<_> = list.iter().copied().collect();
		let band = |p: Priority| match p {
			Priority::RunFirst => 0,
			Priority::Normal => 1,
			Priority::RunLast => 2,
		};
		for pair in ordered.windows(2) {
			prop_assert!(band(pair[0].0) <= band(pair[1].0));
		}

		let normal: Vec<_> = ordered.iter().filter(|(p, _)| *p == Priority::Normal).map(|(_, i)| *i).collect();
		let mut sorted = normal.clone();
		sorted.sort_unstable();
		prop_assert_eq!(normal, sorted);
	}
}
