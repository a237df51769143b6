//! Type maps: the strategies the registry uses to build conversions.
//!
//! Each map answers whether it can convert a type pair and, when selected by
//! the initialization closure, produces a [`ConvertFn`] for it. Built-in maps
//! cover sequences, enums, value-like identity copies and optional wrappers;
//! [`object::MapObject`] compiles a [`crate::MappingPlan`] for a registered
//! one-way mapping.

use std::any::Any;
use std::sync::Arc;

mod collection;
mod enumeration;
mod nullable;
pub(crate) mod object;
mod value;

pub use collection::{MapArray, MapList};
pub use enumeration::MapEnum;
pub use nullable::{NonNullableToNullable, NullableToNullable};
pub use value::MapByValue;

use crate::consume::MemberConsumer;
use crate::diagnostics::PlanReport;
use crate::error::{MapError, Result};
use crate::priority::PriorityList;
use crate::registry::{Requirement, ResourceMapper, TypePair};
use crate::resolve::MemberResolver;
use crate::types::{TypeInfo, Value};

/// Compiled conversion: reads `from` and writes into the existing `to`.
pub type ConvertFn<C> = Arc<dyn Fn(&ResourceMapper<C>, &dyn Any, &mut dyn Any, &C) -> Result<()> + Send + Sync>;

/// Read-only view of what the registry can convert, used by
/// [`TypeMap::can_map`] to check element and payload types.
pub trait MapLookup {
	fn can_map(&self, from: &TypeInfo, to: &TypeInfo) -> bool;
}

/// Initialization context handed to a selected map.
pub struct MapInit<'a> {
	pub(crate) resolvers: &'a PriorityList<Arc<dyn MemberResolver>>,
	pub(crate) consumers: &'a PriorityList<Arc<dyn MemberConsumer>>,
	requirements: Vec<Requirement>,
}

impl<'a> MapInit<'a> {
	pub(crate) fn new(
		resolvers: &'a PriorityList<Arc<dyn MemberResolver>>,
		consumers: &'a PriorityList<Arc<dyn MemberConsumer>>,
	) -> Self {
		Self {
			resolvers,
			consumers,
			requirements: Vec::new(),
		}
	}

	/// Declares that the conversion being built needs `from` to `to`.
	pub fn require(&mut self, from: TypeInfo, to: TypeInfo, reason: impl Into<String>) {
		self.requirements.push(Requirement {
			from,
			to,
			reason: reason.into(),
		});
	}

	pub(crate) fn require_entry(&mut self, requirement: Requirement) {
		self.requirements.push(requirement);
	}

	pub(crate) fn into_requirements(self) -> Vec<Requirement> {
		self.requirements
	}
}

/// A strategy for converting between type pairs.
pub trait TypeMap<C>: Send {
	/// Whether this map can convert `from` into `to`.
	fn can_map(&self, from: &TypeInfo, to: &TypeInfo, lookup: &dyn MapLookup) -> bool;

	/// One-time setup before the first [`converter`](Self::converter) call.
	fn initialize(&mut self, _init: &mut MapInit<'_>) -> Result<()> {
		Ok(())
	}

	/// Builds the conversion for an accepted pair.
	fn converter(&self, from: &TypeInfo, to: &TypeInfo, init: &mut MapInit<'_>) -> Result<ConvertFn<C>>;

	/// The single pair this map serves, for maps bound to one pair.
	fn pair(&self) -> Option<TypePair> {
		None
	}

	/// Plan description for diagnostics export.
	fn report(&self) -> Option<PlanReport> {
		None
	}
}

/// The built-in maps in ascending precedence.
pub(crate) fn defaults<C: 'static>() -> Vec<Box<dyn TypeMap<C>>> {
	vec![
		Box::new(MapList),
		Box::new(MapArray),
		Box::new(MapEnum),
		Box::new(MapByValue),
		Box::new(NonNullableToNullable),
		Box::new(NullableToNullable),
	]
}

pub(crate) fn pair_reason(from: &TypeInfo, to: &TypeInfo) -> String {
	format!("{} => {}", from.name(), to.name())
}

/// Writes `value` into `slot` as a `ty`.
pub(crate) fn assign(ty: &TypeInfo, slot: &mut dyn Any, value: Value) -> Result<()> {
	ty.assign(slot, value).map_err(|_| MapError::Access {
		member: String::from("value"),
		expected: ty.name(),
	})
}

pub(crate) fn unsupported(from: &TypeInfo, to: &TypeInfo) -> MapError {
	MapError::Unmappable {
		from: from.name(),
		to: to.name(),
		hint: Some(String::from("the selected map does not support this pair")),
	}
}
