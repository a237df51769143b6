use std::any::Any;
use std::sync::Arc;

use super::{ConvertFn, MapInit, MapLookup, TypeMap, pair_reason, unsupported};
use crate::error::{MapError, Result};
use crate::registry::ResourceMapper;
use crate::types::{SeqShape, Shape, TypeInfo};

fn sequence(ty: &TypeInfo) -> Option<SeqShape> {
	match ty.shape {
		Shape::List(seq) | Shape::Array(seq) => Some(seq),
		_ => None,
	}
}

fn elements_mappable(from: SeqShape, to: SeqShape, lookup: &dyn MapLookup) -> bool {
	lookup.can_map(&(from.element)(), &(to.element)())
}

/// Maps every element into a fresh sequence and replaces the destination.
fn convert_elements<C: 'static>(from: &TypeInfo, to: &TypeInfo, source: SeqShape, target: SeqShape, init: &mut MapInit<'_>) -> ConvertFn<C> {
	let (from_element, to_element) = ((source.element)(), (target.element)());
	init.require(from_element, to_element, pair_reason(from, to));
	let to_name = to.name();
	Arc::new(move |mapper: &ResourceMapper<C>, from: &dyn Any, to: &mut dyn Any, ctx: &C| -> Result<()> {
		let items = (source.items)(from);
		let mut values = Vec::with_capacity(items.len());
		for item in items {
			let mut element = mapper.construct_value(&to_element)?;
			mapper.map_in_place(&from_element, &to_element, Some(item), &mut *element, ctx)?;
			values.push(element);
		}
		(target.replace)(to, values).map_err(|_| MapError::Access {
			member: String::from("elements"),
			expected: to_name,
		})
	})
}

/// Any list or array into a `Vec<T>`, element by element.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapList;

impl<C: 'static> TypeMap<C> for MapList {
	fn can_map(&self, from: &TypeInfo, to: &TypeInfo, lookup: &dyn MapLookup) -> bool {
		match (sequence(from), to.shape) {
			(Some(source), Shape::List(target)) => elements_mappable(source, target, lookup),
			_ => false,
		}
	}

	fn converter(&self, from: &TypeInfo, to: &TypeInfo, init: &mut MapInit<'_>) -> Result<ConvertFn<C>> {
		match (sequence(from), to.shape) {
			(Some(source), Shape::List(target)) => Ok(convert_elements(from, to, source, target, init)),
			_ => Err(unsupported(from, to)),
		}
	}
}

/// Any list or array into a `Box<[T]>`, element by element.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapArray;

impl<C: 'static> TypeMap<C> for MapArray {
	fn can_map(&self, from: &TypeInfo, to: &TypeInfo, lookup: &dyn MapLookup) -> bool {
		match (sequence(from), to.shape) {
			(Some(source), Shape::Array(target)) => elements_mappable(source, target, lookup),
			_ => false,
		}
	}

	fn converter(&self, from: &TypeInfo, to: &TypeInfo, init: &mut MapInit<'_>) -> Result<ConvertFn<C>> {
		match (sequence(from), to.shape) {
			(Some(source), Shape::Array(target)) => Ok(convert_elements(from, to, source, target, init)),
			_ => Err(unsupported(from, to)),
		}
	}
}
