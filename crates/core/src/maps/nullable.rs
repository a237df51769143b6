use std::any::Any;
use std::sync::Arc;

use super::{ConvertFn, MapInit, MapLookup, TypeMap, assign, pair_reason, unsupported};
use crate::error::{MapError, Result};
use crate::registry::ResourceMapper;
use crate::types::{Constructors, OptionShape, Shape, TypeInfo};

/// Borrows the payload of the option in `slot`, inserting a fresh `inner`
/// first if it is empty.
fn payload<'a>(option: &OptionShape, inner: &TypeInfo, slot: &'a mut dyn Any, ctors: &dyn Constructors) -> Result<&'a mut dyn Any> {
	let mismatch = || MapError::Access {
		member: String::from("payload"),
		expected: inner.name(),
	};
	if (option.get_mut)(&mut *slot).is_none() {
		let value = ctors.construct_value(inner)?;
		(option.insert)(&mut *slot, value).map_err(|_| mismatch())?;
	}
	(option.get_mut)(slot).ok_or_else(mismatch)
}

/// Wraps a `T` into an `Option<U>` by mapping `T` into `U`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonNullableToNullable;

impl<C: 'static> TypeMap<C> for NonNullableToNullable {
	fn can_map(&self, from: &TypeInfo, to: &TypeInfo, lookup: &dyn MapLookup) -> bool {
		match (from.shape, to.shape) {
			(Shape::Option(_), _) => false,
			(_, Shape::Option(target)) => lookup.can_map(from, &(target.inner)()),
			_ => false,
		}
	}

	fn converter(&self, from: &TypeInfo, to: &TypeInfo, init: &mut MapInit<'_>) -> Result<ConvertFn<C>> {
		let Shape::Option(target) = to.shape else {
			return Err(unsupported(from, to));
		};
		let (from_ty, inner) = (*from, (target.inner)());
		init.require(from_ty, inner, pair_reason(from, to));
		Ok(Arc::new(move |mapper: &ResourceMapper<C>, from: &dyn Any, to: &mut dyn Any, ctx: &C| -> Result<()> {
			let slot = payload(&target, &inner, to, mapper)?;
			mapper.map_in_place(&from_ty, &inner, Some(from), slot, ctx)
		}))
	}
}

/// Maps `Option<T>` into `Option<U>`; `None` clears the destination.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullableToNullable;

impl<C: 'static> TypeMap<C> for NullableToNullable {
	fn can_map(&self, from: &TypeInfo, to: &TypeInfo, lookup: &dyn MapLookup) -> bool {
		match (from.shape, to.shape) {
			(Shape::Option(source), Shape::Option(target)) => lookup.can_map(&(source.inner)(), &(target.inner)()),
			_ => false,
		}
	}

	fn converter(&self, from: &TypeInfo, to: &TypeInfo, init: &mut MapInit<'_>) -> Result<ConvertFn<C>> {
		let (Shape::Option(source), Shape::Option(target)) = (from.shape, to.shape) else {
			return Err(unsupported(from, to));
		};
		let (from_inner, to_inner, to_ty) = ((source.inner)(), (target.inner)(), *to);
		init.require(from_inner, to_inner, pair_reason(from, to));
		Ok(Arc::new(move |mapper: &ResourceMapper<C>, from: &dyn Any, to: &mut dyn Any, ctx: &C| -> Result<()> {
			match (source.get)(from) {
				Some(value) => {
					let slot = payload(&target, &to_inner, to, mapper)?;
					mapper.map_in_place(&from_inner, &to_inner, Some(value), slot, ctx)
				}
				None => match to_ty.zero() {
					Some(none) => assign(&to_ty, to, none),
					None => Ok(()),
				},
			}
		}))
	}
}
