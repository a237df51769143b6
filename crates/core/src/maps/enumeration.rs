use std::any::Any;
use std::sync::Arc;

use super::{ConvertFn, MapInit, MapLookup, TypeMap, assign, unsupported};
use crate::error::{MapError, Result};
use crate::registry::ResourceMapper;
use crate::types::{EnumShape, Shape, TypeInfo};

fn sorted(shape: &EnumShape) -> Vec<&'static str> {
	let mut names = shape.variants.to_vec();
	names.sort_unstable();
	names
}

/// Converts between enums with identical variant names, by name.
///
/// Variant matching ignores ASCII case at conversion time but the name sets
/// must match exactly for the map to apply.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapEnum;

impl<C: 'static> TypeMap<C> for MapEnum {
	fn can_map(&self, from: &TypeInfo, to: &TypeInfo, _lookup: &dyn MapLookup) -> bool {
		match (from.shape, to.shape) {
			(Shape::Enum(source), Shape::Enum(target)) => sorted(&source) == sorted(&target),
			_ => false,
		}
	}

	fn converter(&self, from: &TypeInfo, to: &TypeInfo, _init: &mut MapInit<'_>) -> Result<ConvertFn<C>> {
		let (Shape::Enum(source), Shape::Enum(target)) = (from.shape, to.shape) else {
			return Err(unsupported(from, to));
		};
		let (from_ty, to_ty) = (*from, *to);
		Ok(Arc::new(move |_: &ResourceMapper<C>, from: &dyn Any, to: &mut dyn Any, _: &C| -> Result<()> {
			let name = (source.name_of)(from).ok_or_else(|| MapError::access::<dyn Any>("variant"))?;
			let value = target.parse_ignore_case(name).ok_or_else(|| MapError::Conversion {
				from: from_ty.name(),
				to: to_ty.name(),
				message: format!("no variant named `{name}`"),
			})?;
			assign(&to_ty, to, value)
		}))
	}
}
