use std::any::Any;
use std::sync::Arc;

use super::{ConvertFn, MapInit, MapLookup, TypeMap, assign, unsupported};
use crate::error::{MapError, Result};
use crate::registry::ResourceMapper;
use crate::types::TypeInfo;

/// Identity copy for value-like types.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapByValue;

impl<C: 'static> TypeMap<C> for MapByValue {
	fn can_map(&self, from: &TypeInfo, to: &TypeInfo, _lookup: &dyn MapLookup) -> bool {
		from.key == to.key && from.is_value_like() && from.is_cloneable()
	}

	fn converter(&self, from: &TypeInfo, to: &TypeInfo, _init: &mut MapInit<'_>) -> Result<ConvertFn<C>> {
		if from.key != to.key {
			return Err(unsupported(from, to));
		}
		let ty = *to;
		Ok(Arc::new(move |_: &ResourceMapper<C>, from: &dyn Any, to: &mut dyn Any, _: &C| -> Result<()> {
			let value = ty.clone_value(from).ok_or_else(|| MapError::Access {
				member: String::from("value"),
				expected: ty.name(),
			})?;
			assign(&ty, to, value)
		}))
	}
}
