//! Compiles a verified plan into a conversion closure.
//!
//! Each executable entry becomes one [`MemberOp`]; ops run in binding order.
//! Direct ops clone (or move) the source value into the destination slot,
//! remapped ops hand both sides to the registry.

use std::any::Any;
use std::sync::Arc;

use crate::error::{MapError, Result};
use crate::maps::{self, ConvertFn};
use crate::plan::{Binding, PlanCore, SourceFn};
use crate::registry::ResourceMapper;
use crate::types::{AccessorChain, TypeInfo, Value};

enum OpSource<C> {
	/// Full chain from the plan's source root.
	Member(AccessorChain),
	Function {
		source_root: AccessorChain,
		destination_root: AccessorChain,
		function: SourceFn<C>,
	},
}

struct MemberOp<C> {
	label: String,
	source: OpSource<C>,
	source_type: TypeInfo,
	destination: AccessorChain,
	destination_type: TypeInfo,
	remap: bool,
}

impl<C: 'static> MemberOp<C> {
	fn apply(&self, mapper: &ResourceMapper<C>, from: &dyn Any, to: &mut dyn Any, ctx: &C) -> Result<()> {
		match &self.source {
			OpSource::Member(chain) => match chain.read(from)? {
				Some(value) => self.write_borrowed(mapper, value, to, ctx),
				None => self.write_null(mapper, to),
			},
			OpSource::Function {
				source_root,
				destination_root,
				function,
			} => {
				let Some(source) = source_root.read_object(from)? else {
					return self.write_null(mapper, to);
				};
				let value = if destination_root.is_empty() {
					function(source, &*to, ctx)?
				} else {
					let target = destination_root.object_mut(&mut *to, mapper)?;
					function(source, &*target, ctx)?
				};
				self.write_owned(mapper, value, to, ctx)
			}
		}
	}

	fn write_borrowed(&self, mapper: &ResourceMapper<C>, value: &dyn Any, to: &mut dyn Any, ctx: &C) -> Result<()> {
		let slot = self.destination.slot(to, mapper)?;
		if self.remap {
			return mapper.map_in_place(&self.source_type, &self.destination_type, Some(value), slot, ctx);
		}
		let owned = self
			.source_type
			.clone_value(value)
			.ok_or_else(|| self.mismatch(self.source_type.name()))?;
		self.assign(slot, owned)
	}

	fn write_owned(&self, mapper: &ResourceMapper<C>, value: Value, to: &mut dyn Any, ctx: &C) -> Result<()> {
		let slot = self.destination.slot(to, mapper)?;
		if self.remap {
			return mapper.map_in_place(&self.source_type, &self.destination_type, Some(&*value), slot, ctx);
		}
		self.assign(slot, value)
	}

	/// A null source writes the destination's zero value, or nothing.
	fn write_null(&self, mapper: &ResourceMapper<C>, to: &mut dyn Any) -> Result<()> {
		let Some(zero) = self.destination_type.zero() else {
			return Ok(());
		};
		let slot = self.destination.slot(to, mapper)?;
		self.assign(slot, zero)
	}

	fn assign(&self, slot: &mut dyn Any, value: Value) -> Result<()> {
		maps::assign(&self.destination_type, slot, value).map_err(|_| self.mismatch(self.destination_type.name()))
	}

	fn mismatch(&self, expected: &'static str) -> MapError {
		MapError::Access {
			member: self.label.clone(),
			expected,
		}
	}
}

/// Builds the conversion closure for a verified plan.
pub(crate) fn compile<C: 'static>(core: &PlanCore<C>) -> ConvertFn<C> {
	let ops: Vec<MemberOp<C>> = core
		.ordered()
		.into_iter()
		.filter_map(|entry| {
			let source = match &entry.binding {
				Binding::Member(chain) => OpSource::Member(entry.source_root.join(chain)),
				Binding::Function(function) => OpSource::Function {
					source_root: entry.source_root.clone(),
					destination_root: entry.destination_root.clone(),
					function: function.clone(),
				},
				Binding::Unbound | Binding::Ignored | Binding::Nested => return None,
			};
			Some(MemberOp {
				label: entry.destination_path(),
				source,
				source_type: entry.source_type?,
				destination: entry.destination.clone(),
				destination_type: entry.destination_type,
				remap: entry.requires_remap,
			})
		})
		.collect();
	let context = core.child_context.clone();

	Arc::new(move |mapper: &ResourceMapper<C>, from: &dyn Any, to: &mut dyn Any, ctx: &C| -> Result<()> {
		let child;
		let ctx = match &context {
			Some(transform) => {
				child = transform(from, &*to, ctx)?;
				&child
			}
			None => ctx,
		};
		for op in &ops {
			op.apply(mapper, from, &mut *to, ctx)?;
		}
		Ok(())
	})
}
