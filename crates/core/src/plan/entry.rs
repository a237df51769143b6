use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::types::{AccessorChain, TypeInfo, TypeKey, Value};

/// User function producing a member value from `(source, destination, context)`.
pub(crate) type SourceFn<C> = Arc<dyn Fn(&dyn Any, &dyn Any, &C) -> Result<Value> + Send + Sync>;

/// Derives the context handed to nested conversions.
pub(crate) type ContextFn<C> = Arc<dyn Fn(&dyn Any, &dyn Any, &C) -> Result<C> + Send + Sync>;

/// Whether a bound value passes through the type-map registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Remap {
	/// Remap unless the value can be copied as is.
	#[default]
	Auto,
	/// Always route through the registry.
	Always,
	/// Copy directly; binding fails if the types differ.
	Never,
}

/// How a destination member receives its value.
pub(crate) enum Binding<C> {
	Unbound,
	Ignored,
	/// Covered by bindings on its own members.
	Nested,
	/// Source member path, relative to the entry's source root.
	Member(AccessorChain),
	Function(SourceFn<C>),
}

/// Public view of a [`MemberEntry`]'s binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
	Unbound,
	Ignored,
	Nested,
	Member,
	Function,
}

/// Who produced a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingOrigin {
	Explicit,
	Automapped,
}

/// Binding state of one destination member.
pub struct MemberEntry<C> {
	pub(crate) destination: AccessorChain,
	pub(crate) destination_type: TypeInfo,
	pub(crate) source_root: AccessorChain,
	pub(crate) destination_root: AccessorChain,
	pub(crate) binding: Binding<C>,
	pub(crate) source_type: Option<TypeInfo>,
	pub(crate) requires_remap: bool,
	pub(crate) ordinal: u64,
	pub(crate) origin: BindingOrigin,
}

impl<C> MemberEntry<C> {
	pub(crate) fn unbound(destination: AccessorChain, destination_type: TypeInfo) -> Self {
		Self {
			destination,
			destination_type,
			source_root: AccessorChain::new(),
			destination_root: AccessorChain::new(),
			binding: Binding::Unbound,
			source_type: None,
			requires_remap: false,
			ordinal: 0,
			origin: BindingOrigin::Explicit,
		}
	}

	/// Dotted destination path from the plan's root.
	pub fn destination_path(&self) -> String {
		self.destination.path()
	}

	pub fn destination_type(&self) -> TypeKey {
		self.destination_type.key
	}

	/// Dotted source path from the plan's root, for member bindings.
	pub fn source_path(&self) -> Option<String> {
		match &self.binding {
			Binding::Member(chain) => Some(self.source_root.join(chain).path()),
			_ => None,
		}
	}

	pub fn source_type(&self) -> Option<TypeKey> {
		self.source_type.map(|t| t.key)
	}

	pub fn kind(&self) -> BindingKind {
		match self.binding {
			Binding::Unbound => BindingKind::Unbound,
			Binding::Ignored => BindingKind::Ignored,
			Binding::Nested => BindingKind::Nested,
			Binding::Member(_) => BindingKind::Member,
			Binding::Function(_) => BindingKind::Function,
		}
	}

	/// Bound to a source, a function, ignored, or covered by nested bindings.
	pub fn is_bound(&self) -> bool {
		!matches!(self.binding, Binding::Unbound)
	}

	pub fn is_ignored(&self) -> bool {
		matches!(self.binding, Binding::Ignored)
	}

	pub fn requires_remap(&self) -> bool {
		self.requires_remap
	}

	/// Declaration sequence number; members execute in ascending order.
	pub fn ordinal(&self) -> u64 {
		self.ordinal
	}

	pub fn origin(&self) -> BindingOrigin {
		self.origin
	}

	/// Whether this entry copies or converts a value when the plan runs.
	pub(crate) fn is_executable(&self) -> bool {
		matches!(self.binding, Binding::Member(_) | Binding::Function(_))
	}
}

impl<C> fmt::Debug for MemberEntry<C> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MemberEntry")
			.field("destination", &self.destination_path())
			.field("destination_type", &self.destination_type.key)
			.field("source", &self.source_path())
			.field("kind", &self.kind())
			.field("requires_remap", &self.requires_remap)
			.field("ordinal", &self.ordinal)
			.finish()
	}
}
