use std::any::Any;
use std::fmt;

use super::{Reflect, TypeInfo, TypeKey};

/// One named member of an object type.
///
/// The accessors borrow the member out of its owner. They return `None` when
/// handed an owner of a different type.
#[derive(Clone, Copy)]
pub struct MemberInfo {
	pub name: &'static str,
	pub key: TypeKey,
	pub ty: fn() -> TypeInfo,
	pub readable: bool,
	pub writable: bool,
	pub get: fn(&dyn Any) -> Option<&dyn Any>,
	pub get_mut: fn(&mut dyn Any) -> Option<&mut dyn Any>,
}

impl MemberInfo {
	/// A readable and writable member of type `V`.
	pub fn new<V: Reflect>(
		name: &'static str,
		get: fn(&dyn Any) -> Option<&dyn Any>,
		get_mut: fn(&mut dyn Any) -> Option<&mut dyn Any>,
	) -> Self {
		Self {
			name,
			key: TypeKey::of::<V>(),
			ty: V::type_info,
			readable: true,
			writable: true,
			get,
			get_mut,
		}
	}

	/// Marks the member as not writable by mappings.
	pub fn read_only(mut self) -> Self {
		self.writable = false;
		self
	}

	/// Marks the member as not readable by mappings.
	pub fn write_only(mut self) -> Self {
		self.readable = false;
		self
	}

	/// Reflection record of the member's declared type.
	pub fn type_info(&self) -> TypeInfo {
		(self.ty)()
	}
}

impl fmt::Debug for MemberInfo {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MemberInfo")
			.field("name", &self.name)
			.field("type", &self.key)
			.field("readable", &self.readable)
			.field("writable", &self.writable)
			.finish()
	}
}
