//! Type reflection facade.
//!
//! Every mappable type describes itself through a [`TypeInfo`]: a `Copy`
//! table of function pointers that lets the engine inspect members, build
//! zero values and move type-erased [`Value`]s in and out of slots without
//! knowing the concrete type at compile time.
//!
//! Types opt in by implementing [`Reflect`], usually through
//! `#[derive(Reflect)]`. Primitives, `String`, `Option<T>`, `Vec<T>` and
//! `Box<[T]>` are covered here.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

mod access;
mod impls;
mod member;

pub(crate) use access::AccessorChain;
pub use access::Constructors;
pub use member::MemberInfo;

/// A type-erased owned value.
pub type Value = Box<dyn Any>;

/// A type whose shape the mapping engine can inspect.
pub trait Reflect: Any + Sized {
	/// Describes the type.
	fn type_info() -> TypeInfo;
}

/// Stable identity of a type: its [`TypeId`] plus a readable name.
///
/// Equality and hashing only consider the [`TypeId`].
#[derive(Clone, Copy)]
pub struct TypeKey {
	id: TypeId,
	name: &'static str,
}

impl TypeKey {
	/// Returns the key for `T`.
	pub fn of<T: Any + ?Sized>() -> Self {
		Self {
			id: TypeId::of::<T>(),
			name: std::any::type_name::<T>(),
		}
	}

	/// Returns the underlying [`TypeId`].
	pub fn id(&self) -> TypeId {
		self.id
	}

	/// Returns the fully qualified type name.
	pub fn name(&self) -> &'static str {
		self.name
	}
}

impl PartialEq for TypeKey {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
	}
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.id.hash(state);
	}
}

impl fmt::Debug for TypeKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name)
	}
}

impl fmt::Display for TypeKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name)
	}
}

/// Structural description of a type.
#[derive(Clone, Copy, Debug)]
pub enum Shape {
	/// Primitive or immutable leaf copied by value.
	Value,
	/// Fieldless enum addressed by variant name.
	Enum(EnumShape),
	/// `Option<T>`.
	Option(OptionShape),
	/// Growable sequence (`Vec<T>`).
	List(SeqShape),
	/// Fixed sequence (`Box<[T]>`).
	Array(SeqShape),
	/// Struct with named members.
	Object(ObjectShape),
}

/// Variant table of a fieldless enum.
#[derive(Clone, Copy, Debug)]
pub struct EnumShape {
	pub variants: &'static [&'static str],
	pub name_of: fn(&dyn Any) -> Option<&'static str>,
	pub from_name: fn(&str) -> Option<Value>,
}

impl EnumShape {
	/// Parses a variant name, ignoring ASCII case.
	pub fn parse_ignore_case(&self, name: &str) -> Option<Value> {
		let variant = self.variants.iter().find(|v| v.eq_ignore_ascii_case(name))?;
		(self.from_name)(variant)
	}
}

/// Accessors for the payload of an `Option<T>`.
#[derive(Clone, Copy, Debug)]
pub struct OptionShape {
	pub inner: fn() -> TypeInfo,
	pub get: fn(&dyn Any) -> Option<&dyn Any>,
	pub get_mut: fn(&mut dyn Any) -> Option<&mut dyn Any>,
	/// Replaces the option with `Some(value)`.
	pub insert: fn(&mut dyn Any, Value) -> Result<(), Value>,
}

/// Element access for list and array shapes.
#[derive(Clone, Copy, Debug)]
pub struct SeqShape {
	pub element: fn() -> TypeInfo,
	pub items: fn(&dyn Any) -> Vec<&dyn Any>,
	/// Replaces the whole sequence with the given elements.
	pub replace: fn(&mut dyn Any, Vec<Value>) -> Result<(), Value>,
}

/// Member table of a struct.
#[derive(Clone, Copy, Debug)]
pub struct ObjectShape {
	pub members: fn() -> Vec<MemberInfo>,
}

/// Reflection record for one type.
#[derive(Clone, Copy, Debug)]
pub struct TypeInfo {
	pub key: TypeKey,
	pub shape: Shape,
	zero: Option<fn() -> Value>,
	construct: Option<fn() -> Value>,
	clone_value: Option<fn(&dyn Any) -> Option<Value>>,
	assign: fn(&mut dyn Any, Value) -> Result<(), Value>,
}

impl TypeInfo {
	/// Returns the reflection record of `T`.
	pub fn of<T: Reflect>() -> Self {
		T::type_info()
	}

	/// Describes a value-like leaf type.
	pub fn value<T: Any + Clone + Default>() -> Self {
		Self {
			key: TypeKey::of::<T>(),
			shape: Shape::Value,
			zero: Some(default_value::<T>),
			construct: Some(default_value::<T>),
			clone_value: Some(clone_value::<T>),
			assign: assign::<T>,
		}
	}

	/// Describes a fieldless enum. `zero` produces the default variant.
	///
	/// Enum values copy by value, so `T` must be `Clone`.
	pub fn enumeration<T: Any + Clone>(
		variants: &'static [&'static str],
		name_of: fn(&dyn Any) -> Option<&'static str>,
		from_name: fn(&str) -> Option<Value>,
		zero: fn() -> Value,
	) -> Self {
		Self {
			key: TypeKey::of::<T>(),
			shape: Shape::Enum(EnumShape {
				variants,
				name_of,
				from_name,
			}),
			zero: Some(zero),
			construct: Some(zero),
			clone_value: Some(clone_value::<T>),
			assign: assign::<T>,
		}
	}

	/// Describes a struct with named members.
	pub fn object<T: Any>(members: fn() -> Vec<MemberInfo>, construct: Option<fn() -> Value>) -> Self {
		Self {
			key: TypeKey::of::<T>(),
			shape: Shape::Object(ObjectShape { members }),
			zero: None,
			construct,
			clone_value: None,
			assign: assign::<T>,
		}
	}

	/// Describes `Option<T>`.
	pub fn option<T: Reflect>() -> Self {
		Self {
			key: TypeKey::of::<Option<T>>(),
			shape: Shape::Option(OptionShape {
				inner: T::type_info,
				get: option_get::<T>,
				get_mut: option_get_mut::<T>,
				insert: option_insert::<T>,
			}),
			zero: Some(none_value::<T>),
			construct: Some(none_value::<T>),
			clone_value: None,
			assign: assign::<Option<T>>,
		}
	}

	/// Describes `Vec<T>`.
	pub fn list<T: Reflect>() -> Self {
		Self {
			key: TypeKey::of::<Vec<T>>(),
			shape: Shape::List(SeqShape {
				element: T::type_info,
				items: vec_items::<T>,
				replace: vec_replace::<T>,
			}),
			zero: Some(default_value::<Vec<T>>),
			construct: Some(default_value::<Vec<T>>),
			clone_value: None,
			assign: assign::<Vec<T>>,
		}
	}

	/// Describes `Box<[T]>`.
	pub fn array<T: Reflect>() -> Self {
		Self {
			key: TypeKey::of::<Box<[T]>>(),
			shape: Shape::Array(SeqShape {
				element: T::type_info,
				items: slice_items::<T>,
				replace: slice_replace::<T>,
			}),
			zero: Some(default_value::<Box<[T]>>),
			construct: Some(default_value::<Box<[T]>>),
			clone_value: None,
			assign: assign::<Box<[T]>>,
		}
	}

	/// Returns the type name.
	pub fn name(&self) -> &'static str {
		self.key.name()
	}

	/// Primitives, strings and fieldless enums.
	pub fn is_value_like(&self) -> bool {
		matches!(self.shape, Shape::Value | Shape::Enum(_))
	}

	/// Value written when the source of a conversion is null, if the type has one.
	pub fn zero(&self) -> Option<Value> {
		self.zero.map(|zero| zero())
	}

	/// Builds an instance through the type's own parameterless constructor.
	pub fn construct(&self) -> Option<Value> {
		self.construct.map(|construct| construct())
	}

	/// Whether the type has a parameterless constructor.
	pub fn is_constructible(&self) -> bool {
		self.construct.is_some()
	}

	/// Clones a borrowed value of this type. Only value-like types can be cloned.
	pub fn clone_value(&self, value: &dyn Any) -> Option<Value> {
		self.clone_value.and_then(|clone| clone(value))
	}

	/// Whether [`clone_value`](Self::clone_value) is supported.
	pub fn is_cloneable(&self) -> bool {
		self.clone_value.is_some()
	}

	/// Moves `value` into `slot`. Hands the value back if either side has the wrong type.
	pub fn assign(&self, slot: &mut dyn Any, value: Value) -> Result<(), Value> {
		(self.assign)(slot, value)
	}

	/// Members of an object type, empty for every other shape.
	pub fn members(&self) -> Vec<MemberInfo> {
		match self.shape {
			Shape::Object(object) => (object.members)(),
			_ => Vec::new(),
		}
	}

	/// Looks up a member by exact name.
	pub fn member(&self, name: &str) -> Option<MemberInfo> {
		self.members().into_iter().find(|m| m.name == name)
	}

	/// The type reached when navigating through this type: `T` for `Option<T>`, itself otherwise.
	pub fn unwrapped(&self) -> TypeInfo {
		match self.shape {
			Shape::Option(option) => (option.inner)(),
			_ => *self,
		}
	}
}

fn default_value<T: Any + Default>() -> Value {
	Box::new(T::default())
}

fn none_value<T: Any>() -> Value {
	Box::new(None::<T>)
}

fn clone_value<T: Any + Clone>(value: &dyn Any) -> Option<Value> {
	value.downcast_ref::<T>().map(|v| Box::new(v.clone()) as Value)
}

fn assign<T: Any>(slot: &mut dyn Any, value: Value) -> Result<(), Value> {
	let Some(slot) = slot.downcast_mut::<T>() else {
		return Err(value);
	};
	*slot = *value.downcast::<T>()?;
	Ok(())
}

fn option_get<T: Any>(value: &dyn Any) -> Option<&dyn Any> {
	value
		.downcast_ref::<Option<T>>()?
		.as_ref()
		.map(|v| v as &dyn Any)
}

fn option_get_mut<T: Any>(value: &mut dyn Any) -> Option<&mut dyn Any> {
	value
		.downcast_mut::<Option<T>>()?
		.as_mut()
		.map(|v| v as &mut dyn Any)
}

fn option_insert<T: Any>(slot: &mut dyn Any, value: Value) -> Result<(), Value> {
	let Some(slot) = slot.downcast_mut::<Option<T>>() else {
		return Err(value);
	};
	*slot = Some(*value.downcast::<T>()?);
	Ok(())
}

fn vec_items<T: Any>(value: &dyn Any) -> Vec<&dyn Any> {
	value
		.downcast_ref::<Vec<T>>()
		.map(|items| items.iter().map(|v| v as &dyn Any).collect())
		.unwrap_or_default()
}

fn slice_items<T: Any>(value: &dyn Any) -> Vec<&dyn Any> {
	value
		.downcast_ref::<Box<[T]>>()
		.map(|items| items.iter().map(|v| v as &dyn Any).collect())
		.unwrap_or_default()
}

fn downcast_all<T: Any>(values: Vec<Value>) -> Result<Vec<T>, Value> {
	values
		.into_iter()
		.map(|v| v.downcast::<T>().map(|v| *v))
		.collect()
}

fn vec_replace<T: Any>(slot: &mut dyn Any, values: Vec<Value>) -> Result<(), Value> {
	let Some(slot) = slot.downcast_mut::<Vec<T>>() else {
		return Err(Box::new(values));
	};
	*slot = downcast_all(values)?;
	Ok(())
}

fn slice_replace<T: Any>(slot: &mut dyn Any, values: Vec<Value>) -> Result<(), Value> {
	let Some(slot) = slot.downcast_mut::<Box<[T]>>() else {
		return Err(Box::new(values));
	};
	*slot = downcast_all(values)?.into_boxed_slice();
	Ok(())
}

#[cfg(test)]
mod tests;
