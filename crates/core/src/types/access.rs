use std::any::Any;

use smallvec::SmallVec;

use super::{MemberInfo, OptionShape, Shape, TypeInfo, Value};
use crate::error::{MapError, Result};

/// Source of fresh instances for intermediate objects along a write path.
pub trait Constructors {
	/// Builds a new instance of `ty`.
	fn construct_value(&self, ty: &TypeInfo) -> Result<Value>;
}

#[derive(Clone, Copy, Debug)]
struct Step {
	owner: &'static str,
	member: MemberInfo,
	through: Option<(OptionShape, TypeInfo)>,
}

impl Step {
	fn mismatch(&self) -> MapError {
		MapError::Access {
			member: self.member.name.to_string(),
			expected: self.owner,
		}
	}
}

/// Resolved chain of member accessors for a dotted path.
///
/// Every step except the last sees through `Option` members. Reads stop with
/// `None` at an empty intermediate; writes construct it first.
#[derive(Clone, Debug, Default)]
pub(crate) struct AccessorChain {
	steps: SmallVec<[Step; 2]>,
}

impl AccessorChain {
	pub(crate) fn new() -> Self {
		Self::default()
	}

	/// Resolves `path` against `root`, returning a readable reason on failure.
	pub(crate) fn resolve(root: &TypeInfo, path: &[&str]) -> std::result::Result<Self, String> {
		let mut chain = Self::new();
		let mut current = *root;
		for name in path {
			if !matches!(current.shape, Shape::Object(_)) {
				return Err(format!("{} has no members", current.name()));
			}
			let Some(member) = current.member(name) else {
				return Err(format!("{} has no member named `{name}`", current.name()));
			};
			chain.push(current.name(), member);
			current = member.type_info().unwrapped();
		}
		Ok(chain)
	}

	pub(crate) fn push(&mut self, owner: &'static str, member: MemberInfo) {
		let ty = member.type_info();
		let through = match ty.shape {
			Shape::Option(option) => Some((option, (option.inner)())),
			_ => None,
		};
		self.steps.push(Step {
			owner,
			member,
			through,
		});
	}

	/// Concatenates two chains.
	pub(crate) fn join(&self, tail: &AccessorChain) -> AccessorChain {
		let mut steps = self.steps.clone();
		steps.extend(tail.steps.iter().copied());
		AccessorChain { steps }
	}

	pub(crate) fn len(&self) -> usize {
		self.steps.len()
	}

	pub(crate) fn is_empty(&self) -> bool {
		self.steps.is_empty()
	}

	pub(crate) fn members(&self) -> impl Iterator<Item = &MemberInfo> {
		self.steps.iter().map(|s| &s.member)
	}

	pub(crate) fn last(&self) -> Option<&MemberInfo> {
		self.steps.last().map(|s| &s.member)
	}

	pub(crate) fn names(&self) -> Vec<&'static str> {
		self.steps.iter().map(|s| s.member.name).collect()
	}

	/// Dotted path, empty for the root.
	pub(crate) fn path(&self) -> String {
		self.names().join(".")
	}

	pub(crate) fn starts_with(&self, prefix: &[&str]) -> bool {
		self.steps.len() >= prefix.len() && self.steps.iter().zip(prefix).all(|(s, name)| s.member.name == *name)
	}

	/// Reads the member value. `None` means an intermediate option was empty.
	pub(crate) fn read<'a>(&self, root: &'a dyn Any) -> Result<Option<&'a dyn Any>> {
		self.walk(root, false)
	}

	/// Reads the object the chain leads to, seeing through a trailing option.
	pub(crate) fn read_object<'a>(&self, root: &'a dyn Any) -> Result<Option<&'a dyn Any>> {
		self.walk(root, true)
	}

	/// Borrows the member slot for writing, constructing empty intermediates.
	pub(crate) fn slot<'a>(&self, root: &'a mut dyn Any, ctors: &dyn Constructors) -> Result<&'a mut dyn Any> {
		self.walk_mut(root, false, ctors)
	}

	/// Borrows the object the chain leads to for writing, constructing it if empty.
	pub(crate) fn object_mut<'a>(&self, root: &'a mut dyn Any, ctors: &dyn Constructors) -> Result<&'a mut dyn Any> {
		self.walk_mut(root, true, ctors)
	}

	fn walk<'a>(&self, root: &'a dyn Any, through_last: bool) -> Result<Option<&'a dyn Any>> {
		let last = self.steps.len().saturating_sub(1);
		let mut current = root;
		for (i, step) in self.steps.iter().enumerate() {
			let field = (step.member.get)(current).ok_or_else(|| step.mismatch())?;
			current = match step.through {
				Some((option, _)) if i < last || through_last => match (option.get)(field) {
					Some(inner) => inner,
					None => return Ok(None),
				},
				_ => field,
			};
		}
		Ok(Some(current))
	}

	fn walk_mut<'a>(&self, root: &'a mut dyn Any, through_last: bool, ctors: &dyn Constructors) -> Result<&'a mut dyn Any> {
		let last = self.steps.len().saturating_sub(1);
		let mut current = root;
		for (i, step) in self.steps.iter().enumerate() {
			let field = (step.member.get_mut)(current).ok_or_else(|| step.mismatch())?;
			current = match step.through {
				Some((option, inner)) if i < last || through_last => {
					if (option.get_mut)(&mut *field).is_none() {
						let value = ctors.construct_value(&inner)?;
						(option.insert)(&mut *field, value).map_err(|_| step.mismatch())?;
					}
					(option.get_mut)(field).ok_or_else(|| step.mismatch())?
				}
				_ => field,
			};
		}
		Ok(current)
	}
}
