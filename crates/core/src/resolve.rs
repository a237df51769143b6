//! Member resolution strategies.

use std::any::{Any, TypeId};
use std::sync::Arc;

use crate::priority::EntryType;
use crate::types::{MemberInfo, TypeKey};

/// The type pair a plan is being built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanScope {
	pub from: TypeKey,
	pub to: TypeKey,
}

/// Decides whether a source member is a plausible origin for a destination member.
///
/// Implementations must be side-effect free; they are queried many times per plan.
pub trait MemberResolver: Any + Send + Sync {
	fn is_source_for(&self, destination: &MemberInfo, source: &MemberInfo, scope: &PlanScope) -> bool;
}

impl EntryType for Arc<dyn MemberResolver> {
	fn entry_type(&self) -> TypeId {
		let any: &dyn Any = &**self;
		any.type_id()
	}
}

/// Matches members whose names are equal ignoring ASCII case.
#[derive(Debug, Clone, Copy, Default)]
pub struct IgnoreCaseNameMatcher;

impl MemberResolver for IgnoreCaseNameMatcher {
	fn is_source_for(&self, destination: &MemberInfo, source: &MemberInfo, _scope: &PlanScope) -> bool {
		destination.name.eq_ignore_ascii_case(source.name)
	}
}
