//! Member consumers: strategies that turn resolver answers into bindings.

use std::any::{Any, TypeId};
use std::sync::Arc;

use crate::error::Result;
use crate::priority::EntryType;
use crate::resolve::{MemberResolver, PlanScope};
use crate::types::MemberInfo;

/// The automapping surface a plan exposes to member consumers.
pub trait Automap {
	/// Type pair of the (sub-)plan being automapped.
	fn scope(&self) -> PlanScope;
	/// Resolvers in priority order.
	fn resolvers(&self) -> Vec<Arc<dyn MemberResolver>>;
	/// Writable destination members without a binding.
	fn unmapped_destinations(&self) -> Vec<MemberInfo>;
	/// Source members still available for binding.
	fn available_sources(&self) -> Vec<MemberInfo>;
	/// Binds `destination` to `source`, removing both from the unmapped pools.
	fn bind(&mut self, destination: &MemberInfo, source: &MemberInfo) -> Result<()>;
}

/// Proposes member-to-member bindings for a plan.
pub trait MemberConsumer: Any + Send + Sync {
	fn consume(&self, plan: &mut dyn Automap) -> Result<()>;
}

impl EntryType for Arc<dyn MemberConsumer> {
	fn entry_type(&self) -> TypeId {
		let any: &dyn Any = &**self;
		any.type_id()
	}
}

/// Runs every resolver against every unmapped destination; the first accepted
/// source wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMemberConsumer;

impl MemberConsumer for DefaultMemberConsumer {
	fn consume(&self, plan: &mut dyn Automap) -> Result<()> {
		let scope = plan.scope();
		for resolver in plan.resolvers() {
			for destination in plan.unmapped_destinations() {
				let source = plan
					.available_sources()
					.into_iter()
					.find(|source| resolver.is_source_for(&destination, source, &scope));
				if let Some(source) = source {
					tracing::trace!(
						from = scope.from.name(),
						to = scope.to.name(),
						destination = destination.name,
						source = source.name,
						"automapped member"
					);
					plan.bind(&destination, &source)?;
				}
			}
		}
		Ok(())
	}
}
