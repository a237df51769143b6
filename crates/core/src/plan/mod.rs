//! Mapping plans: per type-pair binding state for every destination member.
//!
//! A plan starts with one unbound entry per writable destination member.
//! User overrides bind some of them, member consumers automap the rest, and
//! verification rejects the plan if anything is left unbound. The finished
//! plan is compiled by [`crate::builder`].

use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

mod entry;
mod view;

pub use entry::{BindingKind, BindingOrigin, MemberEntry, Remap};
pub(crate) use entry::{Binding, ContextFn, SourceFn};
pub(crate) use view::PlanView;

use crate::consume::MemberConsumer;
use crate::error::{MapError, Result};
use crate::priority::PriorityList;
use crate::registry::Requirement;
use crate::resolve::MemberResolver;
use crate::types::{AccessorChain, MemberInfo, Reflect, TypeInfo, TypeKey, Value};

/// Untyped state shared by every view of one plan.
pub(crate) struct PlanCore<C> {
	pub(crate) from: TypeInfo,
	pub(crate) to: TypeInfo,
	pub(crate) entries: Vec<MemberEntry<C>>,
	pub(crate) resolvers: PriorityList<Arc<dyn MemberResolver>>,
	pub(crate) consumers: PriorityList<Arc<dyn MemberConsumer>>,
	pub(crate) child_context: Option<ContextFn<C>>,
	declared: Vec<Requirement>,
	next_ordinal: u64,
}

impl<C> PlanCore<C> {
	pub(crate) fn new(
		from: TypeInfo,
		to: TypeInfo,
		resolvers: PriorityList<Arc<dyn MemberResolver>>,
		consumers: PriorityList<Arc<dyn MemberConsumer>>,
	) -> Self {
		let entries = to
			.members()
			.into_iter()
			.filter(|m| m.writable)
			.map(|member| {
				let mut chain = AccessorChain::new();
				chain.push(to.name(), member);
				MemberEntry::unbound(chain, member.type_info())
			})
			.collect();
		Self {
			from,
			to,
			entries,
			resolvers,
			consumers,
			child_context: None,
			declared: Vec::new(),
			next_ordinal: 0,
		}
	}

	pub(crate) fn next_ordinal(&mut self) -> u64 {
		self.next_ordinal += 1;
		self.next_ordinal
	}

	pub(crate) fn find(&self, names: &[&str]) -> Option<usize> {
		self.entries
			.iter()
			.position(|e| e.destination.len() == names.len() && e.destination.starts_with(names))
	}

	/// Marks unbound ancestors of `names` as covered by nested bindings.
	///
	/// A covered ancestor gains one unbound entry per writable member, so
	/// siblings of the bound path still have to be mapped or ignored.
	pub(crate) fn cover_parents(&mut self, names: &[&str]) {
		for depth in 1..names.len() {
			let Some(index) = self.find(&names[..depth]) else {
				continue;
			};
			if self.entries[index].is_bound() {
				continue;
			}
			let ordinal = self.next_ordinal();
			let entry = &mut self.entries[index];
			entry.binding = Binding::Nested;
			entry.ordinal = ordinal;

			let parent = entry.destination.clone();
			let ty = entry.destination_type.unwrapped();
			for member in ty.members().into_iter().filter(|m| m.writable) {
				let mut tail = AccessorChain::new();
				tail.push(ty.name(), member);
				let chain = parent.join(&tail);
				if self.find(&chain.names()).is_none() {
					self.entries.push(MemberEntry::unbound(chain, member.type_info()));
				}
			}
		}
	}

	fn reason(&self) -> String {
		format!("{} => {}", self.from.name(), self.to.name())
	}

	pub(crate) fn declare(&mut self, from: TypeInfo, to: TypeInfo) {
		let reason = self.reason();
		self.declared.push(Requirement { from, to, reason });
	}

	/// Type pairs this plan needs from the registry: every remapped binding
	/// plus explicit declarations.
	pub(crate) fn requirements(&self) -> Vec<Requirement> {
		let reason = self.reason();
		self.entries
			.iter()
			.filter(|e| e.is_executable() && e.requires_remap)
			.filter_map(|e| {
				e.source_type.map(|from| Requirement {
					from,
					to: e.destination_type,
					reason: reason.clone(),
				})
			})
			.chain(self.declared.iter().cloned())
			.collect()
	}

	/// Destination paths without a binding.
	pub(crate) fn unmapped(&self) -> Vec<String> {
		self.entries
			.iter()
			.filter(|e| !e.is_bound())
			.map(|e| e.destination_path())
			.collect()
	}

	/// Fails with [`MapError::UnmappedMembers`] if any entry is unbound.
	pub(crate) fn verify(&self) -> Result<()> {
		let members = self.unmapped();
		if members.is_empty() {
			return Ok(());
		}
		Err(MapError::UnmappedMembers {
			from: self.from.name(),
			to: self.to.name(),
			members,
		})
	}

	/// Bound entries in execution order.
	pub(crate) fn ordered(&self) -> Vec<&MemberEntry<C>> {
		let mut ordered: Vec<_> = self.entries.iter().filter(|e| e.is_bound()).collect();
		ordered.sort_by_key(|e| e.ordinal);
		ordered
	}
}

/// Typed handle for configuring the mapping from `F` to `T` with context `C`.
///
/// Member paths are dotted strings (`"child.name"`) resolved immediately;
/// unknown, unreadable or unwritable members fail the call. Every override
/// must happen before [`automap`](Self::automap), which locks the plan.
pub struct MappingPlan<'p, F, T, C> {
	view: PlanView<'p, C>,
	_types: PhantomData<fn(&F) -> T>,
}

impl<'p, F: Reflect, T: Reflect, C: 'static> MappingPlan<'p, F, T, C> {
	pub(crate) fn from_view(view: PlanView<'p, C>) -> Self {
		Self {
			view,
			_types: PhantomData,
		}
	}

	pub(crate) fn view_mut(&mut self) -> &mut PlanView<'p, C> {
		&mut self.view
	}

	/// Binds destination member `to` to source member `from`.
	pub fn set_member(&mut self, to: &str, from: &str) -> Result<&mut Self> {
		self.set_member_remap(to, from, Remap::Auto)
	}

	/// Binds `to` to `from` with an explicit remap decision.
	pub fn set_member_remap(&mut self, to: &str, from: &str, remap: Remap) -> Result<&mut Self> {
		self.view.set_member(to, from, remap)?;
		Ok(self)
	}

	/// Binds `to` to the value produced by `f`.
	pub fn set<V: Reflect>(
		&mut self,
		to: &str,
		f: impl Fn(&F, &T, &C) -> V + Send + Sync + 'static,
	) -> Result<&mut Self> {
		self.set_remap(to, Remap::Auto, f)
	}

	/// Binds `to` to the value produced by `f` with an explicit remap decision.
	pub fn set_remap<V: Reflect>(
		&mut self,
		to: &str,
		remap: Remap,
		f: impl Fn(&F, &T, &C) -> V + Send + Sync + 'static,
	) -> Result<&mut Self> {
		let function = Arc::new(move |from: &dyn Any, to: &dyn Any, ctx: &C| -> Result<Value> {
			let from = from
				.downcast_ref::<F>()
				.ok_or_else(|| MapError::access::<F>("source"))?;
			let to = to
				.downcast_ref::<T>()
				.ok_or_else(|| MapError::access::<T>("destination"))?;
			Ok(Box::new(f(from, to, ctx)) as Value)
		});
		self.view.set_function(to, function, V::type_info(), remap)?;
		Ok(self)
	}

	/// Binds `to` to a constant.
	pub fn set_value<V: Reflect + Clone + Send + Sync>(&mut self, to: &str, value: V) -> Result<&mut Self> {
		self.set(to, move |_, _, _| value.clone())
	}

	/// Skips `to`; it counts as resolved but is never written.
	pub fn ignore(&mut self, to: &str) -> Result<&mut Self> {
		self.view.ignore(to)?;
		Ok(self)
	}

	/// Ignores every destination member that has no binding yet, which also
	/// leaves nothing for automapping.
	pub fn ignore_unmapped(&mut self) -> Result<&mut Self> {
		self.view.ignore_unmapped()?;
		Ok(self)
	}

	/// Automaps, then ignores whatever is still unbound.
	pub fn automap_only(&mut self) -> Result<&mut Self> {
		self.view.automap_only()?;
		Ok(self)
	}

	/// Flattens the members of source sub-object `from` onto destination
	/// sub-object `to`. Empty paths name the roots.
	///
	/// Automaps this plan first, so no further overrides are possible afterwards.
	pub fn overlay(&mut self, to: &str, from: &str) -> Result<&mut Self> {
		let mut sub = self.view.open_overlay(to, from)?;
		sub.automap()?;
		Ok(self)
	}

	/// Like [`overlay`](Self::overlay), with explicit bindings for the overlaid shape.
	///
	/// Inside `configure`, binding a member that an earlier overlay already
	/// bound is an error.
	pub fn overlay_with<S: Reflect, D: Reflect>(
		&mut self,
		to: &str,
		from: &str,
		configure: impl FnOnce(&mut MappingPlan<'_, S, D, C>) -> Result<()>,
	) -> Result<&mut Self> {
		let sub = self.view.open_overlay(to, from)?;
		if sub.source().key != TypeKey::of::<S>() || sub.destination().key != TypeKey::of::<D>() {
			let reason = format!(
				"overlay maps {} onto {}, not {} onto {}",
				sub.source().name(),
				sub.destination().name(),
				std::any::type_name::<S>(),
				std::any::type_name::<D>(),
			);
			return Err(sub.error(to, reason));
		}
		let mut plan = MappingPlan::<S, D, C>::from_view(sub);
		configure(&mut plan)?;
		plan.view.automap()?;
		Ok(self)
	}

	/// Nested conversions started by this plan receive `transform(from, to, ctx.clone())`
	/// instead of the caller's context. Computed once per conversion.
	pub fn set_child_context(&mut self, f: impl Fn(&F, &T, C) -> C + Send + Sync + 'static) -> Result<&mut Self>
	where
		C: Clone,
	{
		let transform = Arc::new(move |from: &dyn Any, to: &dyn Any, ctx: &C| -> Result<C> {
			let from = from
				.downcast_ref::<F>()
				.ok_or_else(|| MapError::access::<F>("source"))?;
			let to = to
				.downcast_ref::<T>()
				.ok_or_else(|| MapError::access::<T>("destination"))?;
			Ok(f(from, to, ctx.clone()))
		});
		self.view.set_child_context(transform)?;
		Ok(self)
	}

	/// Declares that the mapper must be able to convert `A` to `B`.
	pub fn require_one_way<A: Reflect, B: Reflect>(&mut self) -> &mut Self {
		self.view.require(A::type_info(), B::type_info());
		self
	}

	/// Declares both `A` to `B` and `B` to `A`.
	pub fn require_two_way<A: Reflect, B: Reflect>(&mut self) -> &mut Self {
		self.require_one_way::<A, B>().require_one_way::<B, A>()
	}

	/// Resolvers used by this plan's automapping.
	pub fn member_resolvers(&mut self) -> &mut PriorityList<Arc<dyn MemberResolver>> {
		&mut self.view.core_mut().resolvers
	}

	/// Consumers used by this plan's automapping.
	pub fn member_consumers(&mut self) -> &mut PriorityList<Arc<dyn MemberConsumer>> {
		&mut self.view.core_mut().consumers
	}

	/// Runs automapping once and locks the plan.
	pub fn automap(&mut self) -> Result<&mut Self> {
		self.view.automap()?;
		Ok(self)
	}

	pub fn is_locked(&self) -> bool {
		self.view.is_locked()
	}

	/// Destination members directly below this plan's root with no binding.
	pub fn unmapped_destinations(&self) -> Vec<MemberInfo> {
		self.view.unmapped_destinations()
	}

	/// Source members not yet consumed by a binding.
	pub fn unmapped_sources(&self) -> Vec<MemberInfo> {
		self.view.unmapped_sources()
	}

	/// Every entry of the plan, bound or not.
	pub fn entries(&self) -> &[MemberEntry<C>] {
		&self.view.core().entries
	}

	/// Looks up the entry for a dotted destination path.
	pub fn entry(&self, path: &str) -> Option<&MemberEntry<C>> {
		self.entries().iter().find(|e| e.destination_path() == path)
	}
}
