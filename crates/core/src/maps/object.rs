use std::marker::PhantomData;

use super::{ConvertFn, MapInit, MapLookup, TypeMap};
use crate::builder;
use crate::diagnostics::PlanReport;
use crate::error::{MapError, Result};
use crate::plan::{MappingPlan, PlanCore, PlanView};
use crate::registry::TypePair;
use crate::types::{Reflect, TypeInfo, TypeKey};

/// A user adjustment applied to a plan before automapping.
pub(crate) type Override<F, T, C> = Box<dyn for<'p> FnOnce(&mut MappingPlan<'p, F, T, C>) -> Result<()> + Send>;

/// Member-wise map for one registered `(F, T)` pair.
///
/// The plan is built once, on first initialization: overrides run, then
/// automapping fills the rest and verification rejects unbound members.
pub(crate) struct MapObject<F, T, C> {
	overrides: Vec<Override<F, T, C>>,
	compiled: Option<ConvertFn<C>>,
	report: Option<PlanReport>,
	origin: Option<String>,
	_types: PhantomData<fn(&F) -> T>,
}

impl<F, T, C> MapObject<F, T, C> {
	pub(crate) fn new(overrides: Vec<Override<F, T, C>>, origin: Option<String>) -> Self {
		Self {
			overrides,
			compiled: None,
			report: None,
			origin,
			_types: PhantomData,
		}
	}
}

impl<F: Reflect, T: Reflect, C: 'static> TypeMap<C> for MapObject<F, T, C> {
	fn can_map(&self, from: &TypeInfo, to: &TypeInfo, _lookup: &dyn MapLookup) -> bool {
		from.key == TypeKey::of::<F>() && to.key == TypeKey::of::<T>()
	}

	fn initialize(&mut self, init: &mut MapInit<'_>) -> Result<()> {
		if self.compiled.is_some() {
			return Ok(());
		}
		let mut core = PlanCore::new(F::type_info(), T::type_info(), init.resolvers.clone(), init.consumers.clone());
		{
			let mut plan = MappingPlan::<F, T, C>::from_view(PlanView::root(&mut core));
			for apply in self.overrides.drain(..) {
				apply(&mut plan)?;
			}
			plan.automap()?;
		}
		core.verify()?;

		for requirement in core.requirements() {
			init.require_entry(requirement);
		}
		self.report = Some(PlanReport::from_plan(&core, self.origin.clone()));
		self.compiled = Some(builder::compile(&core));
		tracing::debug!(
			from = core.from.name(),
			to = core.to.name(),
			members = core.ordered().len(),
			"compiled object plan"
		);
		Ok(())
	}

	fn converter(&self, _from: &TypeInfo, _to: &TypeInfo, _init: &mut MapInit<'_>) -> Result<ConvertFn<C>> {
		self.compiled.clone().ok_or(MapError::NotInitialized)
	}

	fn pair(&self) -> Option<TypePair> {
		Some(TypePair::of::<F, T>())
	}

	fn report(&self) -> Option<PlanReport> {
		self.report.clone()
	}
}
