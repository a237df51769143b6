//! Initialization closure: resolves every required pair, transitively.

use rustc_hash::FxHashMap;

use super::dictionary::TypePair;
use super::{CachedMap, Ready, Setup};
use crate::diagnostics::PlanReport;
use crate::error::{MapError, Result};
use crate::maps::{MapInit, MapLookup};
use crate::types::TypeInfo;

/// Which registered map serves a pair.
#[derive(Debug, Clone, Copy)]
enum Slot {
	User(usize),
	Builtin(usize),
}

impl<C: 'static> Setup<C> {
	/// The last registered user map that accepts the pair, else the last
	/// accepting built-in.
	fn select(&self, from: &TypeInfo, to: &TypeInfo) -> Option<Slot> {
		let lookup = self.lookup();
		if let Some(index) = self.maps.iter().rposition(|m| m.map.can_map(from, to, &lookup)) {
			return Some(Slot::User(index));
		}
		self.defaults
			.iter()
			.rposition(|m| m.can_map(from, to, &lookup))
			.map(Slot::Builtin)
	}

	fn build(&mut self, slot: Slot, from: &TypeInfo, to: &TypeInfo) -> Result<CachedMap<C>> {
		let mut init = MapInit::new(&self.resolvers, &self.consumers);
		let (convert, origin) = match slot {
			Slot::User(index) => {
				let registered = &mut self.maps[index];
				registered.map.initialize(&mut init)?;
				(registered.map.converter(from, to, &mut init)?, registered.origin.clone())
			}
			Slot::Builtin(index) => {
				let map = &mut self.defaults[index];
				map.initialize(&mut init)?;
				(map.converter(from, to, &mut init)?, None)
			}
		};
		for requirement in init.into_requirements() {
			self.required.require(requirement);
		}
		Ok(CachedMap {
			from: *from,
			to: *to,
			convert,
			origin,
		})
	}
}

/// Runs the closure to a fixed point and freezes the result.
pub(super) fn resolve<C: 'static>(setup: &mut Setup<C>) -> Result<(Ready<C>, Vec<PlanReport>)> {
	let mut missing: Vec<TypePair> = Vec::new();
	loop {
		let pending = setup
			.required
			.pending(|pair| setup.cache.contains(pair) || missing.contains(pair));
		if pending.is_empty() {
			break;
		}
		for (from, to) in pending {
			let pair = TypePair::new(from.key, to.key);
			if setup.cache.contains(&pair) {
				continue;
			}
			let Some(slot) = setup.select(&from, &to) else {
				tracing::debug!(from = from.name(), to = to.name(), "no map accepts required pair");
				missing.push(pair);
				continue;
			};
			let cached = setup.build(slot, &from, &to)?;
			tracing::debug!(from = from.name(), to = to.name(), ?slot, "resolved map");
			setup.cache.insert(pair, cached);
		}
	}

	if !missing.is_empty() {
		tracing::warn!(count = missing.len(), "required maps could not be resolved");
		return Err(MapError::MissingRequiredMaps {
			missing: missing.iter().map(|pair| setup.required.missing(pair)).collect(),
		});
	}

	let reports = setup.maps.iter().filter_map(|m| m.map.report()).collect();

	let mut types: FxHashMap<_, TypeInfo> = FxHashMap::default();
	for ty in setup.required.types() {
		types.insert(ty.key.id(), *ty);
	}
	for cached in setup.cache.values() {
		types.insert(cached.from.key.id(), cached.from);
		types.insert(cached.to.key.id(), cached.to);
	}
	for (ty, _) in setup.constructors.values() {
		types.insert(ty.key.id(), *ty);
	}

	let ready = Ready {
		cache: std::mem::take(&mut setup.cache),
		constructors: setup
			.constructors
			.iter()
			.map(|(id, (_, ctor))| (*id, ctor.clone()))
			.collect(),
		types,
	};
	Ok((ready, reports))
}
