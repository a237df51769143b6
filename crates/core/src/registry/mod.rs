//! The mapper: type-map registration, initialization and execution.
//!
//! A [`ResourceMapper`] moves through two states. While configuring, maps,
//! converters, requirements and constructors are registered through `&mut self`.
//! [`ResourceMapper::initialize`] then resolves every required type pair
//! (transitively) into a cache of compiled conversions and freezes it. From
//! then on the mapper is read-only and can be shared across threads.

use std::any::{Any, TypeId};
use std::fmt::Display;
use std::panic::Location;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

mod closure;
mod dictionary;
mod required;

pub use dictionary::TypePair;
pub(crate) use dictionary::TypeDictionary;
pub use required::Requirement;
use required::RequiredMaps;

use crate::config::MapperConfig;
use crate::consume::{DefaultMemberConsumer, MemberConsumer};
use crate::convention::{Bidirectional, OneWayMap, TwoWayMap};
use crate::diagnostics;
use crate::error::{MapError, Result};
use crate::maps::object::{MapObject, Override};
use crate::maps::{self, ConvertFn, MapLookup, TypeMap};
use crate::plan::MappingPlan;
use crate::priority::PriorityList;
use crate::resolve::{IgnoreCaseNameMatcher, MemberResolver};
use crate::types::{Constructors, Reflect, TypeInfo, TypeKey, Value};

type ConstructFn = Arc<dyn Fn() -> Value + Send + Sync>;

struct RegisteredMap<C> {
	map: Box<dyn TypeMap<C>>,
	origin: Option<String>,
}

/// A compiled conversion for one pair.
pub(crate) struct CachedMap<C> {
	pub(crate) from: TypeInfo,
	pub(crate) to: TypeInfo,
	pub(crate) convert: ConvertFn<C>,
	pub(crate) origin: Option<String>,
}

/// Mutable registration state, guarded until initialization completes.
pub(crate) struct Setup<C> {
	config: MapperConfig,
	maps: Vec<RegisteredMap<C>>,
	defaults: Vec<Box<dyn TypeMap<C>>>,
	cache: TypeDictionary<CachedMap<C>>,
	required: RequiredMaps,
	constructors: FxHashMap<TypeId, (TypeInfo, ConstructFn)>,
	resolvers: PriorityList<Arc<dyn MemberResolver>>,
	consumers: PriorityList<Arc<dyn MemberConsumer>>,
	attempted: bool,
	failure: Option<MapError>,
}

/// Frozen state after a successful initialization.
pub(crate) struct Ready<C> {
	cache: TypeDictionary<CachedMap<C>>,
	constructors: FxHashMap<TypeId, ConstructFn>,
	types: FxHashMap<TypeId, TypeInfo>,
}

struct Lookup<'a, C> {
	cache: &'a TypeDictionary<CachedMap<C>>,
	maps: &'a [RegisteredMap<C>],
	defaults: &'a [Box<dyn TypeMap<C>>],
}

impl<C: 'static> MapLookup for Lookup<'_, C> {
	fn can_map(&self, from: &TypeInfo, to: &TypeInfo) -> bool {
		self.cache.contains(&TypePair::new(from.key, to.key))
			|| self.maps.iter().any(|m| m.map.can_map(from, to, self))
			|| self.defaults.iter().any(|m| m.can_map(from, to, self))
	}
}

impl<C: 'static> Setup<C> {
	fn new(config: MapperConfig) -> Self {
		let mut resolvers: PriorityList<Arc<dyn MemberResolver>> = PriorityList::new();
		resolvers.add(Arc::new(IgnoreCaseNameMatcher));
		let mut consumers: PriorityList<Arc<dyn MemberConsumer>> = PriorityList::new();
		consumers.add(Arc::new(DefaultMemberConsumer));
		Self {
			config,
			maps: Vec::new(),
			defaults: maps::defaults(),
			cache: TypeDictionary::default(),
			required: RequiredMaps::default(),
			constructors: FxHashMap::default(),
			resolvers,
			consumers,
			attempted: false,
			failure: None,
		}
	}

	fn lookup(&self) -> Lookup<'_, C> {
		Lookup {
			cache: &self.cache,
			maps: &self.maps,
			defaults: &self.defaults,
		}
	}

	fn origin(&self, site: &'static Location<'static>) -> Option<String> {
		self.config.diagnostics.then(|| site.to_string())
	}

	fn ensure_unregistered(&self, from: &TypeInfo, to: &TypeInfo) -> Result<()> {
		let defined_at = |origin: &Option<String>| origin.clone().unwrap_or_else(|| String::from("unknown"));
		let existing = match self.cache.get(&TypePair::new(from.key, to.key)) {
			Some(cached) => Some(defined_at(&cached.origin)),
			None => {
				let lookup = self.lookup();
				self.maps
					.iter()
					.find(|m| m.map.pair().is_some() && m.map.can_map(from, to, &lookup))
					.map(|m| defined_at(&m.origin))
			}
		};
		match existing {
			Some(defined_at) => Err(MapError::DuplicateMapping {
				from: from.name(),
				to: to.name(),
				defined_at,
			}),
			None => Ok(()),
		}
	}
}

/// Registry of type maps and the entry point for every conversion.
///
/// `C` is the context type threaded through conversions and user functions.
pub struct ResourceMapper<C = ()> {
	setup: Mutex<Setup<C>>,
	ready: OnceLock<Ready<C>>,
}

impl<C: 'static> Default for ResourceMapper<C> {
	fn default() -> Self {
		Self::new()
	}
}

impl<C: 'static> ResourceMapper<C> {
	/// A mapper with diagnostics enabled and no export directory.
	pub fn new() -> Self {
		Self::with_config(MapperConfig::default())
	}

	pub fn with_config(config: MapperConfig) -> Self {
		Self {
			setup: Mutex::new(Setup::new(config)),
			ready: OnceLock::new(),
		}
	}

	pub fn is_initialized(&self) -> bool {
		self.ready.get().is_some()
	}

	fn setup_mut(&mut self) -> Result<&mut Setup<C>> {
		let setup = self.setup.get_mut();
		if setup.attempted {
			return Err(MapError::AlreadyInitialized);
		}
		Ok(setup)
	}

	fn ready(&self) -> Result<&Ready<C>> {
		self.ready.get().ok_or(MapError::NotInitialized)
	}

	/// Registers an automapped one-way map from `F` to `T`.
	#[track_caller]
	pub fn register_one_way<F: Reflect, T: Reflect>(&mut self) -> Result<&mut Self> {
		let site = Location::caller();
		self.add_object_map::<F, T>(site, Vec::new())?;
		Ok(self)
	}

	/// Registers a one-way map from `F` to `T`, letting `overrides` adjust the
	/// plan before automapping.
	#[track_caller]
	pub fn register_one_way_with<F: Reflect, T: Reflect>(
		&mut self,
		overrides: impl FnOnce(&mut MappingPlan<'_, F, T, C>) -> Result<()> + Send + 'static,
	) -> Result<&mut Self> {
		let site = Location::caller();
		let apply: Override<F, T, C> = Box::new(overrides);
		self.add_object_map::<F, T>(site, vec![apply])?;
		Ok(self)
	}

	/// Registers a one-way map described by a convention object.
	#[track_caller]
	pub fn register_convention<F: Reflect, T: Reflect>(&mut self, convention: impl OneWayMap<F, T, C>) -> Result<&mut Self> {
		let site = Location::caller();
		let apply: Override<F, T, C> = Box::new(move |plan: &mut MappingPlan<'_, F, T, C>| convention.override_mapping(plan));
		self.add_object_map::<F, T>(site, vec![apply])?;
		Ok(self)
	}

	/// Registers automapped maps in both directions between `A` and `B`.
	#[track_caller]
	pub fn register_two_way<A: Reflect, B: Reflect>(&mut self) -> Result<&mut Self> {
		let site = Location::caller();
		self.add_object_map::<A, B>(site, Vec::new())?;
		self.add_object_map::<B, A>(site, Vec::new())?;
		Ok(self)
	}

	/// Registers maps in both directions with separate overrides for each.
	#[track_caller]
	pub fn register_two_way_with<A: Reflect, B: Reflect>(
		&mut self,
		a_to_b: impl FnOnce(&mut MappingPlan<'_, A, B, C>) -> Result<()> + Send + 'static,
		b_to_a: impl FnOnce(&mut MappingPlan<'_, B, A, C>) -> Result<()> + Send + 'static,
	) -> Result<&mut Self> {
		let site = Location::caller();
		let (a_to_b, b_to_a): (Override<A, B, C>, Override<B, A, C>) = (Box::new(a_to_b), Box::new(b_to_a));
		self.add_object_map::<A, B>(site, vec![a_to_b])?;
		self.add_object_map::<B, A>(site, vec![b_to_a])?;
		Ok(self)
	}

	/// Registers both directions described by a two-way convention object.
	///
	/// Shared member pairs from [`TwoWayMap::both_directions`] apply first in
	/// each direction, followed by the direction-specific overrides.
	#[track_caller]
	pub fn register_two_way_convention<A: Reflect, B: Reflect>(&mut self, convention: impl TwoWayMap<A, B, C>) -> Result<&mut Self> {
		let site = Location::caller();
		let convention = Arc::new(convention);
		let forward = Arc::clone(&convention);
		let a_to_b: Override<A, B, C> = Box::new(move |plan: &mut MappingPlan<'_, A, B, C>| {
			forward.both_directions(&mut Bidirectional::forward(plan.view_mut()))?;
			forward.a_to_b(plan)
		});
		let b_to_a: Override<B, A, C> = Box::new(move |plan: &mut MappingPlan<'_, B, A, C>| {
			convention.both_directions(&mut Bidirectional::reverse(plan.view_mut()))?;
			convention.b_to_a(plan)
		});
		self.add_object_map::<A, B>(site, vec![a_to_b])?;
		self.add_object_map::<B, A>(site, vec![b_to_a])?;
		Ok(self)
	}

	fn add_object_map<F: Reflect, T: Reflect>(&mut self, site: &'static Location<'static>, overrides: Vec<Override<F, T, C>>) -> Result<()> {
		let setup = self.setup_mut()?;
		let (from, to) = (F::type_info(), T::type_info());
		setup.ensure_unregistered(&from, &to)?;
		let origin = setup.origin(site);
		setup.required.require(Requirement {
			from,
			to,
			reason: origin.clone().unwrap_or_else(|| maps::pair_reason(&from, &to)),
		});
		setup.maps.push(RegisteredMap {
			map: Box::new(MapObject::<F, T, C>::new(overrides, origin.clone())),
			origin,
		});
		tracing::trace!(from = from.name(), to = to.name(), "registered object map");
		Ok(())
	}

	/// Registers a custom [`TypeMap`]. Later registrations take precedence.
	#[track_caller]
	pub fn register_mapping(&mut self, map: impl TypeMap<C> + 'static) -> Result<&mut Self> {
		let site = Location::caller();
		let setup = self.setup_mut()?;
		let origin = setup.origin(site);
		setup.maps.push(RegisteredMap {
			map: Box::new(map),
			origin,
		});
		Ok(self)
	}

	/// Registers a conversion function for `F` to `T`.
	#[track_caller]
	pub fn convert_using<F: Reflect, T: Reflect>(&mut self, f: impl Fn(&F) -> T + Send + Sync + 'static) -> Result<&mut Self> {
		let site = Location::caller();
		let convert: ConvertFn<C> = Arc::new(move |_: &ResourceMapper<C>, from: &dyn Any, to: &mut dyn Any, _: &C| -> Result<()> {
			let from = from.downcast_ref::<F>().ok_or_else(|| MapError::access::<F>("source"))?;
			let to = to.downcast_mut::<T>().ok_or_else(|| MapError::access::<T>("destination"))?;
			*to = f(from);
			Ok(())
		});
		self.add_converter::<F, T>(site, convert)?;
		Ok(self)
	}

	/// Registers a fallible conversion function; its error message surfaces
	/// as [`MapError::Conversion`].
	#[track_caller]
	pub fn try_convert_using<F: Reflect, T: Reflect, E: Display>(
		&mut self,
		f: impl Fn(&F) -> std::result::Result<T, E> + Send + Sync + 'static,
	) -> Result<&mut Self> {
		let site = Location::caller();
		let convert: ConvertFn<C> = Arc::new(move |_: &ResourceMapper<C>, from: &dyn Any, to: &mut dyn Any, _: &C| -> Result<()> {
			let from = from.downcast_ref::<F>().ok_or_else(|| MapError::access::<F>("source"))?;
			let to = to.downcast_mut::<T>().ok_or_else(|| MapError::access::<T>("destination"))?;
			*to = f(from).map_err(|e| MapError::Conversion {
				from: std::any::type_name::<F>(),
				to: std::any::type_name::<T>(),
				message: e.to_string(),
			})?;
			Ok(())
		});
		self.add_converter::<F, T>(site, convert)?;
		Ok(self)
	}

	/// Registers a conversion that writes into an existing destination and may
	/// call back into the mapper.
	#[track_caller]
	pub fn convert_using_with<F: Reflect, T: Reflect>(
		&mut self,
		f: impl Fn(&F, &mut T, &ResourceMapper<C>, &C) -> Result<()> + Send + Sync + 'static,
	) -> Result<&mut Self> {
		let site = Location::caller();
		let convert: ConvertFn<C> = Arc::new(move |mapper: &ResourceMapper<C>, from: &dyn Any, to: &mut dyn Any, ctx: &C| -> Result<()> {
			let from = from.downcast_ref::<F>().ok_or_else(|| MapError::access::<F>("source"))?;
			let to = to.downcast_mut::<T>().ok_or_else(|| MapError::access::<T>("destination"))?;
			f(from, to, mapper, ctx)
		});
		self.add_converter::<F, T>(site, convert)?;
		Ok(self)
	}

	pub(crate) fn add_converter<F: Reflect, T: Reflect>(&mut self, site: &'static Location<'static>, convert: ConvertFn<C>) -> Result<()> {
		let setup = self.setup_mut()?;
		let (from, to) = (F::type_info(), T::type_info());
		setup.ensure_unregistered(&from, &to)?;
		let origin = setup.origin(site);
		setup.cache.insert(
			TypePair::new(from.key, to.key),
			CachedMap {
				from,
				to,
				convert,
				origin,
			},
		);
		Ok(())
	}

	/// Requires a map from `F` to `T` to exist after initialization.
	pub fn require_one_way<F: Reflect, T: Reflect>(&mut self, description: impl Into<String>) -> Result<&mut Self> {
		let setup = self.setup_mut()?;
		setup.required.require(Requirement {
			from: F::type_info(),
			to: T::type_info(),
			reason: description.into(),
		});
		Ok(self)
	}

	/// Requires maps in both directions between `A` and `B`.
	pub fn require_two_way<A: Reflect, B: Reflect>(&mut self, description: impl Into<String>) -> Result<&mut Self> {
		let description = description.into();
		self.require_one_way::<A, B>(description.clone())?;
		self.require_one_way::<B, A>(description)
	}

	/// Registers the factory used whenever the mapper needs a fresh `T`.
	pub fn register_constructor<T: Reflect>(&mut self, f: impl Fn() -> T + Send + Sync + 'static) -> Result<&mut Self> {
		let setup = self.setup_mut()?;
		let ctor: ConstructFn = Arc::new(move || Box::new(f()) as Value);
		setup.constructors.insert(TypeId::of::<T>(), (T::type_info(), ctor));
		Ok(self)
	}

	/// Resolvers cloned into every object plan built at initialization.
	pub fn member_resolvers(&mut self) -> Result<&mut PriorityList<Arc<dyn MemberResolver>>> {
		Ok(&mut self.setup_mut()?.resolvers)
	}

	/// Consumers cloned into every object plan built at initialization.
	pub fn member_consumers(&mut self) -> Result<&mut PriorityList<Arc<dyn MemberConsumer>>> {
		Ok(&mut self.setup_mut()?.consumers)
	}

	/// Stops recording registration sites and disables diagnostics export.
	pub fn deactivate_diagnostics(&mut self) -> Result<&mut Self> {
		self.setup_mut()?.config.diagnostics = false;
		Ok(self)
	}

	/// Writes one plan description per object map into `dir` after a
	/// successful initialization. Re-enables diagnostics if they were
	/// deactivated.
	pub fn export_maps_to(&mut self, dir: impl Into<PathBuf>) -> Result<&mut Self> {
		let config = &mut self.setup_mut()?.config;
		config.export_dir = Some(dir.into());
		config.diagnostics = true;
		Ok(self)
	}

	/// Resolves every required map and freezes the mapper.
	///
	/// Safe to call concurrently; exactly one caller runs the closure. A
	/// failure is remembered and returned by every later call.
	pub fn initialize(&self) -> Result<()> {
		if self.ready.get().is_some() {
			return Ok(());
		}
		let mut setup = self.setup.lock();
		if self.ready.get().is_some() {
			return Ok(());
		}
		if let Some(failure) = &setup.failure {
			return Err(failure.clone());
		}
		setup.attempted = true;

		match closure::resolve(&mut setup) {
			Ok((ready, reports)) => {
				if setup.config.diagnostics
					&& let Some(dir) = &setup.config.export_dir
					&& let Err(err) = diagnostics::export(dir, &reports)
				{
					tracing::warn!(error = %err, "failed to export mapping diagnostics");
				}
				tracing::info!(maps = ready.cache.len(), "mapper initialized");
				let _ = self.ready.set(ready);
				Ok(())
			}
			Err(err) => {
				tracing::warn!(error = %err, "mapper initialization failed");
				setup.failure = Some(err.clone());
				Err(err)
			}
		}
	}

	/// Whether a conversion from `F` to `T` exists or could be built.
	pub fn can_map<F: Reflect, T: Reflect>(&self) -> bool {
		self.can_map_types(&F::type_info(), &T::type_info())
	}

	pub fn can_map_types(&self, from: &TypeInfo, to: &TypeInfo) -> bool {
		if let Some(ready) = self.ready.get()
			&& ready.cache.contains(&TypePair::new(from.key, to.key))
		{
			return true;
		}
		self.setup.lock().lookup().can_map(from, to)
	}

	/// Maps `from` into a freshly constructed `T`.
	pub fn map<F: Reflect, T: Reflect>(&self, from: &F, ctx: &C) -> Result<T> {
		let to = T::type_info();
		let mut target = self.construct_value(&to)?;
		self.map_in_place(&F::type_info(), &to, Some(from as &dyn Any), &mut *target, ctx)?;
		target.downcast::<T>().map(|v| *v).map_err(|_| MapError::access::<T>("result"))
	}

	/// Maps `from` into an existing `to`, leaving unbound members untouched.
	pub fn map_into<F: Reflect, T: Reflect>(&self, from: &F, to: &mut T, ctx: &C) -> Result<()> {
		self.map_in_place(&F::type_info(), &T::type_info(), Some(from as &dyn Any), to, ctx)
	}

	/// Maps an optional source. A missing source yields the zero value of `T`
	/// (if it has one) and never reaches a converter.
	pub fn map_option<F: Reflect, T: Reflect>(&self, from: Option<&F>, existing: Option<T>, ctx: &C) -> Result<Option<T>> {
		self.ready()?;
		let Some(from) = from else {
			return Ok(T::type_info()
				.zero()
				.and_then(|zero| zero.downcast::<T>().ok())
				.map(|v| *v));
		};
		let mut target = match existing {
			Some(target) => target,
			None => self.construct::<T>()?,
		};
		self.map_into(from, &mut target, ctx)?;
		Ok(Some(target))
	}

	/// Untyped entry point. `existing` is mapped into when given, otherwise a
	/// fresh destination is constructed.
	pub fn map_value(&self, from: TypeKey, to: TypeKey, value: Option<&dyn Any>, existing: Option<Value>, ctx: &C) -> Result<Option<Value>> {
		let ready = self.ready()?;
		let Some(value) = value else {
			return Ok(ready.types.get(&to.id()).and_then(TypeInfo::zero));
		};
		let Some(cached) = ready.cache.get(&TypePair::new(from, to)) else {
			let (from_ty, to_ty) = (ready.types.get(&from.id()), ready.types.get(&to.id()));
			let hint = match (from_ty, to_ty) {
				(Some(f), Some(t)) => self.unmappable_hint(f, t),
				_ => None,
			};
			return Err(MapError::Unmappable {
				from: from.name(),
				to: to.name(),
				hint,
			});
		};
		let mut target = match existing {
			Some(target) => target,
			None => self.construct_value(&cached.to)?,
		};
		(cached.convert)(self, value, &mut *target, ctx)?;
		Ok(Some(target))
	}

	/// Runs the compiled conversion for `from` to `to` against an existing slot.
	pub fn map_in_place(&self, from: &TypeInfo, to: &TypeInfo, value: Option<&dyn Any>, slot: &mut dyn Any, ctx: &C) -> Result<()> {
		let ready = self.ready()?;
		let Some(value) = value else {
			return match to.zero() {
				Some(zero) => maps::assign(to, slot, zero),
				None => Ok(()),
			};
		};
		match ready.cache.get(&TypePair::new(from.key, to.key)) {
			Some(cached) => (cached.convert)(self, value, slot, ctx),
			None => Err(MapError::Unmappable {
				from: from.name(),
				to: to.name(),
				hint: self.unmappable_hint(from, to),
			}),
		}
	}

	fn unmappable_hint(&self, from: &TypeInfo, to: &TypeInfo) -> Option<String> {
		self.setup.lock().lookup().can_map(from, to).then(|| {
			format!(
				"a map could be built; declare it with require_one_way::<{}, {}>() before initializing",
				from.name(),
				to.name()
			)
		})
	}

	/// Builds a `T` through a registered constructor or its own default.
	pub fn construct<T: Reflect>(&self) -> Result<T> {
		self.construct_value(&T::type_info())?
			.downcast::<T>()
			.map(|v| *v)
			.map_err(|_| MapError::access::<T>("constructor result"))
	}

	pub fn construct_value(&self, ty: &TypeInfo) -> Result<Value> {
		let ready = self.ready()?;
		if let Some(ctor) = ready.constructors.get(&ty.key.id()) {
			return Ok(ctor());
		}
		ty.construct().ok_or(MapError::Construction { ty: ty.name() })
	}

	/// Registration sites of every compiled map, for diagnostics.
	pub fn registered_maps(&self) -> Result<Vec<(TypePair, Option<String>)>> {
		let ready = self.ready()?;
		Ok(ready
			.cache
			.iter()
			.map(|(pair, cached)| (*pair, cached.origin.clone()))
			.collect())
	}
}

impl<C: 'static> Constructors for ResourceMapper<C> {
	fn construct_value(&self, ty: &TypeInfo) -> Result<Value> {
		ResourceMapper::construct_value(self, ty)
	}
}
