use std::sync::Arc;

use super::PlanCore;
use super::entry::{Binding, BindingKind, BindingOrigin, ContextFn, MemberEntry, Remap, SourceFn};
use crate::consume::Automap;
use crate::error::{MapError, Result};
use crate::resolve::{MemberResolver, PlanScope};
use crate::types::{AccessorChain, MemberInfo, Shape, TypeInfo};

/// Splits a dotted path. An empty path names the root.
fn split_path(path: &str) -> Option<Vec<&str>> {
	if path.trim().is_empty() {
		return Some(Vec::new());
	}
	let segments: Vec<&str> = path.split('.').map(str::trim).collect();
	(!segments.iter().any(|s| s.is_empty())).then_some(segments)
}

fn readable(ty: &TypeInfo) -> Vec<MemberInfo> {
	ty.members().into_iter().filter(|m| m.readable).collect()
}

/// A window onto a plan: the root plan, or an overlay rooted at a source and
/// destination sub-path.
pub(crate) struct PlanView<'p, C> {
	core: &'p mut PlanCore<C>,
	source: TypeInfo,
	destination: TypeInfo,
	source_root: AccessorChain,
	destination_root: AccessorChain,
	available: Vec<MemberInfo>,
	locked: bool,
	nested: bool,
}

impl<'p, C: 'static> PlanView<'p, C> {
	pub(crate) fn root(core: &'p mut PlanCore<C>) -> Self {
		let (source, destination) = (core.from, core.to);
		Self {
			core,
			source,
			destination,
			source_root: AccessorChain::new(),
			destination_root: AccessorChain::new(),
			available: readable(&source),
			locked: false,
			nested: false,
		}
	}

	pub(crate) fn source(&self) -> TypeInfo {
		self.source
	}

	pub(crate) fn destination(&self) -> TypeInfo {
		self.destination
	}

	pub(crate) fn is_locked(&self) -> bool {
		self.locked
	}

	pub(crate) fn core(&self) -> &PlanCore<C> {
		&*self.core
	}

	pub(crate) fn core_mut(&mut self) -> &mut PlanCore<C> {
		&mut *self.core
	}

	pub(crate) fn error(&self, member: &str, reason: impl Into<String>) -> MapError {
		MapError::member(self.core.from.name(), self.core.to.name(), member, reason)
	}

	fn ensure_unlocked(&self) -> Result<()> {
		if self.locked {
			return Err(MapError::PlanLocked {
				from: self.source.name(),
				to: self.destination.name(),
			});
		}
		Ok(())
	}

	/// Resolves a writable destination path to a chain from the plan root.
	fn destination_chain(&self, path: &str) -> Result<AccessorChain> {
		let segments = split_path(path)
			.filter(|s| !s.is_empty())
			.ok_or_else(|| self.error(path, "destination path is empty or malformed"))?;
		let chain = AccessorChain::resolve(&self.destination, &segments).map_err(|reason| self.error(path, reason))?;
		match chain.last() {
			Some(member) if member.writable => Ok(self.destination_root.join(&chain)),
			_ => Err(self.error(path, "member is not writable")),
		}
	}

	/// Resolves a readable source path relative to this view's source root.
	fn source_chain(&self, path: &str, allow_root: bool) -> Result<AccessorChain> {
		let segments = split_path(path)
			.filter(|s| allow_root || !s.is_empty())
			.ok_or_else(|| self.error(path, "source path is empty or malformed"))?;
		let chain = AccessorChain::resolve(&self.source, &segments).map_err(|reason| self.error(path, reason))?;
		if let Some(member) = chain.members().find(|m| !m.readable) {
			return Err(self.error(path, format!("source member `{}` is not readable", member.name)));
		}
		Ok(chain)
	}

	fn child_chain(&self, member: MemberInfo) -> AccessorChain {
		let mut tail = AccessorChain::new();
		tail.push(self.destination.name(), member);
		self.destination_root.join(&tail)
	}

	fn bind_entry(
		&mut self,
		destination: AccessorChain,
		binding: Binding<C>,
		source_type: Option<TypeInfo>,
		requires_remap: bool,
		origin: BindingOrigin,
	) -> Result<()> {
		let names = destination.names();
		let index = match self.core.find(&names) {
			Some(index) => index,
			None => {
				let Some(last) = destination.last() else {
					return Err(self.error("", "cannot bind the root object"));
				};
				let ty = last.type_info();
				self.core.entries.push(MemberEntry::unbound(destination.clone(), ty));
				self.core.entries.len() - 1
			}
		};
		if self.nested && self.core.entries[index].is_bound() {
			return Err(self.error(
				&destination.path(),
				"member is already bound by an earlier mapping",
			));
		}

		let replaced = match &self.core.entries[index].binding {
			Binding::Member(chain) if !self.nested && chain.len() == 1 => chain.last().copied(),
			_ => None,
		};

		let ordinal = self.core.next_ordinal();
		let source_root = self.source_root.clone();
		let destination_root = self.destination_root.clone();
		let entry = &mut self.core.entries[index];
		entry.binding = binding;
		entry.source_type = source_type;
		entry.requires_remap = requires_remap;
		entry.ordinal = ordinal;
		entry.origin = origin;
		entry.source_root = source_root;
		entry.destination_root = destination_root;

		self.core.cover_parents(&names);
		if let Some(member) = replaced {
			self.release_source(member);
		}
		Ok(())
	}

	/// Makes a root source member available again once no binding reads it.
	fn release_source(&mut self, member: MemberInfo) {
		let still_read = self.core.entries.iter().any(|e| match &e.binding {
			Binding::Member(chain) => {
				e.source_root.is_empty() && chain.len() == 1 && chain.last().is_some_and(|m| m.name == member.name)
			}
			_ => false,
		});
		if !still_read && !self.available.iter().any(|m| m.name == member.name) {
			self.available.push(member);
		}
	}

	fn bind_member(
		&mut self,
		destination: AccessorChain,
		source: AccessorChain,
		remap: Remap,
		origin: BindingOrigin,
	) -> Result<()> {
		let path = destination.path();
		let (Some(&to), Some(&from)) = (destination.last(), source.last()) else {
			return Err(self.error(&path, "member path is empty"));
		};
		let (to_ty, from_ty) = (to.type_info(), from.type_info());
		let assignable = to_ty.key == from_ty.key;
		let requires_remap = match remap {
			Remap::Auto => !(assignable && to_ty.is_value_like() && from_ty.is_value_like()),
			Remap::Always => true,
			Remap::Never => {
				if !assignable {
					return Err(self.error(
						&path,
						format!("{} is not assignable to {}", from_ty.name(), to_ty.name()),
					));
				}
				if !from_ty.is_cloneable() {
					return Err(self.error(
						&path,
						format!("{} values can only be copied through a remap", from_ty.name()),
					));
				}
				false
			}
		};

		let single = (source.len() == 1).then_some(from.name);
		self.bind_entry(destination, Binding::Member(source), Some(from_ty), requires_remap, origin)?;
		if let Some(name) = single {
			self.available.retain(|m| m.name != name);
		}
		Ok(())
	}

	pub(crate) fn set_member(&mut self, to: &str, from: &str, remap: Remap) -> Result<()> {
		self.ensure_unlocked()?;
		let destination = self.destination_chain(to)?;
		let source = self.source_chain(from, false)?;
		self.bind_member(destination, source, remap, BindingOrigin::Explicit)
	}

	pub(crate) fn set_function(
		&mut self,
		to: &str,
		function: SourceFn<C>,
		value_type: TypeInfo,
		remap: Remap,
	) -> Result<()> {
		self.ensure_unlocked()?;
		let destination = self.destination_chain(to)?;
		let Some(to_ty) = destination.last().map(|m| m.type_info()) else {
			return Err(self.error(to, "member path is empty"));
		};
		let assignable = to_ty.key == value_type.key;
		let requires_remap = match remap {
			Remap::Auto => !assignable,
			Remap::Always => true,
			Remap::Never if !assignable => {
				return Err(self.error(
					to,
					format!("{} is not assignable to {}", value_type.name(), to_ty.name()),
				));
			}
			Remap::Never => false,
		};
		self.bind_entry(
			destination,
			Binding::Function(function),
			Some(value_type),
			requires_remap,
			BindingOrigin::Explicit,
		)
	}

	pub(crate) fn ignore(&mut self, to: &str) -> Result<()> {
		self.ensure_unlocked()?;
		let destination = self.destination_chain(to)?;
		self.bind_entry(destination, Binding::Ignored, None, false, BindingOrigin::Explicit)
	}

	pub(crate) fn ignore_unmapped(&mut self) -> Result<()> {
		self.ensure_unlocked()?;
		self.ignore_remaining()
	}

	pub(crate) fn automap_only(&mut self) -> Result<()> {
		self.automap()?;
		self.ignore_remaining()
	}

	fn ignore_remaining(&mut self) -> Result<()> {
		for member in self.unmapped_destinations() {
			let destination = self.child_chain(member);
			self.bind_entry(destination, Binding::Ignored, None, false, BindingOrigin::Explicit)?;
		}
		Ok(())
	}

	pub(crate) fn set_child_context(&mut self, transform: ContextFn<C>) -> Result<()> {
		self.ensure_unlocked()?;
		if self.nested {
			return Err(self.error("", "a child context can only be declared on the root plan"));
		}
		self.core.child_context = Some(transform);
		Ok(())
	}

	pub(crate) fn require(&mut self, from: TypeInfo, to: TypeInfo) {
		self.core.declare(from, to);
	}

	/// Runs every member consumer once, then locks the view.
	pub(crate) fn automap(&mut self) -> Result<()> {
		if self.locked {
			return Ok(());
		}
		let consumers: Vec<_> = self.core.consumers.iter().cloned().collect();
		for consumer in consumers {
			consumer.consume(&mut *self)?;
		}
		self.locked = true;
		tracing::debug!(
			from = self.source.name(),
			to = self.destination.name(),
			unmapped = self.unmapped_destinations().len(),
			"automapped plan"
		);
		Ok(())
	}

	/// Automaps this view, then opens an overlay of the source sub-object `from`
	/// onto the destination sub-object `to`. Empty paths name the view roots.
	pub(crate) fn open_overlay(&mut self, to: &str, from: &str) -> Result<PlanView<'_, C>> {
		let source_chain = self.source_chain(from, true)?;
		let source = source_chain
			.last()
			.map(|m| m.type_info().unwrapped())
			.unwrap_or(self.source);
		if !matches!(source.shape, Shape::Object(_)) {
			return Err(self.error(from, format!("{} is not an object and cannot be overlaid", source.name())));
		}

		let segments = split_path(to).ok_or_else(|| self.error(to, "destination path is malformed"))?;
		let relative = AccessorChain::resolve(&self.destination, &segments).map_err(|reason| self.error(to, reason))?;
		let destination = relative
			.last()
			.map(|m| m.type_info().unwrapped())
			.unwrap_or(self.destination);
		if !matches!(destination.shape, Shape::Object(_)) {
			return Err(self.error(to, format!("{} is not an object and cannot receive an overlay", destination.name())));
		}
		let destination_root = self.destination_root.join(&relative);
		if !relative.is_empty() {
			self.expand(&destination_root, &destination)?;
		}
		if let (1, Some(member)) = (source_chain.len(), source_chain.last()) {
			let name = member.name;
			self.available.retain(|m| m.name != name);
		}

		self.automap()?;

		Ok(PlanView {
			source_root: self.source_root.join(&source_chain),
			core: &mut *self.core,
			source,
			destination,
			destination_root,
			available: readable(&source),
			locked: false,
			nested: true,
		})
	}

	/// Turns the entry at `root` into a nested entry and adds one entry per
	/// writable member of `ty` below it.
	fn expand(&mut self, root: &AccessorChain, ty: &TypeInfo) -> Result<()> {
		let names = root.names();
		if let Some(index) = self.core.find(&names) {
			match self.core.entries[index].kind() {
				BindingKind::Unbound | BindingKind::Ignored => {
					let ordinal = self.core.next_ordinal();
					let entry = &mut self.core.entries[index];
					entry.binding = Binding::Nested;
					entry.ordinal = ordinal;
				}
				BindingKind::Nested => {}
				BindingKind::Member | BindingKind::Function => {
					return Err(self.error(
						&root.path(),
						"member is already bound and cannot receive an overlay",
					));
				}
			}
		}
		self.core.cover_parents(&names);

		for member in ty.members().into_iter().filter(|m| m.writable) {
			let mut tail = AccessorChain::new();
			tail.push(ty.name(), member);
			let chain = root.join(&tail);
			if self.core.find(&chain.names()).is_none() {
				self.core.entries.push(MemberEntry::unbound(chain, member.type_info()));
			}
		}
		Ok(())
	}

	pub(crate) fn unmapped_destinations(&self) -> Vec<MemberInfo> {
		let prefix = self.destination_root.names();
		let depth = prefix.len() + 1;
		self.core
			.entries
			.iter()
			.filter(|e| !e.is_bound() && e.destination.len() == depth && e.destination.starts_with(&prefix))
			.filter_map(|e| e.destination.last().copied())
			.collect()
	}

	pub(crate) fn unmapped_sources(&self) -> Vec<MemberInfo> {
		self.available.clone()
	}
}

impl<C: 'static> Automap for PlanView<'_, C> {
	fn scope(&self) -> PlanScope {
		PlanScope {
			from: self.source.key,
			to: self.destination.key,
		}
	}

	fn resolvers(&self) -> Vec<Arc<dyn MemberResolver>> {
		self.core.resolvers.iter().cloned().collect()
	}

	fn unmapped_destinations(&self) -> Vec<MemberInfo> {
		PlanView::unmapped_destinations(self)
	}

	fn available_sources(&self) -> Vec<MemberInfo> {
		self.available.clone()
	}

	fn bind(&mut self, destination: &MemberInfo, source: &MemberInfo) -> Result<()> {
		if !destination.writable {
			return Err(self.error(destination.name, "member is not writable"));
		}
		if !source.readable {
			return Err(self.error(source.name, "source member is not readable"));
		}
		let destination = self.child_chain(*destination);
		let mut chain = AccessorChain::new();
		chain.push(self.source.name(), *source);
		self.bind_member(destination, chain, Remap::Auto, BindingOrigin::Automapped)
	}
}
