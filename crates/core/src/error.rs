//! Error types for mapper registration, initialization and execution.

use std::path::PathBuf;

/// Result alias used throughout the mapping engine.
pub type Result<T> = std::result::Result<T, MapError>;

/// Errors raised while configuring, initializing or running a mapper.
///
/// Every variant carries enough context (type pair, member path, registration
/// site) to fix the configuration without reading engine internals.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MapError {
	/// `map`/`construct` was called before `initialize` completed.
	#[error("the mapper cannot be used until it has been initialized")]
	NotInitialized,
	/// A registration call arrived after `initialize` was attempted.
	#[error("the mapper has been initialized; no further changes can be made")]
	AlreadyInitialized,
	/// A type pair was registered twice.
	#[error("mapping already exists for converting from {from} to {to}; previously defined at: {defined_at}")]
	DuplicateMapping {
		from: &'static str,
		to: &'static str,
		defined_at: String,
	},
	/// A plan left writable destination members without a binding.
	#[error(
		"unable to map from {from} to {to}: the following members have no source and are not ignored: {}",
		.members.join(", ")
	)]
	UnmappedMembers {
		from: &'static str,
		to: &'static str,
		members: Vec<String>,
	},
	/// The initialization closure could not resolve every required pair.
	#[error("unable to complete maps; one or more required maps could not be found:{}", render_missing(.missing))]
	MissingRequiredMaps { missing: Vec<MissingMap> },
	/// A binding was rejected while the plan was being built.
	#[error("cannot bind member `{member}` when mapping {from} to {to}: {reason}")]
	MemberMapping {
		from: &'static str,
		to: &'static str,
		member: String,
		reason: String,
	},
	/// A plan was mutated after automapping completed.
	#[error("automapping has been completed for {from} to {to}; no further overrides can be performed")]
	PlanLocked { from: &'static str, to: &'static str },
	/// No constructor is registered or discoverable for a type.
	#[error("unable to construct {ty}: no default constructor found")]
	Construction { ty: &'static str },
	/// `map` was called for a pair without a compiled conversion.
	#[error("unable to map from {from} to {to}{}", render_hint(.hint))]
	Unmappable {
		from: &'static str,
		to: &'static str,
		hint: Option<String>,
	},
	/// A converter rejected a value.
	#[error("conversion from {from} to {to} failed: {message}")]
	Conversion {
		from: &'static str,
		to: &'static str,
		message: String,
	},
	/// An accessor was handed a value of the wrong type.
	#[error("accessor for `{member}` expected a value of type {expected}")]
	Access { member: String, expected: &'static str },
	/// Writing a diagnostics export failed.
	#[error("failed to export mapping diagnostics to {}: {message}", .path.display())]
	Diagnostics { path: PathBuf, message: String },
}

/// One unresolved required pair with every reason that requested it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingMap {
	pub from: &'static str,
	pub to: &'static str,
	pub reasons: Vec<String>,
}

fn render_hint(hint: &Option<String>) -> String {
	hint.as_deref().map(|h| format!(": {h}")).unwrap_or_default()
}

fn render_missing(missing: &[MissingMap]) -> String {
	missing
		.iter()
		.map(|m| format!("\n{} to {}: required by {}", m.from, m.to, m.reasons.join(", ")))
		.collect()
}

impl MapError {
	pub(crate) fn member(
		from: &'static str,
		to: &'static str,
		member: impl Into<String>,
		reason: impl Into<String>,
	) -> Self {
		Self::MemberMapping {
			from,
			to,
			member: member.into(),
			reason: reason.into(),
		}
	}

	pub(crate) fn access<T: ?Sized>(member: impl Into<String>) -> Self {
		Self::Access {
			member: member.into(),
			expected: std::any::type_name::<T>(),
		}
	}
}
