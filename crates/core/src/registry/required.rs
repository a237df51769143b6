use super::dictionary::{TypeDictionary, TypePair};
use crate::error::MissingMap;
use crate::types::TypeInfo;

/// A type pair some part of the configuration needs converted.
#[derive(Debug, Clone)]
pub struct Requirement {
	pub from: TypeInfo,
	pub to: TypeInfo,
	/// Who asked for it: a registration site or `"From => To"`.
	pub reason: String,
}

pub(crate) struct RequiredMap {
	pub(crate) from: TypeInfo,
	pub(crate) to: TypeInfo,
	pub(crate) reasons: Vec<String>,
}

/// Every required pair with the deduplicated reasons that requested it.
#[derive(Default)]
pub(crate) struct RequiredMaps {
	entries: TypeDictionary<RequiredMap>,
}

impl RequiredMaps {
	pub(crate) fn require(&mut self, requirement: Requirement) {
		let Requirement { from, to, reason } = requirement;
		let entry = self
			.entries
			.get_or_insert_with(TypePair::new(from.key, to.key), || RequiredMap {
				from,
				to,
				reasons: Vec::new(),
			});
		if !entry.reasons.contains(&reason) {
			entry.reasons.push(reason);
		}
	}

	/// Required pairs for which `settled` returns false, in request order.
	pub(crate) fn pending(&self, settled: impl Fn(&TypePair) -> bool) -> Vec<(TypeInfo, TypeInfo)> {
		self.entries
			.iter()
			.filter(|(pair, _)| !settled(pair))
			.map(|(_, entry)| (entry.from, entry.to))
			.collect()
	}

	pub(crate) fn missing(&self, pair: &TypePair) -> MissingMap {
		MissingMap {
			from: pair.from.name(),
			to: pair.to.name(),
			reasons: self
				.entries
				.get(pair)
				.map(|entry| entry.reasons.clone())
				.unwrap_or_default(),
		}
	}

	pub(crate) fn types(&self) -> impl Iterator<Item = &TypeInfo> {
		self.entries.values().flat_map(|entry| [&entry.from, &entry.to])
	}
}
