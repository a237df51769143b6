//! Plan descriptions and their JSON export.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MapError, Result};
use crate::plan::{Binding, PlanCore};

/// How one destination member is produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceReport {
	Member { path: String, ty: String },
	Function { ty: String },
	Ignored,
	Nested,
}

/// One bound destination member, in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberReport {
	pub destination: String,
	pub destination_type: String,
	pub order: u64,
	pub remapped: bool,
	pub source: SourceReport,
}

/// Description of a compiled object plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanReport {
	pub from: String,
	pub to: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub defined_at: Option<String>,
	pub members: Vec<MemberReport>,
}

impl PlanReport {
	pub(crate) fn from_plan<C>(core: &PlanCore<C>, defined_at: Option<String>) -> Self {
		let members = core
			.ordered()
			.into_iter()
			.filter_map(|entry| {
				let source = match &entry.binding {
					Binding::Unbound => return None,
					Binding::Ignored => SourceReport::Ignored,
					Binding::Nested => SourceReport::Nested,
					Binding::Member(chain) => SourceReport::Member {
						path: entry.source_root.join(chain).path(),
						ty: source_name(entry.source_type.map(|t| t.name())),
					},
					Binding::Function(_) => SourceReport::Function {
						ty: source_name(entry.source_type.map(|t| t.name())),
					},
				};
				Some(MemberReport {
					destination: entry.destination_path(),
					destination_type: entry.destination_type.name().to_string(),
					order: entry.ordinal,
					remapped: entry.requires_remap,
					source,
				})
			})
			.collect();
		Self {
			from: core.from.name().to_string(),
			to: core.to.name().to_string(),
			defined_at,
			members,
		}
	}

	/// File name for this plan: both type names reduced to `[A-Za-z0-9_]`.
	pub fn file_name(&self) -> String {
		format!("{}__{}.json", sanitize(&self.from), sanitize(&self.to))
	}
}

fn source_name(name: Option<&'static str>) -> String {
	name.unwrap_or("unknown").to_string()
}

fn sanitize(name: &str) -> String {
	name.chars()
		.map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
		.collect()
}

fn export_error(path: &Path, message: impl ToString) -> MapError {
	MapError::Diagnostics {
		path: path.to_path_buf(),
		message: message.to_string(),
	}
}

/// Writes one pretty-printed JSON file per report into `dir`, creating it if needed.
pub fn export(dir: &Path, reports: &[PlanReport]) -> Result<Vec<PathBuf>> {
	fs::create_dir_all(dir).map_err(|e| export_error(dir, e))?;
	let mut written = Vec::with_capacity(reports.len());
	for report in reports {
		let path = dir.join(report.file_name());
		let json = serde_json::to_string_pretty(report).map_err(|e| export_error(&path, e))?;
		fs::write(&path, json).map_err(|e| export_error(&path, e))?;
		tracing::debug!(path = %path.display(), "exported plan");
		written.push(path);
	}
	Ok(written)
}

#[cfg(test)]
mod tests;
