use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;

use super::*;
use crate::registry::ResourceMapper;

#[derive(Debug, Default, crate::Reflect)]
#[reflect(default)]
struct Person {
	name: String,
	age: i32,
	secret: String,
}

#[derive(Debug, Default, crate::Reflect)]
#[reflect(default)]
struct PersonDto {
	name: String,
	years: i32,
	secret: String,
	label: String,
}

fn mapper() -> ResourceMapper {
	let mut mapper = ResourceMapper::<()>::new();
	mapper
		.register_one_way_with::<Person, PersonDto>(|plan| {
			plan.set_member("years", "age")?
				.ignore("secret")?
				.set("label", |p: &Person, _, _| format!("{}!", p.name))?;
			Ok(())
		})
		.unwrap();
	mapper
}

fn read_reports(dir: &Path) -> Vec<PlanReport> {
	let mut reports: Vec<PlanReport> = fs::read_dir(dir)
		.unwrap()
		.map(|entry| {
			let text = fs::read_to_string(entry.unwrap().path()).unwrap();
			serde_json::from_str(&text).unwrap()
		})
		.collect();
	reports.sort_by(|a, b| a.from.cmp(&b.from));
	reports
}

/// File names keep only identifier characters of both type names.
#[test]
fn test_file_name_is_sanitized() {
	let report = PlanReport {
		from: "a::B<c::D>".into(),
		to: "u8".into(),
		defined_at: None,
		members: Vec::new(),
	};
	assert_eq!(report.file_name(), "a__B_c__D___u8.json");
}

/// Initialization writes one description per object map, in binding order.
#[test]
fn test_initialize_exports_plans() {
	let dir = tempfile::tempdir().unwrap();
	let mut mapper = mapper();
	mapper.export_maps_to(dir.path()).unwrap();
	mapper.initialize().unwrap();

	let reports = read_reports(dir.path());
	assert_eq!(reports.len(), 1);
	let report = &reports[0];
	assert_eq!(report.from, std::any::type_name::<Person>());
	assert_eq!(report.to, std::any::type_name::<PersonDto>());
	assert!(report.defined_at.as_deref().unwrap().contains("tests.rs"));

	let member = |name: &str| report.members.iter().find(|m| m.destination == name).unwrap();
	assert_eq!(
		member("years").source,
		SourceReport::Member {
			path: "age".into(),
			ty: "i32".into(),
		}
	);
	assert_eq!(member("secret").source, SourceReport::Ignored);
	assert_eq!(
		member("label").source,
		SourceReport::Function {
			ty: "alloc::string::String".into(),
		}
	);
	assert!(!member("name").remapped);
	assert!(member("years").order < member("name").order);
}

/// Exported JSON tags each source with its kind.
#[test]
fn test_export_writes_tagged_json() {
	let dir = tempfile::tempdir().unwrap();
	let report = PlanReport {
		from: "A".into(),
		to: "B".into(),
		defined_at: None,
		members: vec![MemberReport {
			destination: "id".into(),
			destination_type: "u32".into(),
			order: 1,
			remapped: true,
			source: SourceReport::Member {
				path: "key".into(),
				ty: "u64".into(),
			},
		}],
	};

	let written = export(&dir.path().join("nested"), &[report.clone()]).unwrap();
	assert_eq!(written.len(), 1);
	let text = fs::read_to_string(&written[0]).unwrap();
	assert!(text.contains(r#""kind": "member""#), "{text}");
	assert!(!text.contains("defined_at"));
	assert_eq!(serde_json::from_str::<PlanReport>(&text).unwrap(), report);
}

/// A later initialize call does not export again.
#[test]
fn test_repeated_initialize_exports_once() {
	let dir = tempfile::tempdir().unwrap();
	let mut mapper = mapper();
	mapper.export_maps_to(dir.path()).unwrap();
	mapper.initialize().unwrap();
	for entry in fs::read_dir(dir.path()).unwrap() {
		fs::remove_file(entry.unwrap().path()).unwrap();
	}

	mapper.initialize().unwrap();
	assert!(read_reports(dir.path()).is_empty());
}

/// With diagnostics off nothing is exported.
#[test]
fn test_deactivated_diagnostics_skip_export() {
	let dir = tempfile::tempdir().unwrap();
	let target = dir.path().join("maps");
	let mut mapper = mapper();
	mapper.export_maps_to(&target).unwrap();
	mapper.deactivate_diagnostics().unwrap();
	mapper.initialize().unwrap();

	assert!(!target.exists());
}

/// Choosing an export directory turns diagnostics back on.
#[test]
fn test_export_reactivates_diagnostics() {
	let dir = tempfile::tempdir().unwrap();
	let mut mapper = mapper();
	mapper.deactivate_diagnostics().unwrap();
	mapper.export_maps_to(dir.path()).unwrap();
	mapper.initialize().unwrap();

	let reports = read_reports(dir.path());
	assert_eq!(reports.len(), 1);
	assert_eq!(reports[0].to, std::any::type_name::<PersonDto>());
}

/// Export failures are reported by `export` but do not fail initialization.
#[test]
fn test_export_failure() {
	let dir = tempfile::tempdir().unwrap();
	let blocker = dir.path().join("file");
	fs::write(&blocker, "not a directory").unwrap();

	assert!(matches!(export(&blocker, &[]), Err(MapError::Diagnostics { .. })));

	let mut mapper = mapper();
	mapper.export_maps_to(blocker.join("maps")).unwrap();
	assert_eq!(mapper.initialize(), Ok(()));
	assert!(mapper.is_initialized());
}
