//! End-to-end mapping scenarios through the public API.

use morph_core::{Bidirectional, MapError, MappingPlan, OneWayMap, Reflect, ResourceMapper, Result, TwoWayMap};
use pretty_assertions::assert_eq;

fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[derive(Debug, Default, Reflect)]
#[reflect(default)]
struct Numbers {
	number: i32,
	number_to_string: i32,
}

#[derive(Debug, Default, PartialEq, Reflect)]
#[reflect(default)]
struct NumbersDto {
	number: i32,
	number_to_string: String,
}

/// Identical members copy; differing ones go through the standard converters.
#[test]
fn test_numbers_convert_to_strings() {
	init_tracing();
	let mut mapper = ResourceMapper::<()>::new();
	mapper.load_standard_converters().unwrap();
	mapper.register_one_way::<Numbers, NumbersDto>().unwrap();
	mapper.initialize().unwrap();

	let source = Numbers {
		number: 10,
		number_to_string: -1000,
	};
	assert_eq!(
		mapper.map::<Numbers, NumbersDto>(&source, &()).unwrap(),
		NumbersDto {
			number: 10,
			number_to_string: "-1000".into(),
		}
	);
}

/// Without a converter for a differing member, initialization fails.
#[test]
fn test_missing_converter_fails_initialize() {
	init_tracing();
	let mut mapper = ResourceMapper::<()>::new();
	mapper.register_one_way::<Numbers, NumbersDto>().unwrap();

	let Err(MapError::MissingRequiredMaps { missing }) = mapper.initialize() else {
		panic!("expected missing required maps");
	};
	assert_eq!((missing[0].from, missing[0].to), ("i32", "alloc::string::String"));
}

#[derive(Debug, Clone, Default)]
struct Ctx {
	parent_id: Option<i64>,
}

#[derive(Debug, Default, Reflect)]
#[reflect(default)]
struct Child {
	variable: i32,
}

#[derive(Debug, Default, PartialEq, Reflect)]
#[reflect(default)]
struct ChildDto {
	parent_id: i64,
	variable: i32,
}

#[derive(Debug, Default, Reflect)]
#[reflect(default)]
struct Parent {
	id: i64,
	child: Child,
}

#[derive(Debug, Default, PartialEq, Reflect)]
#[reflect(default)]
struct ParentDto {
	id: i64,
	child: ChildDto,
}

/// Nested conversions see the child context; the caller's context is untouched.
#[test]
fn test_child_context_is_isolated() {
	init_tracing();
	let mut mapper = ResourceMapper::<Ctx>::new();
	mapper
		.register_one_way_with::<Parent, ParentDto>(|plan| {
			plan.set_child_context(|parent, _, mut ctx| {
				ctx.parent_id = Some(parent.id);
				ctx
			})?;
			Ok(())
		})
		.unwrap()
		.register_one_way_with::<Child, ChildDto>(|plan| {
			plan.set("parent_id", |_, _, ctx: &Ctx| ctx.parent_id.unwrap_or(-1))?;
			Ok(())
		})
		.unwrap();
	mapper.initialize().unwrap();

	let ctx = Ctx::default();
	let source = Parent {
		id: 10,
		child: Child { variable: 103 },
	};
	let dto: ParentDto = mapper.map(&source, &ctx).unwrap();
	assert_eq!(
		dto.child,
		ChildDto {
			parent_id: 10,
			variable: 103,
		}
	);
	assert_eq!(dto.id, 10);
	assert_eq!(ctx.parent_id, None);

	let direct: ChildDto = mapper.map(&Child { variable: 1 }, &ctx).unwrap();
	assert_eq!(direct.parent_id, -1);
}

#[derive(Debug, Default, Reflect)]
#[reflect(default)]
struct Src1 {
	property1: i32,
}

#[derive(Debug, Default, Reflect)]
#[reflect(default)]
struct Src2 {
	property2: i32,
}

#[derive(Debug, Default, Reflect)]
#[reflect(default)]
struct Sources {
	src1: Src1,
	src2: Src2,
}

#[derive(Debug, Default, PartialEq, Reflect)]
#[reflect(default)]
struct Flat {
	property1: i32,
	property2: i32,
}

/// Overlaid sub-objects flatten onto the destination root.
#[test]
fn test_overlays_flatten_sources() {
	init_tracing();
	let mut mapper = ResourceMapper::<()>::new();
	mapper
		.register_one_way_with::<Sources, Flat>(|plan| {
			plan.overlay("", "src1")?.overlay("", "src2")?;
			Ok(())
		})
		.unwrap();
	mapper.initialize().unwrap();

	let source = Sources {
		src1: Src1 { property1: 5 },
		src2: Src2 { property2: 7 },
	};
	assert_eq!(
		mapper.map::<Sources, Flat>(&source, &()).unwrap(),
		Flat {
			property1: 5,
			property2: 7,
		}
	);
}

/// Overlays automap the plan, so later overrides fail and so does initialization.
#[test]
fn test_override_after_overlay_is_locked() {
	init_tracing();
	let mut mapper = ResourceMapper::<()>::new();
	mapper
		.register_one_way_with::<Sources, Flat>(|plan| {
			plan.overlay("", "src1")?.overlay("", "src2")?.ignore("property1")?;
			Ok(())
		})
		.unwrap();

	assert!(matches!(mapper.initialize(), Err(MapError::PlanLocked { .. })));
}

#[derive(Debug, Default, Reflect)]
#[reflect(default)]
struct Sample {
	value: i32,
}

#[derive(Debug, Default, Reflect)]
#[reflect(default)]
struct SampleDto {
	value: i32,
}

#[derive(Debug, Default, Reflect)]
#[reflect(default)]
struct Report {
	title: String,
}

/// Duplicate registrations and unresolved requirements are configuration errors.
#[test]
fn test_duplicate_and_missing_maps() {
	init_tracing();
	let mut mapper = ResourceMapper::<()>::new();
	mapper.register_one_way::<Sample, SampleDto>().unwrap();
	assert!(matches!(
		mapper.register_one_way::<Sample, SampleDto>(),
		Err(MapError::DuplicateMapping { .. })
	));

	mapper.require_one_way::<Sample, Report>("monthly report").unwrap();
	let err = mapper.initialize().unwrap_err();
	let MapError::MissingRequiredMaps { missing } = &err else {
		panic!("expected missing required maps, got {err}");
	};
	assert_eq!(missing.len(), 1);
	assert_eq!(missing[0].from, std::any::type_name::<Sample>());
	assert_eq!(missing[0].to, std::any::type_name::<Report>());
	assert_eq!(missing[0].reasons, vec!["monthly report".to_string()]);

	let message = err.to_string();
	assert!(message.contains("Sample"));
	assert!(message.contains("Report"));
	assert!(message.contains("monthly report"));
}

#[derive(Debug, Default, Clone, PartialEq, Reflect)]
#[reflect(default)]
struct Account {
	id: u32,
	owner: String,
	internal_note: String,
}

#[derive(Debug, Default, Clone, PartialEq, Reflect)]
#[reflect(default)]
struct AccountDto {
	account_id: u32,
	owner_name: String,
	summary: String,
}

struct AccountMap;

impl TwoWayMap<Account, AccountDto, ()> for AccountMap {
	fn both_directions(&self, map: &mut Bidirectional<'_, '_, ()>) -> Result<()> {
		map.pair("id", "account_id")?
			.pair("owner", "owner_name")?
			.ignore_a("internal_note")?;
		Ok(())
	}

	fn a_to_b(&self, plan: &mut MappingPlan<'_, Account, AccountDto, ()>) -> Result<()> {
		plan.set("summary", |a, _, _| format!("#{} {}", a.id, a.owner))?;
		Ok(())
	}
}

/// Shared pairings apply in both directions; direction hooks add the rest.
#[test]
fn test_two_way_convention() {
	init_tracing();
	let mut mapper = ResourceMapper::<()>::new();
	mapper.register_two_way_convention(AccountMap).unwrap();
	mapper.initialize().unwrap();

	let account = Account {
		id: 7,
		owner: "ada".into(),
		internal_note: "vip".into(),
	};
	let dto: AccountDto = mapper.map(&account, &()).unwrap();
	assert_eq!(
		dto,
		AccountDto {
			account_id: 7,
			owner_name: "ada".into(),
			summary: "#7 ada".into(),
		}
	);

	let mut existing = account.clone();
	let changed = AccountDto {
		owner_name: "grace".into(),
		..dto
	};
	mapper.map_into(&changed, &mut existing, &()).unwrap();
	assert_eq!(
		existing,
		Account {
			id: 7,
			owner: "grace".into(),
			internal_note: "vip".into(),
		}
	);
}

/// Separate closures configure each direction of a two-way registration.
#[test]
fn test_two_way_with_closures() {
	init_tracing();
	let mut mapper = ResourceMapper::<()>::new();
	mapper
		.register_two_way_with::<Account, AccountDto>(
			|plan| {
				plan.set_member("account_id", "id")?
					.set_member("owner_name", "owner")?
					.set_value("summary", String::from("n/a"))?;
				Ok(())
			},
			|plan| {
				plan.set_member("id", "account_id")?
					.set_member("owner", "owner_name")?
					.ignore("internal_note")?;
				Ok(())
			},
		)
		.unwrap();
	mapper.initialize().unwrap();

	let dto: AccountDto = mapper
		.map(
			&Account {
				id: 1,
				owner: "x".into(),
				internal_note: String::new(),
			},
			&(),
		)
		.unwrap();
	assert_eq!(dto.summary, "n/a");
	let back: Account = mapper.map(&dto, &()).unwrap();
	assert_eq!((back.id, back.owner.as_str()), (1, "x"));
}

#[derive(Debug, Default, Reflect)]
#[reflect(default)]
struct Address {
	city: String,
}

#[derive(Debug, Default, Reflect)]
#[reflect(default)]
struct Person {
	name: String,
	address: Option<Address>,
	nickname: String,
}

#[derive(Debug, Default, PartialEq, Reflect)]
#[reflect(default)]
struct PersonCard {
	name: String,
	city: String,
	nickname: String,
}

struct CardConvention;

impl OneWayMap<Person, PersonCard, ()> for CardConvention {
	fn override_mapping(&self, plan: &mut MappingPlan<'_, Person, PersonCard, ()>) -> Result<()> {
		plan.set_member("city", "address.city")?.automap_only()?;
		Ok(())
	}
}

/// Paths through an absent optional member read as null and write the zero value.
#[test]
fn test_one_way_convention_with_optional_path() {
	init_tracing();
	let mut mapper = ResourceMapper::<()>::new();
	mapper.register_convention(CardConvention).unwrap();
	mapper.initialize().unwrap();

	let with_address = Person {
		name: "ada".into(),
		address: Some(Address { city: "london".into() }),
		nickname: "countess".into(),
	};
	let card: PersonCard = mapper.map(&with_address, &()).unwrap();
	assert_eq!(card.city, "london");
	assert_eq!(card.nickname, "countess");

	let mut existing = PersonCard {
		city: "paris".into(),
		..PersonCard::default()
	};
	mapper
		.map_into(
			&Person {
				name: "grace".into(),
				..Person::default()
			},
			&mut existing,
			&(),
		)
		.unwrap();
	assert_eq!(
		existing,
		PersonCard {
			name: "grace".into(),
			city: String::new(),
			nickname: String::new(),
		}
	);
}

#[derive(Debug, Default, Reflect)]
#[reflect(default)]
struct Tag {
	name: String,
	id: i32,
}

#[derive(Debug, Default, PartialEq, Reflect)]
#[reflect(default)]
struct TagDto {
	name: String,
	id: i32,
}

#[derive(Debug, Default, Reflect)]
#[reflect(default)]
struct Post {
	tag: Tag,
}

#[derive(Debug, Default, PartialEq, Reflect)]
#[reflect(default)]
struct PostDto {
	tag: TagDto,
}

/// A nested destination binding does not silently zero the parent's other members.
#[test]
fn test_nested_binding_requires_sibling_members() {
	init_tracing();
	let mut mapper = ResourceMapper::<()>::new();
	mapper
		.register_one_way_with::<Post, PostDto>(|plan| {
			plan.set_member("tag.name", "tag.name")?;
			Ok(())
		})
		.unwrap();
	let Err(MapError::UnmappedMembers { members, .. }) = mapper.initialize() else {
		panic!("expected unmapped members");
	};
	assert_eq!(members, vec!["tag.id".to_string()]);

	let mut mapper = ResourceMapper::<()>::new();
	mapper
		.register_one_way_with::<Post, PostDto>(|plan| {
			plan.set_member("tag.name", "tag.name")?.set_member("tag.id", "tag.id")?;
			Ok(())
		})
		.unwrap();
	mapper.initialize().unwrap();
	let source = Post {
		tag: Tag {
			name: "rust".into(),
			id: 5,
		},
	};
	assert_eq!(
		mapper.map::<Post, PostDto>(&source, &()).unwrap(),
		PostDto {
			tag: TagDto {
				name: "rust".into(),
				id: 5,
			},
		}
	);
}
