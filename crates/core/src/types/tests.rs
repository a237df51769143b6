use std::any::Any;

use pretty_assertions::assert_eq;

use super::*;
use crate::error::{MapError, Result};

#[derive(Debug, Default, PartialEq, crate::Reflect)]
#[reflect(default)]
struct Address {
	street: String,
	#[reflect(rename = "zip")]
	postal_code: String,
}

#[derive(Debug, Default, PartialEq, crate::Reflect)]
#[reflect(default)]
struct Customer {
	name: String,
	#[reflect(readonly)]
	id: i64,
	#[reflect(writeonly)]
	password: String,
	#[reflect(skip)]
	#[allow(dead_code)]
	cache: u8,
	address: Option<Address>,
	tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, crate::Reflect)]
enum Level {
	Low,
	#[default]
	Medium,
	High,
}

#[derive(Debug, Clone, PartialEq, crate::Reflect)]
enum Shade {
	Light,
	Dark,
}

struct Defaults;

impl Constructors for Defaults {
	fn construct_value(&self, ty: &TypeInfo) -> Result<Value> {
		ty.construct().ok_or(MapError::Construction { ty: ty.name() })
	}
}

fn names(ty: &TypeInfo) -> Vec<&'static str> {
	ty.members().iter().map(|m| m.name).collect()
}

/// Derived structs list their members in declaration order, minus skipped ones.
#[test]
fn test_derive_lists_members_in_order() {
	let info = Customer::type_info();
	assert_eq!(names(&info), vec!["name", "id", "password", "address", "tags"]);
	assert!(matches!(info.shape, Shape::Object(_)));
	assert!(info.is_constructible());
	assert!(!info.is_value_like());
	assert!(info.zero().is_none());
}

/// Field attributes control access flags and member names.
#[test]
fn test_derive_member_attributes() {
	let info = Customer::type_info();
	let id = info.member("id").unwrap();
	assert!(id.readable && !id.writable);
	let password = info.member("password").unwrap();
	assert!(!password.readable && password.writable);
	assert_eq!(names(&Address::type_info()), vec!["street", "zip"]);
	assert_eq!(info.member("address").unwrap().key, TypeKey::of::<Option<Address>>());
}

/// Member accessors borrow fields out of a type-erased owner.
#[test]
fn test_member_accessors_read_and_write() {
	let mut customer = Customer {
		name: "Ada".into(),
		..Customer::default()
	};
	let name = Customer::type_info().member("name").unwrap();

	let value = (name.get)(&customer).unwrap();
	assert_eq!(value.downcast_ref::<String>().unwrap(), "Ada");

	let slot = (name.get_mut)(&mut customer).unwrap();
	*slot.downcast_mut::<String>().unwrap() = "Grace".into();
	assert_eq!(customer.name, "Grace");

	assert!((name.get)(&42_i32).is_none());
}

/// Enums are value-like, expose variant names and parse them ignoring case.
#[test]
fn test_enum_shape() {
	let info = Level::type_info();
	assert!(info.is_value_like());
	let Shape::Enum(shape) = info.shape else {
		panic!("expected an enum shape");
	};
	assert_eq!(shape.variants, &["Low", "Medium", "High"]);
	assert_eq!((shape.name_of)(&Level::High), Some("High"));

	let parsed = shape.parse_ignore_case("hIgH").unwrap();
	assert_eq!(*parsed.downcast::<Level>().unwrap(), Level::High);
	assert!(shape.parse_ignore_case("extreme").is_none());

	let zero = info.zero().unwrap();
	assert_eq!(*zero.downcast::<Level>().unwrap(), Level::Medium);
}

/// Derived enums only need `Clone`: values copy through the vtable and the
/// first variant is the zero value.
#[test]
fn test_clone_only_enum_copies_by_value() {
	let info = Shade::type_info();
	assert!(info.is_cloneable());
	assert!(info.is_value_like());

	let copy = info.clone_value(&Shade::Dark).unwrap();
	assert_eq!(*copy.downcast::<Shade>().unwrap(), Shade::Dark);
	assert_eq!(*info.zero().unwrap().downcast::<Shade>().unwrap(), Shade::Light);
}

/// Value types clone and assign through the vtable; wrong types are handed back.
#[test]
fn test_value_clone_and_assign() {
	let info = i32::type_info();
	let cloned = info.clone_value(&7_i32).unwrap();
	let mut slot = 0_i32;
	info.assign(&mut slot, cloned).unwrap();
	assert_eq!(slot, 7);

	let rejected = info.assign(&mut slot, Box::new("seven".to_string()));
	assert!(rejected.is_err());
	assert!(info.clone_value(&"seven").is_none());
	assert_eq!(*info.zero().unwrap().downcast::<i32>().unwrap(), 0);
}

/// Option, list and array shapes describe their payload and element types.
#[test]
fn test_wrapper_shapes() {
	let option = Option::<i32>::type_info();
	let Shape::Option(shape) = option.shape else {
		panic!("expected an option shape");
	};
	assert_eq!((shape.inner)().key, TypeKey::of::<i32>());
	assert_eq!(option.unwrapped().key, TypeKey::of::<i32>());
	assert!(!option.is_value_like());
	assert!(option.zero().unwrap().downcast::<Option<i32>>().unwrap().is_none());

	let mut value: Option<i32> = None;
	(shape.insert)(&mut value, Box::new(3_i32)).unwrap();
	assert_eq!(value, Some(3));
	assert_eq!((shape.get)(&value).and_then(|v| v.downcast_ref::<i32>()), Some(&3));

	let list = Vec::<u8>::type_info();
	let Shape::List(seq) = list.shape else {
		panic!("expected a list shape");
	};
	let items = vec![1_u8, 2, 3];
	assert_eq!((seq.items)(&items).len(), 3);

	let array = Box::<[u8]>::type_info();
	let Shape::Array(seq) = array.shape else {
		panic!("expected an array shape");
	};
	let mut target: Box<[u8]> = Box::new([]);
	let values: Vec<Value> = vec![Box::new(4_u8), Box::new(5_u8)];
	(seq.replace)(&mut target, values).unwrap();
	assert_eq!(&*target, &[4, 5]);
}

/// Type keys compare by identity and display the type name.
#[test]
fn test_type_key_identity() {
	assert_eq!(TypeKey::of::<String>(), TypeKey::of::<String>());
	assert_ne!(TypeKey::of::<String>(), TypeKey::of::<&'static str>());
	assert_eq!(TypeKey::of::<u8>().to_string(), "u8");
}

/// Reading through an empty optional intermediate yields null.
#[test]
fn test_chain_read_stops_at_empty_option() {
	let root = Customer::type_info();
	let chain = AccessorChain::resolve(&root, &["address", "street"]).unwrap();
	assert_eq!(chain.path(), "address.street");

	let customer = Customer::default();
	assert!(chain.read(&customer).unwrap().is_none());

	let customer = Customer {
		address: Some(Address {
			street: "Main".into(),
			postal_code: "1".into(),
		}),
		..Customer::default()
	};
	let street = chain.read(&customer).unwrap().unwrap();
	assert_eq!(street.downcast_ref::<String>().unwrap(), "Main");
}

/// Writing through an empty optional intermediate constructs it first.
#[test]
fn test_chain_slot_constructs_intermediates() {
	let root = Customer::type_info();
	let chain = AccessorChain::resolve(&root, &["address", "zip"]).unwrap();
	let mut customer = Customer::default();

	let slot = chain.slot(&mut customer, &Defaults).unwrap();
	*slot.downcast_mut::<String>().unwrap() = "12345".into();

	assert_eq!(customer.address.unwrap().postal_code, "12345");
}

/// The last option is kept as is for member reads but seen through for objects.
#[test]
fn test_chain_read_object_sees_through_last_option() {
	let root = Customer::type_info();
	let chain = AccessorChain::resolve(&root, &["address"]).unwrap();
	let customer = Customer {
		address: Some(Address::default()),
		..Customer::default()
	};

	let member = chain.read(&customer).unwrap().unwrap();
	assert!(member.is::<Option<Address>>());
	let object = chain.read_object(&customer).unwrap().unwrap();
	assert!(object.is::<Address>());

	let mut empty = Customer::default();
	let created = chain.object_mut(&mut empty, &Defaults).unwrap();
	assert!(created.is::<Address>());
	assert!(empty.address.is_some());
}

/// Unknown members and paths through value types fail with a reason.
#[test]
fn test_chain_resolve_errors() {
	let root = Customer::type_info();
	let missing = AccessorChain::resolve(&root, &["nope"]).unwrap_err();
	assert!(missing.contains("no member named `nope`"));

	let through_value = AccessorChain::resolve(&root, &["name", "len"]).unwrap_err();
	assert!(through_value.contains("has no members"));
}

/// Accessors report a mismatch instead of panicking on a foreign root.
#[test]
fn test_chain_rejects_foreign_root() {
	let chain = AccessorChain::resolve(&Customer::type_info(), &["name"]).unwrap();
	let foreign: &dyn Any = &5_u32;
	assert!(matches!(chain.read(foreign), Err(MapError::Access { .. })));
}
