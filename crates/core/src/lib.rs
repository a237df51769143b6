//! Object-to-object mapping engine.
//!
//! Types describe themselves through [`Reflect`] (usually derived). A
//! [`ResourceMapper`] collects one-way maps, converters and requirements,
//! then [`ResourceMapper::initialize`] automaps every registered pair by
//! member name, resolves every transitively required pair and compiles the
//! conversions. After that, mapping is lock-free and thread-safe.
//!
//! ```ignore
//! use morph_core::{Reflect, ResourceMapper};
//!
//! #[derive(Default, Reflect)]
//! #[reflect(default)]
//! struct Person { name: String, age: i32 }
//!
//! #[derive(Default, Reflect)]
//! #[reflect(default)]
//! struct PersonDto { name: String, age: i32 }
//!
//! let mut mapper = ResourceMapper::new();
//! mapper.register_one_way::<Person, PersonDto>()?;
//! mapper.initialize()?;
//! let dto: PersonDto = mapper.map(&Person { name: "Ada".into(), age: 36 }, &())?;
//! ```

extern crate self as morph_core;

mod builder;
pub mod config;
pub mod consume;
pub mod convention;
mod converters;
pub mod diagnostics;
pub mod error;
pub mod maps;
pub mod plan;
pub mod priority;
pub mod registry;
pub mod resolve;
pub mod types;

pub use config::{ConfigError, MapperConfig};
pub use consume::{Automap, DefaultMemberConsumer, MemberConsumer};
pub use convention::{Bidirectional, OneWayMap, TwoWayMap};
pub use error::{MapError, MissingMap, Result};
pub use maps::{ConvertFn, MapInit, MapLookup, TypeMap};
pub use morph_macros::Reflect;
pub use plan::{BindingKind, BindingOrigin, MappingPlan, MemberEntry, Remap};
pub use priority::{EntryType, Priority, PriorityList};
pub use registry::{Requirement, ResourceMapper, TypePair};
pub use resolve::{IgnoreCaseNameMatcher, MemberResolver, PlanScope};
pub use types::{Constructors, MemberInfo, Reflect, Shape, TypeInfo, TypeKey, Value};
