//! Procedural macros for the morph mapping engine.
//!
//! Provides `#[derive(Reflect)]`, which describes a struct or fieldless enum
//! to the engine's type reflection facade.

use proc_macro::TokenStream;

/// Reflect derive macro implementation.
mod reflect;

/// Derives `morph_core::Reflect`.
///
/// Structs must have named fields. Enums must be fieldless and implement
/// `Clone`, since enum values are copied between members by value. Generic
/// types are not supported.
///
/// Container attributes:
/// * `#[reflect(default)]` - construct new instances through `Default`
///
/// Field attributes:
/// * `#[reflect(readonly)]` - never written by a mapping
/// * `#[reflect(writeonly)]` - never read as a mapping source
/// * `#[reflect(skip)]` - invisible to the mapper
/// * `#[reflect(rename = "name")]` - member name used for matching and paths
///
/// ```ignore
/// #[derive(Default, Reflect)]
/// #[reflect(default)]
/// pub struct Customer {
///     pub id: i64,
///     #[reflect(readonly)]
///     pub created: String,
/// }
/// ```
#[proc_macro_derive(Reflect, attributes(reflect))]
pub fn derive_reflect(input: TokenStream) -> TokenStream {
	reflect::derive_reflect(input)
}
