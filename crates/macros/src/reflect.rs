//! Reflect derive macro implementation.
//!
//! Emits a `morph_core::Reflect` impl whose member table holds one pair of
//! plain `fn` accessors per field, so the table stays `Copy` and needs no
//! allocation beyond the member list itself.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{quote, quote_spanned};
use syn::ext::IdentExt;
use syn::{Attribute, Data, DataEnum, DeriveInput, Fields, LitStr, parse_macro_input};

/// Entry point for the `#[derive(Reflect)]` macro.
pub fn derive_reflect(input: TokenStream) -> TokenStream {
	let input = parse_macro_input!(input as DeriveInput);
	match expand(&input) {
		Ok(tokens) => tokens.into(),
		Err(e) => e.to_compile_error().into(),
	}
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
	if !input.generics.params.is_empty() {
		return Err(syn::Error::new_spanned(
			&input.generics,
			"Reflect cannot be derived for generic types",
		));
	}

	match &input.data {
		Data::Struct(data) => expand_struct(input, &data.fields),
		Data::Enum(data) => expand_enum(input, data),
		Data::Union(_) => Err(syn::Error::new_spanned(
			&input.ident,
			"Reflect cannot be derived for unions",
		)),
	}
}

#[derive(Default)]
struct MemberAttrs {
	default: bool,
	readonly: bool,
	writeonly: bool,
	skip: bool,
	rename: Option<String>,
}

/// Parses every `#[reflect(...)]` attribute, accepting only the keys in `allowed`.
fn parse_attrs(attrs: &[Attribute], allowed: &[&str]) -> syn::Result<MemberAttrs> {
	let mut parsed = MemberAttrs::default();
	for attr in attrs.iter().filter(|a| a.path().is_ident("reflect")) {
		attr.parse_nested_meta(|meta| {
			let key = meta
				.path
				.get_ident()
				.map(|i| i.to_string())
				.unwrap_or_default();
			if !allowed.contains(&key.as_str()) {
				return Err(meta.error(format!(
					"unsupported reflect attribute, expected one of: {}",
					allowed.join(", ")
				)));
			}
			match key.as_str() {
				"default" => parsed.default = true,
				"readonly" => parsed.readonly = true,
				"writeonly" => parsed.writeonly = true,
				"skip" => parsed.skip = true,
				"rename" => {
					let value: LitStr = meta.value()?.parse()?;
					parsed.rename = Some(value.value());
				}
				_ => return Err(meta.error("unknown reflect attribute")),
			}
			Ok(())
		})?;
	}
	Ok(parsed)
}

fn expand_struct(input: &DeriveInput, fields: &Fields) -> syn::Result<TokenStream2> {
	let ident = &input.ident;
	let Fields::Named(named) = fields else {
		return Err(syn::Error::new_spanned(
			ident,
			"Reflect requires a struct with named fields",
		));
	};

	let container = parse_attrs(&input.attrs, &["default"])?;

	let mut members = Vec::new();
	for field in &named.named {
		let attrs = parse_attrs(&field.attrs, &["readonly", "writeonly", "skip", "rename"])?;
		if attrs.skip {
			continue;
		}
		if attrs.readonly && attrs.writeonly {
			return Err(syn::Error::new_spanned(
				field,
				"a member cannot be both readonly and writeonly",
			));
		}
		let Some(field_ident) = &field.ident else {
			continue;
		};

		let name = attrs
			.rename
			.unwrap_or_else(|| field_ident.unraw().to_string());
		let ty = &field.ty;
		let read_only = attrs.readonly.then(|| quote!(.read_only()));
		let write_only = attrs.writeonly.then(|| quote!(.write_only()));

		members.push(quote! {
			{
				fn get(owner: &dyn ::core::any::Any) -> ::core::option::Option<&dyn ::core::any::Any> {
					owner
						.downcast_ref::<#ident>()
						.map(|owner| &owner.#field_ident as &dyn ::core::any::Any)
				}
				fn get_mut(owner: &mut dyn ::core::any::Any) -> ::core::option::Option<&mut dyn ::core::any::Any> {
					owner
						.downcast_mut::<#ident>()
						.map(|owner| &mut owner.#field_ident as &mut dyn ::core::any::Any)
				}
				::morph_core::MemberInfo::new::<#ty>(#name, get, get_mut) #read_only #write_only
			}
		});
	}

	let (construct_fn, construct) = if container.default {
		(
			quote! {
				fn construct() -> ::morph_core::Value {
					::std::boxed::Box::new(<#ident as ::core::default::Default>::default())
				}
			},
			quote!(::core::option::Option::Some(construct as fn() -> ::morph_core::Value)),
		)
	} else {
		(quote!(), quote!(::core::option::Option::None))
	};

	Ok(quote! {
		impl ::morph_core::Reflect for #ident {
			fn type_info() -> ::morph_core::TypeInfo {
				fn members() -> ::std::vec::Vec<::morph_core::MemberInfo> {
					::std::vec![#(#members),*]
				}
				#construct_fn
				::morph_core::TypeInfo::object::<#ident>(members, #construct)
			}
		}
	})
}

fn expand_enum(input: &DeriveInput, data: &DataEnum) -> syn::Result<TokenStream2> {
	let ident = &input.ident;
	if data.variants.is_empty() {
		return Err(syn::Error::new_spanned(
			ident,
			"Reflect cannot be derived for enums without variants",
		));
	}
	parse_attrs(&input.attrs, &[])?;

	let mut variants = Vec::new();
	let mut names = Vec::new();
	let mut zero = None;
	for variant in &data.variants {
		if !matches!(variant.fields, Fields::Unit) {
			return Err(syn::Error::new_spanned(
				variant,
				"Reflect can only be derived for fieldless enums",
			));
		}
		let attrs = parse_attrs(&variant.attrs, &["rename"])?;
		if zero.is_none() && variant.attrs.iter().any(|a| a.path().is_ident("default")) {
			zero = Some(&variant.ident);
		}
		names.push(attrs.rename.unwrap_or_else(|| variant.ident.unraw().to_string()));
		variants.push(&variant.ident);
	}
	let zero = zero.unwrap_or(variants[0]);
	let requires_clone = quote_spanned! {ident.span()=>
		const _: fn() = || {
			fn requires_clone<T: ::core::clone::Clone>() {}
			requires_clone::<#ident>();
		};
	};

	Ok(quote! {
		#requires_clone

		impl ::morph_core::Reflect for #ident {
			fn type_info() -> ::morph_core::TypeInfo {
				fn name_of(value: &dyn ::core::any::Any) -> ::core::option::Option<&'static str> {
					match value.downcast_ref::<#ident>()? {
						#(#ident::#variants => ::core::option::Option::Some(#names),)*
					}
				}
				fn from_name(name: &str) -> ::core::option::Option<::morph_core::Value> {
					match name {
						#(#names => ::core::option::Option::Some(::std::boxed::Box::new(#ident::#variants) as ::morph_core::Value),)*
						_ => ::core::option::Option::None,
					}
				}
				fn zero() -> ::morph_core::Value {
					::std::boxed::Box::new(#ident::#zero)
				}
				::morph_core::TypeInfo::enumeration::<#ident>(&[#(#names),*], name_of, from_name, zero)
			}
		}
	})
}
