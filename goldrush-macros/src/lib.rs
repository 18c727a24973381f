extern crate proc_macro;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, parse_macro_input, spanned::Spanned};

/// Implements [`std::fmt::Display`] for an enum, printing the variant name
/// followed by the debug form of its fields.
#[proc_macro_derive(EnumToString)]
pub fn derive_enum_to_string(item: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(item as syn::DeriveInput);

    let enum_identifier = &input.ident;

    let mut match_impl = TokenStream2::new();
    match &input.data {
        Data::Enum(syn::DataEnum { variants, .. }) => {
            if variants.is_empty() {
                return syn::Error::new(input.span(), "EnumToString requires at least one variant")
                    .to_compile_error()
                    .into();
            }
            for variant in variants {
                let id = &variant.ident;
                let id_str = id.to_string();

                match &variant.fields {
                    syn::Fields::Named(fields) => {
                        let field_names: Vec<_> = fields
                            .named
                            .iter()
                            .filter_map(|f| f.ident.as_ref())
                            .collect();

                        if field_names.is_empty() {
                            match_impl.extend(quote! {
                                #enum_identifier::#id { .. } => #id_str.to_string(),
                            });
                        } else {
                            let debug_format = field_names
                                .iter()
                                .map(|fname| format!("{}: {{:?}}", fname))
                                .collect::<Vec<_>>()
                                .join(", ");
                            let format_str = format!("{} {{{{ {} }}}}", id_str, debug_format);

                            match_impl.extend(quote! {
                                #enum_identifier::#id { #(#field_names),* } => {
                                    format!(#format_str, #(#field_names),*)
                                },
                            });
                        }
                    }
                    syn::Fields::Unnamed(fields) => {
                        let field_count = fields.unnamed.len();

                        if field_count == 1 {
                            match_impl.extend(quote! {
                                #enum_identifier::#id(inner) => {
                                    format!("{}({:?})", #id_str, inner)
                                },
                            });
                        } else {
                            let field_indices: Vec<_> = (0..field_count)
                                .map(|i| {
                                    syn::Ident::new(
                                        &format!("field{}", i),
                                        proc_macro2::Span::call_site(),
                                    )
                                })
                                .collect();
                            let debug_placeholders = vec!["{:?}"; field_count].join(", ");
                            let format_str = format!("{}({})", id_str, debug_placeholders);

                            match_impl.extend(quote! {
                                #enum_identifier::#id(#(#field_indices),*) => {
                                    format!(#format_str, #(#field_indices),*)
                                },
                            });
                        }
                    }
                    syn::Fields::Unit => {
                        match_impl.extend(quote! {
                            #enum_identifier::#id => #id_str.to_string(),
                        });
                    }
                }
            }
        }
        Data::Struct(_) => {
            return syn::Error::new(
                input.span(),
                "EnumToString can only be derived for enums, not structs",
            )
            .to_compile_error()
            .into();
        }
        Data::Union(_) => {
            return syn::Error::new(
                input.span(),
                "EnumToString can only be derived for enums, not unions",
            )
            .to_compile_error()
            .into();
        }
    }

    quote! {
        #[automatically_derived]
        impl std::fmt::Display for #enum_identifier {
            #[allow(unreachable_patterns)]
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", match self {
                        #match_impl
                    })
            }
        }
    }
    .into()
}

enum ConfigDerivesType {
    Struct,
    Enum,
    None,
}

/// Attribute macro that applies the common derives of configuration types.
///
/// Structs get `#[serde(default)]`, enums get a `type` tag and
/// [`EnumToString`]. Both reject unknown fields.
///
/// Options: `tag_content` (adjacently tagged enum), `skip_unknown_fields`.
#[proc_macro_attribute]
pub fn config_derives(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);

    let attr_str = attr.to_string();

    let mut tagged_derive = quote! { #[serde(tag = "type")] };
    let mut unknown_fields_derive = quote! {
        #[serde(deny_unknown_fields)]
    };
    for attribute in attr_str.split(',') {
        let trimmed = attribute.trim();
        match trimmed {
            "tag_content" => {
                tagged_derive = quote! {  #[serde(tag = "type", content = "config")] };
            }
            "skip_unknown_fields" => {
                unknown_fields_derive = quote! {};
            }
            "" => {}
            _ => {
                return syn::Error::new(
                    input.span(),
                    format!("Unknown attribute '{}' for config_derives", trimmed),
                )
                .to_compile_error()
                .into();
            }
        }
    }

    let struct_or_enum = match &input.data {
        Data::Struct(_) => ConfigDerivesType::Struct,
        Data::Enum(_) => ConfigDerivesType::Enum,
        _ => ConfigDerivesType::None,
    };

    let type_only_attrs = match struct_or_enum {
        ConfigDerivesType::Struct => quote! {
            #[serde(default)]
        },
        ConfigDerivesType::Enum => quote! {
            #[derive(goldrush_macros::EnumToString)]
            #tagged_derive
        },
        ConfigDerivesType::None => quote! {},
    };

    let output = quote! {
        #[derive(
            serde::Serialize,
            serde::Deserialize,
            Debug,
            Clone,
            PartialEq,
        )]
        #unknown_fields_derive
        #type_only_attrs
        #input
    };

    output.into()
}
