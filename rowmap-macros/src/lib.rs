mod decode_field;
mod decode_join;

use decode_field::{FieldMetadata, decode_field};
use decode_join::{JoinPartMetadata, decode_join_part};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Error, Fields, ItemStruct, Result, parse_macro_input, spanned::Spanned};

/// Implements `FieldAccess`, `Record` and `Target` for a struct whose fields
/// are tagged with `#[rowmap(column = "name")]`.
#[proc_macro_derive(Record, attributes(rowmap))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let item = parse_macro_input!(input as ItemStruct);
    record(&item)
        .unwrap_or_else(Error::into_compile_error)
        .into()
}

/// Implements `Joined` and `Target` for a struct of records, each field
/// tagged with the alias of its table: `#[rowmap(table = "u")]`.
#[proc_macro_derive(Joined, attributes(rowmap))]
pub fn derive_joined(input: TokenStream) -> TokenStream {
    let item = parse_macro_input!(input as ItemStruct);
    joined(&item)
        .unwrap_or_else(Error::into_compile_error)
        .into()
}

fn record(item: &ItemStruct) -> Result<TokenStream2> {
    let Fields::Named(fields) = &item.fields else {
        return Err(Error::new(
            item.span(),
            "Record can only be derived for structs with named fields",
        ));
    };
    let fields: Vec<FieldMetadata> = fields
        .named
        .iter()
        .map(decode_field)
        .filter_map(Result::transpose)
        .collect::<Result<_>>()?;
    let name = &item.ident;
    let (impl_generics, ty_generics, where_clause) = item.generics.split_for_impl();
    let field_defs = fields.iter().map(|f| {
        let field = f.ident.to_string();
        let column = &f.column;
        let nullable = f.nullable;
        let json = f.json;
        let public = f.public;
        quote! {
            ::rowmap::FieldDef {
                field: #field,
                column: #column,
                nullable: #nullable,
                json: #json,
                public: #public,
            }
        }
    });
    let field_values = fields.iter().map(|f| {
        let ident = &f.ident;
        if f.json {
            quote!(::rowmap::encode_json(&self.#ident)?)
        } else {
            quote!(::rowmap::AsValue::as_value(::std::clone::Clone::clone(&self.#ident)))
        }
    });
    let set_field = fields.iter().enumerate().map(|(i, f)| {
        let ident = &f.ident;
        let ty = &f.ty;
        if f.json {
            quote!(#i => ::rowmap::decode_json(&mut self.#ident, value)?)
        } else {
            quote!(#i => self.#ident = <#ty as ::rowmap::AsValue>::try_from_value(value)?)
        }
    });
    Ok(quote! {
        impl #impl_generics ::rowmap::FieldAccess for #name #ty_generics #where_clause {
            fn field_values(&self) -> ::rowmap::Result<::std::vec::Vec<::rowmap::Value>> {
                Ok(::std::vec![#(#field_values),*])
            }

            fn set_field(&mut self, index: usize, value: ::rowmap::Value) -> ::rowmap::Result<()> {
                match index {
                    #(#set_field,)*
                    _ => {
                        return Err(::rowmap::Error::msg(::std::format!(
                            "`{}` has no mapped field at index {}",
                            ::std::any::type_name::<Self>(),
                            index
                        )));
                    }
                }
                Ok(())
            }
        }

        impl #impl_generics ::rowmap::Record for #name #ty_generics #where_clause {
            fn field_defs() -> &'static [::rowmap::FieldDef] {
                const FIELDS: &[::rowmap::FieldDef] = &[#(#field_defs),*];
                FIELDS
            }
        }

        impl #impl_generics ::rowmap::Target for #name #ty_generics #where_clause {
            fn layout() -> ::rowmap::Result<::rowmap::Layout> {
                ::rowmap::Layout::of_record::<Self>()
            }

            fn part_mut(&mut self, index: usize) -> Option<&mut dyn ::rowmap::FieldAccess> {
                (index == 0).then_some(self as &mut dyn ::rowmap::FieldAccess)
            }
        }
    })
}

fn joined(item: &ItemStruct) -> Result<TokenStream2> {
    let Fields::Named(fields) = &item.fields else {
        return Err(Error::new(
            item.span(),
            "Joined can only be derived for structs with named fields, each one tagged with `#[rowmap(table = \"alias\")]`",
        ));
    };
    if !item.generics.params.is_empty() {
        return Err(Error::new(
            item.generics.span(),
            "Joined cannot be derived for generic structs",
        ));
    }
    let parts: Vec<JoinPartMetadata> = fields
        .named
        .iter()
        .map(decode_join_part)
        .collect::<Result<_>>()?;
    let name = &item.ident;
    let join_parts = parts.iter().map(|p| {
        let field = p.ident.to_string();
        let alias = &p.alias;
        let ty = &p.ty;
        quote! {
            ::rowmap::JoinPart {
                field: #field,
                alias: #alias,
                metadata: ::rowmap::RecordMeta::of::<#ty>,
            }
        }
    });
    let part_mut = parts.iter().enumerate().map(|(i, p)| {
        let ident = &p.ident;
        quote!(#i => Some(&mut self.#ident))
    });
    Ok(quote! {
        impl ::rowmap::Joined for #name {
            fn join_parts() -> &'static [::rowmap::JoinPart] {
                const PARTS: &[::rowmap::JoinPart] = &[#(#join_parts),*];
                PARTS
            }
        }

        impl ::rowmap::Target for #name {
            fn layout() -> ::rowmap::Result<::rowmap::Layout> {
                ::rowmap::Layout::of_joined::<Self>()
            }

            fn part_mut(&mut self, index: usize) -> Option<&mut dyn ::rowmap::FieldAccess> {
                match index {
                    #(#part_mut,)*
                    _ => None,
                }
            }
        }
    })
}
