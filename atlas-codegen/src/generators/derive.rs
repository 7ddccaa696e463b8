//! Implementation of the `#[derive(Model)]` macro.

use proc_macro2::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Expr, Fields, Ident, LitStr, Path, Type, parse_quote};

/// Parse and generate code for the `#[derive(Model)]` macro.
pub fn derive_model_impl(input: &DeriveInput) -> Result<TokenStream, syn::Error> {
    let name = &input.ident;
    let model_name = name.unraw().to_string();

    // Extract struct fields
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Model derive only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Model derive only supports structs",
            ));
        }
    };

    // Parse struct-level attributes
    let struct_attrs = parse_struct_attrs(input)?;
    let krate = struct_attrs
        .crate_path
        .unwrap_or_else(|| parse_quote!(::atlas_orm));

    // Parse field attributes
    let field_infos: Vec<FieldInfo> = fields.iter().map(parse_field).collect::<Result<_, _>>()?;

    let persisted: Vec<&FieldInfo> = field_infos.iter().filter(|f| !f.skip).collect();
    if persisted.is_empty() {
        return Err(syn::Error::new_spanned(
            input,
            "Model must have at least one persisted field",
        ));
    }

    let table_fn = struct_attrs.table_name.map(|table| {
        quote! {
            fn table_name() -> ::std::string::String {
                ::std::string::String::from(#table)
            }
        }
    });

    let field_defs: Vec<_> = persisted
        .iter()
        .map(|f| generate_field_def(f, &krate))
        .collect();

    let value_entries: Vec<_> = persisted
        .iter()
        .map(|f| {
            let ident = &f.name;
            let logical = &f.logical_name;
            quote! { (#logical, #krate::SqlType::to_value(&self.#ident)) }
        })
        .collect();

    let row_entries: Vec<_> = field_infos
        .iter()
        .map(|f| {
            let ident = &f.name;
            let ty = &f.ty;
            if f.skip {
                quote! { #ident: ::core::default::Default::default() }
            } else {
                let column = f.row_column();
                quote! { #ident: row.get_or_default::<#ty>(#column)? }
            }
        })
        .collect();

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics #krate::Model for #name #ty_generics #where_clause {
            const NAME: &'static str = #model_name;

            #table_fn

            fn fields() -> ::std::vec::Vec<#krate::FieldDef> {
                ::std::vec![#(#field_defs),*]
            }

            fn values(&self) -> ::std::vec::Vec<(&'static str, #krate::Value)> {
                ::std::vec![#(#value_entries),*]
            }
        }

        impl #impl_generics #krate::FromRow for #name #ty_generics #where_clause {
            fn from_row(row: &#krate::Row) -> #krate::SchemaResult<Self> {
                ::core::result::Result::Ok(Self {
                    #(#row_entries,)*
                })
            }
        }
    })
}

/// Struct-level attributes parsed from `#[atlas(...)]`.
#[derive(Default)]
struct StructAttrs {
    table_name: Option<String>,
    crate_path: Option<Path>,
}

/// Parse struct-level `#[atlas(...)]` attributes.
fn parse_struct_attrs(input: &DeriveInput) -> Result<StructAttrs, syn::Error> {
    let mut attrs = StructAttrs::default();

    for attr in &input.attrs {
        if !attr.path().is_ident("atlas") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                let value: LitStr = meta.value()?.parse()?;
                attrs.table_name = Some(value.value());
            } else if meta.path.is_ident("crate") {
                let value: LitStr = meta.value()?.parse()?;
                attrs.crate_path = Some(value.parse()?);
            } else {
                return Err(meta.error("unknown atlas model attribute"));
            }
            Ok(())
        })?;
    }

    Ok(attrs)
}

/// Information about a field.
struct FieldInfo {
    name: Ident,
    logical_name: String,
    ty: Type,
    column_name: Option<String>,
    type_override: Option<String>,
    is_primary_key: bool,
    is_auto_increment: bool,
    is_not_null: bool,
    is_unique: bool,
    has_default: bool,
    default_value: Option<Expr>,
    skip: bool,
}

impl FieldInfo {
    /// The column this field is read back from.
    fn row_column(&self) -> String {
        self.column_name
            .clone()
            .unwrap_or_else(|| snake_case(&self.logical_name))
    }
}

/// Parse a field and its `#[atlas(...)]` attributes.
fn parse_field(field: &syn::Field) -> Result<FieldInfo, syn::Error> {
    let name = field
        .ident
        .clone()
        .ok_or_else(|| syn::Error::new_spanned(field, "Fields must be named"))?;

    let mut info = FieldInfo {
        logical_name: name.unraw().to_string(),
        name,
        ty: field.ty.clone(),
        column_name: None,
        type_override: None,
        is_primary_key: false,
        is_auto_increment: false,
        is_not_null: false,
        is_unique: false,
        has_default: false,
        default_value: None,
        skip: false,
    };

    for attr in &field.attrs {
        if !attr.path().is_ident("atlas") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("primary_key") || meta.path.is_ident("primarykey") {
                info.is_primary_key = true;
            } else if meta.path.is_ident("auto_increment") || meta.path.is_ident("autoincrement") {
                info.is_auto_increment = true;
            } else if meta.path.is_ident("not_null") {
                info.is_not_null = true;
            } else if meta.path.is_ident("unique") {
                info.is_unique = true;
            } else if meta.path.is_ident("skip") {
                info.skip = true;
            } else if meta.path.is_ident("default") {
                info.has_default = true;
                if meta.input.peek(syn::Token![=]) {
                    info.default_value = Some(meta.value()?.parse()?);
                }
            } else if meta.path.is_ident("column") {
                let value: LitStr = meta.value()?.parse()?;
                info.column_name = Some(value.value());
            } else if meta.path.is_ident("type") {
                let value: LitStr = meta.value()?.parse()?;
                info.type_override = Some(value.value());
            } else {
                return Err(meta.error("unknown atlas field attribute"));
            }
            Ok(())
        })?;
    }

    if info.skip && (info.is_primary_key || info.column_name.is_some()) {
        return Err(syn::Error::new_spanned(
            field,
            "a skipped field cannot carry column attributes",
        ));
    }

    Ok(info)
}

/// Generate the `FieldDef` expression for one field.
fn generate_field_def(field: &FieldInfo, krate: &Path) -> TokenStream {
    let logical = &field.logical_name;
    let ty = &field.ty;

    let mut def = quote! {
        #krate::FieldDef::new(#logical, <#ty as #krate::SqlType>::data_type())
    };

    if let Some(column) = &field.column_name {
        def = quote! { #def.column(#column) };
    }
    if let Some(type_name) = &field.type_override {
        def = quote! { #def.type_override(#type_name) };
    }
    if field.is_primary_key {
        def = quote! { #def.primary_key() };
    }
    if field.is_auto_increment {
        def = quote! { #def.auto_increment() };
    }
    if field.is_not_null {
        def = quote! { #def.not_null() };
    }
    if field.is_unique {
        def = quote! { #def.unique() };
    }
    match (&field.default_value, field.has_default) {
        (Some(value), _) => def = quote! { #def.default_value(#value) },
        (None, true) => def = quote! { #def.has_default() },
        (None, false) => {}
    }

    def
}

/// Same folding as the runtime schema uses for column names.
fn snake_case(name: &str) -> String {
    use convert_case::{Case, Casing};
    name.to_case(Case::Snake)
}
