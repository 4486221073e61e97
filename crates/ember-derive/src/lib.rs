//! Derive macro for declaring tables.
//!
//! `#[derive(Table)]` turns a struct into an `ember_core::Table`
//! implementation whose `definition()` describes one column per field.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse_macro_input, Attribute, Data, DeriveInput, Expr, Fields, GenericArgument, Ident, Lit,
    Meta, PathArguments, Type,
};

/// Derives `ember_core::Table` for a struct with named fields.
///
/// # Attributes
///
/// - `#[table(name = "table_name")]` - SQL table name (optional, defaults to
///   the `snake_case` struct name)
///
/// # Field Attributes
///
/// - `#[column(primary_key)]` - part of the primary key, in field order
/// - `#[column(name = "column_name")]` - SQL column name (defaults to the
///   field name)
/// - `#[column(nullable)]` - allow NULL even for a non-`Option` field
/// - `#[column(default = "expr")]` - raw SQL default literal
/// - `#[column(affinity = "integer" | "real" | "text" | "blob")]` - override
///   the affinity inferred from the field type
///
/// Integers and `bool` map to `INTEGER`, floats to `REAL`, `String`/`char`
/// to `TEXT` and `Vec<u8>` to `BLOB`. `Option<T>` fields are nullable,
/// every other field is NOT NULL. Key fields follow the same rule, so an
/// `Option<i64>` key declares a plain `INTEGER PRIMARY KEY`.
#[proc_macro_derive(Table, attributes(table, column))]
pub fn derive_table(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_table_impl(&input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn derive_table_impl(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let table_name = get_table_name(&input.attrs, struct_name)?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Table derive only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Table derive only supports structs",
            ));
        }
    };

    let mut columns = Vec::new();
    for field in fields {
        let Some(field_name) = field.ident.as_ref() else {
            continue;
        };
        let attrs = parse_column_attrs(&field.attrs)?;
        let (inner_type, is_option) = unwrap_option(&field.ty);

        let affinity = match attrs.affinity {
            Some(affinity) => affinity,
            None => infer_affinity(inner_type).ok_or_else(|| {
                syn::Error::new_spanned(
                    &field.ty,
                    "cannot infer a column affinity for this type; \
                     add #[column(affinity = \"...\")]",
                )
            })?,
        };

        columns.push(ColumnInfo {
            column_name: attrs.name.unwrap_or_else(|| field_name.to_string()),
            affinity,
            not_null: !(is_option || attrs.nullable),
            primary_key: attrs.primary_key,
            default_expr: attrs.default_expr,
        });
    }

    let column_exprs: Vec<TokenStream2> = columns.iter().map(ColumnInfo::to_tokens).collect();

    let expanded = quote! {
        impl ::ember_core::schema::Table for #struct_name {
            const NAME: &'static str = #table_name;

            fn definition() -> ::ember_core::schema::TableDefinition {
                ::ember_core::schema::TableDefinition::new(#table_name)
                    #(.column(#column_exprs))*
            }
        }
    };

    Ok(expanded)
}

#[derive(Clone, Copy)]
enum Affinity {
    Integer,
    Real,
    Text,
    Blob,
}

impl Affinity {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "integer" => Some(Self::Integer),
            "real" => Some(Self::Real),
            "text" => Some(Self::Text),
            "blob" => Some(Self::Blob),
            _ => None,
        }
    }

    fn variant(self) -> TokenStream2 {
        match self {
            Self::Integer => quote!(::ember_core::schema::SqlAffinity::Integer),
            Self::Real => quote!(::ember_core::schema::SqlAffinity::Real),
            Self::Text => quote!(::ember_core::schema::SqlAffinity::Text),
            Self::Blob => quote!(::ember_core::schema::SqlAffinity::Blob),
        }
    }
}

struct ColumnInfo {
    column_name: String,
    affinity: Affinity,
    not_null: bool,
    primary_key: bool,
    default_expr: Option<String>,
}

impl ColumnInfo {
    fn to_tokens(&self) -> TokenStream2 {
        let name = &self.column_name;
        let affinity = self.affinity.variant();
        let mut expr = quote! {
            ::ember_core::schema::ColumnDescriptor::new(#name, #affinity)
        };
        if self.primary_key {
            expr = quote!(#expr.primary_key());
        }
        if self.not_null {
            expr = quote!(#expr.not_null());
        }
        if let Some(default) = &self.default_expr {
            expr = quote!(#expr.default(#default));
        }
        expr
    }
}

#[derive(Default)]
struct ColumnAttrs {
    name: Option<String>,
    primary_key: bool,
    nullable: bool,
    affinity: Option<Affinity>,
    default_expr: Option<String>,
}

fn string_value(meta: &syn::meta::ParseNestedMeta<'_>) -> syn::Result<Option<String>> {
    let value: Expr = meta.value()?.parse()?;
    if let Expr::Lit(lit) = value {
        if let Lit::Str(s) = lit.lit {
            return Ok(Some(s.value()));
        }
    }
    Ok(None)
}

fn get_table_name(attrs: &[Attribute], struct_name: &Ident) -> syn::Result<String> {
    for attr in attrs {
        if attr.path().is_ident("table") {
            let mut table_name = None;
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    table_name = string_value(&meta)?;
                }
                Ok(())
            })?;
            if let Some(name) = table_name {
                return Ok(name);
            }
        }
    }
    Ok(to_snake_case(&struct_name.to_string()))
}

fn parse_column_attrs(attrs: &[Attribute]) -> syn::Result<ColumnAttrs> {
    let mut result = ColumnAttrs::default();

    for attr in attrs {
        if !attr.path().is_ident("column") || matches!(attr.meta, Meta::Path(_)) {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("primary_key") {
                result.primary_key = true;
            } else if meta.path.is_ident("nullable") {
                result.nullable = true;
            } else if meta.path.is_ident("name") {
                result.name = string_value(&meta)?;
            } else if meta.path.is_ident("default") {
                result.default_expr = string_value(&meta)?;
            } else if meta.path.is_ident("affinity") {
                let value = string_value(&meta)?.unwrap_or_default();
                result.affinity = Some(Affinity::parse(&value).ok_or_else(|| {
                    meta.error("affinity must be one of \"integer\", \"real\", \"text\", \"blob\"")
                })?);
            } else {
                return Err(meta.error("unknown column attribute"));
            }
            Ok(())
        })?;
    }

    Ok(result)
}

/// Returns the inner type of `Option<T>` and whether it was an option.
fn unwrap_option(ty: &Type) -> (&Type, bool) {
    if let Some((ident, Some(inner))) = last_segment(ty) {
        if ident == "Option" {
            return (inner, true);
        }
    }
    (ty, false)
}

/// Returns the last path segment of `ty` and its first generic type argument.
fn last_segment(ty: &Type) -> Option<(&Ident, Option<&Type>)> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    let argument = match &segment.arguments {
        PathArguments::AngleBracketed(args) => args.args.iter().find_map(|arg| match arg {
            GenericArgument::Type(ty) => Some(ty),
            _ => None,
        }),
        _ => None,
    };
    Some((&segment.ident, argument))
}

fn infer_affinity(ty: &Type) -> Option<Affinity> {
    if let Type::Reference(reference) = ty {
        return infer_affinity(&reference.elem);
    }
    let (ident, argument) = last_segment(ty)?;
    let name = ident.to_string();
    match name.as_str() {
        "i8" | "i16" | "i32" | "i64" | "isize" | "u8" | "u16" | "u32" | "u64" | "usize"
        | "bool" => Some(Affinity::Integer),
        "f32" | "f64" => Some(Affinity::Real),
        "String" | "str" | "char" => Some(Affinity::Text),
        "Vec" => match argument.and_then(last_segment) {
            Some((inner, _)) if inner == "u8" => Some(Affinity::Blob),
            _ => None,
        },
        _ => None,
    }
}

fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.push(c.to_ascii_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}
