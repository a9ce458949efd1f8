use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{
    Data, DeriveInput, Error, Field, Fields, FieldsNamed, LitStr, Result, Type, parse_macro_input,
    punctuated::Punctuated, token::Comma,
};

/// Derive macro that generates a `Default` implementation for configuration
/// structs whose defaults are declared inline.
///
/// `String` fields accept string literals directly. Every other field takes
/// its expression as written and relies on type inference.
///
/// # Example
/// ```
/// use orbitsim_macros::ConfigDefaults;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(ConfigDefaults, Serialize, Deserialize)]
/// #[serde(default)]
/// pub struct TimeConfig {
///     #[default(0.0)]
///     pub start: f64,
///
///     #[default(2.0 * std::f64::consts::PI)]
///     pub end: f64,
///
///     #[default(None)]
///     pub output_interval: Option<f64>,
///
///     #[default("output")]
///     pub directory: String,
/// }
///
/// let config = TimeConfig::default();
/// assert_eq!(config.start, 0.0);
/// assert_eq!(config.output_interval, None);
/// assert_eq!(config.directory, "output");
/// ```
///
/// # Errors
///
/// Compilation fails when the input is not a struct with named fields, when a
/// field has no `#[default(...)]` attribute, or when that attribute is empty.
#[proc_macro_derive(ConfigDefaults, attributes(default))]
pub fn config_defaults(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match generate_default_impl(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Derive macro that describes a flat output record: its column names and
/// the numeric values of one row.
///
/// Generates two inherent items:
/// - `COLUMNS: &'static [&'static str]`, the header in field order
/// - `fn row(&self) -> Vec<f64>`, the values in the same order
///
/// Field attributes:
/// - `#[record(rename = "E_tot")]` sets the column name (defaults to the field name)
/// - `#[record(vector = "pos")]` expands a 3-vector field into `pos_x`, `pos_y`, `pos_z`
/// - `#[record(skip)]` leaves the field out of the record
///
/// Scalar fields are converted with `as f64`, so any primitive numeric type works.
///
/// # Example
/// ```
/// use orbitsim_macros::Record;
///
/// struct Vec3 { x: f64, y: f64, z: f64 }
///
/// #[derive(Record)]
/// struct Sample {
///     time: f64,
///     #[record(vector = "pos")]
///     position: Vec3,
///     #[record(rename = "E_tot")]
///     energy: f64,
///     #[record(skip)]
///     #[allow(dead_code)]
///     label: &'static str,
/// }
///
/// assert_eq!(Sample::COLUMNS, &["time", "pos_x", "pos_y", "pos_z", "E_tot"]);
///
/// let sample = Sample {
///     time: 0.5,
///     position: Vec3 { x: 1.0, y: 2.0, z: 3.0 },
///     energy: -0.5,
///     label: "ignored",
/// };
/// assert_eq!(sample.row(), vec![0.5, 1.0, 2.0, 3.0, -0.5]);
/// ```
#[proc_macro_derive(Record, attributes(record))]
pub fn record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match generate_record_impl(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Both derives only make sense on structs with named fields
fn named_fields<'a>(input: &'a DeriveInput, derive: &str) -> Result<&'a FieldsNamed> {
    match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => Ok(fields),
            Fields::Unnamed(_) => Err(Error::new_spanned(
                input,
                format!("{derive} only supports structs with named fields"),
            )),
            Fields::Unit => Err(Error::new_spanned(
                input,
                format!("{derive} cannot be derived for unit structs"),
            )),
        },
        Data::Enum(_) => Err(Error::new_spanned(
            input,
            format!("{derive} can only be derived for structs, not enums"),
        )),
        Data::Union(_) => Err(Error::new_spanned(
            input,
            format!("{derive} can only be derived for structs, not unions"),
        )),
    }
}

fn field_label(field: &Field) -> String {
    field
        .ident
        .as_ref()
        .map(|ident| ident.to_string())
        .unwrap_or_else(|| "unnamed field".to_string())
}

fn generate_default_impl(input: DeriveInput) -> Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let fields = named_fields(&input, "ConfigDefaults")?;

    let field_defaults = fields
        .named
        .iter()
        .map(|field| {
            let field_name = &field.ident;
            let default_value = extract_default_value(field)?;

            // Only String fields need the &str -> String conversion
            if is_string_type(&field.ty) {
                Ok(quote! { #field_name: ::std::convert::Into::into(#default_value) })
            } else {
                Ok(quote! { #field_name: #default_value })
            }
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(quote! {
        #[automatically_derived]
        impl #impl_generics Default for #name #ty_generics #where_clause {
            fn default() -> Self {
                Self {
                    #(#field_defaults),*
                }
            }
        }
    })
}

fn is_string_type(ty: &Type) -> bool {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            return segment.ident == "String";
        }
    }
    false
}

fn extract_default_value(field: &Field) -> Result<proc_macro2::TokenStream> {
    let label = field_label(field);

    let Some(attr) = field.attrs.iter().find(|attr| attr.path().is_ident("default")) else {
        return Err(Error::new_spanned(
            field,
            format!("Field '{label}' must have a #[default(...)] attribute specifying its default value"),
        ));
    };

    let tokens: proc_macro2::TokenStream = attr.parse_args().map_err(|e| {
        Error::new_spanned(
            attr,
            format!("Failed to parse default attribute for field '{label}': {e}"),
        )
    })?;

    if tokens.is_empty() {
        return Err(Error::new_spanned(
            attr,
            format!("Field '{label}' has an empty #[default()] attribute. Please provide a default value."),
        ));
    }

    Ok(tokens)
}

/// How one struct field maps onto record columns
enum ColumnSpec {
    Skip,
    Scalar(String),
    Vector(String),
}

fn column_spec(field: &Field) -> Result<ColumnSpec> {
    let mut rename: Option<String> = None;
    let mut vector: Option<String> = None;
    let mut skip = false;

    for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("record")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                skip = true;
                Ok(())
            } else if meta.path.is_ident("rename") {
                let value: LitStr = meta.value()?.parse()?;
                rename = Some(value.value());
                Ok(())
            } else if meta.path.is_ident("vector") {
                let value: LitStr = meta.value()?.parse()?;
                vector = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("expected `skip`, `rename = \"...\"` or `vector = \"...\"`"))
            }
        })?;
    }

    match (skip, rename, vector) {
        (true, None, None) => Ok(ColumnSpec::Skip),
        (true, _, _) => Err(Error::new_spanned(
            field,
            "#[record(skip)] cannot be combined with other record options",
        )),
        (false, Some(_), Some(_)) => Err(Error::new_spanned(
            field,
            "#[record(rename)] and #[record(vector)] are mutually exclusive",
        )),
        (false, None, Some(prefix)) => Ok(ColumnSpec::Vector(prefix)),
        (false, Some(column), None) => Ok(ColumnSpec::Scalar(column)),
        (false, None, None) => Ok(ColumnSpec::Scalar(field_label(field))),
    }
}

fn generate_record_impl(input: DeriveInput) -> Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let fields: &Punctuated<Field, Comma> = &named_fields(&input, "Record")?.named;

    let mut columns: Vec<String> = Vec::new();
    let mut pushes: Vec<proc_macro2::TokenStream> = Vec::new();

    for field in fields {
        let field_name = &field.ident;
        match column_spec(field)? {
            ColumnSpec::Skip => {}
            ColumnSpec::Scalar(column) => {
                columns.push(column);
                pushes.push(quote! { row.push(self.#field_name as f64); });
            }
            ColumnSpec::Vector(prefix) => {
                for axis in ["x", "y", "z"] {
                    columns.push(format!("{prefix}_{axis}"));
                    let component = format_ident!("{}", axis);
                    pushes.push(quote! { row.push(self.#field_name.#component as f64); });
                }
            }
        }
    }

    if columns.is_empty() {
        return Err(Error::new_spanned(
            &input,
            "Record requires at least one column; every field is skipped",
        ));
    }

    let width = columns.len();

    Ok(quote! {
        #[automatically_derived]
        impl #impl_generics #name #ty_generics #where_clause {
            /// Column names in output order
            pub const COLUMNS: &'static [&'static str] = &[#(#columns),*];

            /// Values of this record in `COLUMNS` order
            pub fn row(&self) -> ::std::vec::Vec<f64> {
                let mut row = ::std::vec::Vec::with_capacity(#width);
                #(#pushes)*
                row
            }
        }
    })
}
