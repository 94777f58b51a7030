use syn::{
    Error, Field, GenericArgument, Ident, LitStr, PathArguments, Result, Type, Visibility,
    parse::ParseBuffer, spanned::Spanned,
};

pub(crate) struct FieldMetadata {
    pub(crate) ident: Ident,
    pub(crate) ty: Type,
    pub(crate) column: String,
    pub(crate) nullable: bool,
    pub(crate) json: bool,
    pub(crate) public: bool,
}

/// Last path segment of `ty` with its generic arguments, if `ty` is a path.
pub(crate) fn last_segment(ty: &Type) -> Option<(String, Option<&Type>)> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    let inner = match &segment.arguments {
        PathArguments::AngleBracketed(args) => args.args.iter().find_map(|v| match v {
            GenericArgument::Type(t) => Some(t),
            _ => None,
        }),
        _ => None,
    };
    Some((segment.ident.to_string(), inner))
}

/// Reads `#[rowmap(column = "...", json)]`, `None` for untagged fields.
pub(crate) fn decode_field(field: &Field) -> Result<Option<FieldMetadata>> {
    let Some(ident) = field.ident.clone() else {
        return Err(Error::new(field.span(), "Record fields must be named"));
    };
    let mut column: Option<LitStr> = None;
    let mut json = false;
    for attr in &field.attrs {
        if !attr.path().is_ident("rowmap") {
            continue;
        }
        attr.parse_nested_meta(|arg| {
            if arg.path.is_ident("column") {
                let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                    return Err(arg.error(
                        "Error while parsing `column`, use it like: `#[rowmap(column = \"my_column\")]`",
                    ));
                };
                column = Some(v);
            } else if arg.path.is_ident("json") {
                json = true;
            } else {
                return Err(arg.error(format!(
                    "Unknown attribute `{}` inside rowmap macro",
                    arg.path
                        .get_ident()
                        .map(ToString::to_string)
                        .unwrap_or_default()
                )));
            }
            Ok(())
        })?;
    }
    let Some(column) = column else {
        if json {
            return Err(Error::new(
                field.span(),
                "`json` requires a column, use it like: `#[rowmap(column = \"my_column\", json)]`",
            ));
        }
        return Ok(None);
    };
    let nullable = matches!(last_segment(&field.ty), Some((name, Some(_))) if name == "Option");
    Ok(Some(FieldMetadata {
        ident,
        ty: field.ty.clone(),
        column: column.value(),
        nullable,
        json,
        public: !matches!(field.vis, Visibility::Inherited),
    }))
}
