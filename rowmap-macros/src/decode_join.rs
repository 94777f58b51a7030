use crate::decode_field::last_segment;
use syn::{Error, Field, Ident, LitStr, Result, Type, parse::ParseBuffer, spanned::Spanned};

pub(crate) struct JoinPartMetadata {
    pub(crate) ident: Ident,
    pub(crate) ty: Type,
    pub(crate) alias: String,
}

/// Reads `#[rowmap(table = "alias")]`, required on every field of a joined struct.
pub(crate) fn decode_join_part(field: &Field) -> Result<JoinPartMetadata> {
    let Some(ident) = field.ident.clone() else {
        return Err(Error::new(field.span(), "Joined fields must be named"));
    };
    match &field.ty {
        Type::Reference(..) | Type::Ptr(..) => {
            return Err(Error::new(
                field.ty.span(),
                "Joined fields must be records held by value, not references",
            ));
        }
        ty => {
            if let Some((name, _)) = last_segment(ty)
                && matches!(name.as_str(), "Option" | "Box" | "Rc" | "Arc")
            {
                return Err(Error::new(
                    ty.span(),
                    format!("Joined fields must be records held by value, not `{}`", name),
                ));
            }
        }
    }
    let mut alias: Option<LitStr> = None;
    for attr in &field.attrs {
        if !attr.path().is_ident("rowmap") {
            continue;
        }
        attr.parse_nested_meta(|arg| {
            if arg.path.is_ident("table") {
                let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                    return Err(arg.error(
                        "Error while parsing `table`, use it like: `#[rowmap(table = \"alias\")]`",
                    ));
                };
                alias = Some(v);
            } else {
                return Err(arg.error("Unknown attribute inside rowmap macro, joined fields only accept `table`"));
            }
            Ok(())
        })?;
    }
    let Some(alias) = alias else {
        return Err(Error::new(
            field.span(),
            format!(
                "The field `{}` of a joined struct must be tagged with its table alias: `#[rowmap(table = \"alias\")]`",
                ident
            ),
        ));
    };
    Ok(JoinPartMetadata {
        ident,
        ty: field.ty.clone(),
        alias: alias.value(),
    })
}
