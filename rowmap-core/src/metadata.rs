use crate::{FieldDef, JoinPart, Joined, Record, Result, column_key, error::config_error};
use std::{
    any::{TypeId, type_name},
    collections::HashMap,
    sync::{Arc, LazyLock, RwLock},
};

static CACHE: LazyLock<RwLock<HashMap<TypeId, Arc<RecordMeta>>>> =
    LazyLock::new(Default::default);

/// Validated mapping between the columns of a record type and its fields.
#[derive(Debug)]
pub struct RecordMeta {
    type_name: &'static str,
    fields: &'static [FieldDef],
    by_column: HashMap<String, usize>,
}

impl RecordMeta {
    /// Metadata of `R`, computed once per type and shared afterwards.
    pub fn of<R: Record>() -> Result<Arc<RecordMeta>> {
        let id = TypeId::of::<R>();
        if let Some(meta) = CACHE.read().ok().and_then(|cache| cache.get(&id).cloned()) {
            return Ok(meta);
        }
        let meta = Arc::new(Self::build(type_name::<R>(), R::field_defs())?);
        let Ok(mut cache) = CACHE.write() else {
            return Ok(meta);
        };
        Ok(cache.entry(id).or_insert(meta).clone())
    }

    /// Validate a field list: at least one mapped field, no empty column tag,
    /// every tagged field public, no column mapped twice (ignoring case).
    pub fn build(type_name: &'static str, fields: &'static [FieldDef]) -> Result<RecordMeta> {
        if fields.is_empty() {
            return Err(config_error(format!(
                "the struct `{}` must have at least one field tagged with a column name",
                type_name
            )));
        }
        let mut by_column = HashMap::with_capacity(fields.len());
        for (i, field) in fields.iter().enumerate() {
            if field.column.is_empty() {
                return Err(config_error(format!(
                    "the field `{}` of `{}` has an empty column tag",
                    field.field, type_name
                )));
            }
            if !field.public {
                return Err(config_error(format!(
                    "all fields using the rowmap column tag must be public, but the field `{}` of `{}` tagged `{}` is private",
                    field.field, type_name, field.column
                )));
            }
            if by_column.insert(column_key(field.column), i).is_some() {
                return Err(config_error(format!(
                    "found two fields with the same column tag `{}` in struct `{}`",
                    field.column, type_name
                )));
            }
        }
        Ok(RecordMeta {
            type_name,
            fields,
            by_column,
        })
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn fields(&self) -> &'static [FieldDef] {
        self.fields
    }

    pub fn columns(&self) -> impl ExactSizeIterator<Item = &'static str> + Clone {
        self.fields.iter().map(|f| f.column)
    }

    /// Index of the field mapped to `column`, matched case-insensitively.
    pub fn field_index(&self, column: &str) -> Option<usize> {
        self.by_column.get(&column_key(column)).copied()
    }

    pub fn field(&self, column: &str) -> Option<&'static FieldDef> {
        self.field_index(column).map(|i| &self.fields[i])
    }
}

#[derive(Debug, Clone)]
pub struct JoinedMeta {
    pub alias: &'static str,
    pub field: &'static str,
    pub meta: Arc<RecordMeta>,
}

/// How the columns of a result row are distributed over a scan target.
#[derive(Debug, Clone)]
pub enum Layout {
    /// A single record, columns matched by name.
    Table(Arc<RecordMeta>),
    /// One record per joined table, columns matched by position in the
    /// synthesized select list.
    Join(Arc<[JoinedMeta]>),
}

impl Layout {
    pub fn of_record<R: Record>() -> Result<Layout> {
        RecordMeta::of::<R>().map(Layout::Table)
    }

    pub fn of_joined<J: Joined>() -> Result<Layout> {
        Self::from_parts(type_name::<J>(), J::join_parts())
    }

    pub fn from_parts(type_name: &'static str, parts: &[JoinPart]) -> Result<Layout> {
        if parts.is_empty() {
            return Err(config_error(format!(
                "the joined struct `{}` must have at least one field tagged with a table alias",
                type_name
            )));
        }
        let mut result = Vec::<JoinedMeta>::with_capacity(parts.len());
        for part in parts {
            if part.alias.is_empty() {
                return Err(config_error(format!(
                    "the field `{}` of the joined struct `{}` has an empty table alias",
                    part.field, type_name
                )));
            }
            if result.iter().any(|v| v.alias.eq_ignore_ascii_case(part.alias)) {
                return Err(config_error(format!(
                    "found duplicate table alias `{}` in the joined struct `{}`",
                    part.alias, type_name
                )));
            }
            result.push(JoinedMeta {
                alias: part.alias,
                field: part.field,
                meta: (part.metadata)()?,
            });
        }
        Ok(Layout::Join(result.into()))
    }

    pub fn is_join(&self) -> bool {
        matches!(self, Layout::Join(..))
    }

    /// Number of columns the scanner expects to bind.
    pub fn width(&self) -> usize {
        match self {
            Layout::Table(meta) => meta.fields().len(),
            Layout::Join(parts) => parts.iter().map(|p| p.meta.fields().len()).sum(),
        }
    }
}
