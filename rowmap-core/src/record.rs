use crate::{Error, Layout, RecordMeta, Result, Value};
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;

/// Static description of one struct field, emitted by `#[derive(Record)]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Rust field name.
    pub field: &'static str,
    /// Column name from the `column` tag, case preserved.
    pub column: &'static str,
    /// The field is an `Option<_>`: `None` is skipped by insert and update.
    pub nullable: bool,
    /// The field is stored as JSON text.
    pub json: bool,
    /// The field is visible outside its module.
    pub public: bool,
}

/// Dynamic access to the mapped fields of a record.
///
/// Indexes follow the order of [`Record::field_defs`]. The trait is object
/// safe so the scanner can address the parts of a joined row uniformly.
pub trait FieldAccess {
    /// Current values of every mapped field, JSON fields already encoded.
    fn field_values(&self) -> Result<Vec<Value>>;
    /// Decode `value` into the field at `index`.
    fn set_field(&mut self, index: usize, value: Value) -> Result<()>;
}

/// A struct mapped to the columns of one table.
pub trait Record: FieldAccess + Default + Send + Sync + 'static {
    fn field_defs() -> &'static [FieldDef];
}

/// One sub-record of a [`Joined`] row.
#[derive(Debug, Clone, Copy)]
pub struct JoinPart {
    pub field: &'static str,
    /// Table alias used to prefix the columns of this part.
    pub alias: &'static str,
    pub metadata: fn() -> Result<Arc<RecordMeta>>,
}

/// A row made of one record per joined table.
pub trait Joined: Target {
    fn join_parts() -> &'static [JoinPart];
}

/// Anything a result row can be scanned into: a [`Record`] or a [`Joined`]
/// composite.
pub trait Target: Default + Send + 'static {
    fn layout() -> Result<Layout>;
    /// The record receiving the columns of part `index`, for a plain record
    /// that is itself at index 0.
    fn part_mut(&mut self, index: usize) -> Option<&mut dyn FieldAccess>;
}

/// Rows scanned into boxed targets, `Vec<Box<T>>` for example.
impl<T: Target> Target for Box<T> {
    fn layout() -> Result<Layout> {
        T::layout()
    }
    fn part_mut(&mut self, index: usize) -> Option<&mut dyn FieldAccess> {
        (**self).part_mut(index)
    }
}

/// Serialize `value` as JSON text, a JSON `null` becomes SQL `NULL`.
pub fn encode_json<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    let text = serde_json::to_string(value)
        .map_err(|e| Error::new(e).context("Could not encode the field as JSON"))?;
    if text == "null" {
        return Ok(Value::Varchar(None));
    }
    Ok(Value::Varchar(Some(text)))
}

/// Decode the JSON column `value` into `field`. A `NULL` leaves the field
/// untouched.
pub fn decode_json<T: DeserializeOwned>(field: &mut T, value: Value) -> Result<()> {
    if value.is_null() {
        return Ok(());
    }
    let Some(bytes) = value.as_bytes() else {
        return Err(Error::msg(format!(
            "Cannot decode a {} value as JSON, expected text or bytes",
            value.type_name()
        )));
    };
    *field = serde_json::from_slice(bytes)
        .map_err(|e| Error::new(e).context("Could not decode the JSON column"))?;
    Ok(())
}
