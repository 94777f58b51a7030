use crate::{AsValue, Record, RecordMeta, Result, Table, Value, error::config_error};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

/// The key selecting the rows removed by a delete.
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteKey {
    /// Column and value of every mapped field of a record.
    ByRecord(Vec<(&'static str, Value)>),
    /// Explicit values by column name.
    ByFieldMap(HashMap<String, Value>),
    /// The value of the only identifying column.
    ByScalar(Value),
}

impl DeleteKey {
    /// Canonical column to value mapping covering every identifying column of
    /// `table`. Each one must be present, not nil and not zero.
    pub fn resolve(self, table: &Table) -> Result<Vec<(String, Value)>> {
        table.validate()?;
        let mut result = Vec::with_capacity(table.id_columns().len());
        match self {
            DeleteKey::ByScalar(value) => {
                let mut ids = table.id_columns();
                let (Some(id), None) = (ids.next(), ids.next()) else {
                    return Err(config_error(format!(
                        "a single value can only be used as key for tables with one ID column, but `{}` has {}",
                        table.name(),
                        table.id_columns().len()
                    )));
                };
                result.push((id.to_owned(), check_id(id, value)?));
            }
            DeleteKey::ByRecord(fields) => {
                for id in table.id_columns() {
                    match fields.iter().find(|(c, _)| c.eq_ignore_ascii_case(id)) {
                        Some((_, value)) if value.is_null() => {
                            return Err(config_error(format!(
                                "missing required ID field `{}`: nil",
                                id
                            )));
                        }
                        Some((_, value)) => {
                            result.push((id.to_owned(), check_id(id, value.clone())?))
                        }
                        None => return Err(missing(id)),
                    }
                }
            }
            DeleteKey::ByFieldMap(mut map) => {
                for id in table.id_columns() {
                    let value = match map.remove(id) {
                        Some(v) => v,
                        None => {
                            let Some(key) = map.keys().find(|k| k.eq_ignore_ascii_case(id)).cloned()
                            else {
                                return Err(missing(id));
                            };
                            map.remove(&key).unwrap_or_default()
                        }
                    };
                    result.push((id.to_owned(), check_id(id, value)?));
                }
            }
        }
        Ok(result)
    }
}

fn missing(id: &str) -> crate::Error {
    config_error(format!("missing required ID field `{}`", id))
}

fn check_id(id: &str, value: Value) -> Result<Value> {
    if value.is_null() || value.is_zero() {
        return Err(config_error(format!(
            "invalid value for required ID field `{}`: {}",
            id, value
        )));
    }
    Ok(value)
}

/// Anything usable as the key of a delete.
pub trait IntoKey {
    fn into_key(self) -> Result<DeleteKey>;
}

impl IntoKey for DeleteKey {
    fn into_key(self) -> Result<DeleteKey> {
        Ok(self)
    }
}

impl<R: Record> IntoKey for &R {
    fn into_key(self) -> Result<DeleteKey> {
        let meta = RecordMeta::of::<R>()?;
        let values = self.field_values()?;
        Ok(DeleteKey::ByRecord(meta.columns().zip(values).collect()))
    }
}

impl IntoKey for HashMap<String, Value> {
    fn into_key(self) -> Result<DeleteKey> {
        Ok(DeleteKey::ByFieldMap(self))
    }
}

impl IntoKey for BTreeMap<String, Value> {
    fn into_key(self) -> Result<DeleteKey> {
        Ok(DeleteKey::ByFieldMap(self.into_iter().collect()))
    }
}

impl IntoKey for Value {
    fn into_key(self) -> Result<DeleteKey> {
        Ok(DeleteKey::ByScalar(self))
    }
}

macro_rules! impl_into_key_scalar {
    ($($source:ty),+ $(,)?) => {
        $(
            impl IntoKey for $source {
                fn into_key(self) -> Result<DeleteKey> {
                    Ok(DeleteKey::ByScalar(self.as_value()))
                }
            }
        )+
    };
}
impl_into_key_scalar!(i8, i16, i32, i64, u8, u16, u32, u64, String, Uuid);
