use crate::{CBox, error_message};
use libsqlite3_sys::*;
use rowmap_core::{Error, Result, Value};
use rust_decimal::prelude::ToPrimitive;
use std::{
    ffi::{CStr, c_char, c_int, c_void},
    slice,
};
use time::{format_description::BorrowedFormatItem, macros::format_description};

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const TIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[hour]:[minute]:[second].[subsecond]");
const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]");

pub(crate) type Statement = CBox<*mut sqlite3_stmt>;

pub(crate) fn extract_value(statement: &Statement, index: c_int) -> Result<Value> {
    unsafe {
        let column_type = sqlite3_column_type(**statement, index);
        Ok(match column_type {
            SQLITE_NULL => Value::Null,
            SQLITE_INTEGER => Value::Int64(Some(sqlite3_column_int64(**statement, index))),
            SQLITE_FLOAT => Value::Float64(Some(sqlite3_column_double(**statement, index))),
            SQLITE_BLOB => {
                let ptr = sqlite3_column_blob(**statement, index) as *const u8;
                let len = sqlite3_column_bytes(**statement, index) as usize;
                if ptr.is_null() {
                    Value::Blob(Some(Box::default()))
                } else {
                    Value::Blob(Some(slice::from_raw_parts(ptr, len).into()))
                }
            }
            SQLITE_TEXT => {
                let ptr = sqlite3_column_text(**statement, index);
                let len = sqlite3_column_bytes(**statement, index) as usize;
                if ptr.is_null() {
                    Value::Varchar(Some(String::new()))
                } else {
                    let bytes = slice::from_raw_parts(ptr, len);
                    Value::Varchar(Some(String::from_utf8_lossy(bytes).into_owned()))
                }
            }
            _ => {
                return Err(Error::msg(format!(
                    "Unexpected sqlite column type {}",
                    column_type
                )));
            }
        })
    }
}

pub(crate) fn extract_name(statement: &Statement, index: c_int) -> Result<String> {
    unsafe {
        let name = sqlite3_column_name(**statement, index);
        if name.is_null() {
            return Err(Error::msg(format!(
                "Could not read the name of the column {}",
                index
            )));
        }
        Ok(CStr::from_ptr(name).to_string_lossy().into_owned())
    }
}

fn bind_text(statement: &Statement, index: c_int, text: &str) -> c_int {
    unsafe {
        sqlite3_bind_text(
            **statement,
            index,
            text.as_ptr() as *const c_char,
            text.len() as c_int,
            SQLITE_TRANSIENT(),
        )
    }
}

/// Bind `value` to the 1-based parameter `index`.
pub(crate) fn bind_value(statement: &Statement, index: c_int, value: &Value) -> Result<()> {
    let stmt = **statement;
    let rc = unsafe {
        match value {
            v if v.is_null() => sqlite3_bind_null(stmt, index),
            Value::Boolean(Some(v)) => sqlite3_bind_int(stmt, index, *v as c_int),
            Value::Int8(Some(v)) => sqlite3_bind_int(stmt, index, *v as c_int),
            Value::Int16(Some(v)) => sqlite3_bind_int(stmt, index, *v as c_int),
            Value::Int32(Some(v)) => sqlite3_bind_int(stmt, index, *v as c_int),
            Value::Int64(Some(v)) => sqlite3_bind_int64(stmt, index, *v),
            Value::UInt8(Some(v)) => sqlite3_bind_int(stmt, index, *v as c_int),
            Value::UInt16(Some(v)) => sqlite3_bind_int(stmt, index, *v as c_int),
            Value::UInt32(Some(v)) => sqlite3_bind_int64(stmt, index, *v as sqlite3_int64),
            Value::UInt64(Some(v)) => {
                let Ok(v) = sqlite3_int64::try_from(*v) else {
                    return Err(Error::msg(format!(
                        "Cannot bind the value {} into a sqlite integer because it's out of bounds",
                        v
                    )));
                };
                sqlite3_bind_int64(stmt, index, v)
            }
            Value::Float32(Some(v)) => sqlite3_bind_double(stmt, index, *v as f64),
            Value::Float64(Some(v)) => sqlite3_bind_double(stmt, index, *v),
            Value::Decimal(Some(v)) => sqlite3_bind_double(
                stmt,
                index,
                v.to_f64().ok_or_else(|| {
                    Error::msg(format!("Cannot convert the Decimal value `{}` to f64", v))
                })?,
            ),
            Value::Varchar(Some(v)) => bind_text(statement, index, v),
            Value::Blob(Some(v)) => sqlite3_bind_blob(
                stmt,
                index,
                v.as_ptr() as *const c_void,
                v.len() as c_int,
                SQLITE_TRANSIENT(),
            ),
            Value::Date(Some(v)) => bind_text(statement, index, &v.format(DATE_FORMAT)?),
            Value::Time(Some(v)) => bind_text(statement, index, &v.format(TIME_FORMAT)?),
            Value::Timestamp(Some(v)) => {
                bind_text(statement, index, &v.format(TIMESTAMP_FORMAT)?)
            }
            Value::Uuid(Some(v)) => bind_text(statement, index, &v.to_string()),
            _ => {
                return Err(Error::msg(format!(
                    "Cannot use a {:?} as a query parameter",
                    value
                )));
            }
        }
    };
    if rc != SQLITE_OK {
        let error = Error::msg(error_message(unsafe { sqlite3_db_handle(stmt) }))
            .context(format!("Cannot bind the parameter {}", index));
        log::error!("{:#}", error);
        return Err(error);
    }
    Ok(())
}
