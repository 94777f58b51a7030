use crate::{Result, error::config_error};
use std::fmt::{Debug, Write};

/// How a database hands back the identifiers it generated on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertMethod {
    /// `INSERT ... RETURNING id`
    Returning,
    /// `INSERT ... OUTPUT INSERTED.id VALUES ...`
    Output,
    /// The driver reports the last generated id with the affected rows.
    LastInsertId,
    /// Generated identifiers cannot be recovered.
    NoIdRetrieval,
}

impl InsertMethod {
    /// The id columns come back as a result row.
    pub fn returns_row(&self) -> bool {
        matches!(self, InsertMethod::Returning | InsertMethod::Output)
    }
}

/// The SQL flavor of a database engine.
pub trait Dialect: Send + Sync + Debug {
    /// Driver identity, as accepted by [`dialect_for`].
    fn name(&self) -> &'static str;

    fn insert_method(&self) -> InsertMethod;

    /// Write the placeholder of the parameter at `index` (0 based).
    fn write_placeholder(&self, out: &mut String, index: usize);

    fn write_identifier(&self, out: &mut String, value: &str) {
        out.push('"');
        write_escaped(out, value, '"', r#""""#);
        out.push('"');
    }

    /// Body of an insert that sets no column.
    fn write_default_values(&self, out: &mut String) {
        out.push_str("\nDEFAULT VALUES");
    }

    fn placeholder(&self, index: usize) -> String {
        let mut out = String::new();
        self.write_placeholder(&mut out, index);
        out
    }

    fn escape(&self, value: &str) -> String {
        let mut out = String::with_capacity(value.len() + 2);
        self.write_identifier(&mut out, value);
        out
    }
}

pub fn write_escaped(out: &mut String, value: &str, search: char, replace: &str) {
    let mut position = 0;
    for (i, c) in value.char_indices() {
        if c == search {
            out.push_str(&value[position..i]);
            out.push_str(replace);
            position = i + c.len_utf8();
        }
    }
    out.push_str(&value[position..]);
}

#[derive(Default, Debug, Clone, Copy)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }
    fn insert_method(&self) -> InsertMethod {
        InsertMethod::Returning
    }
    fn write_placeholder(&self, out: &mut String, index: usize) {
        let _ = write!(out, "${}", index + 1);
    }
}

#[derive(Default, Debug, Clone, Copy)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite3"
    }
    fn insert_method(&self) -> InsertMethod {
        InsertMethod::Returning
    }
    fn write_placeholder(&self, out: &mut String, _index: usize) {
        out.push('?');
    }
}

#[derive(Default, Debug, Clone, Copy)]
pub struct MySqlDialect;

impl Dialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }
    fn insert_method(&self) -> InsertMethod {
        InsertMethod::LastInsertId
    }
    fn write_placeholder(&self, out: &mut String, _index: usize) {
        out.push('?');
    }
    fn write_identifier(&self, out: &mut String, value: &str) {
        out.push('`');
        write_escaped(out, value, '`', "``");
        out.push('`');
    }
    fn write_default_values(&self, out: &mut String) {
        out.push_str(" () VALUES ()");
    }
}

#[derive(Default, Debug, Clone, Copy)]
pub struct SqlServerDialect;

impl Dialect for SqlServerDialect {
    fn name(&self) -> &'static str {
        "sqlserver"
    }
    fn insert_method(&self) -> InsertMethod {
        InsertMethod::Output
    }
    fn write_placeholder(&self, out: &mut String, index: usize) {
        let _ = write!(out, "@p{}", index + 1);
    }
    fn write_identifier(&self, out: &mut String, value: &str) {
        out.push('[');
        write_escaped(out, value, ']', "]]");
        out.push(']');
    }
}

/// Built-in dialect of a driver name.
pub fn dialect_for(driver: &str) -> Result<&'static dyn Dialect> {
    Ok(match driver {
        "postgres" | "pgx" => &PostgresDialect,
        "sqlite" | "sqlite3" => &SqliteDialect,
        "mysql" => &MySqlDialect,
        "sqlserver" | "mssql" => &SqlServerDialect,
        _ => {
            return Err(config_error(format!(
                "unsupported driver `{}`, expected one of postgres, pgx, sqlite, sqlite3, mysql, sqlserver, mssql",
                driver
            )));
        }
    })
}
