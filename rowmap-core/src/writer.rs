use crate::{
    Dialect, InsertMethod, Layout, Query, RecordMeta, Result, Table, Value,
    error::config_error, separated_by, starts_with_select,
};

/// An insert statement and what to do with its outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertPlan {
    pub query: Query,
    /// Columns written by the statement, used to annotate errors.
    pub columns: Vec<&'static str>,
    /// Identifying columns (present in the record) the statement returns as a row.
    pub returning: Vec<&'static str>,
    /// Record field receiving the driver reported last insert id.
    pub last_insert_id_field: Option<usize>,
}

/// Builds dialect specific SQL out of record metadata.
#[derive(Debug, Clone, Copy)]
pub struct QueryBuilder {
    dialect: &'static dyn Dialect,
}

impl QueryBuilder {
    pub const fn new(dialect: &'static dyn Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> &'static dyn Dialect {
        self.dialect
    }

    /// Complete a query that may start with `FROM` by synthesizing the list
    /// of selected columns. Queries already starting with `SELECT` are kept
    /// as they are, which is only possible for a plain record.
    pub fn select(&self, layout: &Layout, query: &str) -> Result<String> {
        if starts_with_select(query) {
            if layout.is_join() {
                return Err(config_error(
                    "queries starting with SELECT cannot be scanned into a nested struct, \
                     this feature is only available for queries starting with FROM",
                ));
            }
            return Ok(query.to_owned());
        }
        let mut out = String::with_capacity(query.len() + 16 * layout.width());
        out.push_str("SELECT ");
        match layout {
            Layout::Table(meta) => {
                separated_by(
                    &mut out,
                    meta.columns(),
                    |out, column| self.dialect.write_identifier(out, column),
                    ", ",
                );
            }
            Layout::Join(parts) => {
                separated_by(
                    &mut out,
                    parts
                        .iter()
                        .flat_map(|p| p.meta.columns().map(move |c| (p.alias, c))),
                    |out, (alias, column)| {
                        self.dialect.write_identifier(out, alias);
                        out.push('.');
                        self.dialect.write_identifier(out, column);
                    },
                    ", ",
                );
            }
        }
        out.push(' ');
        out.push_str(query.trim_start());
        Ok(out)
    }

    /// `values` are the field values of the record, in metadata order.
    pub fn insert(&self, table: &Table, meta: &RecordMeta, values: &[Value]) -> Result<InsertPlan> {
        table.validate()?;
        check_width(meta, values)?;
        let method = self.dialect.insert_method();
        let ids = table.id_columns().len();
        let mut columns = Vec::with_capacity(values.len());
        let mut params = Vec::with_capacity(values.len());
        for (field, value) in meta.fields().iter().zip(values) {
            let is_id = table.is_id(field.column);
            if is_id && (value.is_null() || value.is_zero()) {
                continue;
            }
            if field.nullable && value.is_null() {
                continue;
            }
            columns.push(field.column);
            params.push(value.clone());
        }
        let returning: Vec<&'static str> = if method.returns_row() {
            table
                .id_columns()
                .filter_map(|id| meta.field(id).map(|f| f.column))
                .collect()
        } else {
            Vec::new()
        };
        let last_insert_id_field = if method == InsertMethod::LastInsertId && ids == 1 {
            table
                .id_columns()
                .find_map(|id| meta.field_index(id))
                .filter(|i| !columns.contains(&meta.fields()[*i].column))
        } else {
            None
        };

        let mut sql = String::with_capacity(64 + columns.len() * 24);
        sql.push_str("INSERT INTO ");
        self.dialect.write_identifier(&mut sql, table.name());
        if !columns.is_empty() {
            sql.push_str(" (");
            separated_by(
                &mut sql,
                &columns,
                |out, v| self.dialect.write_identifier(out, v),
                ", ",
            );
            sql.push(')');
        }
        if method == InsertMethod::Output && !returning.is_empty() {
            sql.push_str("\nOUTPUT ");
            separated_by(
                &mut sql,
                &returning,
                |out, v| {
                    out.push_str("INSERTED.");
                    self.dialect.write_identifier(out, v);
                },
                ", ",
            );
        }
        if columns.is_empty() {
            if method == InsertMethod::Output {
                sql.push_str("\nDEFAULT VALUES");
            } else {
                self.dialect.write_default_values(&mut sql);
            }
        } else {
            sql.push_str("\nVALUES (");
            separated_by(
                &mut sql,
                0..columns.len(),
                |out, i| self.dialect.write_placeholder(out, i),
                ", ",
            );
            sql.push(')');
        }
        if method == InsertMethod::Returning && !returning.is_empty() {
            sql.push_str("\nRETURNING ");
            separated_by(
                &mut sql,
                &returning,
                |out, v| self.dialect.write_identifier(out, v),
                ", ",
            );
        }
        Ok(InsertPlan {
            query: Query::new(sql, params),
            columns,
            returning,
            last_insert_id_field,
        })
    }

    /// Every non identifying column is set, `None` in an `Option` field
    /// leaves the column unchanged.
    pub fn update(&self, table: &Table, meta: &RecordMeta, values: &[Value]) -> Result<Query> {
        table.validate()?;
        check_width(meta, values)?;
        let mut keys = Vec::with_capacity(table.id_columns().len());
        for id in table.id_columns() {
            let Some(index) = meta.field_index(id) else {
                return Err(config_error(format!(
                    "missing required ID field `{}` on record `{}`",
                    id,
                    meta.type_name()
                )));
            };
            let value = &values[index];
            if value.is_null() {
                return Err(config_error(format!(
                    "invalid value for required ID field `{}`: nil",
                    id
                )));
            }
            keys.push((meta.fields()[index].column, value.clone()));
        }
        let mut params = Vec::with_capacity(values.len());
        let mut sql = String::with_capacity(64 + values.len() * 24);
        sql.push_str("UPDATE ");
        self.dialect.write_identifier(&mut sql, table.name());
        sql.push_str("\nSET ");
        separated_by(
            &mut sql,
            meta.fields()
                .iter()
                .zip(values)
                .filter(|(f, v)| !table.is_id(f.column) && !(f.nullable && v.is_null())),
            |out, (field, value)| {
                self.dialect.write_identifier(out, field.column);
                out.push_str(" = ");
                self.dialect.write_placeholder(out, params.len());
                params.push(value.clone());
            },
            ", ",
        );
        if params.is_empty() {
            return Err(config_error(format!(
                "nothing to update on table `{}`: every non ID field of `{}` is empty",
                table.name(),
                meta.type_name()
            )));
        }
        self.write_where(&mut sql, &mut params, keys);
        Ok(Query::new(sql, params))
    }

    /// `keys` is the resolved column to value mapping of the identifying columns.
    pub fn delete(&self, table: &Table, keys: Vec<(String, Value)>) -> Result<Query> {
        table.validate()?;
        let mut sql = String::with_capacity(64);
        sql.push_str("DELETE FROM ");
        self.dialect.write_identifier(&mut sql, table.name());
        let mut params = Vec::with_capacity(keys.len());
        self.write_where(&mut sql, &mut params, keys);
        Ok(Query::new(sql, params))
    }

    fn write_where<C: AsRef<str>>(
        &self,
        out: &mut String,
        params: &mut Vec<Value>,
        keys: Vec<(C, Value)>,
    ) {
        out.push_str("\nWHERE ");
        separated_by(
            out,
            keys,
            |out, (column, value)| {
                self.dialect.write_identifier(out, column.as_ref());
                out.push_str(" = ");
                self.dialect.write_placeholder(out, params.len());
                params.push(value);
            },
            " AND ",
        );
    }
}

fn check_width(meta: &RecordMeta, values: &[Value]) -> Result<()> {
    if values.len() != meta.fields().len() {
        return Err(config_error(format!(
            "`{}` maps {} fields but returned {} values",
            meta.type_name(),
            meta.fields().len(),
            values.len()
        )));
    }
    Ok(())
}
