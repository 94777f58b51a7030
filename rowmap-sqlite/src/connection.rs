use crate::{
    CBox, SqliteDriver, SqliteTransaction, error_message,
    extract::{Statement, bind_value, extract_name, extract_value},
};
use async_stream::try_stream;
use libsqlite3_sys::{
    SQLITE_BUSY, SQLITE_DONE, SQLITE_LOCKED, SQLITE_OK, SQLITE_OPEN_CREATE, SQLITE_OPEN_READWRITE,
    SQLITE_OPEN_URI, SQLITE_ROW, sqlite3, sqlite3_bind_parameter_count, sqlite3_close,
    sqlite3_column_count, sqlite3_finalize, sqlite3_last_insert_rowid, sqlite3_open_v2,
    sqlite3_prepare_v2, sqlite3_step, sqlite3_stmt_readonly, sqlite3_total_changes64,
};
use rowmap_core::{
    Connection, Context, Driver, Error, Executor, Query, QueryResult, Result, RowLabeled,
    RowNames, RowsAffected, Value, stream::Stream,
};
use std::{
    ffi::{CString, c_char, c_int},
    ptr,
    thread,
    vec,
};

/// A connection to a sqlite database, opened from a `sqlite://<path>` url.
///
/// `sqlite://:memory:` opens a private in-memory database, query parameters
/// are passed to sqlite as URI parameters (`sqlite://data.db?mode=ro`).
pub struct SqliteConnection {
    pub(crate) connection: CBox<*mut sqlite3>,
}

impl SqliteConnection {
    /// Compile the statement starting at byte `offset` of `sql`. Returns it
    /// (`None` for whitespace or comments) and the offset of the rest.
    fn prepare(&self, sql: &CString, offset: usize) -> Result<(Option<Statement>, usize)> {
        let bytes = sql.as_bytes();
        let start = unsafe { sql.as_ptr().add(offset) };
        let mut statement: Statement = CBox::new(ptr::null_mut(), |p| unsafe {
            sqlite3_finalize(p);
        });
        let mut tail: *const c_char = ptr::null();
        let rc = unsafe {
            sqlite3_prepare_v2(
                *self.connection,
                start,
                (bytes.len() - offset) as c_int,
                &mut *statement,
                &mut tail,
            )
        };
        if rc != SQLITE_OK {
            let error = Error::msg(error_message(*self.connection));
            log::error!("{:#}", error);
            return Err(error);
        }
        let next = if tail.is_null() {
            bytes.len()
        } else {
            (tail as usize - sql.as_ptr() as usize).clamp(offset + 1, bytes.len())
        };
        Ok(((!statement.is_null()).then_some(statement), next))
    }

    /// Total changes and last inserted rowid of the connection.
    fn counters(&self) -> (i64, i64) {
        unsafe {
            (
                sqlite3_total_changes64(*self.connection),
                sqlite3_last_insert_rowid(*self.connection),
            )
        }
    }

    /// Advance `statement`, the values of the new row or `None` when done.
    fn step(&self, statement: &Statement, columns: c_int) -> Result<Option<Box<[Value]>>> {
        loop {
            match unsafe { sqlite3_step(**statement) } {
                SQLITE_ROW => {
                    return (0..columns)
                        .map(|i| extract_value(statement, i))
                        .collect::<Result<_>>()
                        .map(Some);
                }
                SQLITE_DONE => return Ok(None),
                SQLITE_BUSY | SQLITE_LOCKED => thread::yield_now(),
                _ => {
                    let error = Error::msg(error_message(*self.connection));
                    log::error!("{:#}", error);
                    return Err(error);
                }
            }
        }
    }

    fn bind(statement: &Statement, params: &mut vec::IntoIter<Value>) -> Result<()> {
        let count = unsafe { sqlite3_bind_parameter_count(**statement) };
        for index in 1..=count {
            let Some(value) = params.next() else {
                return Err(Error::msg(format!(
                    "The query expects at least {} parameters, but fewer were provided",
                    count
                )));
            };
            bind_value(statement, index, &value)?;
        }
        Ok(())
    }
}

impl Executor for SqliteConnection {
    type Driver = SqliteDriver;

    fn driver(&self) -> &SqliteDriver {
        &SqliteDriver {}
    }

    /// Runs every statement of `query.sql` in order, consuming the parameters
    /// each one declares. Statements that can write report their changes
    /// after their rows.
    fn run(&mut self, query: Query) -> impl Stream<Item = Result<QueryResult>> + Send {
        try_stream! {
            let Query { sql, params } = query;
            let sql = CString::new(sql).context("The query contains a nul character")?;
            let len = sql.as_bytes().len();
            let mut params = params.into_iter();
            let mut offset = 0;
            while offset < len {
                let (statement, next) = self.prepare(&sql, offset)?;
                offset = next;
                let Some(statement) = statement else {
                    continue;
                };
                Self::bind(&statement, &mut params)?;
                let columns = unsafe { sqlite3_column_count(*statement) };
                let labels = (0..columns)
                    .map(|i| extract_name(&statement, i))
                    .collect::<Result<RowNames>>()?;
                let readonly = unsafe { sqlite3_stmt_readonly(*statement) } != 0;
                let (changes, rowid) = self.counters();
                while let Some(values) = self.step(&statement, columns)? {
                    yield QueryResult::Row(RowLabeled::new(labels.clone(), values));
                }
                if !readonly {
                    let (total, last) = self.counters();
                    yield QueryResult::Affected(RowsAffected {
                        rows_affected: (total - changes).max(0) as u64,
                        last_affected_id: (last != rowid).then_some(last),
                    });
                }
            }
            let unused = params.len();
            if unused > 0 {
                Err::<(), _>(Error::msg(format!(
                    "{} parameters were not used by the query",
                    unused
                )))?;
            }
        }
    }
}

impl Connection for SqliteConnection {
    async fn connect(url: &str) -> Result<SqliteConnection> {
        let prefix = format!("{}://", <SqliteDriver as Driver>::NAME);
        let Some(path) = url.strip_prefix(&prefix) else {
            return Err(Error::msg(format!(
                "Expected sqlite connection url to start with `{}`, got `{}`",
                prefix, url
            )));
        };
        let uri = CString::new(format!("file:{}", path))
            .with_context(|| format!("Error while decoding connection URL: `{}`", url))?;
        let mut connection = CBox::new(ptr::null_mut(), |p| unsafe {
            sqlite3_close(p);
        });
        let rc = unsafe {
            sqlite3_open_v2(
                uri.as_ptr(),
                &mut *connection,
                SQLITE_OPEN_READWRITE | SQLITE_OPEN_CREATE | SQLITE_OPEN_URI,
                ptr::null(),
            )
        };
        if rc != SQLITE_OK {
            let error = Error::msg(error_message(*connection))
                .context(format!("Could not open the database `{}`", url));
            log::error!("{:#}", error);
            return Err(error);
        }
        log::debug!("Connected to `{}`", url);
        Ok(Self { connection })
    }

    async fn begin(&mut self) -> Result<SqliteTransaction<'_>> {
        SqliteTransaction::new(self).await
    }
}
