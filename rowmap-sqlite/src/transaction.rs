use crate::{SqliteConnection, SqliteDriver, error_message};
use libsqlite3_sys::{SQLITE_OK, sqlite3_exec};
use rowmap_core::{Executor, Query, QueryResult, Result, Transaction, stream::Stream};
use std::ptr;

/// A transaction opened with `BEGIN` on a borrowed connection.
///
/// Dropped without `commit` or `rollback`, it rolls back.
pub struct SqliteTransaction<'c> {
    connection: &'c mut SqliteConnection,
    finished: bool,
}

impl<'c> SqliteTransaction<'c> {
    pub(crate) async fn new(connection: &'c mut SqliteConnection) -> Result<Self> {
        connection.execute("BEGIN".into()).await?;
        Ok(Self {
            connection,
            finished: false,
        })
    }

    async fn finish(mut self, sql: &'static str) -> Result<()> {
        let result = self.connection.execute(sql.into()).await.map(|_| ());
        self.finished = result.is_ok();
        result
    }
}

impl<'c> Executor for SqliteTransaction<'c> {
    type Driver = SqliteDriver;

    fn driver(&self) -> &SqliteDriver {
        self.connection.driver()
    }

    fn run(&mut self, query: Query) -> impl Stream<Item = Result<QueryResult>> + Send {
        self.connection.run(query)
    }
}

impl<'c> Transaction<'c> for SqliteTransaction<'c> {
    async fn commit(self) -> Result<()> {
        self.finish("COMMIT").await
    }

    async fn rollback(self) -> Result<()> {
        self.finish("ROLLBACK").await
    }
}

impl Drop for SqliteTransaction<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let db = *self.connection.connection;
        let rc = unsafe {
            sqlite3_exec(
                db,
                c"ROLLBACK".as_ptr(),
                None,
                ptr::null_mut(),
                ptr::null_mut(),
            )
        };
        if rc != SQLITE_OK {
            log::warn!(
                "Could not roll back the dropped transaction: {}",
                error_message(db)
            );
        }
    }
}
