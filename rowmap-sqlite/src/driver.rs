use crate::{SqliteConnection, SqliteTransaction};
use rowmap_core::{Dialect, Driver, SqliteDialect};

#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteDriver {}

impl SqliteDriver {
    pub const fn new() -> Self {
        Self {}
    }
}

impl Driver for SqliteDriver {
    const NAME: &'static str = "sqlite";
    type Connection = SqliteConnection;
    type Transaction<'c> = SqliteTransaction<'c>;

    fn dialect(&self) -> &'static dyn Dialect {
        &SqliteDialect
    }
}
