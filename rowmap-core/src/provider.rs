use crate::{
    Connection, Context, Dialect, Driver, Executor, IntoKey, Query, QueryBuilder, Record,
    RecordMeta, RecordNotFound, Result, Rows, RowsAffected, Scanner, Table, Target, Transaction,
    Value, stream::StreamExt, truncate_long,
};
use std::pin::pin;

/// The CRUD engine: maps records to SQL statements run by an [`Executor`]
/// and scans the results back.
#[derive(Debug)]
pub struct Provider<E: Executor> {
    executor: E,
    builder: QueryBuilder,
}

impl<E: Executor> Provider<E> {
    /// Uses the dialect of the executor's driver.
    pub fn new(executor: E) -> Self {
        let dialect = executor.driver().dialect();
        Self::with_dialect(executor, dialect)
    }

    pub fn with_dialect(executor: E, dialect: &'static dyn Dialect) -> Self {
        Self {
            executor,
            builder: QueryBuilder::new(dialect),
        }
    }

    pub fn dialect(&self) -> &'static dyn Dialect {
        self.builder.dialect()
    }

    pub fn builder(&self) -> &QueryBuilder {
        &self.builder
    }

    pub fn executor(&mut self) -> &mut E {
        &mut self.executor
    }

    pub fn into_inner(self) -> E {
        self.executor
    }

    /// Replace the content of `records` with every row of the query.
    ///
    /// The query either starts with `SELECT` or with `FROM`, in which case
    /// the selected columns are generated from the target type.
    pub async fn query<T: Target>(
        &mut self,
        records: &mut Vec<T>,
        query: &str,
        params: &[Value],
    ) -> Result<()> {
        let mut scanner = Scanner::<T>::new()?;
        let sql = self.builder.select(scanner.layout(), query)?;
        records.clear();
        let query = Query::new(sql, params);
        log::debug!("query: {}", query);
        let context = error_running(&query.sql);
        let mut stream = pin!(self.executor.fetch(query));
        while let Some(row) = stream.next().await {
            let row = row.with_context(|| context.clone())?;
            records.push(scanner.scan(row)?);
        }
        Ok(())
    }

    /// Scan the first row of the query into `record`. Fails with
    /// [`RecordNotFound`] when there is none.
    pub async fn query_one<T: Target>(
        &mut self,
        record: &mut T,
        query: &str,
        params: &[Value],
    ) -> Result<()> {
        let mut scanner = Scanner::<T>::new()?;
        let sql = self.builder.select(scanner.layout(), query)?;
        let query = Query::new(sql, params);
        log::debug!("query_one: {}", query);
        let context = error_running(&query.sql);
        let mut stream = pin!(self.executor.fetch(query));
        let Some(row) = stream.next().await.transpose().with_context(|| context)? else {
            return Err(RecordNotFound.into());
        };
        scanner.scan_into(row, record)
    }

    /// Insert `record`, then write the generated identifiers back into it
    /// when the dialect can report them.
    pub async fn insert<R: Record>(&mut self, table: &Table, record: &mut R) -> Result<()> {
        table.validate()?;
        let meta = RecordMeta::of::<R>()?;
        let values = record.field_values()?;
        let plan = self.builder.insert(table, &meta, &values)?;
        log::debug!("insert: {}", plan.query);
        let context = format!(
            "Could not insert into `{}` the columns ({})",
            table.name(),
            plan.columns.join(", ")
        );
        if !plan.returning.is_empty() {
            let mut stream = pin!(self.executor.fetch(plan.query));
            let Some(row) = stream
                .next()
                .await
                .transpose()
                .with_context(|| context.clone())?
            else {
                return Ok(());
            };
            while let Some(rest) = stream.next().await {
                rest.with_context(|| context.clone())?;
            }
            for (label, value) in row.labels.iter().zip(row.values.into_vec()) {
                if let Some(i) = meta.field_index(label) {
                    record.set_field(i, value).with_context(|| {
                        format!("Could not write back the generated `{}`", label)
                    })?;
                }
            }
        } else {
            let result = self
                .executor
                .execute(plan.query)
                .await
                .with_context(|| context)?;
            if let (Some(i), Some(id)) = (plan.last_insert_id_field, result.last_affected_id) {
                record.set_field(i, Value::Int64(Some(id))).with_context(|| {
                    format!("Could not write back the generated id {}", id)
                })?;
            }
        }
        Ok(())
    }

    /// Fails with [`RecordNotFound`] when no row matches the identifiers of `record`.
    pub async fn update<R: Record>(&mut self, table: &Table, record: &R) -> Result<()> {
        table.validate()?;
        let meta = RecordMeta::of::<R>()?;
        let values = record.field_values()?;
        let query = self.builder.update(table, &meta, &values)?;
        log::debug!("update: {}", query);
        let result = self
            .executor
            .execute(query)
            .await
            .with_context(|| format!("Could not update the table `{}`", table.name()))?;
        if result.rows_affected == 0 {
            return Err(RecordNotFound.into());
        }
        Ok(())
    }

    /// Fails with [`RecordNotFound`] when nothing was deleted.
    pub async fn delete(&mut self, table: &Table, key: impl IntoKey) -> Result<()> {
        table.validate()?;
        let keys = key.into_key()?.resolve(table)?;
        let query = self.builder.delete(table, keys)?;
        log::debug!("delete: {}", query);
        let result = self
            .executor
            .execute(query)
            .await
            .with_context(|| format!("Could not delete from the table `{}`", table.name()))?;
        if result.rows_affected == 0 {
            return Err(RecordNotFound.into());
        }
        Ok(())
    }

    /// Run a statement as it is.
    pub async fn exec(&mut self, sql: &str, params: &[Value]) -> Result<RowsAffected> {
        let query = Query::new(sql, params);
        log::debug!("exec: {}", query);
        let context = error_running(&query.sql);
        self.executor.execute(query).await.with_context(|| context)
    }

    /// Raw cursor over the rows of a statement, see [`Rows`].
    pub fn rows(&mut self, sql: &str, params: &[Value]) -> Rows<'_> {
        let query = Query::new(sql, params);
        log::debug!("rows: {}", query);
        Rows::new(self.executor.fetch(query))
    }
}

impl<C: Connection> Provider<C> {
    /// Run `f` inside a transaction: commit when it succeeds, roll back
    /// otherwise. The error of `f` is returned as it is, a failure to commit
    /// or to roll back is returned with a context naming the step.
    pub async fn transaction<F, R>(&mut self, f: F) -> Result<R>
    where
        F: AsyncFnOnce(&mut Provider<<C::Driver as Driver>::Transaction<'_>>) -> Result<R>,
    {
        let dialect = self.dialect();
        log::debug!("transaction: begin");
        let transaction = self
            .executor
            .begin()
            .await
            .context("Could not begin the transaction")?;
        let mut provider = Provider::with_dialect(transaction, dialect);
        match f(&mut provider).await {
            Ok(result) => {
                log::debug!("transaction: commit");
                provider
                    .into_inner()
                    .commit()
                    .await
                    .context("Could not commit the transaction")?;
                Ok(result)
            }
            Err(error) => {
                log::debug!("transaction: rollback after {:#}", error);
                if let Err(rollback) = provider.into_inner().rollback().await {
                    log::warn!("Could not roll back the transaction: {:#}", rollback);
                    return Err(rollback.context(format!(
                        "Could not roll back the transaction after the error: {:#}",
                        error
                    )));
                }
                Err(error)
            }
        }
    }
}

fn error_running(sql: &str) -> String {
    format!("error running query: {}", truncate_long!(sql))
}
