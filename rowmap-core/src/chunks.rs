use crate::{
    AbortIteration, Context, Executor, Provider, Query, Result, Scanner, Target, Value,
    error::config_error, stream::StreamExt, truncate_long,
};
use std::{mem, pin::pin};

/// A query whose rows are delivered to a callback in chunks.
///
/// The callback gets a fresh `Vec` of at most `chunk_size` records each time.
/// Returning [`AbortIteration`] stops the iteration without error, any other
/// error stops it and is returned.
///
/// ```rust,ignore
/// provider
///     .query_chunks(ChunkParser {
///         query: "FROM users WHERE age > ?",
///         params: &[18.into()],
///         chunk_size: 100,
///         for_each_chunk: |users: Vec<User>| {
///             process(users)?;
///             Ok(())
///         },
///     })
///     .await?;
/// ```
pub struct ChunkParser<'q, F> {
    pub query: &'q str,
    pub params: &'q [Value],
    pub chunk_size: usize,
    pub for_each_chunk: F,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkState {
    Idle,
    Running,
    Completed,
    Aborted,
    Failed,
}

impl ChunkState {
    fn to(&mut self, state: ChunkState) {
        log::debug!("query_chunks: {:?} -> {:?}", self, state);
        *self = state;
    }
}

impl<E: Executor> Provider<E> {
    pub async fn query_chunks<T, F>(&mut self, parser: ChunkParser<'_, F>) -> Result<()>
    where
        T: Target,
        F: FnMut(Vec<T>) -> Result<()>,
    {
        let ChunkParser {
            query,
            params,
            chunk_size,
            mut for_each_chunk,
        } = parser;
        if chunk_size == 0 {
            return Err(config_error(
                "rowmap::ChunkParser: the chunk size must be greater than zero",
            ));
        }
        let mut state = ChunkState::Idle;
        let mut scanner = Scanner::<T>::new()?;
        let sql = self.builder().select(scanner.layout(), query)?;
        let query = Query::new(sql, params);
        log::debug!("query_chunks: {}", query);
        let context = format!("error running query: {}", truncate_long!(query.sql));
        let mut stream = pin!(self.executor().fetch(query));
        state.to(ChunkState::Running);
        let mut buffer = Vec::with_capacity(chunk_size);
        loop {
            let row = stream.next().await;
            let exhausted = row.is_none();
            if let Some(row) = row {
                let record = row
                    .with_context(|| context.clone())
                    .and_then(|row| scanner.scan(row));
                match record {
                    Ok(record) => buffer.push(record),
                    Err(error) => {
                        state.to(ChunkState::Failed);
                        return Err(error);
                    }
                }
            }
            if buffer.len() < chunk_size && !exhausted {
                continue;
            }
            if !buffer.is_empty() {
                let chunk = mem::replace(&mut buffer, Vec::with_capacity(chunk_size));
                match for_each_chunk(chunk) {
                    Ok(()) => {}
                    Err(error) if error.is::<AbortIteration>() => {
                        state.to(ChunkState::Aborted);
                        return Ok(());
                    }
                    Err(error) => {
                        state.to(ChunkState::Failed);
                        return Err(error);
                    }
                }
            }
            if exhausted {
                state.to(ChunkState::Completed);
                return Ok(());
            }
        }
    }
}
