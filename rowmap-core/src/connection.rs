use crate::{Driver, Executor, Result};
use std::future::Future;

pub trait Connection: Executor {
    /// Open a connection to the database at the given URL.
    fn connect(url: &str) -> impl Future<Output = Result<Self>> + Send;

    /// Start a transaction, the connection is borrowed until it ends.
    fn begin(
        &mut self,
    ) -> impl Future<Output = Result<<Self::Driver as Driver>::Transaction<'_>>> + Send;
}
