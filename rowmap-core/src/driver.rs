use crate::{Connection, Dialect, Result, Transaction};
use std::{fmt::Debug, future::Future};

/// Entry point of a database backend.
pub trait Driver: Debug + Send + Sync + Sized + 'static {
    /// Driver identity, also the name its dialect answers to.
    const NAME: &'static str;

    type Connection: Connection<Driver = Self>;
    type Transaction<'c>: Transaction<'c, Driver = Self>;

    /// SQL flavor spoken by the backend.
    fn dialect(&self) -> &'static dyn Dialect;

    fn connect(&self, url: &str) -> impl Future<Output = Result<Self::Connection>> + Send {
        <Self::Connection as Connection>::connect(url)
    }
}
