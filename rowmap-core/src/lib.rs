mod as_value;
mod chunks;
mod connection;
mod dialect;
mod driver;
mod error;
mod executor;
mod key;
mod metadata;
mod provider;
mod query;
mod record;
mod scan;
mod table;
mod transaction;
mod util;
mod value;
mod writer;

pub use ::anyhow::Context;
pub use as_value::*;
pub use chunks::*;
pub use connection::*;
pub use dialect::*;
pub use driver::*;
pub use error::*;
pub use executor::*;
pub use key::*;
pub use metadata::*;
pub use provider::*;
pub use query::*;
pub use record::*;
pub use scan::*;
pub use table::*;
pub use transaction::*;
pub use util::*;
pub use value::*;
pub use writer::*;
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
