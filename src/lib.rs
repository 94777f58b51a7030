//! Struct-relational mapping: read and write relational rows as plain structs.
//!
//! ```rust,ignore
//! #[derive(Default, Record)]
//! pub struct User {
//!     #[rowmap(column = "id")]
//!     pub id: i64,
//!     #[rowmap(column = "name")]
//!     pub name: String,
//! }
//!
//! let mut provider = Provider::new(connection);
//! let mut users = Vec::<User>::new();
//! provider.query(&mut users, "FROM users WHERE name = ?", &["Bia".into()]).await?;
//! ```
pub use rowmap_core::*;
pub use rowmap_macros::*;
