use crate::{Result, error::config_error};
use std::borrow::Cow;

/// Name and identifying columns of the table an operation targets.
///
/// ```rust
/// use rowmap_core::Table;
/// let users = Table::new("users");
/// assert_eq!(users.ids(), ["id"]);
/// let permissions = Table::with_ids("user_permissions", ["user_id", "perm_id"]);
/// assert_eq!(permissions.ids().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    name: Cow<'static, str>,
    ids: Vec<Cow<'static, str>>,
}

impl Table {
    /// A table identified by the single column `id`.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self::with_ids(name, ["id"])
    }

    pub fn with_ids<I, S>(name: impl Into<Cow<'static, str>>, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Cow<'static, str>>,
    {
        Self {
            name: name.into(),
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ids(&self) -> Vec<&str> {
        self.ids.iter().map(AsRef::as_ref).collect()
    }

    pub fn id_columns(&self) -> impl ExactSizeIterator<Item = &str> + Clone {
        self.ids.iter().map(AsRef::as_ref)
    }

    pub fn is_id(&self, column: &str) -> bool {
        self.ids.iter().any(|v| v.eq_ignore_ascii_case(column))
    }

    /// Checked by every operation before any SQL is built.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(config_error(
                "rowmap::Table: table name cannot be an empty string",
            ));
        }
        if self.ids.is_empty() {
            return Err(config_error(
                "rowmap::Table: at least one ID column is required",
            ));
        }
        if self.ids.iter().any(|v| v.is_empty()) {
            return Err(config_error(
                "rowmap::Table: ID column cannot be an empty string",
            ));
        }
        Ok(())
    }
}
