use rowmap::{Connection, Joined, Provider, Record, Table, Value};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub street: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub number: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub city: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub state: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub country: String,
}

#[derive(Debug, Default, Clone, PartialEq, Record)]
pub struct User {
    #[rowmap(column = "id")]
    pub id: u64,
    #[rowmap(column = "name")]
    pub name: String,
    #[rowmap(column = "age")]
    pub age: i32,
    #[rowmap(column = "address", json)]
    pub address: Address,
}

#[derive(Debug, Default, Clone, PartialEq, Record)]
pub struct Post {
    #[rowmap(column = "id")]
    pub id: i64,
    #[rowmap(column = "user_id")]
    pub user_id: u64,
    #[rowmap(column = "title")]
    pub title: String,
}

#[derive(Debug, Default, Clone, PartialEq, Record)]
pub struct UserPermission {
    #[rowmap(column = "id")]
    pub id: i64,
    #[rowmap(column = "user_id")]
    pub user_id: i64,
    #[rowmap(column = "perm_id")]
    pub perm_id: i64,
}

#[derive(Debug, Default, Clone, PartialEq, Joined)]
pub struct UserPost {
    #[rowmap(table = "u")]
    pub user: User,
    #[rowmap(table = "p")]
    pub post: Post,
}

pub fn users_table() -> Table {
    Table::new("users")
}

pub fn posts_table() -> Table {
    Table::new("posts")
}

/// Placeholder of the parameter `index` (0-based) in the dialect of `provider`.
pub fn p<C: Connection>(provider: &Provider<C>, index: usize) -> String {
    provider.dialect().placeholder(index)
}

pub async fn user_by_name<C: Connection>(provider: &mut Provider<C>, name: &str) -> rowmap::Result<User> {
    let mut user = User::default();
    let sql = format!("FROM users WHERE name = {}", p(provider, 0));
    provider.query_one(&mut user, &sql, &[name.into()]).await?;
    Ok(user)
}

pub async fn user_by_id<C: Connection>(provider: &mut Provider<C>, id: u64) -> rowmap::Result<User> {
    let mut user = User::default();
    let sql = format!("FROM users WHERE id = {}", p(provider, 0));
    provider.query_one(&mut user, &sql, &[id.into()]).await?;
    Ok(user)
}

pub async fn permissions_by_user<C: Connection>(
    provider: &mut Provider<C>,
    user_id: i64,
) -> rowmap::Result<Vec<UserPermission>> {
    let mut permissions = Vec::new();
    let sql = format!("FROM user_permissions WHERE user_id = {}", p(provider, 0));
    provider
        .query(&mut permissions, &sql, &[Value::from(user_id)])
        .await?;
    Ok(permissions)
}
