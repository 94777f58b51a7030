#![allow(dead_code)]
use rowmap_core::{
    AsValue, Connection, Dialect, Driver, Error, Executor, FieldAccess, FieldDef, JoinPart,
    Joined, Layout, PostgresDialect, Query, QueryResult, Record, RecordMeta, Result, RowLabeled,
    RowsAffected, Target, Transaction, Value, decode_json, encode_json,
    stream::{self, Stream},
};
use serde::{Deserialize, Serialize};
use std::{collections::VecDeque, sync::Arc};

#[derive(Debug, Default, Clone, Copy)]
pub struct MockDriver {
    dialect: Option<&'static dyn Dialect>,
}

impl Driver for MockDriver {
    const NAME: &'static str = "mock";
    type Connection = MockConnection;
    type Transaction<'c> = MockTransaction<'c>;

    fn dialect(&self) -> &'static dyn Dialect {
        self.dialect.unwrap_or(&PostgresDialect)
    }
}

type Response = Vec<std::result::Result<QueryResult, String>>;

/// Replays scripted responses, one per statement, and records what it ran.
#[derive(Debug, Default)]
pub struct MockConnection {
    driver: MockDriver,
    responses: VecDeque<Response>,
    pub statements: Vec<Query>,
}

impl MockConnection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dialect(dialect: &'static dyn Dialect) -> Self {
        Self {
            driver: MockDriver {
                dialect: Some(dialect),
            },
            ..Default::default()
        }
    }

    pub fn rows(&mut self, labels: &[&str], rows: Vec<Vec<Value>>) -> &mut Self {
        let labels: Arc<[String]> = labels.iter().map(|v| v.to_string()).collect();
        self.responses.push_back(
            rows.into_iter()
                .map(|v| Ok(RowLabeled::new(labels.clone(), v.into()).into()))
                .collect(),
        );
        self
    }

    pub fn affected(&mut self, rows_affected: u64, last_affected_id: Option<i64>) -> &mut Self {
        self.responses.push_back(vec![Ok(RowsAffected {
            rows_affected,
            last_affected_id,
        }
        .into())]);
        self
    }

    pub fn fail(&mut self, message: &str) -> &mut Self {
        self.responses.push_back(vec![Err(message.to_string())]);
        self
    }

    pub fn response(&mut self, response: Response) -> &mut Self {
        self.responses.push_back(response);
        self
    }

    pub fn sql(&self) -> Vec<&str> {
        self.statements.iter().map(|v| v.sql.as_str()).collect()
    }
}

impl Executor for MockConnection {
    type Driver = MockDriver;

    fn driver(&self) -> &MockDriver {
        &self.driver
    }

    fn run(&mut self, query: Query) -> impl Stream<Item = Result<QueryResult>> + Send {
        self.statements.push(query);
        let response = self.responses.pop_front().unwrap_or_default();
        stream::iter(response.into_iter().map(|v| v.map_err(Error::msg)))
    }
}

impl Connection for MockConnection {
    async fn connect(_url: &str) -> Result<Self> {
        Ok(Self::new())
    }

    async fn begin(&mut self) -> Result<MockTransaction<'_>> {
        self.execute("BEGIN".into()).await?;
        Ok(MockTransaction { connection: self })
    }
}

pub struct MockTransaction<'c> {
    connection: &'c mut MockConnection,
}

impl<'c> Executor for MockTransaction<'c> {
    type Driver = MockDriver;

    fn driver(&self) -> &MockDriver {
        self.connection.driver()
    }

    fn run(&mut self, query: Query) -> impl Stream<Item = Result<QueryResult>> + Send {
        self.connection.run(query)
    }
}

impl<'c> Transaction<'c> for MockTransaction<'c> {
    async fn commit(self) -> Result<()> {
        self.connection.execute("COMMIT".into()).await.map(|_| ())
    }

    async fn rollback(self) -> Result<()> {
        self.connection.execute("ROLLBACK".into()).await.map(|_| ())
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub country: String,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub age: Option<i32>,
    pub address: Address,
    pub ignored: String,
}

impl FieldAccess for User {
    fn field_values(&self) -> Result<Vec<Value>> {
        Ok(vec![
            self.id.as_value(),
            self.name.clone().as_value(),
            self.age.as_value(),
            encode_json(&self.address)?,
        ])
    }
    fn set_field(&mut self, index: usize, value: Value) -> Result<()> {
        match index {
            0 => self.id = AsValue::try_from_value(value)?,
            1 => self.name = AsValue::try_from_value(value)?,
            2 => self.age = AsValue::try_from_value(value)?,
            3 => decode_json(&mut self.address, value)?,
            _ => return Err(Error::msg(format!("User has no field {}", index))),
        }
        Ok(())
    }
}

impl Record for User {
    fn field_defs() -> &'static [FieldDef] {
        const FIELDS: &[FieldDef] = &[
            field("id", "id", false, false),
            field("name", "name", false, false),
            field("age", "age", true, false),
            field("address", "address", false, true),
        ];
        FIELDS
    }
}

impl Target for User {
    fn layout() -> Result<Layout> {
        Layout::of_record::<Self>()
    }
    fn part_mut(&mut self, index: usize) -> Option<&mut dyn FieldAccess> {
        (index == 0).then_some(self as &mut dyn FieldAccess)
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Post {
    pub id: i64,
    pub user_id: u64,
    pub title: String,
}

impl FieldAccess for Post {
    fn field_values(&self) -> Result<Vec<Value>> {
        Ok(vec![
            self.id.as_value(),
            self.user_id.as_value(),
            self.title.clone().as_value(),
        ])
    }
    fn set_field(&mut self, index: usize, value: Value) -> Result<()> {
        match index {
            0 => self.id = AsValue::try_from_value(value)?,
            1 => self.user_id = AsValue::try_from_value(value)?,
            2 => self.title = AsValue::try_from_value(value)?,
            _ => return Err(Error::msg(format!("Post has no field {}", index))),
        }
        Ok(())
    }
}

impl Record for Post {
    fn field_defs() -> &'static [FieldDef] {
        const FIELDS: &[FieldDef] = &[
            field("id", "id", false, false),
            field("user_id", "user_id", false, false),
            field("title", "title", false, false),
        ];
        FIELDS
    }
}

impl Target for Post {
    fn layout() -> Result<Layout> {
        Layout::of_record::<Self>()
    }
    fn part_mut(&mut self, index: usize) -> Option<&mut dyn FieldAccess> {
        (index == 0).then_some(self as &mut dyn FieldAccess)
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct UserPost {
    pub user: User,
    pub post: Post,
}

impl Joined for UserPost {
    fn join_parts() -> &'static [JoinPart] {
        const PARTS: &[JoinPart] = &[
            JoinPart {
                field: "user",
                alias: "u",
                metadata: RecordMeta::of::<User>,
            },
            JoinPart {
                field: "post",
                alias: "p",
                metadata: RecordMeta::of::<Post>,
            },
        ];
        PARTS
    }
}

impl Target for UserPost {
    fn layout() -> Result<Layout> {
        Layout::of_joined::<Self>()
    }
    fn part_mut(&mut self, index: usize) -> Option<&mut dyn FieldAccess> {
        match index {
            0 => Some(&mut self.user),
            1 => Some(&mut self.post),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct UserPermission {
    pub id: i64,
    pub user_id: i64,
    pub perm_id: i64,
}

impl FieldAccess for UserPermission {
    fn field_values(&self) -> Result<Vec<Value>> {
        Ok(vec![
            self.id.as_value(),
            self.user_id.as_value(),
            self.perm_id.as_value(),
        ])
    }
    fn set_field(&mut self, index: usize, value: Value) -> Result<()> {
        match index {
            0 => self.id = AsValue::try_from_value(value)?,
            1 => self.user_id = AsValue::try_from_value(value)?,
            2 => self.perm_id = AsValue::try_from_value(value)?,
            _ => return Err(Error::msg(format!("UserPermission has no field {}", index))),
        }
        Ok(())
    }
}

impl Record for UserPermission {
    fn field_defs() -> &'static [FieldDef] {
        const FIELDS: &[FieldDef] = &[
            field("id", "id", false, false),
            field("user_id", "user_id", false, false),
            field("perm_id", "perm_id", false, false),
        ];
        FIELDS
    }
}

impl Target for UserPermission {
    fn layout() -> Result<Layout> {
        Layout::of_record::<Self>()
    }
    fn part_mut(&mut self, index: usize) -> Option<&mut dyn FieldAccess> {
        (index == 0).then_some(self as &mut dyn FieldAccess)
    }
}

pub const fn field(
    field: &'static str,
    column: &'static str,
    nullable: bool,
    json: bool,
) -> FieldDef {
    FieldDef {
        field,
        column,
        nullable,
        json,
        public: true,
    }
}

pub fn user_row(id: i64, name: &str, age: Option<i64>, address: Option<&str>) -> Vec<Value> {
    vec![
        Value::Int64(Some(id)),
        Value::Varchar(Some(name.into())),
        Value::Int64(age),
        Value::Varchar(address.map(Into::into)),
    ]
}
