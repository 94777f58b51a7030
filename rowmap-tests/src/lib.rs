mod delete;
mod insert;
mod models;
mod query;
mod query_chunks;
mod query_one;
mod scan_rows;
mod transaction;
mod update;

use delete::delete;
use insert::insert;
use log::LevelFilter;
use query::query;
use query_chunks::query_chunks;
use query_one::query_one;
use rowmap::{Connection, Provider, Result};
use scan_rows::scan_rows;
use std::env;
use transaction::transaction;
use update::update;

pub use models::*;

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

/// Runs every scenario against `connection`. The tables `users`, `posts`
/// and `user_permissions` are dropped and created again along the way.
pub async fn execute_tests<C: Connection>(connection: C) {
    let mut provider = Provider::new(connection);
    query(&mut provider).await;
    query_one(&mut provider).await;
    insert(&mut provider).await;
    delete(&mut provider).await;
    update(&mut provider).await;
    query_chunks(&mut provider).await;
    transaction(&mut provider).await;
    scan_rows(&mut provider).await;
}

/// Drop and create the test tables with the column types of the dialect in use.
pub async fn create_tables<C: Connection>(provider: &mut Provider<C>) -> Result<()> {
    for table in ["users", "posts", "user_permissions"] {
        let _ = provider.exec(&format!("DROP TABLE {}", table), &[]).await;
    }
    let statements: [&str; 3] = match provider.dialect().name() {
        "postgres" => [
            "CREATE TABLE users (id serial PRIMARY KEY, age INT, name VARCHAR(50), address jsonb)",
            "CREATE TABLE posts (id serial PRIMARY KEY, user_id INT, title VARCHAR(50))",
            "CREATE TABLE user_permissions (id serial PRIMARY KEY, user_id INT, perm_id INT, UNIQUE (user_id, perm_id))",
        ],
        "mysql" => [
            "CREATE TABLE users (id INT AUTO_INCREMENT PRIMARY KEY, age INT, name VARCHAR(50), address JSON)",
            "CREATE TABLE posts (id INT AUTO_INCREMENT PRIMARY KEY, user_id INT, title VARCHAR(50))",
            "CREATE TABLE user_permissions (id INT AUTO_INCREMENT PRIMARY KEY, user_id INT, perm_id INT, UNIQUE KEY (user_id, perm_id))",
        ],
        "sqlserver" => [
            "CREATE TABLE users (id INT IDENTITY(1,1) PRIMARY KEY, age INT, name VARCHAR(50), address NVARCHAR(4000))",
            "CREATE TABLE posts (id INT IDENTITY(1,1) PRIMARY KEY, user_id INT, title VARCHAR(50))",
            "CREATE TABLE user_permissions (id INT IDENTITY(1,1) PRIMARY KEY, user_id INT, perm_id INT, CONSTRAINT unique_1 UNIQUE (user_id, perm_id))",
        ],
        _ => [
            "CREATE TABLE users (id INTEGER PRIMARY KEY, age INTEGER, name TEXT, address BLOB)",
            "CREATE TABLE posts (id INTEGER PRIMARY KEY, user_id INTEGER, title TEXT)",
            "CREATE TABLE user_permissions (id INTEGER PRIMARY KEY, user_id INTEGER, perm_id INTEGER, UNIQUE (user_id, perm_id))",
        ],
    };
    for sql in statements {
        provider.exec(sql, &[]).await?;
    }
    Ok(())
}

#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        $($code)+
        log::set_max_level(level);
    }};
}
