#[cfg(test)]
mod tests {
    use rowmap_core::{Connection, Executor, Provider, Value};
    use rowmap_sqlite::SqliteConnection;
    use rowmap_tests::{init_logs, silent_logs};
    use std::{path::Path, sync::Mutex};
    use tokio::fs;

    static MUTEX: Mutex<()> = Mutex::new(());

    #[tokio::test]
    async fn create_database() {
        init_logs();
        const DB_PATH: &'static str = "../target/debug/creation.sqlite";
        let _guard = MUTEX.lock().unwrap();
        if Path::new(DB_PATH).exists() {
            fs::remove_file(DB_PATH)
                .await
                .expect(format!("Failed to remove test database file {}", DB_PATH).as_str());
        }
        SqliteConnection::connect(&format!("sqlite://{}?mode=rwc", DB_PATH))
            .await
            .expect("Could not create the database");
        assert!(
            Path::new(DB_PATH).exists(),
            "Database file should be created after connection"
        );
        SqliteConnection::connect(&format!("sqlite://{}?mode=ro", DB_PATH))
            .await
            .expect("Could not open the database read only");
        fs::remove_file(DB_PATH)
            .await
            .expect(format!("Failed to remove test database file {}", DB_PATH).as_str());
        assert!(
            SqliteConnection::connect(&format!("sqlite://{}?mode=ro", DB_PATH))
                .await
                .is_err(),
            "Should not be able to open in read only unexisting database"
        );
    }

    #[tokio::test]
    async fn wrong_url() {
        silent_logs! {
            assert!(
                SqliteConnection::connect("postgres://some_value")
                    .await
                    .is_err()
            );
        };
    }

    #[tokio::test]
    async fn affected_rows_and_last_id() {
        init_logs();
        let mut connection = SqliteConnection::connect("sqlite://:memory:")
            .await
            .expect("Could not open the in-memory database");
        connection
            .execute("CREATE TABLE t (id INTEGER PRIMARY KEY, v INTEGER)".into())
            .await
            .expect("Could not create the table");
        let result = connection
            .execute("INSERT INTO t (v) VALUES (1), (2), (3)".into())
            .await
            .expect("Could not insert");
        assert_eq!(result.rows_affected, 3);
        assert_eq!(result.last_affected_id, Some(3));

        // Several statements in one call, parameters are consumed in order
        let mut provider = Provider::new(connection);
        let result = provider
            .exec(
                "UPDATE t SET v = ? WHERE id = 1; DELETE FROM t WHERE v = ?",
                &[Value::from(10), Value::from(2)],
            )
            .await
            .expect("Could not run the statements");
        assert_eq!(result.rows_affected, 2);

        let error = provider
            .exec("SELECT * FROM t", &[Value::from(1)])
            .await
            .expect_err("Unused parameters must be reported");
        assert!(format!("{:#}", error).contains("error running query"));
    }

    #[tokio::test]
    async fn transaction_rolls_back_on_drop() {
        init_logs();
        let mut connection = SqliteConnection::connect("sqlite://:memory:")
            .await
            .expect("Could not open the in-memory database");
        connection
            .execute("CREATE TABLE t (v INTEGER)".into())
            .await
            .expect("Could not create the table");
        {
            let mut transaction = connection.begin().await.expect("Could not begin");
            transaction
                .execute("INSERT INTO t VALUES (1)".into())
                .await
                .expect("Could not insert");
        }
        let mut provider = Provider::new(connection);
        let mut values = provider.rows("SELECT v FROM t", &[]);
        assert!(!values.next().await.expect("Could not read the table"));
    }
}
