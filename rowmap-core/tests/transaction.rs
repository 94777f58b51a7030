mod mock;

#[cfg(test)]
mod tests {
    use crate::mock::{MockConnection, User};
    use rowmap_core::{Error, Provider, Table, Value};

    #[tokio::test]
    async fn commit() {
        let mut connection = MockConnection::new();
        connection
            .affected(0, None)
            .rows(&["id"], vec![vec![Value::Int64(Some(1))]])
            .affected(1, None)
            .affected(0, None);
        let mut provider = Provider::new(connection);
        let id = provider
            .transaction(async |provider| {
                let mut user = User {
                    name: "User1".into(),
                    ..Default::default()
                };
                provider.insert(&Table::new("users"), &mut user).await?;
                provider.delete(&Table::new("users"), user.id).await?;
                Ok(user.id)
            })
            .await
            .unwrap();
        assert_eq!(id, 1);
        let connection = provider.into_inner();
        let sql = connection.sql();
        assert_eq!(sql.first(), Some(&"BEGIN"));
        assert_eq!(sql.last(), Some(&"COMMIT"));
        assert_eq!(sql.len(), 4);
    }

    #[tokio::test]
    async fn rollback_keeps_the_error() {
        let mut connection = MockConnection::new();
        connection.affected(0, None).affected(1, None);
        let mut provider = Provider::new(connection);
        let error = provider
            .transaction(async |provider| -> rowmap_core::Result<()> {
                provider
                    .exec("UPDATE users SET age = $1", &[42.into()])
                    .await?;
                Err(Error::msg("fake-error"))
            })
            .await
            .unwrap_err();
        assert_eq!(format!("{error:#}"), "fake-error");
        assert_eq!(
            provider.into_inner().sql(),
            ["BEGIN", "UPDATE users SET age = $1", "ROLLBACK"]
        );
    }

    #[tokio::test]
    async fn rollback_on_query_error() {
        let mut connection = MockConnection::new();
        connection.affected(0, None).fail("constraint failed");
        let mut provider = Provider::new(connection);
        let error = provider
            .transaction(async |provider| {
                provider.exec("INSERT INTO users DEFAULT VALUES", &[]).await?;
                Ok(())
            })
            .await
            .unwrap_err();
        assert!(format!("{error:#}").contains("constraint failed"));
        assert_eq!(provider.into_inner().sql().last(), Some(&"ROLLBACK"));
    }

    #[tokio::test]
    async fn failed_begin() {
        let mut connection = MockConnection::new();
        connection.fail("database is locked");
        let mut provider = Provider::new(connection);
        let mut called = false;
        let error = provider
            .transaction(async |_| {
                called = true;
                Ok(())
            })
            .await
            .unwrap_err();
        assert!(!called);
        assert!(format!("{error:#}").contains("Could not begin the transaction"));
    }

    #[tokio::test]
    async fn failed_commit() {
        let mut connection = MockConnection::new();
        connection.affected(0, None).fail("disk I/O error");
        let mut provider = Provider::new(connection);
        let error = provider
            .transaction(async |_| Ok(()))
            .await
            .unwrap_err();
        let message = format!("{error:#}");
        assert!(message.contains("Could not commit the transaction"), "{message}");
        assert!(message.contains("disk I/O error"), "{message}");
    }

    #[tokio::test]
    async fn failed_rollback() {
        let mut connection = MockConnection::new();
        connection.affected(0, None).fail("connection reset");
        let mut provider = Provider::new(connection);
        let error = provider
            .transaction(async |_| -> rowmap_core::Result<()> { Err(Error::msg("fake-error")) })
            .await
            .unwrap_err();
        let message = format!("{error:#}");
        assert!(message.contains("fake-error"), "{message}");
        assert!(message.contains("connection reset"), "{message}");
    }
}
