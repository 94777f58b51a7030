mod mock;

#[cfg(test)]
mod tests {
    use crate::mock::{Address, MockConnection, Post, User, UserPermission, UserPost, user_row};
    use indoc::indoc;
    use rowmap_core::{
        DeleteKey, Dialect, InsertMethod, MySqlDialect, Provider, QueryResult, RowLabeled,
        SqlServerDialect, Table, Value, is_config_error, is_record_not_found,
    };
    use std::collections::{BTreeMap, HashMap};

    const USER_COLUMNS: &[&str] = &["id", "name", "age", "address"];

    /// A database that cannot report the identifiers it generates.
    #[derive(Debug)]
    struct NoIdDialect;

    impl Dialect for NoIdDialect {
        fn name(&self) -> &'static str {
            "noid"
        }
        fn insert_method(&self) -> InsertMethod {
            InsertMethod::NoIdRetrieval
        }
        fn write_placeholder(&self, out: &mut String, _index: usize) {
            out.push('?');
        }
    }

    #[tokio::test]
    async fn query_builds_select_and_scans() {
        let mut connection = MockConnection::new();
        connection.rows(
            USER_COLUMNS,
            vec![
                user_row(1, "João Garcia", Some(0), Some(r#"{"country":"US"}"#)),
                user_row(2, "Bia Garcia", None, Some(r#"{"country":"BR"}"#)),
            ],
        );
        let mut provider = Provider::new(connection);
        let mut users = vec![User::default()];
        provider
            .query(&mut users, "FROM users WHERE name like $1", &["% Garcia".into()])
            .await
            .unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].id, 1);
        assert_eq!(users[0].name, "João Garcia");
        assert_eq!(users[0].age, Some(0));
        assert_eq!(users[0].address.country, "US");
        assert_eq!(users[1].age, None);
        assert_eq!(users[1].address.country, "BR");
        let connection = provider.into_inner();
        assert_eq!(
            connection.sql(),
            [r#"SELECT "id", "name", "age", "address" FROM users WHERE name like $1"#]
        );
        assert_eq!(
            connection.statements[0].params,
            [Value::Varchar(Some("% Garcia".into()))]
        );
    }

    #[tokio::test]
    async fn query_zero_rows() {
        let mut connection = MockConnection::new();
        connection.rows(USER_COLUMNS, vec![]);
        let mut provider = Provider::new(connection);
        let mut users = Vec::<User>::new();
        provider
            .query(&mut users, "SELECT * FROM users WHERE id=1", &[])
            .await
            .unwrap();
        assert!(users.is_empty());
    }

    #[tokio::test]
    async fn query_ignores_extra_columns_and_case() {
        let mut connection = MockConnection::new();
        connection.rows(
            &["ID", "extra", "Name", "count(*)"],
            vec![vec![
                Value::Int64(Some(3)),
                Value::Varchar(Some("ignored".into())),
                Value::Varchar(Some("Bia".into())),
                Value::Int64(Some(10)),
            ]],
        );
        let mut provider = Provider::new(connection);
        let mut users = Vec::<User>::new();
        provider
            .query(&mut users, "SELECT *, 'ignored' AS extra FROM users", &[])
            .await
            .unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, 3);
        assert_eq!(users[0].name, "Bia");
        assert_eq!(users[0].address, Address::default());
    }

    #[tokio::test]
    async fn query_joined() {
        let mut connection = MockConnection::new();
        let mut row = user_row(1, "João Ribeiro", Some(0), None);
        row.extend([
            Value::Int64(Some(10)),
            Value::Int64(Some(1)),
            Value::Varchar(Some("João Post1".into())),
        ]);
        connection.rows(
            &["id", "name", "age", "address", "id", "user_id", "title"],
            vec![row],
        );
        let mut provider = Provider::new(connection);
        let mut rows = Vec::<UserPost>::new();
        provider
            .query(
                &mut rows,
                "FROM users u JOIN posts p ON p.user_id = u.id ORDER BY u.id, p.id",
                &[],
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].user.name, "João Ribeiro");
        assert_eq!(
            rows[0].post,
            Post {
                id: 10,
                user_id: 1,
                title: "João Post1".into()
            }
        );
        assert_eq!(
            provider.into_inner().sql(),
            [indoc! {r#"
                SELECT "u"."id", "u"."name", "u"."age", "u"."address", "p"."id", "p"."user_id", "p"."title" FROM users u JOIN posts p ON p.user_id = u.id ORDER BY u.id, p.id
            "#}
            .trim()]
        );
    }

    #[tokio::test]
    async fn query_boxed_targets() {
        let mut connection = MockConnection::new();
        connection.rows(
            USER_COLUMNS,
            vec![
                user_row(1, "João Garcia", Some(0), Some(r#"{"country":"US"}"#)),
                user_row(2, "Bia Garcia", None, Some(r#"{"country":"BR"}"#)),
            ],
        );
        let mut provider = Provider::new(connection);
        let mut users = Vec::<Box<User>>::new();
        provider
            .query(&mut users, "FROM users WHERE name like $1", &["% Garcia".into()])
            .await
            .unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].name, "João Garcia");
        assert_eq!(users[1].address.country, "BR");
        assert_eq!(
            provider.into_inner().sql(),
            [r#"SELECT "id", "name", "age", "address" FROM users WHERE name like $1"#]
        );

        let mut connection = MockConnection::new();
        connection.rows(&["id", "name"], vec![]);
        let mut provider = Provider::new(connection);
        let mut user = Box::new(User::default());
        let error = provider
            .query_one(&mut user, "FROM users WHERE id = $1", &[1.into()])
            .await
            .unwrap_err();
        assert!(is_record_not_found(&error));
    }

    #[tokio::test]
    async fn query_boxed_joined_rejects_select() {
        let mut provider = Provider::new(MockConnection::new());
        let mut rows = Vec::<Box<UserPost>>::new();
        let error = provider
            .query(&mut rows, "SELECT * FROM users u JOIN posts p ON u.id = p.user_id", &[])
            .await
            .unwrap_err();
        assert!(is_config_error(&error));
        assert!(provider.into_inner().statements.is_empty());
    }

    #[tokio::test]
    async fn query_joined_rejects_select() {
        let mut provider = Provider::new(MockConnection::new());
        let mut rows = Vec::<UserPost>::new();
        let error = provider
            .query(&mut rows, "SELECT * FROM users u JOIN posts p ON u.id = p.user_id", &[])
            .await
            .unwrap_err();
        assert!(is_config_error(&error));
        assert!(format!("{error}").contains("nested struct"));
        assert!(provider.into_inner().statements.is_empty());
    }

    #[tokio::test]
    async fn query_reports_database_errors() {
        let mut connection = MockConnection::new();
        connection.fail("near \"a\": syntax error");
        let mut provider = Provider::new(connection);
        let mut users = Vec::<User>::new();
        let error = provider
            .query(&mut users, "SELECT * FROM not a valid query", &[])
            .await
            .unwrap_err();
        assert!(format!("{error:#}").contains("error running query"));
        assert!(format!("{error:#}").contains("syntax error"));
    }

    #[tokio::test]
    async fn query_reports_decode_errors() {
        let mut connection = MockConnection::new();
        connection.rows(
            &["id", "name"],
            vec![vec![
                Value::Varchar(Some("not a number".into())),
                Value::Null,
            ]],
        );
        let mut provider = Provider::new(connection);
        let mut users = Vec::<User>::new();
        let error = provider
            .query(&mut users, "SELECT id, name FROM users", &[])
            .await
            .unwrap_err();
        let message = format!("{error:#}");
        assert!(message.contains("`id`"), "{message}");
        assert!(message.contains("User"), "{message}");
    }

    #[tokio::test]
    async fn query_one() {
        let mut connection = MockConnection::new();
        connection
            .rows(USER_COLUMNS, vec![])
            .rows(
                &["id", "NAME"],
                vec![
                    vec![Value::Int64(Some(1)), Value::Varchar(Some("first".into()))],
                    vec![Value::Int64(Some(2)), Value::Varchar(Some("second".into()))],
                ],
            );
        let mut provider = Provider::new(connection);
        let mut user = User::default();
        let error = provider
            .query_one(&mut user, "FROM users WHERE id = $1", &[4200.into()])
            .await
            .unwrap_err();
        assert!(is_record_not_found(&error));
        assert_eq!(user, User::default());

        provider
            .query_one(&mut user, "SELECT id, name FROM users", &[])
            .await
            .unwrap();
        assert_eq!(user.id, 1);
        assert_eq!(user.name, "first");
    }

    #[tokio::test]
    async fn insert_reads_back_returning() {
        let mut connection = MockConnection::new();
        connection.rows(&["id"], vec![vec![Value::Int64(Some(17))]]);
        let mut provider = Provider::new(connection);
        let mut user = User {
            name: "Fernanda".into(),
            ..Default::default()
        };
        provider
            .insert(&Table::new("users"), &mut user)
            .await
            .unwrap();
        assert_eq!(user.id, 17);
    }

    #[tokio::test]
    async fn insert_without_id_retrieval() {
        let mut connection = MockConnection::with_dialect(&NoIdDialect);
        connection.affected(1, Some(55));
        let mut provider = Provider::new(connection);
        let mut user = User {
            name: "Fernanda".into(),
            ..Default::default()
        };
        provider
            .insert(&Table::new("users"), &mut user)
            .await
            .unwrap();
        assert_eq!(user.id, 0);
        let connection = provider.into_inner();
        assert_eq!(
            connection.sql(),
            [indoc! {r#"
                INSERT INTO "users" ("name", "address")
                VALUES (?, ?)
            "#}
            .trim()]
        );
    }

    #[tokio::test]
    async fn insert_reads_back_last_insert_id() {
        let mut connection = MockConnection::with_dialect(&MySqlDialect);
        connection.affected(1, Some(99)).affected(1, Some(100));
        let mut provider = Provider::new(connection);
        let mut user = User {
            name: "Fernanda".into(),
            ..Default::default()
        };
        provider
            .insert(&Table::new("users"), &mut user)
            .await
            .unwrap();
        assert_eq!(user.id, 99);

        let mut user = User {
            name: "No ID returned".into(),
            ..Default::default()
        };
        provider
            .insert(&Table::with_ids("users", ["id", "name"]), &mut user)
            .await
            .unwrap();
        assert_eq!(user.id, 0);
    }

    #[tokio::test]
    async fn insert_composite_output() {
        let mut connection = MockConnection::with_dialect(&SqlServerDialect);
        connection.rows(
            &["id", "user_id", "perm_id"],
            vec![vec![
                Value::Int32(Some(5)),
                Value::Int32(Some(2)),
                Value::Int32(Some(42)),
            ]],
        );
        let mut provider = Provider::new(connection);
        let mut permission = UserPermission {
            user_id: 2,
            perm_id: 42,
            ..Default::default()
        };
        provider
            .insert(
                &Table::with_ids("user_permissions", ["id", "user_id", "perm_id"]),
                &mut permission,
            )
            .await
            .unwrap();
        assert_eq!(permission.id, 5);
    }

    #[tokio::test]
    async fn insert_annotates_errors() {
        let mut connection = MockConnection::new();
        connection.fail("table users has no column named non_existing");
        let mut provider = Provider::new(connection);
        let error = provider
            .insert(&Table::new("users"), &mut User::default())
            .await
            .unwrap_err();
        let message = format!("{error:#}");
        assert!(message.contains("Could not insert into `users`"), "{message}");
        assert!(message.contains("non_existing"), "{message}");

        let error = provider
            .insert(&Table::with_ids("users", [""]), &mut User::default())
            .await
            .unwrap_err();
        assert!(is_config_error(&error));
        assert_eq!(provider.into_inner().statements.len(), 1);
    }

    #[tokio::test]
    async fn update() {
        let mut connection = MockConnection::new();
        connection.affected(1, None).affected(0, None);
        let mut provider = Provider::new(connection);
        let user = User {
            id: 3,
            name: "Thayane".into(),
            ..Default::default()
        };
        provider.update(&Table::new("users"), &user).await.unwrap();
        let error = provider
            .update(
                &Table::new("users"),
                &User {
                    id: 4200,
                    ..user.clone()
                },
            )
            .await
            .unwrap_err();
        assert!(is_record_not_found(&error));
        let connection = provider.into_inner();
        assert_eq!(
            connection.statements[0].sql,
            indoc! {r#"
                UPDATE "users"
                SET "name" = $1, "address" = $2
                WHERE "id" = $3
            "#}
            .trim()
        );
    }

    #[tokio::test]
    async fn delete_keys() {
        let mut connection = MockConnection::new();
        connection
            .affected(1, None)
            .affected(1, None)
            .affected(1, None)
            .affected(1, None)
            .affected(0, None);
        let mut provider = Provider::new(connection);
        let users = Table::new("users");
        let permissions = Table::with_ids("user_permissions", ["user_id", "perm_id"]);
        let user = User {
            id: 8,
            ..Default::default()
        };
        provider.delete(&users, 8u64).await.unwrap();
        provider.delete(&users, &user).await.unwrap();
        provider
            .delete(
                &permissions,
                &UserPermission {
                    id: 1,
                    user_id: 2,
                    perm_id: 42,
                },
            )
            .await
            .unwrap();
        provider
            .delete(
                &permissions,
                HashMap::from([
                    ("user_id".to_string(), Value::from(2)),
                    ("perm_id".to_string(), Value::from(42)),
                ]),
            )
            .await
            .unwrap();
        let error = provider.delete(&users, 4200).await.unwrap_err();
        assert!(is_record_not_found(&error));
        let connection = provider.into_inner();
        assert_eq!(connection.statements[0].params, [Value::UInt64(Some(8))]);
        assert_eq!(connection.statements[1].params, [Value::UInt64(Some(8))]);
        assert_eq!(
            connection.statements[2].sql,
            "DELETE FROM \"user_permissions\"\nWHERE \"user_id\" = $1 AND \"perm_id\" = $2"
        );
        assert_eq!(
            connection.statements[3].params,
            [Value::Int32(Some(2)), Value::Int32(Some(42))]
        );
    }

    #[tokio::test]
    async fn delete_rejects_invalid_keys() {
        let mut provider = Provider::new(MockConnection::new());
        let users = Table::new("users");
        let permissions = Table::with_ids("user_permissions", ["user_id", "perm_id"]);

        let error = provider.delete(&users, &Post::default()).await.unwrap_err();
        let message = format!("{error}");
        assert!(message.contains("invalid value"), "{message}");
        assert!(message.contains("0"), "{message}");

        let error = provider
            .delete(&users, &UserPermission::default())
            .await
            .unwrap_err();
        assert!(format!("{error}").contains("invalid value for required ID field `id`: 0"));

        let error = provider
            .delete(
                &permissions,
                BTreeMap::from([("user_id".to_string(), Value::from(1))]),
            )
            .await
            .unwrap_err();
        assert!(format!("{error}").contains("missing required ID field `perm_id`"));

        let error = provider
            .delete(
                &permissions,
                BTreeMap::from([
                    ("user_id".to_string(), Value::from(1)),
                    ("perm_id".to_string(), Value::Null),
                ]),
            )
            .await
            .unwrap_err();
        assert!(format!("{error}").contains("invalid value for required ID field `perm_id`: nil"));

        let error = provider
            .delete(&permissions, DeleteKey::ByScalar(Value::from(1)))
            .await
            .unwrap_err();
        assert!(format!("{error}").contains("one ID column"));

        let error = provider
            .delete(
                &users,
                DeleteKey::ByRecord(vec![("id", Value::Int64(None)), ("name", "Bia".into())]),
            )
            .await
            .unwrap_err();
        assert!(is_config_error(&error));
        assert!(format!("{error}").ends_with("missing required ID field `id`: nil"));

        let error = provider
            .delete(&users, DeleteKey::ByRecord(vec![("name", "Bia".into())]))
            .await
            .unwrap_err();
        assert!(format!("{error}").ends_with("missing required ID field `id`"));

        let error = provider
            .delete(&Table::with_ids("users", [""]), &User::default())
            .await
            .unwrap_err();
        assert!(format!("{error}").contains("rowmap::Table: ID column cannot be an empty string"));

        let error = provider
            .delete(&Table::new(""), 1)
            .await
            .unwrap_err();
        assert!(format!("{error}").contains("table name"));

        assert!(provider.into_inner().statements.is_empty());
    }

    #[tokio::test]
    async fn rows_cursor() {
        let mut connection = MockConnection::new();
        connection.rows(
            USER_COLUMNS,
            vec![user_row(1, "User1", Some(22), None), user_row(2, "User2", Some(14), None)],
        );
        let mut provider = Provider::new(connection);
        let mut rows = provider.rows("SELECT * FROM users", &[]);
        let mut user = User::default();
        assert!(rows.scan(&mut user).is_err());
        assert!(rows.next().await.unwrap());
        rows.scan(&mut user).unwrap();
        assert_eq!(user.name, "User1");
        assert_eq!(rows.columns().unwrap().len(), 4);
        assert!(rows.next().await.unwrap());
        rows.scan(&mut user).unwrap();
        assert_eq!(user.age, Some(14));
        assert!(!rows.next().await.unwrap());
        assert!(format!("{}", rows.scan(&mut user).unwrap_err()).contains("exhausted"));
        rows.close().unwrap();
        assert!(rows.is_closed());
        assert!(format!("{}", rows.scan(&mut user).unwrap_err()).contains("closed"));
        assert!(rows.next().await.is_err());
    }

    #[tokio::test]
    async fn exec() {
        let mut connection = MockConnection::new();
        connection.response(vec![
            Ok(QueryResult::Row(RowLabeled::new(
                ["x".to_string()].into(),
                [Value::Null].into(),
            ))),
            Ok(rowmap_core::RowsAffected {
                rows_affected: 2,
                last_affected_id: None,
            }
            .into()),
            Ok(rowmap_core::RowsAffected {
                rows_affected: 3,
                last_affected_id: Some(9),
            }
            .into()),
        ]);
        let mut provider = Provider::new(connection);
        let result = provider
            .exec("UPDATE users SET age = $1", &[22.into()])
            .await
            .unwrap();
        assert_eq!(result.rows_affected, 5);
        assert_eq!(result.last_affected_id, Some(9));
    }
}
