use crate::{
    User, UserPermission, create_tables, permissions_by_user, user_by_id, users_table,
};
use rowmap::{Connection, Provider, Record, Table, Value, is_config_error, is_record_not_found};
use std::collections::HashMap;

#[derive(Debug, Default, Record)]
pub struct NameOnly {
    #[rowmap(column = "name")]
    pub name: String,
}

#[derive(Debug, Default, Record)]
pub struct NullableId {
    #[rowmap(column = "id")]
    pub id: Option<i32>,
    #[rowmap(column = "name")]
    pub name: String,
}

#[derive(Debug, Default, Record)]
pub struct ZeroId {
    #[rowmap(column = "id")]
    pub id: i32,
    #[rowmap(column = "name")]
    pub name: String,
}

async fn insert_pair<C: Connection>(provider: &mut Provider<C>) -> (User, User) {
    let mut deleted = User {
        name: "Fernanda".into(),
        ..Default::default()
    };
    let mut kept = User {
        name: "Won't be deleted".into(),
        ..Default::default()
    };
    for user in [&mut deleted, &mut kept] {
        provider
            .insert(&users_table(), user)
            .await
            .expect("Failed to insert a user");
        assert_ne!(user.id, 0);
        let result = user_by_id(provider, user.id)
            .await
            .expect("Failed to read the user back");
        assert_eq!(result.id, user.id);
    }
    (deleted, kept)
}

async fn check_deleted<C: Connection>(provider: &mut Provider<C>, deleted: &User, kept: &User) {
    let error = user_by_id(provider, deleted.id)
        .await
        .expect_err("The user must be deleted");
    assert!(is_record_not_found(&error));
    let result = user_by_id(provider, kept.id)
        .await
        .expect("The other user must be kept");
    assert_eq!(result.name, "Won't be deleted");
}

fn fields(entries: &[(&str, Value)]) -> HashMap<String, Value> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

pub async fn delete<C: Connection>(provider: &mut Provider<C>) {
    create_tables(provider)
        .await
        .expect("Could not create the test tables");

    // Single primary key, by ID
    let (deleted, kept) = insert_pair(provider).await;
    provider
        .delete(&users_table(), deleted.id)
        .await
        .expect("Failed to delete by ID");
    check_deleted(provider, &deleted, &kept).await;

    // By record
    let (deleted, kept) = insert_pair(provider).await;
    provider
        .delete(&users_table(), &deleted)
        .await
        .expect("Failed to delete by record");
    check_deleted(provider, &deleted, &kept).await;

    // Composite keys
    let permissions = Table::with_ids("user_permissions", ["user_id", "perm_id"]);
    for user_id in [1, 2] {
        let mut kept = UserPermission {
            user_id,
            perm_id: 44,
            ..Default::default()
        };
        let mut deleted = UserPermission {
            user_id,
            perm_id: 42,
            ..Default::default()
        };
        for permission in [&mut kept, &mut deleted] {
            provider
                .insert(&Table::new("user_permissions"), permission)
                .await
                .expect("Failed to insert a permission");
            assert_ne!(permission.id, 0);
        }
        if user_id == 1 {
            provider
                .delete(&permissions, &deleted)
                .await
                .expect("Failed to delete by composite record");
        } else {
            provider
                .delete(
                    &permissions,
                    fields(&[("user_id", 2.into()), ("perm_id", 42.into())]),
                )
                .await
                .expect("Failed to delete by composite map");
        }
        let stored = permissions_by_user(provider, user_id)
            .await
            .expect("Failed to read the permissions back");
        assert_eq!(stored, [kept]);
    }

    // Nothing deleted
    let error = provider
        .delete(&users_table(), 4200)
        .await
        .expect_err("Deleting a missing row must fail");
    assert!(is_record_not_found(&error));

    // Invalid keys: single ID
    let error = provider
        .delete(
            &users_table(),
            &NameOnly {
                name: "fake-name".into(),
            },
        )
        .await
        .expect_err("A missing ID must be rejected");
    let message = format!("{}", error);
    assert!(message.contains("missing required") && message.contains("id"));

    let error = provider
        .delete(
            &users_table(),
            &NullableId {
                id: None,
                name: "fake-name".into(),
            },
        )
        .await
        .expect_err("A NULL ID must be rejected");
    let message = format!("{}", error);
    assert!(message.contains("missing required") && message.ends_with("`id`: nil"));

    let error = provider
        .delete(
            &users_table(),
            &ZeroId {
                id: 0,
                name: "fake-name".into(),
            },
        )
        .await
        .expect_err("A zero ID must be rejected");
    let message = format!("{}", error);
    assert!(message.contains("invalid value") && message.contains("0"));

    // Invalid keys: several IDs
    let error = provider
        .delete(
            &permissions,
            fields(&[("user_id", 1.into()), ("name", "fake-name".into())]),
        )
        .await
        .expect_err("A missing perm_id must be rejected");
    let message = format!("{}", error);
    assert!(message.contains("missing required") && message.contains("perm_id"));

    let error = provider
        .delete(
            &permissions,
            fields(&[("user_id", 1.into()), ("perm_id", Value::Null)]),
        )
        .await
        .expect_err("A NULL perm_id must be rejected");
    let message = format!("{}", error);
    assert!(message.contains("invalid value") && message.contains("nil"));
    assert!(message.contains("perm_id"));

    let error = provider
        .delete(
            &permissions,
            fields(&[("user_id", 1.into()), ("perm_id", 0.into())]),
        )
        .await
        .expect_err("A zero perm_id must be rejected");
    let message = format!("{}", error);
    assert!(message.contains("invalid value") && message.contains("perm_id"));

    // Invalid tables
    let error = provider
        .delete(
            &Table::with_ids("users", [""]),
            &User {
                id: 42,
                ..Default::default()
            },
        )
        .await
        .expect_err("An empty ID column must be rejected");
    assert!(is_config_error(&error));
    let message = format!("{}", error);
    assert!(message.contains("rowmap::Table") && message.contains("empty string"));

    let error = provider
        .delete(&Table::new(""), &User::default())
        .await
        .expect_err("An empty table name must be rejected");
    let message = format!("{}", error);
    assert!(message.contains("table name") && message.contains("empty string"));
}
