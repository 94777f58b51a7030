use crate::{User, create_tables, permissions_by_user, user_by_id, user_by_name, users_table};
use rowmap::{Connection, InsertMethod, Provider, Record, Table};

#[derive(Debug, Default, Record)]
pub struct UserByName {
    #[rowmap(column = "name")]
    pub name: String,
    #[rowmap(column = "age")]
    pub age: i32,
}

#[derive(Debug, Default, Record)]
pub struct NonExisting {
    #[rowmap(column = "id")]
    pub id: String,
    #[rowmap(column = "non_existing")]
    pub non_existing_column: i32,
    #[rowmap(column = "name")]
    pub name: String,
}

#[derive(Debug, Default, Record)]
pub struct BrokenId {
    #[rowmap(column = "non_existing_id")]
    pub id: String,
    #[rowmap(column = "age")]
    pub age: i32,
    #[rowmap(column = "name")]
    pub name: String,
}

pub async fn insert<C: Connection>(provider: &mut Provider<C>) {
    create_tables(provider)
        .await
        .expect("Could not create the test tables");
    let method = provider.dialect().insert_method();

    // One user
    let mut user = User {
        name: "Fernanda".into(),
        ..Default::default()
    };
    user.address.country = "Brazil".into();
    provider
        .insert(&users_table(), &mut user)
        .await
        .expect("Failed to insert Fernanda");
    assert_ne!(user.id, 0);
    let result = user_by_id(provider, user.id)
        .await
        .expect("Failed to read Fernanda back");
    assert_eq!(result, user);

    // Several ID columns with last insert id: nothing is written back
    if method == InsertMethod::LastInsertId {
        let mut user = User {
            name: "No ID returned".into(),
            age: 3434,
            ..Default::default()
        };
        provider
            .insert(&Table::with_ids("users", ["id", "name"]), &mut user)
            .await
            .expect("Failed to insert with two ID columns");
        assert_eq!(user.id, 0);
        let result = user_by_name(provider, "No ID returned")
            .await
            .expect("Failed to read the user back");
        assert_eq!(result.age, 3434);
    }

    // Preset ID
    let mut preset = UserByName {
        name: "Preset Name".into(),
        age: 5455,
    };
    provider
        .insert(&Table::with_ids("users", ["name"]), &mut preset)
        .await
        .expect("Failed to insert with a preset ID");
    let result = user_by_name(provider, "Preset Name")
        .await
        .expect("Failed to read the preset user back");
    assert_eq!(result.age, 5455);

    // The ID is not mapped by the struct
    provider
        .insert(
            &users_table(),
            &mut UserByName {
                name: "Inserted With no ID".into(),
                age: 42,
            },
        )
        .await
        .expect("Failed to insert without ID field");
    let result = user_by_name(provider, "Inserted With no ID")
        .await
        .expect("Failed to read the user back");
    assert_ne!(result.id, 0);
    assert_eq!(result.age, 42);

    // Composite keys
    let permissions = Table::with_ids("user_permissions", ["id", "user_id", "perm_id"]);
    let mut permission = crate::UserPermission {
        user_id: 1,
        perm_id: 42,
        ..Default::default()
    };
    provider
        .insert(&permissions, &mut permission)
        .await
        .expect("Failed to insert into a composite key table");
    let stored = permissions_by_user(provider, 1)
        .await
        .expect("Failed to read the permissions back");
    assert_eq!(stored.len(), 1);
    assert_eq!((stored[0].user_id, stored[0].perm_id), (1, 42));

    let mut permission = crate::UserPermission {
        user_id: 2,
        perm_id: 42,
        ..Default::default()
    };
    provider
        .insert(&permissions, &mut permission)
        .await
        .expect("Failed to insert partially provided keys");
    let stored = permissions_by_user(provider, 2)
        .await
        .expect("Failed to read the permissions back");
    assert_eq!(stored.len(), 1);
    assert_eq!((stored[0].user_id, stored[0].perm_id), (2, 42));
    if method.returns_row() {
        assert_ne!(permission.id, 0);
        assert_eq!(stored[0].id, permission.id);
    } else {
        assert_eq!(permission.id, 0);
    }

    // Errors
    let error = provider
        .insert(&Table::with_ids("users", [""]), &mut User::default())
        .await
        .expect_err("An empty ID column must be rejected");
    let message = format!("{}", error);
    assert!(message.contains("rowmap::Table") && message.contains("ID"));
    assert!(message.contains("empty string"));

    let error = provider
        .insert(&Table::new(""), &mut User::default())
        .await
        .expect_err("An empty table name must be rejected");
    let message = format!("{}", error);
    assert!(message.contains("rowmap::Table") && message.contains("table name"));

    let error = provider
        .insert(
            &users_table(),
            &mut NonExisting {
                non_existing_column: 42,
                name: "fake-name".into(),
                ..Default::default()
            },
        )
        .await
        .expect_err("A column missing in the database must fail");
    let message = format!("{:#}", error);
    assert!(message.contains("column"), "{}", message);
    assert!(message.contains("non_existing"), "{}", message);

    let _ = provider
        .insert(
            &users_table(),
            &mut BrokenId {
                age: 42,
                name: "fake-name".into(),
                ..Default::default()
            },
        )
        .await;
    let _ = provider
        .insert(
            &Table::with_ids("users", ["non_existing_id"]),
            &mut BrokenId {
                age: 42,
                name: "fake-name".into(),
                ..Default::default()
            },
        )
        .await;
}
