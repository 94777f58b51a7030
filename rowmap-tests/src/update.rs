use crate::{User, create_tables, p, user_by_id, user_by_name, users_table};
use rowmap::{Connection, Provider, Record, Table, is_record_not_found};

#[derive(Debug, Default, Record)]
pub struct PartialUser {
    #[rowmap(column = "id")]
    pub id: u64,
    #[rowmap(column = "name")]
    pub name: String,
    #[rowmap(column = "age")]
    pub age: Option<i32>,
}

async fn insert_raw<C: Connection>(provider: &mut Provider<C>, name: &str, age: i32) -> User {
    let sql = format!(
        "INSERT INTO users (name, age) VALUES ({}, {})",
        p(provider, 0),
        p(provider, 1)
    );
    provider
        .exec(&sql, &[name.into(), age.into()])
        .await
        .expect("Failed to insert a user");
    let user = user_by_name(provider, name)
        .await
        .expect("Failed to read the user back");
    assert_ne!(user.id, 0);
    user
}

pub async fn update<C: Connection>(provider: &mut Provider<C>) {
    create_tables(provider)
        .await
        .expect("Could not create the test tables");

    // Whole record
    let user = insert_raw(provider, "Letícia", 0).await;
    provider
        .update(
            &users_table(),
            &User {
                id: user.id,
                name: "Thayane".into(),
                ..Default::default()
            },
        )
        .await
        .expect("Failed to update Letícia");
    let result = user_by_id(provider, user.id)
        .await
        .expect("Failed to read the user back");
    assert_eq!(result.name, "Thayane");

    // A None field is left unchanged, an empty string is written
    let user = insert_raw(provider, "Letícia 22", 22).await;
    provider
        .update(
            &users_table(),
            &PartialUser {
                id: user.id,
                name: "".into(),
                age: None,
            },
        )
        .await
        .expect("Failed to update partially");
    let result = user_by_id(provider, user.id)
        .await
        .expect("Failed to read the user back");
    assert_eq!(result.name, "");
    assert_eq!(result.age, 22);

    provider
        .update(
            &users_table(),
            &PartialUser {
                id: user.id,
                name: "Thay".into(),
                age: Some(42),
            },
        )
        .await
        .expect("Failed to update every field");
    let result = user_by_id(provider, user.id)
        .await
        .expect("Failed to read the user back");
    assert_eq!(result.name, "Thay");
    assert_eq!(result.age, 42);

    // Errors
    let error = provider
        .update(
            &users_table(),
            &User {
                id: 4200,
                name: "Thayane".into(),
                ..Default::default()
            },
        )
        .await
        .expect_err("Updating a missing row must fail");
    assert!(is_record_not_found(&error));

    let error = provider
        .update(
            &Table::new("non_existing_table"),
            &User {
                id: 1,
                name: "Thayane".into(),
                ..Default::default()
            },
        )
        .await
        .expect_err("Updating a missing table must fail");
    assert!(format!("{:#}", error).contains("non_existing_table"));
}
