use crate::{User, create_tables, p, users_table};
use rowmap::{Connection, Provider, Record};

#[derive(Debug, Default, PartialEq, Record)]
pub struct UserAge {
    #[rowmap(column = "id")]
    pub id: u64,
    #[rowmap(column = "age")]
    pub age: i32,
}

pub async fn scan_rows<C: Connection>(provider: &mut Provider<C>) {
    create_tables(provider)
        .await
        .expect("Could not create the test tables");
    for (name, age) in [("User1", 22), ("User2", 14), ("User3", 43)] {
        let mut user = User {
            name: name.into(),
            age,
            ..Default::default()
        };
        user.address.country = "BR".into();
        provider
            .insert(&users_table(), &mut user)
            .await
            .expect("Failed to insert a user");
    }

    let sql = format!(
        "SELECT * FROM users WHERE name = {} ORDER BY id",
        p(provider, 0)
    );
    let mut rows = provider.rows(&sql, &["User2".into()]);
    assert!(rows.next().await.expect("Failed to advance the rows"));
    let mut user = User::default();
    rows.scan(&mut user).expect("Failed to scan the user");
    assert_ne!(user.id, 0);
    assert_eq!(user.name, "User2");
    assert_eq!(user.age, 14);
    assert_eq!(user.address.country, "BR");
    assert!(!rows.next().await.expect("Failed to reach the end"));
    drop(rows);

    // Columns missing from the struct are ignored
    let mut rows = provider.rows("SELECT * FROM users ORDER BY id", &[]);
    let mut ages = Vec::new();
    while rows.next().await.expect("Failed to advance the rows") {
        let mut user = UserAge::default();
        rows.scan(&mut user).expect("Failed to scan the partial user");
        assert_ne!(user.id, 0);
        ages.push(user.age);
    }
    drop(rows);
    assert_eq!(ages, [22, 14, 43]);

    // A closed cursor cannot be used anymore
    let mut rows = provider.rows("SELECT * FROM users ORDER BY id", &[]);
    assert!(rows.next().await.expect("Failed to advance the rows"));
    rows.close().expect("Failed to close the rows");
    assert!(rows.is_closed());
    assert!(rows.next().await.is_err());
    assert!(rows.scan(&mut UserAge::default()).is_err());
}
