use crate::{User, create_tables, users_table};
use rowmap::{Connection, Error, Provider};

pub async fn transaction<C: Connection>(provider: &mut Provider<C>) {
    create_tables(provider)
        .await
        .expect("Could not create the test tables");
    let mut u1 = User {
        name: "User1".into(),
        ..Default::default()
    };
    let mut u2 = User {
        name: "User2".into(),
        ..Default::default()
    };
    for user in [&mut u1, &mut u2] {
        provider
            .insert(&users_table(), user)
            .await
            .expect("Failed to insert a user");
    }

    // Commit
    let users = provider
        .transaction(async |tx| {
            let mut users = Vec::<User>::new();
            tx.query(&mut users, "FROM users ORDER BY id ASC", &[]).await?;
            Ok(users)
        })
        .await
        .expect("Failed to query inside a transaction");
    assert_eq!(users, [u1.clone(), u2.clone()]);

    // Rollback
    let error = provider
        .transaction(async |tx| -> rowmap::Result<()> {
            for name in ["User3", "User4"] {
                let mut user = User {
                    name: name.into(),
                    ..Default::default()
                };
                tx.insert(&users_table(), &mut user).await?;
            }
            let sql = format!("UPDATE users SET age = {}", tx.dialect().placeholder(0));
            tx.exec(&sql, &[42.into()]).await?;
            Err(Error::msg("fake-error"))
        })
        .await
        .expect_err("The error of the callback must be returned");
    assert_eq!(error.to_string(), "fake-error");

    let mut users = Vec::<User>::new();
    provider
        .query(&mut users, "FROM users ORDER BY id ASC", &[])
        .await
        .expect("Failed to query the users after the rollback");
    assert_eq!(users, [u1, u2]);
}
