use crate::{Address, Post, User, UserPost, create_tables, p};
use rowmap::{Connection, Provider, Value, is_config_error};

pub async fn query<C: Connection>(provider: &mut Provider<C>) {
    create_tables(provider)
        .await
        .expect("Could not create the test tables");

    // No results
    let mut users = vec![User::default()];
    provider
        .query(&mut users, "FROM users WHERE id=1", &[])
        .await
        .expect("Failed to query an empty table");
    assert!(users.is_empty(), "The output vector must be cleared");

    // One user
    let insert = format!(
        "INSERT INTO users (name, age, address) VALUES ({}, {}, {})",
        p(provider, 0),
        p(provider, 1),
        p(provider, 2)
    );
    provider
        .exec(
            &insert,
            &["Bia".into(), 0.into(), r#"{"country":"BR"}"#.into()],
        )
        .await
        .expect("Failed to insert Bia");
    let sql = format!("FROM users WHERE name = {}", p(provider, 0));
    provider
        .query(&mut users, &sql, &["Bia".into()])
        .await
        .expect("Failed to query Bia");
    assert_eq!(users.len(), 1);
    assert_ne!(users[0].id, 0);
    assert_eq!(users[0].name, "Bia");
    assert_eq!(
        users[0].address,
        Address {
            country: "BR".into(),
            ..Default::default()
        }
    );

    // Multiple users
    for (name, country) in [("João Garcia", "US"), ("Bia Garcia", "BR")] {
        provider
            .exec(
                &insert,
                &[name.into(), 0.into(), format!(r#"{{"country":"{}"}}"#, country).into()],
            )
            .await
            .expect("Failed to insert a Garcia");
    }
    let sql = format!("FROM users WHERE name like {} ORDER BY id", p(provider, 0));
    provider
        .query(&mut users, &sql, &["% Garcia".into()])
        .await
        .expect("Failed to query the Garcias");
    assert_eq!(users.len(), 2);
    assert_eq!(users[0].name, "João Garcia");
    assert_eq!(users[0].address.country, "US");
    assert_eq!(users[1].name, "Bia Garcia");
    assert_eq!(users[1].address.country, "BR");

    // Boxed records
    let mut boxed = Vec::<Box<User>>::new();
    provider
        .query(&mut boxed, &sql, &["% Garcia".into()])
        .await
        .expect("Failed to query the Garcias into boxes");
    assert_eq!(boxed.len(), 2);
    assert_eq!(*boxed[0], users[0]);
    assert_eq!(*boxed[1], users[1]);

    // Joined tables
    let joao = users[0].clone();
    let bia = users[1].clone();
    let insert_post = format!(
        "INSERT INTO posts (user_id, title) VALUES ({}, {})",
        p(provider, 0),
        p(provider, 1)
    );
    for (user, title) in [
        (&joao, "João Post1"),
        (&bia, "Bia Post1"),
        (&bia, "Bia Post2"),
    ] {
        provider
            .exec(&insert_post, &[user.id.into(), title.into()])
            .await
            .expect("Failed to insert a post");
    }
    let mut rows = Vec::<UserPost>::new();
    let sql = format!(
        "FROM users u JOIN posts p ON p.user_id = u.id WHERE u.name like {} ORDER BY u.id, p.id",
        p(provider, 0)
    );
    provider
        .query(&mut rows, &sql, &["% Garcia".into()])
        .await
        .expect("Failed to query the joined tables");
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].user, joao);
    assert_eq!(rows[0].post.title, "João Post1");
    assert_eq!(rows[1].user, bia);
    assert_eq!(
        rows[2].post,
        Post {
            id: rows[2].post.id,
            user_id: bia.id,
            title: "Bia Post2".into()
        }
    );

    // Errors
    let error = provider
        .query(&mut users, "SELECT * FROM not a valid query", &[])
        .await
        .expect_err("An invalid query must fail");
    assert!(format!("{:#}", error).contains("error running query"));

    let error = provider
        .query(
            &mut rows,
            "SELECT * FROM users u JOIN posts p ON p.user_id = u.id",
            &[],
        )
        .await
        .expect_err("A joined struct cannot be used with SELECT");
    assert!(is_config_error(&error));
    assert!(format!("{}", error).contains("nested struct"));

    let error = provider
        .query(&mut users, "FROM users WHERE name = 'Bia'", &[Value::from(1)])
        .await
        .expect_err("Unused parameters must be reported");
    assert!(format!("{:#}", error).contains("error running query"));
}
