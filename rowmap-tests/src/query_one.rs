use crate::{User, UserPost, create_tables, p, users_table};
use rowmap::{Connection, Provider, is_config_error, is_record_not_found};

pub async fn query_one<C: Connection>(provider: &mut Provider<C>) {
    create_tables(provider)
        .await
        .expect("Could not create the test tables");

    let mut user = User::default();
    let error = provider
        .query_one(&mut user, "FROM users WHERE id=1", &[])
        .await
        .expect_err("Querying an empty table must fail");
    assert!(is_record_not_found(&error));

    for name in ["Bia", "Bia Garcia", "João Garcia"] {
        let mut user = User {
            name: name.into(),
            ..Default::default()
        };
        provider
            .insert(&users_table(), &mut user)
            .await
            .expect("Failed to insert a user");
    }

    let sql = format!("FROM users WHERE name = {}", p(provider, 0));
    provider
        .query_one(&mut user, &sql, &["Bia".into()])
        .await
        .expect("Failed to query Bia");
    assert_ne!(user.id, 0);
    assert_eq!(user.name, "Bia");

    // Only the first of multiple matches
    let sql = format!("FROM users WHERE name like {} ORDER BY id ASC", p(provider, 0));
    provider
        .query_one(&mut user, &sql, &["% Garcia".into()])
        .await
        .expect("Failed to query the Garcias");
    assert_eq!(user.name, "Bia Garcia");

    // Column labels match case-insensitively
    let dialect = provider.dialect();
    let sql = format!(
        "SELECT id AS {}, name AS {} FROM users WHERE name = {}",
        dialect.escape("ID"),
        dialect.escape("NAME"),
        p(provider, 0)
    );
    let mut user = User::default();
    provider
        .query_one(&mut user, &sql, &["João Garcia".into()])
        .await
        .expect("Failed to query upper case labels");
    assert_ne!(user.id, 0);
    assert_eq!(user.name, "João Garcia");

    // Joined tables
    let insert_post = format!(
        "INSERT INTO posts (user_id, title) VALUES ({}, {})",
        p(provider, 0),
        p(provider, 1)
    );
    provider
        .exec(&insert_post, &[user.id.into(), "João Post1".into()])
        .await
        .expect("Failed to insert a post");
    let mut row = UserPost::default();
    let sql = format!(
        "FROM users u JOIN posts p ON p.user_id = u.id WHERE u.name = {}",
        p(provider, 0)
    );
    provider
        .query_one(&mut row, &sql, &["João Garcia".into()])
        .await
        .expect("Failed to query the joined tables");
    assert_eq!(row.user.id, user.id);
    assert_eq!(row.post.user_id, user.id);
    assert_eq!(row.post.title, "João Post1");

    // Errors
    let error = provider
        .query_one(&mut user, "SELECT * FROM not a valid query", &[])
        .await
        .expect_err("An invalid query must fail");
    assert!(format!("{:#}", error).contains("error running query"));

    let error = provider
        .query_one(
            &mut row,
            "SELECT * FROM users u JOIN posts p ON p.user_id = u.id",
            &[],
        )
        .await
        .expect_err("A joined struct cannot be used with SELECT");
    assert!(is_config_error(&error));
}
