use crate::{Address, User, UserPost, create_tables, p, users_table};
use rowmap::{AbortIteration, ChunkParser, Connection, Error, Provider, is_config_error};

async fn insert_users<C: Connection>(provider: &mut Provider<C>, names: &[&str]) -> Vec<User> {
    let mut users = Vec::with_capacity(names.len());
    for name in names {
        let mut user = User {
            name: name.to_string(),
            ..Default::default()
        };
        provider
            .insert(&users_table(), &mut user)
            .await
            .expect("Failed to insert a user");
        users.push(user);
    }
    users
}

/// Pops the next outcome of the chunk callback, `Ok` once they run out.
fn shift(outcomes: &mut Vec<Option<Error>>) -> rowmap::Result<()> {
    if outcomes.is_empty() {
        return Ok(());
    }
    match outcomes.remove(0) {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

pub async fn query_chunks<C: Connection>(provider: &mut Provider<C>) {
    for prefix in ["SELECT * ", ""] {
        // A single row
        create_tables(provider)
            .await
            .expect("Could not create the test tables");
        let mut user = User {
            name: "User1".into(),
            address: Address {
                country: "BR".into(),
                ..Default::default()
            },
            ..Default::default()
        };
        provider
            .insert(&users_table(), &mut user)
            .await
            .expect("Failed to insert User1");
        let query = format!("{}FROM users WHERE name = {}", prefix, p(provider, 0));
        let mut lengths = Vec::new();
        let mut users = Vec::new();
        provider
            .query_chunks(ChunkParser {
                query: &query,
                params: &["User1".into()],
                chunk_size: 100,
                for_each_chunk: |chunk: Vec<User>| {
                    lengths.push(chunk.len());
                    users.extend(chunk);
                    Ok(())
                },
            })
            .await
            .expect("Failed to query a single row");
        assert_eq!(lengths, [1]);
        assert_ne!(users[0].id, 0);
        assert_eq!(users[0].name, "User1");
        assert_eq!(users[0].address.country, "BR");

        // One chunk, chunks of 1 and partially filled chunks
        create_tables(provider)
            .await
            .expect("Could not create the test tables");
        insert_users(provider, &["User1", "User2", "User3"]).await;
        let query = format!(
            "{}from users where name like {} order by name asc;",
            prefix,
            p(provider, 0)
        );
        let cases: [(usize, Vec<usize>); 3] = [(100, vec![3]), (1, vec![1, 1, 1]), (2, vec![2, 1])];
        for (chunk_size, expected) in cases {
            let mut lengths = Vec::new();
            let mut users = Vec::new();
            provider
                .query_chunks(ChunkParser {
                    query: &query,
                    params: &["User%".into()],
                    chunk_size,
                    for_each_chunk: |chunk: Vec<User>| {
                        lengths.push(chunk.len());
                        users.extend(chunk);
                        Ok(())
                    },
                })
                .await
                .expect("Failed to query in chunks");
            assert_eq!(lengths, expected, "chunk size {}", chunk_size);
            let names: Vec<_> = users.iter().map(|u| u.name.as_str()).collect();
            assert_eq!(names, ["User1", "User2", "User3"]);
            assert!(users.iter().all(|u| u.id != 0));
        }

        // The callback outcome decides when to stop
        let cases: [(Vec<Option<Error>>, Vec<usize>, bool); 4] = [
            (vec![Some(AbortIteration.into())], vec![2], true),
            (vec![None, Some(AbortIteration.into())], vec![2, 1], true),
            (vec![Some(Error::msg("fake error msg"))], vec![2], false),
            (vec![None, Some(Error::msg("fake error msg"))], vec![2, 1], false),
        ];
        for (mut outcomes, expected, succeeds) in cases {
            let mut lengths = Vec::new();
            let mut users = Vec::new();
            let result = provider
                .query_chunks(ChunkParser {
                    query: &query,
                    params: &["User%".into()],
                    chunk_size: 2,
                    for_each_chunk: |chunk: Vec<User>| {
                        lengths.push(chunk.len());
                        users.extend(chunk);
                        shift(&mut outcomes)
                    },
                })
                .await;
            match result {
                Ok(()) => assert!(succeeds, "The error of the callback was lost"),
                Err(error) => {
                    assert!(!succeeds, "Unexpected error: {:#}", error);
                    assert_eq!(error.to_string(), "fake error msg");
                }
            }
            assert_eq!(lengths, expected);
            assert_eq!(users[0].name, "User1");
            assert_eq!(users[1].name, "User2");
        }

        // Errors
        let mut called = false;
        let error = provider
            .query_chunks(ChunkParser {
                query: &format!("{}not a valid query", prefix),
                params: &[],
                chunk_size: 10,
                for_each_chunk: |_: Vec<User>| {
                    called = true;
                    Ok(())
                },
            })
            .await
            .expect_err("An invalid query must fail");
        assert!(!called);
        assert!(format!("{:#}", error).contains("error running query"));
    }

    // Joined tables
    create_tables(provider)
        .await
        .expect("Could not create the test tables");
    let users = insert_users(provider, &["Thiago Ribeiro", "Thatiana Ribeiro"]).await;
    let (thiago, thatiana) = (&users[0], &users[1]);
    let insert_post = format!(
        "INSERT INTO posts (user_id, title) VALUES ({}, {})",
        p(provider, 0),
        p(provider, 1)
    );
    for (user, title) in [
        (thatiana, "Thatiana Post1"),
        (thatiana, "Thatiana Post2"),
        (thiago, "Thiago Post1"),
    ] {
        provider
            .exec(&insert_post, &[user.id.into(), title.into()])
            .await
            .expect("Failed to insert a post");
    }
    let query = format!(
        "FROM users u JOIN posts p ON p.user_id = u.id WHERE u.name like {} ORDER BY u.id, p.id",
        p(provider, 0)
    );
    let mut lengths = Vec::new();
    let mut rows = Vec::new();
    provider
        .query_chunks(ChunkParser {
            query: &query,
            params: &["% Ribeiro".into()],
            chunk_size: 2,
            for_each_chunk: |chunk: Vec<UserPost>| {
                lengths.push(chunk.len());
                rows.extend(chunk);
                Ok(())
            },
        })
        .await
        .expect("Failed to query the joined tables in chunks");
    assert_eq!(lengths, [2, 1]);
    let summary: Vec<_> = rows
        .iter()
        .map(|r| (r.user.id, r.user.name.as_str(), r.post.title.as_str()))
        .collect();
    assert_eq!(
        summary,
        [
            (thiago.id, "Thiago Ribeiro", "Thiago Post1"),
            (thatiana.id, "Thatiana Ribeiro", "Thatiana Post1"),
            (thatiana.id, "Thatiana Ribeiro", "Thatiana Post2"),
        ]
    );

    let error = provider
        .query_chunks(ChunkParser {
            query: "SELECT * FROM users u JOIN posts p ON p.user_id = u.id",
            params: &[],
            chunk_size: 10,
            for_each_chunk: |_: Vec<UserPost>| Ok(()),
        })
        .await
        .expect_err("A joined struct cannot be used with SELECT");
    assert!(is_config_error(&error));
}
