mod common;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use linkstash::client::{ApiClient, BookmarkPatch, ClientError, NewBookmark, TokenStore};
use linkstash::db::models::BookmarkStatus;

use common::{test_app, TestDb, TEST_PASSWORD};

async fn spawn_server(tag: &str) -> (String, TestDb) {
    let (app, _cfg, db) = test_app(tag).await;
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("serve");
    });
    (format!("http://{addr}"), db)
}

fn temp_token_path(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!(
        "linkstash-client-{tag}-{}-{nanos}",
        std::process::id()
    ));
    path
}

#[tokio::test]
async fn full_client_round_trip() {
    let (base_url, _db) = spawn_server("client-round-trip").await;
    let token_path = temp_token_path("round-trip");
    let mut client = ApiClient::new(&base_url, &token_path);

    let user = client
        .register("Ada Lovelace", "ada@example.com", TEST_PASSWORD)
        .await
        .expect("register");
    assert_eq!(user.email, "ada@example.com");

    let session = client
        .login("ada@example.com", TEST_PASSWORD)
        .await
        .expect("login");
    assert_eq!(session.token_type, "Bearer");
    assert_eq!(client.token(), Some(session.access_token.as_str()));

    let me = client.me().await.expect("me");
    assert_eq!(me.id, user.id);

    let created = client
        .create_bookmark(&NewBookmark {
            title: "Rust blog".to_string(),
            url: "https://blog.rust-lang.org".to_string(),
            category: "tech".to_string(),
            status: None,
        })
        .await
        .expect("create");
    assert_eq!(created.status, BookmarkStatus::Unread);

    client
        .create_bookmark(&NewBookmark {
            title: "Morning paper".to_string(),
            url: "https://news.example.com".to_string(),
            category: "news".to_string(),
            status: Some("reading".to_string()),
        })
        .await
        .expect("create second");

    let listed = client.bookmarks().await.expect("list");
    assert_eq!(listed.len(), 2);

    let updated = client
        .update_bookmark(
            created.id,
            &BookmarkPatch {
                title: Some("Rust blog (official)".to_string()),
                ..BookmarkPatch::default()
            },
        )
        .await
        .expect("update");
    assert_eq!(updated.title, "Rust blog (official)");

    let read = client.mark_as_read(created.id).await.expect("mark read");
    assert_eq!(read.status, BookmarkStatus::Read);

    let stats = client.stats().await.expect("stats");
    assert_eq!(stats.total, 2);
    assert_eq!(stats.read, 1);
    assert_eq!(stats.reading, 1);
    assert_eq!(stats.by_category.len(), 2);

    client.delete_bookmark(created.id).await.expect("delete");
    let listed = client.bookmarks().await.expect("list after delete");
    assert_eq!(listed.len(), 1);

    client.logout().expect("logout");
    assert_eq!(client.token(), None);
    assert!(matches!(client.me().await, Err(ClientError::NotLoggedIn)));
}

#[tokio::test]
async fn token_persists_between_clients() {
    let (base_url, _db) = spawn_server("client-persist").await;
    let token_path = temp_token_path("persist");

    let mut first = ApiClient::new(&base_url, &token_path);
    first
        .register("Grace Hopper", "grace@example.com", TEST_PASSWORD)
        .await
        .expect("register");
    first
        .login("grace@example.com", TEST_PASSWORD)
        .await
        .expect("login");

    // A brand-new client over the same store resumes the session.
    let second = ApiClient::new(&base_url, &token_path);
    let me = second.me().await.expect("me");
    assert_eq!(me.email, "grace@example.com");

    TokenStore::new(&token_path).clear().expect("clear");
}

#[tokio::test]
async fn api_errors_surface_machine_codes() {
    let (base_url, _db) = spawn_server("client-errors").await;
    let token_path = temp_token_path("errors");
    let mut client = ApiClient::new(&base_url, &token_path);

    client
        .register("Ada", "ada@example.com", TEST_PASSWORD)
        .await
        .expect("register");

    let err = client
        .login("ada@example.com", "wrong-password")
        .await
        .expect_err("login should fail");
    match err {
        ClientError::Api { status, code, .. } => {
            assert_eq!(status.as_u16(), 401);
            assert_eq!(code, "INVALID_CREDENTIALS");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    client
        .login("ada@example.com", TEST_PASSWORD)
        .await
        .expect("login");
    let err = client.bookmark(4242).await.expect_err("missing bookmark");
    match err {
        ClientError::Api { status, code, .. } => {
            assert_eq!(status.as_u16(), 404);
            assert_eq!(code, "BOOKMARK_NOT_FOUND");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    client.logout().expect("logout");
}
