#![allow(dead_code)]

use linkstash::config::Config;
use linkstash::db::Storage;
use linkstash::router::{app_router, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

pub const TEST_JWT_SECRET: &str = "test-secret";
pub const TEST_PASSWORD: &str = "password123";

/// Process-unique SQLite file, removed when the test drops it.
pub struct TestDb {
    path: PathBuf,
}

impl TestDb {
    pub fn new(tag: &str) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before UNIX_EPOCH")
            .as_nanos();
        let mut path = std::env::temp_dir();
        path.push(format!(
            "linkstash-{tag}-{}-{nanos}.sqlite",
            std::process::id()
        ));
        Self { path }
    }

    pub fn url(&self) -> String {
        format!("sqlite:{}", self.path.display())
    }
}

impl Drop for TestDb {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// The real router over a fresh database, with a known JWT secret.
pub async fn test_app(tag: &str) -> (axum::Router, Arc<Config>, TestDb) {
    let db = TestDb::new(tag);
    let storage = Storage::connect(&db.url()).await.expect("storage");
    let cfg = Arc::new(Config {
        jwt_secret: TEST_JWT_SECRET.to_string(),
        ..Config::default()
    });
    let app = app_router(AppState::new(storage, cfg.clone()));
    (app, cfg, db)
}
