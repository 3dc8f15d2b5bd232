//! Database module: models and schema for persistent storage.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows and outward views
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `sqlite.rs`: the sqlx-backed storage wrapper

pub mod models;
pub mod schema;
pub mod sqlite;

pub use models::{Bookmark, BookmarkStatus, BookmarkView, User, UserView};
pub use schema::SQLITE_INIT;
pub use sqlite::{SqlitePool, Storage};
