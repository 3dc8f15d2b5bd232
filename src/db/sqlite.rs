use crate::db::models::{Bookmark, BookmarkStatus, User};
use crate::db::schema::SQLITE_INIT;
use crate::error::ApiError;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;

pub type SqlitePool = Pool<Sqlite>;

/// All persistence for the service: users and bookmarks, one self-contained
/// row per entity.
#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database and run the bundled DDL.
    pub async fn connect(database_url: &str) -> Result<Self, ApiError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        let storage = Self::new(pool);
        storage.init_schema().await?;
        Ok(storage)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), ApiError> {
        // execute multiple statements safely (SQLite supports multi-commands but sqlx::query doesn't)
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Insert a user; the row id comes from the store's own counter.
    /// Fails with a unique violation when the email is already taken.
    pub async fn insert_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, ApiError> {
        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO users (name, email, password_hash, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(User {
            id: result.last_insert_rowid(),
            name: name.to_owned(),
            email: email.to_owned(),
            password_hash: password_hash.to_owned(),
            created_at,
        })
    }

    pub async fn user_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        let row = sqlx::query(
            "SELECT id, name, email, password_hash, created_at FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_user).transpose()
    }

    pub async fn user_by_id(&self, id: i64) -> Result<Option<User>, ApiError> {
        let row = sqlx::query(
            "SELECT id, name, email, password_hash, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_user).transpose()
    }

    pub async fn insert_bookmark(
        &self,
        user_id: i64,
        title: &str,
        url: &str,
        category: &str,
        status: BookmarkStatus,
    ) -> Result<Bookmark, ApiError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"INSERT INTO bookmarks (title, url, category, status, user_id, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(title)
        .bind(url)
        .bind(category)
        .bind(status.as_str())
        .bind(user_id)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(Bookmark {
            id: result.last_insert_rowid(),
            title: title.to_owned(),
            url: url.to_owned(),
            category: category.to_owned(),
            status,
            user_id,
            created_at: now,
            updated_at: now,
        })
    }

    /// All bookmarks owned by the user, newest first. The row id breaks
    /// creation-time ties.
    pub async fn bookmarks_for_user(&self, user_id: i64) -> Result<Vec<Bookmark>, ApiError> {
        let rows = sqlx::query(
            r#"SELECT id, title, url, category, status, user_id, created_at, updated_at
               FROM bookmarks WHERE user_id = ?
               ORDER BY created_at DESC, id DESC"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Self::row_to_bookmark).collect()
    }

    /// Fetch one bookmark scoped to its owner; `None` covers both a missing
    /// id and an id owned by someone else.
    pub async fn bookmark_for_user(
        &self,
        user_id: i64,
        id: i64,
    ) -> Result<Option<Bookmark>, ApiError> {
        let row = sqlx::query(
            r#"SELECT id, title, url, category, status, user_id, created_at, updated_at
               FROM bookmarks WHERE id = ? AND user_id = ?"#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_bookmark).transpose()
    }

    /// Write back every mutable column of the bookmark, keyed by (id, owner).
    pub async fn update_bookmark(&self, bookmark: &Bookmark) -> Result<(), ApiError> {
        sqlx::query(
            r#"UPDATE bookmarks SET title = ?, url = ?, category = ?, status = ?, updated_at = ?
               WHERE id = ? AND user_id = ?"#,
        )
        .bind(&bookmark.title)
        .bind(&bookmark.url)
        .bind(&bookmark.category)
        .bind(bookmark.status.as_str())
        .bind(bookmark.updated_at.to_rfc3339())
        .bind(bookmark.id)
        .bind(bookmark.user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Delete scoped to the owner; returns whether a row was removed.
    pub async fn delete_bookmark(&self, user_id: i64, id: i64) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM bookmarks WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count_bookmarks(&self, user_id: i64) -> Result<i64, ApiError> {
        let rec: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM bookmarks WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(rec.0)
    }

    pub async fn count_by_status(&self, user_id: i64) -> Result<Vec<(String, i64)>, ApiError> {
        let rows = sqlx::query_as(
            "SELECT status, COUNT(*) FROM bookmarks WHERE user_id = ? GROUP BY status",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Category histogram, most-bookmarked first; name order breaks count
    /// ties so responses are deterministic.
    pub async fn count_by_category(&self, user_id: i64) -> Result<Vec<(String, i64)>, ApiError> {
        let rows = sqlx::query_as(
            r#"SELECT category, COUNT(*) AS count FROM bookmarks WHERE user_id = ?
               GROUP BY category ORDER BY count DESC, category ASC"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    fn row_to_user(row: SqliteRow) -> Result<User, ApiError> {
        let id: i64 = row.try_get("id")?;
        let name: String = row.try_get("name")?;
        let email: String = row.try_get("email")?;
        let password_hash: String = row.try_get("password_hash")?;
        let created_at = parse_timestamp(row.try_get("created_at")?)?;

        Ok(User {
            id,
            name,
            email,
            password_hash,
            created_at,
        })
    }

    fn row_to_bookmark(row: SqliteRow) -> Result<Bookmark, ApiError> {
        let id: i64 = row.try_get("id")?;
        let title: String = row.try_get("title")?;
        let url: String = row.try_get("url")?;
        let category: String = row.try_get("category")?;
        let status_str: String = row.try_get("status")?;
        let user_id: i64 = row.try_get("user_id")?;
        let created_at = parse_timestamp(row.try_get("created_at")?)?;
        let updated_at = parse_timestamp(row.try_get("updated_at")?)?;

        let status = status_str
            .parse::<BookmarkStatus>()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

        Ok(Bookmark {
            id,
            title,
            url,
            category,
            status,
            user_id,
            created_at,
            updated_at,
        })
    }
}

fn parse_timestamp(raw: String) -> Result<DateTime<Utc>, ApiError> {
    Ok(chrono::DateTime::parse_from_rfc3339(&raw)
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))?
        .with_timezone(&Utc))
}
