use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A user row. The password hash stays inside the process; serialize
/// [`UserView`] instead.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Public view of a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserView {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

/// Read-status of a bookmark. Closed enumeration, stored as lowercase text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookmarkStatus {
    #[default]
    Unread,
    Read,
    Reading,
}

impl BookmarkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookmarkStatus::Unread => "unread",
            BookmarkStatus::Read => "read",
            BookmarkStatus::Reading => "reading",
        }
    }
}

impl fmt::Display for BookmarkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidStatus;

impl fmt::Display for InvalidStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("unknown bookmark status")
    }
}

impl std::error::Error for InvalidStatus {}

impl FromStr for BookmarkStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unread" => Ok(BookmarkStatus::Unread),
            "read" => Ok(BookmarkStatus::Read),
            "reading" => Ok(BookmarkStatus::Reading),
            _ => Err(InvalidStatus),
        }
    }
}

/// A bookmark row, owned by exactly one user.
#[derive(Debug, Clone, PartialEq)]
pub struct Bookmark {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub category: String,
    pub status: BookmarkStatus,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Outward view of a bookmark; the owning user id is implied by the bearer
/// token and never serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookmarkView {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub category: String,
    pub status: BookmarkStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Bookmark> for BookmarkView {
    fn from(bookmark: Bookmark) -> Self {
        Self {
            id: bookmark.id,
            title: bookmark.title,
            url: bookmark.url,
            category: bookmark.category,
            status: bookmark.status,
            created_at: bookmark.created_at,
            updated_at: bookmark.updated_at,
        }
    }
}
