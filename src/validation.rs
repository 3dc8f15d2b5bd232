//! Request payloads and the per-field checks that gate every handler.
//!
//! Payloads deserialize leniently (every field optional) and then validate as
//! a whole, collecting all violations before rejecting, so a single response
//! reports everything wrong with the request.

use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::db::models::BookmarkStatus;
use crate::error::{ApiError, FieldError};

/// Consumes the raw payload and produces the normalized form handlers work
/// with, or every violation found.
pub trait Validate: Sized {
    type Valid;

    fn validate(self) -> Result<Self::Valid, Vec<FieldError>>;
}

/// JSON body extractor that runs [`Validate`] before the handler sees the
/// payload. Deserialization failures surface through the same 400 shape.
pub struct ValidatedJson<T: Validate>(pub T::Valid);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            ApiError::Validation(vec![FieldError::new("body", rejection.body_text())])
        })?;
        payload
            .validate()
            .map(Self)
            .map_err(ApiError::Validation)
    }
}

/// Path-segment bookmark id; anything but a positive integer is a validation
/// error, not a router-level rejection.
pub struct BookmarkId(pub i64);

impl<S> FromRequestParts<S> for BookmarkId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i64>::from_request_parts(parts, state)
            .await
            .map_err(|_| invalid_id())?;
        if id <= 0 {
            return Err(invalid_id());
        }
        Ok(Self(id))
    }
}

fn invalid_id() -> ApiError {
    ApiError::Validation(vec![FieldError::new("id", "id must be a positive integer")])
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterPayload {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Normalized registration data: name trimmed, email lowercased.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl Validate for RegisterPayload {
    type Valid = Registration;

    fn validate(self) -> Result<Registration, Vec<FieldError>> {
        let mut errors = Vec::new();

        let name = match self.name {
            Some(raw) => bounded("name", raw, 2, 50, &mut errors),
            None => {
                errors.push(FieldError::new("name", "name is required"));
                String::new()
            }
        };
        let email = match self.email {
            Some(raw) => checked_email(raw, &mut errors),
            None => {
                errors.push(FieldError::new("email", "email is required"));
                String::new()
            }
        };
        let password = match self.password {
            Some(raw) => {
                if raw.chars().count() < 6 {
                    errors.push(FieldError::new(
                        "password",
                        "password must contain at least 6 characters",
                    ));
                }
                raw
            }
            None => {
                errors.push(FieldError::new("password", "password is required"));
                String::new()
            }
        };

        if errors.is_empty() {
            Ok(Registration {
                name,
                email,
                password,
            })
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginPayload {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

impl Validate for LoginPayload {
    type Valid = LoginCredentials;

    fn validate(self) -> Result<LoginCredentials, Vec<FieldError>> {
        let mut errors = Vec::new();

        let email = match self.email {
            Some(raw) => checked_email(raw, &mut errors),
            None => {
                errors.push(FieldError::new("email", "email is required"));
                String::new()
            }
        };
        let password = self.password.unwrap_or_default();
        if password.is_empty() {
            errors.push(FieldError::new("password", "password is required"));
        }

        if errors.is_empty() {
            Ok(LoginCredentials { email, password })
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateBookmarkPayload {
    pub title: Option<String>,
    pub url: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewBookmark {
    pub title: String,
    pub url: String,
    pub category: String,
    pub status: BookmarkStatus,
}

impl Validate for CreateBookmarkPayload {
    type Valid = NewBookmark;

    fn validate(self) -> Result<NewBookmark, Vec<FieldError>> {
        let mut errors = Vec::new();

        let title = match self.title {
            Some(raw) => bounded("title", raw, 1, 200, &mut errors),
            None => {
                errors.push(FieldError::new("title", "title is required"));
                String::new()
            }
        };
        let url = match self.url {
            Some(raw) => checked_url(raw, &mut errors),
            None => {
                errors.push(FieldError::new("url", "url is required"));
                String::new()
            }
        };
        let category = match self.category {
            Some(raw) => bounded("category", raw, 1, 50, &mut errors),
            None => {
                errors.push(FieldError::new("category", "category is required"));
                String::new()
            }
        };
        let status = match self.status {
            Some(raw) => checked_status(raw, &mut errors).unwrap_or_default(),
            None => BookmarkStatus::default(),
        };

        if errors.is_empty() {
            Ok(NewBookmark {
                title,
                url,
                category,
                status,
            })
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateBookmarkPayload {
    pub title: Option<String>,
    pub url: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
}

/// Partial update: absent fields keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct BookmarkChanges {
    pub title: Option<String>,
    pub url: Option<String>,
    pub category: Option<String>,
    pub status: Option<BookmarkStatus>,
}

impl Validate for UpdateBookmarkPayload {
    type Valid = BookmarkChanges;

    fn validate(self) -> Result<BookmarkChanges, Vec<FieldError>> {
        let mut errors = Vec::new();

        if self.title.is_none()
            && self.url.is_none()
            && self.category.is_none()
            && self.status.is_none()
        {
            errors.push(FieldError::new(
                "body",
                "at least one field must be provided for the update",
            ));
        }

        let changes = BookmarkChanges {
            title: self.title.map(|raw| bounded("title", raw, 1, 200, &mut errors)),
            url: self.url.map(|raw| checked_url(raw, &mut errors)),
            category: self
                .category
                .map(|raw| bounded("category", raw, 1, 50, &mut errors)),
            status: self
                .status
                .and_then(|raw| checked_status(raw, &mut errors)),
        };

        if errors.is_empty() {
            Ok(changes)
        } else {
            Err(errors)
        }
    }
}

/// Trim, then enforce character-count bounds.
fn bounded(
    field: &str,
    raw: String,
    min: usize,
    max: usize,
    errors: &mut Vec<FieldError>,
) -> String {
    let value = raw.trim().to_string();
    let len = value.chars().count();
    if len < min {
        let message = if min <= 1 {
            format!("{field} cannot be empty")
        } else {
            format!("{field} must contain at least {min} characters")
        };
        errors.push(FieldError::new(field, message));
    } else if len > max {
        errors.push(FieldError::new(
            field,
            format!("{field} cannot exceed {max} characters"),
        ));
    }
    value
}

fn checked_email(raw: String, errors: &mut Vec<FieldError>) -> String {
    let email = raw.trim().to_lowercase();
    if !looks_like_email(&email) {
        errors.push(FieldError::new("email", "invalid email format"));
    }
    email
}

fn looks_like_email(candidate: &str) -> bool {
    let Some((local, domain)) = candidate.split_once('@') else {
        return false;
    };
    if local.is_empty() || candidate.contains(char::is_whitespace) {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty()
        && tld.chars().count() >= 2
        && domain
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
}

fn checked_url(raw: String, errors: &mut Vec<FieldError>) -> String {
    let value = raw.trim().to_string();
    match Url::parse(&value) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
        _ => errors.push(FieldError::new("url", "invalid URL format")),
    }
    value
}

fn checked_status(raw: String, errors: &mut Vec<FieldError>) -> Option<BookmarkStatus> {
    match raw.parse::<BookmarkStatus>() {
        Ok(status) => Some(status),
        Err(_) => {
            errors.push(FieldError::new(
                "status",
                "status must be one of: unread, read, reading",
            ));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(errors: &[FieldError]) -> Vec<&str> {
        errors.iter().map(|e| e.field.as_str()).collect()
    }

    #[test]
    fn registration_normalizes_and_passes() {
        let valid = RegisterPayload {
            name: Some("  Ada Lovelace  ".to_string()),
            email: Some("Ada@Example.COM".to_string()),
            password: Some("difference engine".to_string()),
        }
        .validate()
        .expect("valid");
        assert_eq!(valid.name, "Ada Lovelace");
        assert_eq!(valid.email, "ada@example.com");
    }

    #[test]
    fn registration_collects_every_violation() {
        let errors = RegisterPayload {
            name: Some("A".to_string()),
            email: Some("not-an-email".to_string()),
            password: Some("short".to_string()),
        }
        .validate()
        .expect_err("invalid");
        assert_eq!(fields(&errors), vec!["name", "email", "password"]);
    }

    #[test]
    fn registration_reports_missing_fields() {
        let errors = RegisterPayload::default().validate().expect_err("invalid");
        assert_eq!(fields(&errors), vec!["name", "email", "password"]);
        assert!(errors.iter().all(|e| e.message.ends_with("is required")));
    }

    #[test]
    fn email_format_edge_cases() {
        assert!(looks_like_email("ada@example.com"));
        assert!(looks_like_email("a.b-c@sub.example.org"));
        assert!(!looks_like_email("ada@example"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("ada at example.com"));
        assert!(!looks_like_email("ada@exa mple.com"));
    }

    #[test]
    fn bookmark_url_must_be_http_or_https() {
        let errors = CreateBookmarkPayload {
            title: Some("FTP mirror".to_string()),
            url: Some("ftp://mirror.example.com".to_string()),
            category: Some("tech".to_string()),
            status: None,
        }
        .validate()
        .expect_err("invalid");
        assert_eq!(fields(&errors), vec!["url"]);
    }

    #[test]
    fn bookmark_status_defaults_to_unread() {
        let valid = CreateBookmarkPayload {
            title: Some("Rust book".to_string()),
            url: Some("https://doc.rust-lang.org/book/".to_string()),
            category: Some("tech".to_string()),
            status: None,
        }
        .validate()
        .expect("valid");
        assert_eq!(valid.status, BookmarkStatus::Unread);
    }

    #[test]
    fn bookmark_rejects_unknown_status() {
        let errors = CreateBookmarkPayload {
            title: Some("Rust book".to_string()),
            url: Some("https://doc.rust-lang.org/book/".to_string()),
            category: Some("tech".to_string()),
            status: Some("archived".to_string()),
        }
        .validate()
        .expect_err("invalid");
        assert_eq!(fields(&errors), vec!["status"]);
    }

    #[test]
    fn update_requires_at_least_one_field() {
        let errors = UpdateBookmarkPayload::default()
            .validate()
            .expect_err("invalid");
        assert_eq!(fields(&errors), vec!["body"]);
    }

    #[test]
    fn update_accepts_a_single_field() {
        let changes = UpdateBookmarkPayload {
            status: Some("read".to_string()),
            ..UpdateBookmarkPayload::default()
        }
        .validate()
        .expect("valid");
        assert_eq!(changes.status, Some(BookmarkStatus::Read));
        assert!(changes.title.is_none());
    }

    #[test]
    fn long_title_is_rejected() {
        let errors = UpdateBookmarkPayload {
            title: Some("x".repeat(201)),
            ..UpdateBookmarkPayload::default()
        }
        .validate()
        .expect_err("invalid");
        assert_eq!(fields(&errors), vec!["title"]);
    }
}
