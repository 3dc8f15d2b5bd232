pub mod auth;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod validation;

pub use error::ApiError;
pub use router::{app_router, AppState};
