#[allow(clippy::module_inception)]
pub mod auth;
pub mod email_index;
pub mod handlers;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use auth::AuthUser;
