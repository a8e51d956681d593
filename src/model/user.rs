use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// A registered principal. Employee records are scoped to the user that
/// created them.
#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
}
