use chrono::{DateTime, Utc};
use sqlx::MySqlPool;
use sqlx::types::Json;

use crate::model::employee::EmployeePatch;

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    String(String),
    U64(u64),
    F64(f64),
    DateTime(DateTime<Utc>),
    Json(serde_json::Value),
    Null,
}

impl From<Option<String>> for SqlValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(SqlValue::Null, SqlValue::String)
    }
}

impl From<Option<f64>> for SqlValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(SqlValue::Null, SqlValue::F64)
    }
}

/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// Column/value pairs for the fields present in `patch`, always ending with
/// `updated_at` so an update never has an empty SET clause.
pub fn patch_assignments(
    patch: &EmployeePatch,
    now: DateTime<Utc>,
) -> Result<Vec<(&'static str, SqlValue)>, serde_json::Error> {
    let mut out: Vec<(&'static str, SqlValue)> = Vec::new();

    if let Some(v) = &patch.employee_id {
        out.push(("employee_code", v.clone().into()));
    }
    if let Some(v) = &patch.name {
        out.push(("name", SqlValue::String(v.clone())));
    }
    if let Some(v) = &patch.email {
        out.push(("email", SqlValue::String(v.clone())));
    }
    if let Some(v) = &patch.phone {
        out.push(("phone", v.clone().into()));
    }
    if let Some(v) = &patch.position {
        out.push(("position", SqlValue::String(v.clone())));
    }
    if let Some(v) = &patch.department {
        out.push(("department", SqlValue::String(v.clone())));
    }
    if let Some(v) = patch.hire_date {
        out.push(("hire_date", SqlValue::DateTime(v)));
    }
    if let Some(v) = patch.salary {
        out.push(("salary", v.into()));
    }
    if let Some(v) = patch.status {
        out.push(("status", SqlValue::String(v.to_string())));
    }
    if let Some(v) = &patch.address {
        out.push(("address", SqlValue::Json(serde_json::to_value(v)?)));
    }
    if let Some(v) = &patch.emergency_contact {
        out.push((
            "emergency_contact",
            SqlValue::Json(serde_json::to_value(v)?),
        ));
    }
    if let Some(v) = &patch.profile_image {
        out.push(("profile_image", SqlValue::Json(serde_json::to_value(v)?)));
    }
    out.push(("updated_at", SqlValue::DateTime(now)));

    Ok(out)
}

/// ===============================
/// Build dynamic UPDATE SQL scoped by id and owner
/// ===============================
pub fn build_update_sql(
    table: &str,
    assignments: Vec<(&'static str, SqlValue)>,
    id: &str,
    owner: u64,
) -> SqlUpdate {
    let set_clause = assignments
        .iter()
        .map(|(column, _)| format!("{} = ?", column))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!(
        "UPDATE {} SET {} WHERE id = ? AND created_by = ?",
        table, set_clause
    );

    let mut values: Vec<SqlValue> = assignments.into_iter().map(|(_, v)| v).collect();
    values.push(SqlValue::String(id.to_string()));
    values.push(SqlValue::U64(owner));

    SqlUpdate { sql, values }
}

/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update(pool: &MySqlPool, update: SqlUpdate) -> Result<u64, sqlx::Error> {
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::U64(v) => query.bind(v),
            SqlValue::F64(v) => query.bind(v),
            SqlValue::DateTime(v) => query.bind(v),
            SqlValue::Json(v) => query.bind(Json(v)),
            SqlValue::Null => query.bind(None::<String>),
        };
    }

    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}
