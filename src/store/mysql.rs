use std::str::FromStr;

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use sqlx::MySqlPool;
use sqlx::types::Json;
use tracing::debug;
use uuid::Uuid;

use super::{EmployeePage, EmployeeRepository, ListQuery};
use crate::model::employee::{
    Address, EmergencyContact, Employee, EmployeePatch, EmployeeStatus, ImageRef, NewEmployee,
};
use crate::utils::db_utils::{SqlValue, build_update_sql, execute_update, patch_assignments};

const COLUMNS: &str = "id, employee_code, name, email, phone, position, department, hire_date, \
    salary, status, address, emergency_contact, profile_image, created_by, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct EmployeeRow {
    id: String,
    employee_code: Option<String>,
    name: String,
    email: String,
    phone: Option<String>,
    position: String,
    department: String,
    hire_date: DateTime<Utc>,
    salary: Option<f64>,
    status: String,
    address: Json<Address>,
    emergency_contact: Json<EmergencyContact>,
    profile_image: Json<ImageRef>,
    created_by: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<EmployeeRow> for Employee {
    type Error = anyhow::Error;

    fn try_from(row: EmployeeRow) -> Result<Self, Self::Error> {
        let status = EmployeeStatus::from_str(&row.status)
            .map_err(|_| anyhow!("unknown employee status {:?} on {}", row.status, row.id))?;
        Ok(Employee {
            id: row.id,
            employee_id: row.employee_code,
            name: row.name,
            email: row.email,
            phone: row.phone,
            position: row.position,
            department: row.department,
            hire_date: row.hire_date,
            salary: row.salary,
            status,
            address: row.address.0,
            emergency_contact: row.emergency_contact.0,
            profile_image: row.profile_image.0,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// WHERE clause and its bindings for a scoped list query.
fn list_filter(owner: u64, query: &ListQuery) -> (String, Vec<SqlValue>) {
    let mut conditions = vec!["created_by = ?"];
    let mut bindings = vec![SqlValue::U64(owner)];

    if let Some(search) = &query.search {
        conditions.push(
            "(name LIKE ? OR email LIKE ? OR position LIKE ? OR department LIKE ? OR employee_code LIKE ?)",
        );
        let like = like_pattern(search);
        for _ in 0..5 {
            bindings.push(SqlValue::String(like.clone()));
        }
    }

    if let Some(department) = &query.department {
        conditions.push("department = ?");
        bindings.push(SqlValue::String(department.clone()));
    }

    if let Some(status) = query.status {
        conditions.push("status = ?");
        bindings.push(SqlValue::String(status.to_string()));
    }

    (format!("WHERE {}", conditions.join(" AND ")), bindings)
}

pub struct MySqlEmployeeStore {
    pool: MySqlPool,
}

impl MySqlEmployeeStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmployeeRepository for MySqlEmployeeStore {
    async fn insert(&self, new: NewEmployee) -> anyhow::Result<Employee> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().trunc_subsecs(6);

        sqlx::query(
            r#"
            INSERT INTO employees
            (id, employee_code, name, email, phone, position, department, hire_date, salary,
             status, address, emergency_contact, profile_image, created_by, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&new.employee_id)
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(&new.position)
        .bind(&new.department)
        .bind(new.hire_date)
        .bind(new.salary)
        .bind(new.status.to_string())
        .bind(Json(&new.address))
        .bind(Json(&new.emergency_contact))
        .bind(Json(&new.profile_image))
        .bind(new.created_by)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("insert employee")?;

        Ok(Employee {
            id,
            employee_id: new.employee_id,
            name: new.name,
            email: new.email,
            phone: new.phone,
            position: new.position,
            department: new.department,
            hire_date: new.hire_date,
            salary: new.salary,
            status: new.status,
            address: new.address,
            emergency_contact: new.emergency_contact,
            profile_image: new.profile_image,
            created_by: new.created_by,
            created_at: now,
            updated_at: now,
        })
    }

    async fn find(&self, owner: u64, id: &str) -> anyhow::Result<Option<Employee>> {
        let sql = format!("SELECT {COLUMNS} FROM employees WHERE id = ? AND created_by = ?");
        let row = sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await
            .context("fetch employee")?;

        row.map(Employee::try_from).transpose()
    }

    async fn list(&self, owner: u64, query: &ListQuery) -> anyhow::Result<EmployeePage> {
        let (where_clause, bindings) = list_filter(owner, query);

        // ---------- total count ----------
        let count_sql = format!("SELECT COUNT(*) FROM employees {}", where_clause);
        debug!(sql = %count_sql, bindings = ?bindings, "Counting employees");

        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        for b in &bindings {
            count_query = match b {
                SqlValue::String(v) => count_query.bind(v),
                SqlValue::U64(v) => count_query.bind(*v),
                other => return Err(anyhow!("unexpected list binding {other:?}")),
            };
        }
        let total = count_query
            .fetch_one(&self.pool)
            .await
            .context("count employees")?;

        // ---------- data query ----------
        let data_sql = format!(
            "SELECT {COLUMNS} FROM employees {} ORDER BY created_at DESC, seq DESC LIMIT ? OFFSET ?",
            where_clause
        );
        debug!(sql = %data_sql, page = query.page, limit = query.limit, "Fetching employees");

        let mut data_query = sqlx::query_as::<_, EmployeeRow>(&data_sql);
        for b in &bindings {
            data_query = match b {
                SqlValue::String(v) => data_query.bind(v),
                SqlValue::U64(v) => data_query.bind(*v),
                other => return Err(anyhow!("unexpected list binding {other:?}")),
            };
        }
        data_query = data_query.bind(u64::from(query.limit)).bind(query.offset());

        let rows = data_query
            .fetch_all(&self.pool)
            .await
            .context("fetch employees")?;
        let items = rows
            .into_iter()
            .map(Employee::try_from)
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(EmployeePage::new(items, u64::try_from(total)?, query))
    }

    async fn update(
        &self,
        owner: u64,
        id: &str,
        patch: &EmployeePatch,
    ) -> anyhow::Result<Option<Employee>> {
        let now = Utc::now().trunc_subsecs(6);
        let update = build_update_sql("employees", patch_assignments(patch, now)?, id, owner);
        debug!(sql = %update.sql, id, "Updating employee");

        let affected = execute_update(&self.pool, update)
            .await
            .context("update employee")?;
        if affected == 0 {
            return Ok(None);
        }

        self.find(owner, id).await
    }

    async fn delete(&self, owner: u64, id: &str) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM employees WHERE id = ? AND created_by = ?")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await
            .context("delete employee")?;

        Ok(result.rows_affected() > 0)
    }
}
