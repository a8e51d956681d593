//! Employee record persistence.
//!
//! Every operation is scoped by owner. Callers never see records belonging to
//! another principal; a lookup against someone else's id behaves exactly like
//! a lookup against an id that does not exist.

pub mod memory;
pub mod mysql;

use async_trait::async_trait;

use crate::model::employee::{Employee, EmployeePatch, EmployeeStatus, NewEmployee};

pub use memory::MemoryEmployeeStore;
pub use mysql::MySqlEmployeeStore;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

/// Normalized list request.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
    pub department: Option<String>,
    pub status: Option<EmployeeStatus>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            search: None,
            department: None,
            status: None,
        }
    }
}

impl ListQuery {
    /// Zero or missing page/limit fall back to the defaults, the limit is
    /// capped, and blank text filters are dropped.
    pub fn new(
        page: Option<u32>,
        limit: Option<u32>,
        search: Option<String>,
        department: Option<String>,
        status: Option<EmployeeStatus>,
    ) -> Self {
        Self {
            page: page.filter(|p| *p > 0).unwrap_or(DEFAULT_PAGE),
            limit: limit.filter(|l| *l > 0).unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT),
            search: non_blank(search),
            department: non_blank(department),
            status,
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn total_pages(total: u64, limit: u32) -> u64 {
    total.div_ceil(u64::from(limit.max(1)))
}

/// One page of results plus the counts needed to render a pager.
#[derive(Debug, Clone, PartialEq)]
pub struct EmployeePage {
    pub items: Vec<Employee>,
    pub total_count: u64,
    pub total_pages: u64,
    pub current_page: u32,
}

impl EmployeePage {
    pub fn new(items: Vec<Employee>, total_count: u64, query: &ListQuery) -> Self {
        Self {
            items,
            total_count,
            total_pages: total_pages(total_count, query.limit),
            current_page: query.page,
        }
    }
}

#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    async fn insert(&self, new: NewEmployee) -> anyhow::Result<Employee>;

    async fn find(&self, owner: u64, id: &str) -> anyhow::Result<Option<Employee>>;

    async fn list(&self, owner: u64, query: &ListQuery) -> anyhow::Result<EmployeePage>;

    /// Applies `patch` and returns the updated record, or `None` when no record
    /// with this id belongs to `owner`.
    async fn update(
        &self,
        owner: u64,
        id: &str,
        patch: &EmployeePatch,
    ) -> anyhow::Result<Option<Employee>>;

    /// Returns whether a record was removed.
    async fn delete(&self, owner: u64, id: &str) -> anyhow::Result<bool>;
}
