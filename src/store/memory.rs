use std::sync::RwLock;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{EmployeePage, EmployeeRepository, ListQuery};
use crate::model::employee::{Employee, EmployeePatch, NewEmployee};

/// In-process record store. Records are kept in insertion order, which is
/// the tie-breaker when two records share a creation timestamp.
#[derive(Default)]
pub struct MemoryEmployeeStore {
    records: RwLock<Vec<Employee>>,
}

impl MemoryEmployeeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record as-is, keeping its id and timestamps.
    pub fn seed(&self, employee: Employee) -> anyhow::Result<()> {
        self.records
            .write()
            .map_err(|_| anyhow!("employee store poisoned"))?
            .push(employee);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn matches_search(employee: &Employee, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    [
        Some(employee.name.as_str()),
        Some(employee.email.as_str()),
        Some(employee.position.as_str()),
        Some(employee.department.as_str()),
        employee.employee_id.as_deref(),
    ]
    .into_iter()
    .flatten()
    .any(|field| field.to_lowercase().contains(&needle))
}

fn matches(employee: &Employee, owner: u64, query: &ListQuery) -> bool {
    employee.created_by == owner
        && query
            .search
            .as_deref()
            .is_none_or(|s| matches_search(employee, s))
        && query
            .department
            .as_deref()
            .is_none_or(|d| employee.department == d)
        && query.status.is_none_or(|s| employee.status == s)
}

#[async_trait]
impl EmployeeRepository for MemoryEmployeeStore {
    async fn insert(&self, new: NewEmployee) -> anyhow::Result<Employee> {
        let now = Utc::now();
        let employee = Employee {
            id: Uuid::new_v4().to_string(),
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
        };
        self.seed(employee.clone())?;
        Ok(employee)
    }

    async fn find(&self, owner: u64, id: &str) -> anyhow::Result<Option<Employee>> {
        let records = self
            .records
            .read()
            .map_err(|_| anyhow!("employee store poisoned"))?;
        Ok(records
            .iter()
            .find(|e| e.id == id && e.created_by == owner)
            .cloned())
    }

    async fn list(&self, owner: u64, query: &ListQuery) -> anyhow::Result<EmployeePage> {
        let records = self
            .records
            .read()
            .map_err(|_| anyhow!("employee store poisoned"))?;

        // Walk newest insertion first so a stable sort keeps later inserts
        // ahead on equal timestamps.
        let mut hits: Vec<&Employee> = records
            .iter()
            .rev()
            .filter(|e| matches(e, owner, query))
            .collect();
        hits.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = hits.len() as u64;
        let items = hits
            .into_iter()
            .skip(usize::try_from(query.offset()).unwrap_or(usize::MAX))
            .take(query.limit as usize)
            .cloned()
            .collect();

        Ok(EmployeePage::new(items, total, query))
    }

    async fn update(
        &self,
        owner: u64,
        id: &str,
        patch: &EmployeePatch,
    ) -> anyhow::Result<Option<Employee>> {
        let mut records = self
            .records
            .write()
            .map_err(|_| anyhow!("employee store poisoned"))?;
        let Some(employee) = records
            .iter_mut()
            .find(|e| e.id == id && e.created_by == owner)
        else {
            return Ok(None);
        };
        patch.apply_to(employee, Utc::now());
        Ok(Some(employee.clone()))
    }

    async fn delete(&self, owner: u64, id: &str) -> anyhow::Result<bool> {
        let mut records = self
            .records
            .write()
            .map_err(|_| anyhow!("employee store poisoned"))?;
        let before = records.len();
        records.retain(|e| !(e.id == id && e.created_by == owner));
        Ok(records.len() != before)
    }
}
