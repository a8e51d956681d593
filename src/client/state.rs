//! Client-side employee state, changed only through [`EmployeeAction`]s.

use std::collections::HashSet;

use crate::client::api::EmployeeListing;
use crate::model::employee::Employee;
use crate::store::DEFAULT_PAGE;

/// Lifecycle of one request family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RequestStatus {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestFamily {
    List,
    Get,
    Create,
    Update,
    Delete,
}

impl RequestFamily {
    /// Shown when a failure carries no server message.
    pub fn fallback_message(self) -> &'static str {
        match self {
            RequestFamily::List => "Failed to fetch employees",
            RequestFamily::Get => "Failed to fetch employee details",
            RequestFamily::Create => "Failed to create employee",
            RequestFamily::Update => "Failed to update employee",
            RequestFamily::Delete => "Failed to delete employee",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestStatuses {
    pub list: RequestStatus,
    pub get: RequestStatus,
    pub create: RequestStatus,
    pub update: RequestStatus,
    pub delete: RequestStatus,
}

impl RequestStatuses {
    pub fn of(&self, family: RequestFamily) -> RequestStatus {
        match family {
            RequestFamily::List => self.list,
            RequestFamily::Get => self.get,
            RequestFamily::Create => self.create,
            RequestFamily::Update => self.update,
            RequestFamily::Delete => self.delete,
        }
    }

    fn set(&mut self, family: RequestFamily, status: RequestStatus) {
        let slot = match family {
            RequestFamily::List => &mut self.list,
            RequestFamily::Get => &mut self.get,
            RequestFamily::Create => &mut self.create,
            RequestFamily::Update => &mut self.update,
            RequestFamily::Delete => &mut self.delete,
        };
        *slot = status;
    }
}

#[derive(Debug, Clone)]
pub enum EmployeeAction {
    Request(RequestFamily),
    ListSuccess(EmployeeListing),
    GetSuccess(Employee),
    CreateSuccess(Employee),
    UpdateSuccess(Employee),
    /// Carries the id of the removed record.
    DeleteSuccess(String),
    /// Carries the server's message when there was one.
    Fail(RequestFamily, Option<String>),
    SetSearchTerm(String),
    SetCurrentPage(u32),
    ClearErrors,
    ClearSuccess,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeState {
    pub employees: Vec<Employee>,
    pub employee: Option<Employee>,
    pub loading: bool,
    pub error: Option<String>,
    pub success: bool,
    pub deleted: bool,
    pub total_employees: u64,
    pub total_pages: u64,
    pub current_page: u32,
    pub search_term: String,
    pub requests: RequestStatuses,
}

impl Default for EmployeeState {
    fn default() -> Self {
        Self {
            employees: Vec::new(),
            employee: None,
            loading: false,
            error: None,
            success: false,
            deleted: false,
            total_employees: 0,
            total_pages: 0,
            current_page: DEFAULT_PAGE,
            search_term: String::new(),
            requests: RequestStatuses::default(),
        }
    }
}

impl EmployeeState {
    /// Distinct departments among the listed employees, for dashboard stats.
    pub fn department_count(&self) -> usize {
        self.employees
            .iter()
            .map(|e| e.department.trim())
            .filter(|d| !d.is_empty())
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn apply(&mut self, action: EmployeeAction) {
        match action {
            EmployeeAction::Request(family) => {
                self.loading = true;
                self.error = None;
                match family {
                    RequestFamily::Create | RequestFamily::Update => self.success = false,
                    RequestFamily::Delete => self.deleted = false,
                    RequestFamily::List | RequestFamily::Get => {}
                }
                self.requests.set(family, RequestStatus::Loading);
            }
            EmployeeAction::ListSuccess(listing) => {
                self.loading = false;
                self.employees = listing.data;
                self.total_employees = listing.total_employees;
                self.total_pages = listing.total_pages;
                self.current_page = listing.current_page;
                self.requests.set(RequestFamily::List, RequestStatus::Succeeded);
            }
            EmployeeAction::GetSuccess(employee) => {
                self.loading = false;
                self.employee = Some(employee);
                self.requests.set(RequestFamily::Get, RequestStatus::Succeeded);
            }
            EmployeeAction::CreateSuccess(employee) => {
                self.loading = false;
                self.success = true;
                // a later list fetch is authoritative for order
                self.employees.insert(0, employee);
                self.requests.set(RequestFamily::Create, RequestStatus::Succeeded);
            }
            EmployeeAction::UpdateSuccess(employee) => {
                self.loading = false;
                self.success = true;
                if let Some(slot) = self.employees.iter_mut().find(|e| e.id == employee.id) {
                    *slot = employee.clone();
                }
                self.employee = Some(employee);
                self.requests.set(RequestFamily::Update, RequestStatus::Succeeded);
            }
            EmployeeAction::DeleteSuccess(id) => {
                self.loading = false;
                self.deleted = true;
                self.employees.retain(|e| e.id != id);
                self.requests.set(RequestFamily::Delete, RequestStatus::Succeeded);
            }
            EmployeeAction::Fail(family, message) => {
                self.loading = false;
                self.error = Some(message.unwrap_or_else(|| family.fallback_message().to_string()));
                match family {
                    RequestFamily::Create | RequestFamily::Update => self.success = false,
                    RequestFamily::Delete => self.deleted = false,
                    RequestFamily::List | RequestFamily::Get => {}
                }
                self.requests.set(family, RequestStatus::Failed);
            }
            EmployeeAction::SetSearchTerm(term) => self.search_term = term,
            EmployeeAction::SetCurrentPage(page) => self.current_page = page.max(DEFAULT_PAGE),
            EmployeeAction::ClearErrors => self.error = None,
            EmployeeAction::ClearSuccess => {
                self.success = false;
                self.deleted = false;
            }
        }
    }
}
