//! Runs client requests and folds their outcomes into [`EmployeeState`].

use tracing::{debug, warn};

use crate::client::api::{ClientError, EmployeeApi, EmployeePayload, ListParams};
use crate::client::state::{EmployeeAction, EmployeeState, RequestFamily};
use crate::model::employee::Employee;
use crate::store::DEFAULT_LIMIT;

/// Owns the state container and the API it talks to. Requests run one at a
/// time through `&mut self`; whichever response is applied last wins.
pub struct ClientStore<A: EmployeeApi> {
    api: A,
    state: EmployeeState,
}

impl<A: EmployeeApi> ClientStore<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            state: EmployeeState::default(),
        }
    }

    pub fn state(&self) -> &EmployeeState {
        &self.state
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn dispatch(&mut self, action: EmployeeAction) {
        self.state.apply(action);
    }

    fn fail(&mut self, family: RequestFamily, error: &ClientError) {
        warn!(?family, error = %error, "Employee request failed");
        self.dispatch(EmployeeAction::Fail(
            family,
            error.server_message().map(str::to_owned),
        ));
    }

    /// Filters for the page the state currently points at.
    pub fn current_params(&self) -> ListParams {
        ListParams {
            page: self.state.current_page,
            limit: DEFAULT_LIMIT,
            search: self.state.search_term.clone(),
            ..ListParams::default()
        }
    }

    pub async fn fetch_employees(&mut self, params: &ListParams) -> Result<(), ClientError> {
        self.dispatch(EmployeeAction::Request(RequestFamily::List));
        match self.api.list(params).await {
            Ok(listing) => {
                debug!(count = listing.data.len(), page = listing.current_page, "Fetched employees");
                self.dispatch(EmployeeAction::ListSuccess(listing));
                Ok(())
            }
            Err(e) => {
                self.fail(RequestFamily::List, &e);
                Err(e)
            }
        }
    }

    /// Re-fetches using the stored search term and page.
    pub async fn refresh(&mut self) -> Result<(), ClientError> {
        let params = self.current_params();
        self.fetch_employees(&params).await
    }

    pub async fn fetch_employee(&mut self, id: &str) -> Result<Employee, ClientError> {
        self.dispatch(EmployeeAction::Request(RequestFamily::Get));
        match self.api.get(id).await {
            Ok(employee) => {
                self.dispatch(EmployeeAction::GetSuccess(employee.clone()));
                Ok(employee)
            }
            Err(e) => {
                self.fail(RequestFamily::Get, &e);
                Err(e)
            }
        }
    }

    pub async fn create_employee(&mut self, payload: &EmployeePayload) -> Result<Employee, ClientError> {
        self.dispatch(EmployeeAction::Request(RequestFamily::Create));
        match self.api.create(payload).await {
            Ok(employee) => {
                self.dispatch(EmployeeAction::CreateSuccess(employee.clone()));
                Ok(employee)
            }
            Err(e) => {
                self.fail(RequestFamily::Create, &e);
                Err(e)
            }
        }
    }

    pub async fn update_employee(
        &mut self,
        id: &str,
        payload: &EmployeePayload,
    ) -> Result<Employee, ClientError> {
        self.dispatch(EmployeeAction::Request(RequestFamily::Update));
        match self.api.update(id, payload).await {
            Ok(employee) => {
                self.dispatch(EmployeeAction::UpdateSuccess(employee.clone()));
                Ok(employee)
            }
            Err(e) => {
                self.fail(RequestFamily::Update, &e);
                Err(e)
            }
        }
    }

    pub async fn delete_employee(&mut self, id: &str) -> Result<(), ClientError> {
        self.dispatch(EmployeeAction::Request(RequestFamily::Delete));
        match self.api.delete(id).await {
            Ok(()) => {
                self.dispatch(EmployeeAction::DeleteSuccess(id.to_string()));
                Ok(())
            }
            Err(e) => {
                self.fail(RequestFamily::Delete, &e);
                Err(e)
            }
        }
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.dispatch(EmployeeAction::SetSearchTerm(term.into()));
    }

    pub fn set_current_page(&mut self, page: u32) {
        self.dispatch(EmployeeAction::SetCurrentPage(page));
    }

    pub fn clear_errors(&mut self) {
        self.dispatch(EmployeeAction::ClearErrors);
    }

    pub fn clear_success(&mut self) {
        self.dispatch(EmployeeAction::ClearSuccess);
    }
}
