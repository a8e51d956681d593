//! Client half: talks to the employee endpoints and keeps the state a UI
//! renders from.

pub mod api;
pub mod form;
pub mod state;
pub mod store;

pub use api::{ClientError, EmployeeApi, EmployeePayload, HttpEmployeeApi, ListParams};
pub use form::EmployeeForm;
pub use state::{EmployeeAction, EmployeeState, RequestFamily, RequestStatus};
pub use store::ClientStore;
