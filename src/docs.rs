use crate::api::employee::{
    EmployeeListResponse, EmployeeResponse, EmployeeUpload, MessageResponse,
};
use crate::model::employee::{Address, EmergencyContact, Employee, EmployeeStatus, ImageRef};
use crate::model::user::User;
use crate::models::{LoginReqDto, LoginResponse, RegisterReq};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Staffbook API",
        version = "1.0.0",
        description = r#"
## Staffbook

Employee directory for small teams. Every record belongs to the account that
created it; other accounts cannot see or change it.

### 🔹 Key Features
- **Accounts**
  - Register and log in to receive a bearer token
- **Employee Management**
  - Create, update, list, view and delete employee profiles
  - Search and filter by department or status, with pagination
  - Profile photo upload, cropped to 250x250 by the media store

### 🔐 Security
Every `/api` endpoint requires **JWT Bearer authentication**.

### 📦 Response Format
- JSON bodies shaped `{ "success": bool, ... }`
- Failures carry a human readable `message`
- Create and update accept `multipart/form-data` or a JSON object

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,

        crate::api::employee::list_employees,
        crate::api::employee::get_employee,
        crate::api::employee::create_employee,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee
    ),
    components(
        schemas(
            RegisterReq,
            LoginReqDto,
            LoginResponse,
            User,
            Employee,
            EmployeeStatus,
            Address,
            EmergencyContact,
            ImageRef,
            EmployeeUpload,
            EmployeeResponse,
            EmployeeListResponse,
            MessageResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Account registration and login"),
        (name = "Employee", description = "Employee management APIs"),
    )
)]
pub struct ApiDoc;

/// Prefix the employee paths are written with in the `#[utoipa::path]`
/// attributes. Routes are mounted under `Config::api_prefix` instead.
const DOCUMENTED_PREFIX: &str = "/api";

/// The API document with employee paths moved under `api_prefix`, so Swagger
/// matches wherever the protected scope is mounted.
pub fn openapi_for(api_prefix: &str) -> openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    let prefix = api_prefix.trim_end_matches('/');
    let paths = std::mem::take(&mut doc.paths.paths);
    doc.paths.paths = paths
        .into_iter()
        .map(|(path, item)| match path.strip_prefix(DOCUMENTED_PREFIX) {
            Some(rest) if rest.starts_with('/') => (format!("{prefix}{rest}"), item),
            _ => (path, item),
        })
        .collect();
    doc
}

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_employee_routes_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/employees"));
        assert!(doc.paths.paths.contains_key("/api/employees/{id}"));
        assert!(doc.paths.paths.contains_key("/auth/login"));

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(components.schemas.contains_key("Employee"));
    }

    #[test]
    fn employee_paths_follow_the_configured_prefix() {
        let doc = openapi_for("/v2/");
        assert!(doc.paths.paths.contains_key("/v2/employees"));
        assert!(doc.paths.paths.contains_key("/v2/employees/{id}"));
        assert!(!doc.paths.paths.contains_key("/api/employees"));
        assert!(doc.paths.paths.contains_key("/auth/register"));
    }

    #[test]
    fn default_prefix_leaves_paths_unchanged() {
        let doc = openapi_for("/api");
        assert_eq!(
            doc.paths.paths.keys().collect::<Vec<_>>(),
            ApiDoc::openapi().paths.paths.keys().collect::<Vec<_>>()
        );
    }
}
