use std::str::FromStr;

use actix_web::{HttpRequest, HttpResponse, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    api::submission::read_submission,
    auth::AuthUser,
    config::Config,
    error::ApiError,
    model::employee::{Employee, EmployeeStatus},
    service::{EmployeeInput, EmployeeService},
    store::ListQuery,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct EmployeeQuery {
    /// Page number, starting at 1
    pub page: Option<u32>,
    /// Items per page (default 10, max 100)
    pub limit: Option<u32>,
    /// Free-text match over name, email, position, department and employee id
    pub search: Option<String>,
    pub department: Option<String>,
    /// `active`, `on leave` or `terminated`
    pub status: Option<String>,
}

impl EmployeeQuery {
    fn into_list_query(self) -> Result<ListQuery, ApiError> {
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(EmployeeStatus::from_str(raw).map_err(|_| ApiError::invalid_field("status"))?),
        };
        Ok(ListQuery::new(
            self.page,
            self.limit,
            self.search,
            self.department,
            status,
        ))
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeListResponse {
    #[schema(example = true)]
    pub success: bool,
    #[schema(example = 10)]
    pub count: usize,
    #[schema(example = 25)]
    pub total_employees: u64,
    #[schema(example = 3)]
    pub total_pages: u64,
    #[schema(example = 1)]
    pub current_page: u32,
    pub data: Vec<Employee>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeResponse {
    #[schema(example = true)]
    pub success: bool,
    pub data: Employee,
}

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = true)]
    pub success: bool,
    #[schema(example = "Employee deleted successfully")]
    pub message: String,
}

/// Multipart body accepted by create and update. Every field is optional on
/// update.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[allow(dead_code)]
pub struct EmployeeUpload {
    #[schema(example = "Ada Lovelace")]
    name: String,
    #[schema(example = "ada@x.com")]
    email: String,
    phone: Option<String>,
    #[schema(example = "Engineer")]
    position: String,
    #[schema(example = "R&D")]
    department: String,
    #[schema(example = "2024-01-01")]
    hire_date: Option<String>,
    salary: Option<String>,
    #[schema(example = "active")]
    status: Option<String>,
    employee_id: Option<String>,
    /// JSON-encoded address object
    #[schema(example = "{\"city\":\"London\",\"country\":\"UK\"}")]
    address: Option<String>,
    /// JSON-encoded emergency contact object
    emergency_contact: Option<String>,
    #[schema(value_type = Option<String>, format = Binary)]
    profile_image: Option<Vec<u8>>,
}

#[utoipa::path(
    get,
    path = "/api/employees",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeeListResponse),
        (status = 400, description = "Invalid filter"),
        (status = 401, description = "Missing or invalid bearer token")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn list_employees(
    auth: AuthUser,
    service: web::Data<EmployeeService>,
    query: web::Query<EmployeeQuery>,
) -> Result<HttpResponse, ApiError> {
    let query = query.into_inner().into_list_query()?;
    let page = service.list(auth.user_id, &query).await?;

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        success: true,
        count: page.items.len(),
        total_employees: page.total_count,
        total_pages: page.total_pages,
        current_page: page.current_page,
        data: page.items,
    }))
}

#[utoipa::path(
    get,
    path = "/api/employees/{id}",
    params(("id", Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee found", body = EmployeeResponse),
        (status = 404, description = "Employee not found or you do not have permission", body = MessageResponse)
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn get_employee(
    auth: AuthUser,
    service: web::Data<EmployeeService>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let employee = service.get(auth.user_id, &path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(EmployeeResponse {
        success: true,
        data: employee,
    }))
}

#[utoipa::path(
    post,
    path = "/api/employees",
    request_body(content = EmployeeUpload, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Employee created", body = EmployeeResponse),
        (status = 400, description = "Missing or malformed field", body = MessageResponse),
        (status = 502, description = "Profile image upload failed", body = MessageResponse),
        (status = 500, description = "Storage failure", body = MessageResponse)
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn create_employee(
    auth: AuthUser,
    req: HttpRequest,
    payload: web::Payload,
    service: web::Data<EmployeeService>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let submission = read_submission(&req, payload, config.max_image_bytes).await?;
    let input = EmployeeInput::from_fields(&submission.fields)?;

    let employee = service
        .create(auth.user_id, input, submission.image)
        .await?;

    Ok(HttpResponse::Created().json(EmployeeResponse {
        success: true,
        data: employee,
    }))
}

#[utoipa::path(
    put,
    path = "/api/employees/{id}",
    params(("id", Path, description = "Employee ID")),
    request_body(content = EmployeeUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Employee updated", body = EmployeeResponse),
        (status = 400, description = "Malformed field", body = MessageResponse),
        (status = 404, description = "Employee not found or you do not have permission", body = MessageResponse),
        (status = 502, description = "Profile image upload failed", body = MessageResponse)
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn update_employee(
    auth: AuthUser,
    req: HttpRequest,
    payload: web::Payload,
    path: web::Path<String>,
    service: web::Data<EmployeeService>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let submission = read_submission(&req, payload, config.max_image_bytes).await?;
    let input = EmployeeInput::from_fields(&submission.fields)?;

    let employee = service
        .update(auth.user_id, &path.into_inner(), input, submission.image)
        .await?;

    Ok(HttpResponse::Ok().json(EmployeeResponse {
        success: true,
        data: employee,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/employees/{id}",
    params(("id", Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee deleted", body = MessageResponse),
        (status = 404, description = "Employee not found or you do not have permission", body = MessageResponse)
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn delete_employee(
    auth: AuthUser,
    service: web::Data<EmployeeService>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    service.delete(auth.user_id, &path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(MessageResponse {
        success: true,
        message: "Employee deleted successfully".into(),
    }))
}
