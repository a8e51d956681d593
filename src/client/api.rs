//! HTTP access to the employee endpoints from the client side.

use async_trait::async_trait;
use derive_more::Display;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use crate::media::ImageUpload;
use crate::model::employee::{Address, EmergencyContact, Employee};
use crate::store::{DEFAULT_LIMIT, DEFAULT_PAGE};

#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The server answered with a non-success status.
    #[display(fmt = "Request failed with status {}", status)]
    Server {
        status: u16,
        message: Option<String>,
    },

    /// No usable response: connection refused, timeout, undecodable body.
    #[display(fmt = "Request could not be completed: {}", _0)]
    Transport(String),
}

impl ClientError {
    /// The human-readable message the server attached to its failure, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ClientError::Server { message, .. } => message.as_deref(),
            ClientError::Transport(_) => None,
        }
    }
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Transport(e.to_string())
    }
}

/// Listing filters. Blank filters are left off the query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    pub page: u32,
    pub limit: u32,
    pub search: String,
    pub department: String,
    pub status: String,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            search: String::new(),
            department: String::new(),
            status: String::new(),
        }
    }
}

impl ListParams {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
        ];
        for (key, value) in [
            ("search", &self.search),
            ("department", &self.department),
            ("status", &self.status),
        ] {
            if !value.trim().is_empty() {
                pairs.push((key, value.trim().to_string()));
            }
        }
        pairs
    }
}

/// One page of the listing as the server reports it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeListing {
    pub data: Vec<Employee>,
    pub total_employees: u64,
    pub total_pages: u64,
    pub current_page: u32,
}

/// Everything a create or update submits. Scalars travel as text exactly as
/// entered; a blank optional scalar clears it on update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmployeePayload {
    pub employee_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub position: String,
    pub department: String,
    pub hire_date: String,
    pub salary: String,
    pub status: String,
    pub address: Address,
    pub emergency_contact: EmergencyContact,
    pub profile_image: Option<ImageUpload>,
}

impl EmployeePayload {
    /// Form fields in submission order, nested objects JSON-encoded.
    pub fn text_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("employeeId", self.employee_id.clone()),
            ("name", self.name.clone()),
            ("email", self.email.clone()),
            ("phone", self.phone.clone()),
            ("position", self.position.clone()),
            ("department", self.department.clone()),
            ("hireDate", self.hire_date.clone()),
            ("salary", self.salary.clone()),
            ("status", self.status.clone()),
            ("address", json!(self.address).to_string()),
            ("emergencyContact", json!(self.emergency_contact).to_string()),
        ]
    }

    fn to_form(&self) -> Result<Form, ClientError> {
        let mut form = Form::new();
        for (key, value) in self.text_fields() {
            form = form.text(key, value);
        }
        if let Some(image) = &self.profile_image {
            let part = Part::bytes(image.bytes.clone())
                .file_name(image.file_name.clone())
                .mime_str(&image.content_type)?;
            form = form.part("profileImage", part);
        }
        Ok(form)
    }
}

/// The operations the client store drives.
#[async_trait]
pub trait EmployeeApi: Send + Sync {
    async fn list(&self, params: &ListParams) -> Result<EmployeeListing, ClientError>;
    async fn get(&self, id: &str) -> Result<Employee, ClientError>;
    async fn create(&self, payload: &EmployeePayload) -> Result<Employee, ClientError>;
    async fn update(&self, id: &str, payload: &EmployeePayload) -> Result<Employee, ClientError>;
    async fn delete(&self, id: &str) -> Result<(), ClientError>;
}

#[derive(Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct FailureBody {
    message: Option<String>,
}

#[derive(Deserialize)]
struct TokenBody {
    token: String,
}

/// `EmployeeApi` over HTTP with a bearer token.
pub struct HttpEmployeeApi {
    client: Client,
    base_url: String,
    api_prefix: String,
    token: Option<String>,
}

impl HttpEmployeeApi {
    pub fn new(base_url: impl Into<String>, api_prefix: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_prefix: api_prefix.into(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn employees_url(&self, id: Option<&str>) -> String {
        match id {
            Some(id) => format!("{}{}/employees/{id}", self.base_url, self.api_prefix),
            None => format!("{}{}/employees", self.base_url, self.api_prefix),
        }
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Logs in and keeps the returned token for later requests.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<(), ClientError> {
        let response = self
            .client
            .post(format!("{}/auth/login", self.base_url))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let body: TokenBody = read_json(response).await?;
        self.token = Some(body.token);
        Ok(())
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<(), ClientError> {
        let response = self
            .client
            .post(format!("{}/auth/register", self.base_url))
            .json(&json!({ "name": name, "email": email, "password": password }))
            .send()
            .await?;
        check_status(response).await.map(|_| ())
    }

    /// Drops the stored token.
    pub fn logout(&mut self) {
        self.token = None;
    }
}

async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .json::<FailureBody>()
        .await
        .ok()
        .and_then(|body| body.message);
    debug!(status = status.as_u16(), ?message, "Employee request rejected");
    Err(ClientError::Server {
        status: status.as_u16(),
        message,
    })
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    Ok(check_status(response).await?.json::<T>().await?)
}

#[async_trait]
impl EmployeeApi for HttpEmployeeApi {
    async fn list(&self, params: &ListParams) -> Result<EmployeeListing, ClientError> {
        let request = self
            .client
            .get(self.employees_url(None))
            .query(&params.query_pairs());
        read_json(self.authorized(request).send().await?).await
    }

    async fn get(&self, id: &str) -> Result<Employee, ClientError> {
        let request = self.client.get(self.employees_url(Some(id)));
        let envelope: DataEnvelope<Employee> = read_json(self.authorized(request).send().await?).await?;
        Ok(envelope.data)
    }

    async fn create(&self, payload: &EmployeePayload) -> Result<Employee, ClientError> {
        let request = self
            .client
            .post(self.employees_url(None))
            .multipart(payload.to_form()?);
        let envelope: DataEnvelope<Employee> = read_json(self.authorized(request).send().await?).await?;
        Ok(envelope.data)
    }

    async fn update(&self, id: &str, payload: &EmployeePayload) -> Result<Employee, ClientError> {
        let request = self
            .client
            .put(self.employees_url(Some(id)))
            .multipart(payload.to_form()?);
        let envelope: DataEnvelope<Employee> = read_json(self.authorized(request).send().await?).await?;
        Ok(envelope.data)
    }

    async fn delete(&self, id: &str) -> Result<(), ClientError> {
        let request = self.client.delete(self.employees_url(Some(id)));
        check_status(self.authorized(request).send().await?).await?;
        Ok(())
    }
}
