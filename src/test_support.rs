//! Collaborators shared by the in-crate test modules.

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use actix_web::ResponseError;
use anyhow::anyhow;
use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::client::api::{ClientError, EmployeeApi, EmployeeListing, EmployeePayload, ListParams};
use crate::error::ApiError;
use crate::media::{ImageUpload, MediaStore};
use crate::model::employee::{Employee, EmployeeStatus, ImageRef};
use crate::service::{EmployeeInput, EmployeeService};
use crate::store::{ListQuery, MemoryEmployeeStore};

pub const PLACEHOLDER_ID: &str = "employees/default";
pub const PLACEHOLDER_URL: &str = "https://res.cloudinary.com/demo/image/upload/v1312461204/sample.jpg";

pub fn placeholder() -> ImageRef {
    ImageRef::new(PLACEHOLDER_ID, PLACEHOLDER_URL)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaCall {
    Upload(String),
    Delete(String),
}

/// Media store that records every call and can be told to fail.
#[derive(Default)]
pub struct FakeMedia {
    calls: Mutex<Vec<MediaCall>>,
    uploads: Mutex<u32>,
    fail_upload: Mutex<bool>,
    fail_delete: Mutex<bool>,
}

impl FakeMedia {
    pub fn calls(&self) -> Vec<MediaCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn set_fail_upload(&self, fail: bool) {
        *self.fail_upload.lock().unwrap() = fail;
    }

    pub fn set_fail_delete(&self, fail: bool) {
        *self.fail_delete.lock().unwrap() = fail;
    }
}

#[async_trait]
impl MediaStore for FakeMedia {
    async fn upload(&self, image: &ImageUpload) -> anyhow::Result<ImageRef> {
        self.calls
            .lock()
            .unwrap()
            .push(MediaCall::Upload(image.file_name.clone()));
        if *self.fail_upload.lock().unwrap() {
            return Err(anyhow!("upload refused"));
        }
        let mut n = self.uploads.lock().unwrap();
        *n += 1;
        let public_id = format!("employees/img{}", *n);
        Ok(ImageRef::new(
            public_id.clone(),
            format!("https://media.test/{public_id}.jpg"),
        ))
    }

    async fn delete(&self, image: &ImageRef) -> anyhow::Result<bool> {
        self.calls
            .lock()
            .unwrap()
            .push(MediaCall::Delete(image.public_id.clone()));
        if *self.fail_delete.lock().unwrap() {
            return Err(anyhow!("delete refused"));
        }
        Ok(true)
    }
}

pub fn png(name: &str) -> ImageUpload {
    ImageUpload {
        file_name: name.to_string(),
        content_type: "image/png".into(),
        bytes: vec![0x89, b'P', b'N', b'G'],
    }
}

pub struct Harness {
    pub store: Arc<MemoryEmployeeStore>,
    pub media: Arc<FakeMedia>,
    pub service: Arc<EmployeeService>,
}

pub fn harness() -> Harness {
    let store = Arc::new(MemoryEmployeeStore::new());
    let media = Arc::new(FakeMedia::default());
    let service = Arc::new(EmployeeService::new(
        store.clone(),
        media.clone(),
        placeholder(),
    ));
    Harness {
        store,
        media,
        service,
    }
}

/// `EmployeeApi` that skips HTTP and calls the service directly as one owner,
/// translating errors into what the HTTP layer would have answered.
pub struct ServiceApi {
    owner: u64,
    harness: Harness,
    offline: AtomicBool,
}

impl ServiceApi {
    pub fn new(owner: u64) -> Self {
        Self {
            owner,
            harness: harness(),
            offline: AtomicBool::new(false),
        }
    }

    pub fn harness(&self) -> &Harness {
        &self.harness
    }

    /// While offline every call fails without a response.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn reachable(&self) -> Result<(), ClientError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(ClientError::Transport("connection refused".into()))
        } else {
            Ok(())
        }
    }

    fn input(payload: &EmployeePayload) -> Result<EmployeeInput, ClientError> {
        let fields: Map<String, Value> = payload
            .text_fields()
            .into_iter()
            .map(|(k, v)| (k.to_string(), Value::String(v)))
            .collect();
        EmployeeInput::from_fields(&fields).map_err(rejected)
    }
}

fn rejected(e: ApiError) -> ClientError {
    ClientError::Server {
        status: e.status_code().as_u16(),
        message: Some(e.to_string()),
    }
}

#[async_trait]
impl EmployeeApi for ServiceApi {
    async fn list(&self, params: &ListParams) -> Result<EmployeeListing, ClientError> {
        self.reachable()?;
        let status = match params.status.trim() {
            "" => None,
            raw => Some(EmployeeStatus::from_str(raw).map_err(|_| rejected(ApiError::invalid_field("status")))?),
        };
        let query = ListQuery::new(
            Some(params.page),
            Some(params.limit),
            Some(params.search.clone()),
            Some(params.department.clone()),
            status,
        );
        let page = self.harness.service.list(self.owner, &query).await.map_err(rejected)?;
        Ok(EmployeeListing {
            data: page.items,
            total_employees: page.total_count,
            total_pages: page.total_pages,
            current_page: page.current_page,
        })
    }

    async fn get(&self, id: &str) -> Result<Employee, ClientError> {
        self.reachable()?;
        self.harness.service.get(self.owner, id).await.map_err(rejected)
    }

    async fn create(&self, payload: &EmployeePayload) -> Result<Employee, ClientError> {
        self.reachable()?;
        let input = Self::input(payload)?;
        self.harness
            .service
            .create(self.owner, input, payload.profile_image.clone())
            .await
            .map_err(rejected)
    }

    async fn update(&self, id: &str, payload: &EmployeePayload) -> Result<Employee, ClientError> {
        self.reachable()?;
        let input = Self::input(payload)?;
        self.harness
            .service
            .update(self.owner, id, input, payload.profile_image.clone())
            .await
            .map_err(rejected)
    }

    async fn delete(&self, id: &str) -> Result<(), ClientError> {
        self.reachable()?;
        self.harness.service.delete(self.owner, id).await.map_err(rejected)
    }
}
