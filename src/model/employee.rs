use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
pub enum EmployeeStatus {
    #[default]
    #[serde(rename = "active")]
    #[strum(serialize = "active")]
    Active,
    #[serde(rename = "on leave")]
    #[strum(serialize = "on leave")]
    OnLeave,
    #[serde(rename = "terminated")]
    #[strum(serialize = "terminated")]
    Terminated,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    #[schema(example = "221B Baker Street")]
    pub street: Option<String>,
    #[schema(example = "London")]
    pub city: Option<String>,
    pub state: Option<String>,
    #[schema(example = "NW1 6XE")]
    pub zip_code: Option<String>,
    #[schema(example = "UK")]
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct EmergencyContact {
    pub name: Option<String>,
    #[schema(example = "sibling")]
    pub relationship: Option<String>,
    pub phone: Option<String>,
}

/// Reference to an object held by the media store.
///
/// Always written as `{public_id, url}`. A bare URL string is accepted on input
/// as a legacy shape and normalized by deriving `public_id` from the last path
/// segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ImageRef {
    #[schema(example = "employees/abc123")]
    pub public_id: String,
    #[schema(example = "https://res.cloudinary.com/demo/image/upload/abc123.jpg")]
    pub url: String,
}

impl ImageRef {
    pub fn new(public_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            public_id: public_id.into(),
            url: url.into(),
        }
    }

    pub fn from_legacy_url(url: &str) -> Self {
        let file = url.rsplit('/').next().unwrap_or(url);
        let stem = file.split('.').next().unwrap_or(file);
        Self::new(stem, url)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawImageRef {
    Full { public_id: String, url: String },
    Legacy(String),
}

impl<'de> Deserialize<'de> for ImageRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawImageRef::deserialize(deserializer)? {
            RawImageRef::Full { public_id, url } => ImageRef { public_id, url },
            RawImageRef::Legacy(url) => ImageRef::from_legacy_url(&url),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(
    example = json!({
        "id": "5f0c2d9e-3c1a-4b7e-9a43-1c7f0f2b9d11",
        "employeeId": "EMP-001",
        "name": "Ada Lovelace",
        "email": "ada@x.com",
        "phone": "+44 20 7946 0000",
        "position": "Engineer",
        "department": "R&D",
        "hireDate": "2024-01-01T00:00:00Z",
        "salary": 85000.0,
        "status": "active",
        "address": { "city": "London", "country": "UK" },
        "emergencyContact": { "name": "Byron", "relationship": "parent" },
        "profileImage": {
            "public_id": "employees/default",
            "url": "https://res.cloudinary.com/demo/image/upload/v1312461204/sample.jpg"
        },
        "createdBy": 7,
        "createdAt": "2024-01-01T09:30:00Z",
        "updatedAt": "2024-01-01T09:30:00Z"
    })
)]
pub struct Employee {
    pub id: String,
    #[serde(default)]
    pub employee_id: Option<String>,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub position: String,
    pub department: String,
    #[schema(value_type = String, format = DateTime)]
    pub hire_date: DateTime<Utc>,
    #[serde(default)]
    pub salary: Option<f64>,
    #[serde(default)]
    pub status: EmployeeStatus,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub emergency_contact: EmergencyContact,
    pub profile_image: ImageRef,
    pub created_by: u64,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTime<Utc>,
}

/// A fully-resolved record ready to be persisted. The store assigns `id`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEmployee {
    pub employee_id: Option<String>,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub position: String,
    pub department: String,
    pub hire_date: DateTime<Utc>,
    pub salary: Option<f64>,
    pub status: EmployeeStatus,
    pub address: Address,
    pub emergency_contact: EmergencyContact,
    pub profile_image: ImageRef,
    pub created_by: u64,
}

/// Partial update. `None` leaves the stored value untouched; for optional
/// columns `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmployeePatch {
    pub employee_id: Option<Option<String>>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<Option<String>>,
    pub position: Option<String>,
    pub department: Option<String>,
    pub hire_date: Option<DateTime<Utc>>,
    pub salary: Option<Option<f64>>,
    pub status: Option<EmployeeStatus>,
    pub address: Option<Address>,
    pub emergency_contact: Option<EmergencyContact>,
    pub profile_image: Option<ImageRef>,
}

impl EmployeePatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge the supplied fields into `employee`, stamping `updated_at`.
    pub fn apply_to(&self, employee: &mut Employee, now: DateTime<Utc>) {
        if let Some(v) = &self.employee_id {
            employee.employee_id = v.clone();
        }
        if let Some(v) = &self.name {
            employee.name = v.clone();
        }
        if let Some(v) = &self.email {
            employee.email = v.clone();
        }
        if let Some(v) = &self.phone {
            employee.phone = v.clone();
        }
        if let Some(v) = &self.position {
            employee.position = v.clone();
        }
        if let Some(v) = &self.department {
            employee.department = v.clone();
        }
        if let Some(v) = self.hire_date {
            employee.hire_date = v;
        }
        if let Some(v) = self.salary {
            employee.salary = v;
        }
        if let Some(v) = self.status {
            employee.status = v;
        }
        if let Some(v) = &self.address {
            employee.address = v.clone();
        }
        if let Some(v) = &self.emergency_contact {
            employee.emergency_contact = v.clone();
        }
        if let Some(v) = &self.profile_image {
            employee.profile_image = v.clone();
        }
        employee.updated_at = now;
    }
}
