//! Normalization of incoming employee payloads.
//!
//! Multipart forms deliver every field as text, with `address` and
//! `emergencyContact` JSON-encoded; JSON bodies deliver numbers and raw
//! objects. Both land in a `serde_json::Map` and go through one parsing step
//! here, producing typed values or a request-rejected error naming the field.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::model::employee::{
    Address, EmergencyContact, EmployeePatch, EmployeeStatus, ImageRef, NewEmployee,
};
use crate::validation::{is_valid_email, parse_salary};

/// Fields supplied by the caller. `None` means the key was absent; a blank
/// value is kept as an empty string so updates can tell "clear" from "leave".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmployeeInput {
    pub employee_id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub position: Option<String>,
    pub department: Option<String>,
    pub hire_date: Option<DateTime<Utc>>,
    pub salary: Option<Option<f64>>,
    pub status: Option<EmployeeStatus>,
    pub address: Option<Address>,
    pub emergency_contact: Option<EmergencyContact>,
}

fn text(fields: &Map<String, Value>, key: &str) -> Result<Option<String>, ApiError> {
    match fields.get(key) {
        None => Ok(None),
        Some(Value::Null) => Ok(Some(String::new())),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(_) => Err(ApiError::invalid_field(key)),
    }
}

/// Accepts a raw object or a JSON-encoded string. Blank means absent.
fn nested<T: DeserializeOwned>(fields: &Map<String, Value>, key: &str) -> Result<Option<T>, ApiError> {
    let parsed = match fields.get(key) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::String(s)) => serde_json::from_str(s),
        Some(value @ Value::Object(_)) => serde_json::from_value(value.clone()),
        Some(_) => return Err(ApiError::invalid_field(key)),
    };
    parsed.map(Some).map_err(|_| ApiError::invalid_field(key))
}

fn parse_hire_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn require(value: Option<String>, message: &str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::rejected(message))
}

fn optional(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn check_email(email: &str) -> Result<(), ApiError> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(ApiError::rejected("Email is invalid"))
    }
}

impl EmployeeInput {
    pub fn from_fields(fields: &Map<String, Value>) -> Result<Self, ApiError> {
        let salary = match fields.get("salary") {
            None => None,
            Some(Value::Number(n)) => Some(n.as_f64()),
            Some(_) => {
                let raw = text(fields, "salary")?.unwrap_or_default();
                Some(parse_salary(&raw).map_err(|_| ApiError::rejected("Salary must be a number"))?)
            }
        };

        let hire_date = match text(fields, "hireDate")? {
            Some(raw) if !raw.is_empty() => {
                Some(parse_hire_date(&raw).ok_or_else(|| ApiError::invalid_field("hireDate"))?)
            }
            _ => None,
        };

        let status = match text(fields, "status")? {
            Some(raw) if !raw.is_empty() => Some(
                EmployeeStatus::from_str(&raw).map_err(|_| ApiError::invalid_field("status"))?,
            ),
            _ => None,
        };

        Ok(Self {
            employee_id: text(fields, "employeeId")?,
            name: text(fields, "name")?,
            email: text(fields, "email")?,
            phone: text(fields, "phone")?,
            position: text(fields, "position")?,
            department: text(fields, "department")?,
            hire_date,
            salary,
            status,
            address: nested(fields, "address")?,
            emergency_contact: nested(fields, "emergencyContact")?,
        })
    }

    /// Builds a complete record for creation, applying defaults for anything
    /// left out.
    pub fn into_new_employee(
        self,
        owner: u64,
        profile_image: ImageRef,
        now: DateTime<Utc>,
    ) -> Result<NewEmployee, ApiError> {
        let name = require(self.name, "Name is required")?;
        let email = require(self.email, "Email is required")?;
        check_email(&email)?;
        let position = require(self.position, "Position is required")?;
        let department = require(self.department, "Department is required")?;

        Ok(NewEmployee {
            employee_id: optional(self.employee_id),
            name,
            email,
            phone: optional(self.phone),
            position,
            department,
            hire_date: self.hire_date.unwrap_or(now),
            salary: self.salary.flatten(),
            status: self.status.unwrap_or_default(),
            address: self.address.unwrap_or_default(),
            emergency_contact: self.emergency_contact.unwrap_or_default(),
            profile_image,
            created_by: owner,
        })
    }

    /// Builds a partial update. Required fields may be omitted but not
    /// blanked; blank optional fields are cleared.
    pub fn into_patch(self) -> Result<EmployeePatch, ApiError> {
        let name = self.name.map(|v| require(Some(v), "Name is required")).transpose()?;
        let email = self.email.map(|v| require(Some(v), "Email is required")).transpose()?;
        if let Some(email) = &email {
            check_email(email)?;
        }
        let position = self
            .position
            .map(|v| require(Some(v), "Position is required"))
            .transpose()?;
        let department = self
            .department
            .map(|v| require(Some(v), "Department is required"))
            .transpose()?;

        Ok(EmployeePatch {
            employee_id: self.employee_id.map(|v| optional(Some(v))),
            name,
            email,
            phone: self.phone.map(|v| optional(Some(v))),
            position,
            department,
            hire_date: self.hire_date,
            salary: self.salary,
            status: self.status,
            address: self.address,
            emergency_contact: self.emergency_contact,
            profile_image: None,
        })
    }
}
