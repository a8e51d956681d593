//! Employee add/edit form: field state, client-side checks, and submission
//! through the [`ClientStore`].

use std::collections::BTreeMap;

use chrono::SecondsFormat;
use derive_more::Display;

use crate::client::api::{ClientError, EmployeeApi, EmployeePayload};
use crate::client::store::ClientStore;
use crate::media::ImageUpload;
use crate::model::employee::{Employee, EmployeeStatus};
use crate::validation::{is_valid_email, parse_salary};

#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum FormError {
    #[display(fmt = "Unknown form field {}", _0)]
    UnknownField(String),

    /// Client-side checks failed; see [`EmployeeForm::errors`].
    #[display(fmt = "Please correct the highlighted fields")]
    Invalid,

    #[display(fmt = "{}", _0)]
    Rejected(ClientError),
}

impl std::error::Error for FormError {}

impl From<ClientError> for FormError {
    fn from(e: ClientError) -> Self {
        FormError::Rejected(e)
    }
}

/// What the image slot shows before submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImagePreview {
    /// Stored image of the record being edited.
    Remote(String),
    /// A picked file not yet uploaded.
    Local { file_name: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeForm {
    values: EmployeePayload,
    errors: BTreeMap<String, String>,
    editing: Option<String>,
    preview: Option<ImagePreview>,
}

impl Default for EmployeeForm {
    fn default() -> Self {
        Self::new()
    }
}

impl EmployeeForm {
    /// Blank form in create mode.
    pub fn new() -> Self {
        Self {
            values: EmployeePayload {
                status: EmployeeStatus::Active.to_string(),
                ..EmployeePayload::default()
            },
            errors: BTreeMap::new(),
            editing: None,
            preview: None,
        }
    }

    pub fn is_edit_mode(&self) -> bool {
        self.editing.is_some()
    }

    pub fn editing_id(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    pub fn preview(&self) -> Option<&ImagePreview> {
        self.preview.as_ref()
    }

    pub fn payload(&self) -> &EmployeePayload {
        &self.values
    }

    fn slot(&mut self, path: &str) -> Option<&mut String> {
        let v = &mut self.values;
        let slot = match path {
            "employeeId" => &mut v.employee_id,
            "name" => &mut v.name,
            "email" => &mut v.email,
            "phone" => &mut v.phone,
            "position" => &mut v.position,
            "department" => &mut v.department,
            "hireDate" => &mut v.hire_date,
            "salary" => &mut v.salary,
            "status" => &mut v.status,
            _ => return None,
        };
        Some(slot)
    }

    fn nested_slot(&mut self, path: &str) -> Option<&mut Option<String>> {
        let (head, field) = path.split_once('.')?;
        let slot = match (head, field) {
            ("address", "street") => &mut self.values.address.street,
            ("address", "city") => &mut self.values.address.city,
            ("address", "state") => &mut self.values.address.state,
            ("address", "zipCode") => &mut self.values.address.zip_code,
            ("address", "country") => &mut self.values.address.country,
            ("emergencyContact", "name") => &mut self.values.emergency_contact.name,
            ("emergencyContact", "relationship") => &mut self.values.emergency_contact.relationship,
            ("emergencyContact", "phone") => &mut self.values.emergency_contact.phone,
            _ => return None,
        };
        Some(slot)
    }

    /// Sets a field by its path, e.g. `name` or `address.city`, and clears
    /// any error shown for it.
    pub fn set_field(&mut self, path: &str, value: impl Into<String>) -> Result<(), FormError> {
        let value = value.into();
        if let Some(slot) = self.slot(path) {
            *slot = value;
        } else if let Some(slot) = self.nested_slot(path) {
            *slot = Some(value);
        } else {
            return Err(FormError::UnknownField(path.to_string()));
        }
        self.errors.remove(path);
        Ok(())
    }

    pub fn field(&self, path: &str) -> Option<&str> {
        let v = &self.values;
        let value = match path {
            "employeeId" => &v.employee_id,
            "name" => &v.name,
            "email" => &v.email,
            "phone" => &v.phone,
            "position" => &v.position,
            "department" => &v.department,
            "hireDate" => &v.hire_date,
            "salary" => &v.salary,
            "status" => &v.status,
            "address.street" => return Some(v.address.street.as_deref().unwrap_or_default()),
            "address.city" => return Some(v.address.city.as_deref().unwrap_or_default()),
            "address.state" => return Some(v.address.state.as_deref().unwrap_or_default()),
            "address.zipCode" => return Some(v.address.zip_code.as_deref().unwrap_or_default()),
            "address.country" => return Some(v.address.country.as_deref().unwrap_or_default()),
            "emergencyContact.name" => {
                return Some(v.emergency_contact.name.as_deref().unwrap_or_default());
            }
            "emergencyContact.relationship" => {
                return Some(v.emergency_contact.relationship.as_deref().unwrap_or_default());
            }
            "emergencyContact.phone" => {
                return Some(v.emergency_contact.phone.as_deref().unwrap_or_default());
            }
            _ => return None,
        };
        Some(value.as_str())
    }

    pub fn set_image(&mut self, image: ImageUpload) {
        self.preview = Some(ImagePreview::Local {
            file_name: image.file_name.clone(),
        });
        self.values.profile_image = Some(image);
    }

    /// Runs the client-side checks. On failure the messages are kept in
    /// [`errors`](Self::errors), keyed by field.
    pub fn validate(&mut self) -> bool {
        let v = &self.values;
        let mut errors = BTreeMap::new();

        if v.name.trim().is_empty() {
            errors.insert("name".to_string(), "Employee name is required".to_string());
        }
        if v.email.trim().is_empty() {
            errors.insert("email".to_string(), "Email is required".to_string());
        } else if !is_valid_email(v.email.trim()) {
            errors.insert("email".to_string(), "Email is invalid".to_string());
        }
        if v.position.trim().is_empty() {
            errors.insert("position".to_string(), "Position is required".to_string());
        }
        if v.department.trim().is_empty() {
            errors.insert("department".to_string(), "Department is required".to_string());
        }
        if parse_salary(&v.salary).is_err() {
            errors.insert("salary".to_string(), "Salary must be a number".to_string());
        }

        self.errors = errors;
        self.errors.is_empty()
    }

    /// Validates, then creates (no bound record) or updates (edit mode).
    /// Nothing is sent when validation fails.
    pub async fn submit<A: EmployeeApi>(&mut self, store: &mut ClientStore<A>) -> Result<Employee, FormError> {
        if !self.validate() {
            return Err(FormError::Invalid);
        }

        let saved = match &self.editing {
            Some(id) => store.update_employee(id, &self.values).await?,
            None => store.create_employee(&self.values).await?,
        };

        // the stored image now stands in for the picked file
        self.values.profile_image = None;
        self.preview = Some(ImagePreview::Remote(saved.profile_image.url.clone()));
        Ok(saved)
    }

    /// Switches to edit mode for `id` and back-fills every field from the
    /// stored record.
    pub async fn load_for_edit<A: EmployeeApi>(
        &mut self,
        store: &mut ClientStore<A>,
        id: &str,
    ) -> Result<(), FormError> {
        let employee = store.fetch_employee(id).await?;
        self.fill_from(&employee);
        Ok(())
    }

    pub fn fill_from(&mut self, employee: &Employee) {
        self.values = EmployeePayload {
            employee_id: employee.employee_id.clone().unwrap_or_default(),
            name: employee.name.clone(),
            email: employee.email.clone(),
            phone: employee.phone.clone().unwrap_or_default(),
            position: employee.position.clone(),
            department: employee.department.clone(),
            // full precision, so resubmitting leaves the stored value as is
            hire_date: employee.hire_date.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            salary: employee.salary.map(|s| s.to_string()).unwrap_or_default(),
            status: employee.status.to_string(),
            address: employee.address.clone(),
            emergency_contact: employee.emergency_contact.clone(),
            profile_image: None,
        };
        self.errors.clear();
        self.editing = Some(employee.id.clone());
        self.preview = Some(ImagePreview::Remote(employee.profile_image.url.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::state::{RequestFamily, RequestStatus};
    use crate::test_support::{MediaCall, PLACEHOLDER_URL, ServiceApi, png};
    use rstest::rstest;

    fn filled() -> EmployeeForm {
        let mut form = EmployeeForm::new();
        form.set_field("name", "Ada").unwrap();
        form.set_field("email", "ada@x.com").unwrap();
        form.set_field("position", "Eng").unwrap();
        form.set_field("department", "R&D").unwrap();
        form
    }

    #[test]
    fn new_form_defaults_to_active_create_mode() {
        let form = EmployeeForm::new();
        assert_eq!(form.field("status"), Some("active"));
        assert!(!form.is_edit_mode());
        assert_eq!(form.preview(), None);
    }

    #[test]
    fn dotted_paths_reach_nested_fields() {
        let mut form = EmployeeForm::new();
        form.set_field("address.city", "London").unwrap();
        form.set_field("emergencyContact.phone", "555-0101").unwrap();

        assert_eq!(form.payload().address.city.as_deref(), Some("London"));
        assert_eq!(form.payload().emergency_contact.phone.as_deref(), Some("555-0101"));
        assert_eq!(form.field("address.city"), Some("London"));
        assert_eq!(form.field("address.street"), Some(""));
    }

    #[rstest]
    #[case("nickname")]
    #[case("address.planet")]
    #[case("address")]
    #[case("emergencyContact.email")]
    fn unknown_paths_are_rejected(#[case] path: &str) {
        let mut form = EmployeeForm::new();
        assert_eq!(
            form.set_field(path, "x"),
            Err(FormError::UnknownField(path.to_string()))
        );
    }

    #[test]
    fn blank_form_reports_every_required_field() {
        let mut form = EmployeeForm::new();
        assert!(!form.validate());

        let errors = form.errors();
        assert_eq!(errors["name"], "Employee name is required");
        assert_eq!(errors["email"], "Email is required");
        assert_eq!(errors["position"], "Position is required");
        assert_eq!(errors["department"], "Department is required");
        assert!(!errors.contains_key("salary"));
    }

    #[rstest]
    #[case("email", "not-an-email", "Email is invalid")]
    #[case("salary", "lots", "Salary must be a number")]
    fn shape_checks(#[case] path: &str, #[case] value: &str, #[case] message: &str) {
        let mut form = filled();
        form.set_field(path, value).unwrap();
        assert!(!form.validate());
        assert_eq!(form.errors()[path], message);
    }

    #[test]
    fn editing_a_field_clears_its_error() {
        let mut form = EmployeeForm::new();
        form.validate();
        form.set_field("name", "Ada").unwrap();

        assert!(!form.errors().contains_key("name"));
        assert!(form.errors().contains_key("email"));
    }

    #[actix_web::test]
    async fn invalid_form_never_reaches_the_api() {
        let mut store = ClientStore::new(ServiceApi::new(1));
        let mut form = EmployeeForm::new();

        assert_eq!(form.submit(&mut store).await, Err(FormError::Invalid));
        assert_eq!(store.state().requests.of(RequestFamily::Create), RequestStatus::Idle);
        assert!(store.api().harness().store.is_empty());
    }

    #[actix_web::test]
    async fn submit_in_create_mode_creates_with_nested_fields() {
        let mut store = ClientStore::new(ServiceApi::new(1));
        let mut form = filled();
        form.set_field("address.city", "London").unwrap();
        form.set_field("salary", "1200").unwrap();

        let created = form.submit(&mut store).await.unwrap();

        assert_eq!(created.address.city.as_deref(), Some("London"));
        assert_eq!(created.salary, Some(1200.0));
        assert_eq!(created.profile_image.url, PLACEHOLDER_URL);
        assert!(store.state().success);
        assert_eq!(store.state().employees.len(), 1);
    }

    #[actix_web::test]
    async fn submit_sends_picked_image() {
        let mut store = ClientStore::new(ServiceApi::new(1));
        let mut form = filled();
        form.set_image(png("ada.png"));
        assert_eq!(
            form.preview(),
            Some(&ImagePreview::Local {
                file_name: "ada.png".into()
            })
        );

        let created = form.submit(&mut store).await.unwrap();

        assert_eq!(created.profile_image.public_id, "employees/img1");
        assert_eq!(
            store.api().harness().media.calls(),
            vec![MediaCall::Upload("ada.png".into())]
        );
        assert_eq!(
            form.preview(),
            Some(&ImagePreview::Remote(created.profile_image.url.clone()))
        );
    }

    #[actix_web::test]
    async fn edit_mode_back_fills_and_updates() {
        let mut store = ClientStore::new(ServiceApi::new(1));
        let mut creator = filled();
        creator.set_field("address.country", "UK").unwrap();
        creator.set_field("hireDate", "2024-03-01").unwrap();
        creator.set_field("salary", "85000").unwrap();
        let created = creator.submit(&mut store).await.unwrap();

        let mut form = EmployeeForm::new();
        form.load_for_edit(&mut store, &created.id).await.unwrap();

        assert!(form.is_edit_mode());
        assert_eq!(form.field("name"), Some("Ada"));
        assert_eq!(form.field("address.country"), Some("UK"));
        assert_eq!(form.field("hireDate"), Some("2024-03-01T00:00:00Z"));
        assert_eq!(form.field("salary"), Some("85000"));
        assert_eq!(form.preview(), Some(&ImagePreview::Remote(PLACEHOLDER_URL.into())));

        form.set_field("department", "Ops").unwrap();
        let updated = form.submit(&mut store).await.unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.department, "Ops");
        assert_eq!(updated.address.country.as_deref(), Some("UK"));
        assert_eq!(updated.salary, Some(85000.0));
        assert_eq!(updated.hire_date, created.hire_date);
        assert_eq!(store.api().harness().store.len(), 1);
    }

    #[actix_web::test]
    async fn editing_keeps_a_defaulted_hire_date_intact() {
        let mut store = ClientStore::new(ServiceApi::new(1));
        let created = filled().submit(&mut store).await.unwrap();

        let mut form = EmployeeForm::new();
        form.load_for_edit(&mut store, &created.id).await.unwrap();
        form.set_field("department", "Ops").unwrap();
        let updated = form.submit(&mut store).await.unwrap();

        assert_eq!(updated.department, "Ops");
        assert_eq!(updated.hire_date, created.hire_date);
    }

    #[actix_web::test]
    async fn loading_a_missing_record_reports_not_found() {
        let mut store = ClientStore::new(ServiceApi::new(1));
        let mut form = EmployeeForm::new();

        let err = form.load_for_edit(&mut store, "missing").await.unwrap_err();

        assert!(matches!(err, FormError::Rejected(ClientError::Server { status: 404, .. })));
        assert!(!form.is_edit_mode());
        assert_eq!(
            store.state().error.as_deref(),
            Some("Employee not found or you do not have permission")
        );
    }

    #[test]
    fn status_round_trips_through_the_form() {
        let mut form = filled();
        form.set_field("status", EmployeeStatus::OnLeave.to_string()).unwrap();
        assert_eq!(form.field("status"), Some("on leave"));
    }
}
