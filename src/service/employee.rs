use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, instrument, warn};

use super::input::EmployeeInput;
use crate::error::ApiError;
use crate::media::{ImageUpload, MediaStore};
use crate::model::employee::{Employee, ImageRef};
use crate::store::{EmployeePage, EmployeeRepository, ListQuery};

/// Coordinates the record store and the media store for one owner at a time.
///
/// Media and record writes are not transactional. Operations are ordered so a
/// failure can leave an unreferenced media object behind (logged) but never a
/// record pointing at an image that was not stored.
pub struct EmployeeService {
    store: Arc<dyn EmployeeRepository>,
    media: Arc<dyn MediaStore>,
    placeholder: ImageRef,
}

impl EmployeeService {
    pub fn new(
        store: Arc<dyn EmployeeRepository>,
        media: Arc<dyn MediaStore>,
        placeholder: ImageRef,
    ) -> Self {
        Self {
            store,
            media,
            placeholder,
        }
    }

    fn is_placeholder(&self, image: &ImageRef) -> bool {
        image.public_id == self.placeholder.public_id
    }

    fn check_image(image: &ImageUpload) -> Result<(), ApiError> {
        if image.bytes.is_empty() {
            return Err(ApiError::rejected("Profile image is empty"));
        }
        if !image.is_image() {
            return Err(ApiError::rejected("Profile image must be an image file"));
        }
        Ok(())
    }

    /// Best-effort removal of an object no record points at.
    async fn discard_upload(&self, image: &ImageRef) {
        if let Err(e) = self.media.delete(image).await {
            warn!(error = %e, public_id = %image.public_id, "Orphaned profile image left in media store");
        }
    }

    #[instrument(skip(self, query))]
    pub async fn list(&self, owner: u64, query: &ListQuery) -> Result<EmployeePage, ApiError> {
        self.store.list(owner, query).await.map_err(|e| {
            error!(error = %e, "Failed to list employees");
            ApiError::Storage("Server error while fetching employees".into())
        })
    }

    #[instrument(skip(self))]
    pub async fn get(&self, owner: u64, id: &str) -> Result<Employee, ApiError> {
        self.store
            .find(owner, id)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch employee");
                ApiError::Storage("Server error while fetching employee".into())
            })?
            .ok_or(ApiError::NotFound)
    }

    #[instrument(skip(self, input, image))]
    pub async fn create(
        &self,
        owner: u64,
        input: EmployeeInput,
        image: Option<ImageUpload>,
    ) -> Result<Employee, ApiError> {
        let mut new = input.into_new_employee(owner, self.placeholder.clone(), Utc::now())?;

        let uploaded = match &image {
            Some(image) => {
                Self::check_image(image)?;
                let stored = self.media.upload(image).await.map_err(|e| {
                    error!(error = %e, "Profile image upload failed");
                    ApiError::Media("Error uploading profile image".into())
                })?;
                new.profile_image = stored.clone();
                Some(stored)
            }
            None => None,
        };

        match self.store.insert(new).await {
            Ok(employee) => {
                info!(id = %employee.id, "Employee created");
                Ok(employee)
            }
            Err(e) => {
                error!(error = %e, "Failed to create employee");
                if let Some(stored) = &uploaded {
                    self.discard_upload(stored).await;
                }
                Err(ApiError::Storage("Server error while creating employee".into()))
            }
        }
    }

    #[instrument(skip(self, input, image))]
    pub async fn update(
        &self,
        owner: u64,
        id: &str,
        input: EmployeeInput,
        image: Option<ImageUpload>,
    ) -> Result<Employee, ApiError> {
        let mut patch = input.into_patch()?;
        if let Some(image) = &image {
            Self::check_image(image)?;
        }

        let existing = self.get(owner, id).await?;

        let uploaded = match &image {
            Some(image) => {
                let old = &existing.profile_image;
                if !self.is_placeholder(old) {
                    match self.media.delete(old).await {
                        Ok(true) => {}
                        Ok(false) => warn!(public_id = %old.public_id, "Previous profile image was already gone"),
                        Err(e) => {
                            error!(error = %e, public_id = %old.public_id, "Failed to delete previous profile image");
                            return Err(ApiError::Media("Error replacing profile image".into()));
                        }
                    }
                }

                let stored = self.media.upload(image).await.map_err(|e| {
                    if !self.is_placeholder(old) {
                        error!(
                            error = %e,
                            public_id = %old.public_id,
                            "Profile image upload failed after previous image was deleted; record still references it"
                        );
                    } else {
                        error!(error = %e, "Profile image upload failed");
                    }
                    ApiError::Media("Error uploading profile image".into())
                })?;
                patch.profile_image = Some(stored.clone());
                Some(stored)
            }
            None => None,
        };

        let outcome = self.store.update(owner, id, &patch).await;
        match outcome {
            Ok(Some(employee)) => {
                info!("Employee updated");
                Ok(employee)
            }
            Ok(None) => {
                if let Some(stored) = &uploaded {
                    self.discard_upload(stored).await;
                }
                Err(ApiError::NotFound)
            }
            Err(e) => {
                error!(error = %e, "Failed to update employee");
                if let Some(stored) = &uploaded {
                    self.discard_upload(stored).await;
                }
                Err(ApiError::Storage("Server error while updating employee".into()))
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, owner: u64, id: &str) -> Result<(), ApiError> {
        let existing = self.get(owner, id).await?;

        let image = &existing.profile_image;
        if !self.is_placeholder(image) {
            match self.media.delete(image).await {
                Ok(true) => {}
                Ok(false) => warn!(public_id = %image.public_id, "Profile image was already gone"),
                Err(e) => {
                    warn!(error = %e, public_id = %image.public_id, "Failed to delete profile image; continuing with record delete")
                }
            }
        }

        let removed = self.store.delete(owner, id).await.map_err(|e| {
            error!(error = %e, "Failed to delete employee");
            ApiError::Storage("Server error while deleting employee".into())
        })?;

        if removed {
            info!("Employee deleted");
            Ok(())
        } else {
            Err(ApiError::NotFound)
        }
    }
}
