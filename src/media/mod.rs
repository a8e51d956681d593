//! Remote storage for profile images.

pub mod cloudinary;

use async_trait::async_trait;

use crate::model::employee::ImageRef;

pub use cloudinary::{CloudinaryConfig, CloudinaryMedia, SignatureAlgorithm};

/// An image received from a client, held in memory until it is handed to the
/// media store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn upload(&self, image: &ImageUpload) -> anyhow::Result<ImageRef>;

    /// Removes the object. Returns `false` when the store reports it did not
    /// exist.
    async fn delete(&self, image: &ImageRef) -> anyhow::Result<bool>;
}
