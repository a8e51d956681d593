use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use strum::EnumString;
use tracing::{debug, instrument};

use super::{ImageUpload, MediaStore};
use crate::model::employee::ImageRef;

/// Profile pictures are cropped to a square on upload.
const PROFILE_TRANSFORMATION: &str = "c_fill,h_250,w_250";

/// Digest the account verifies request signatures with. Accounts sign with
/// SHA-1 unless switched to SHA-256 in their security settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum SignatureAlgorithm {
    #[default]
    #[strum(serialize = "sha1")]
    Sha1,
    #[strum(serialize = "sha256")]
    Sha256,
}

#[derive(Clone, Debug)]
pub struct CloudinaryConfig {
    pub api_base: String,
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub signature_algorithm: SignatureAlgorithm,
    pub folder: String,
    pub timeout: Duration,
}

pub struct CloudinaryMedia {
    client: Client,
    config: CloudinaryConfig,
}

#[derive(Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
}

#[derive(Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorMessage,
}

#[derive(Deserialize)]
struct ErrorMessage {
    message: String,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Signs request parameters: sorted `key=value` pairs joined by `&`, with the
/// secret appended, hashed with the account's digest.
fn sign(params: &[(&str, &str)], secret: &str, algorithm: SignatureAlgorithm) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let payload = format!("{joined}{secret}");
    match algorithm {
        SignatureAlgorithm::Sha1 => hex::encode(Sha1::digest(payload.as_bytes())),
        SignatureAlgorithm::Sha256 => hex::encode(Sha256::digest(payload.as_bytes())),
    }
}

impl CloudinaryMedia {
    pub fn new(config: CloudinaryConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/v1_1/{}/image/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.cloud_name,
            action
        )
    }

    async fn read_error(response: reqwest::Response) -> anyhow::Error {
        let status = response.status();
        match response.json::<ErrorBody>().await {
            Ok(body) => anyhow!("media store returned {status}: {}", body.error.message),
            Err(_) => anyhow!("media store returned {status}"),
        }
    }
}

#[async_trait]
impl MediaStore for CloudinaryMedia {
    #[instrument(skip(self, image), fields(file = %image.file_name, size = image.bytes.len()))]
    async fn upload(&self, image: &ImageUpload) -> anyhow::Result<ImageRef> {
        let timestamp = unix_now().to_string();
        let signature = sign(
            &[
                ("folder", self.config.folder.as_str()),
                ("timestamp", timestamp.as_str()),
                ("transformation", PROFILE_TRANSFORMATION),
            ],
            &self.config.api_secret,
            self.config.signature_algorithm,
        );

        let file = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.content_type)
            .context("invalid image content type")?;
        let form = Form::new()
            .part("file", file)
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", self.config.folder.clone())
            .text("transformation", PROFILE_TRANSFORMATION)
            .text("signature", signature);

        let response = self
            .client
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await
            .context("media upload request failed")?;

        if !response.status().is_success() {
            return Err(Self::read_error(response).await);
        }

        let body: UploadResponse = response
            .json()
            .await
            .context("media upload response was not understood")?;
        debug!(public_id = %body.public_id, "Image uploaded");

        Ok(ImageRef::new(body.public_id, body.secure_url))
    }

    #[instrument(skip(self), fields(public_id = %image.public_id))]
    async fn delete(&self, image: &ImageRef) -> anyhow::Result<bool> {
        let timestamp = unix_now().to_string();
        let signature = sign(
            &[
                ("public_id", image.public_id.as_str()),
                ("timestamp", timestamp.as_str()),
            ],
            &self.config.api_secret,
            self.config.signature_algorithm,
        );

        let params = [
            ("public_id", image.public_id.as_str()),
            ("api_key", self.config.api_key.as_str()),
            ("timestamp", timestamp.as_str()),
            ("signature", signature.as_str()),
        ];

        let response = self
            .client
            .post(self.endpoint("destroy"))
            .form(&params)
            .send()
            .await
            .context("media delete request failed")?;

        if !response.status().is_success() {
            return Err(Self::read_error(response).await);
        }

        let body: DestroyResponse = response
            .json()
            .await
            .context("media delete response was not understood")?;

        match body.result.as_str() {
            "ok" => Ok(true),
            "not found" => Ok(false),
            other => Err(anyhow!("media store refused delete: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    const DOCUMENTED_PARAMS: [(&str, &str); 3] = [
        ("timestamp", "1315060510"),
        ("eager", "w_400,h_300,c_pad|w_260,h_200,c_crop"),
        ("public_id", "sample_image"),
    ];

    #[rstest]
    #[case(SignatureAlgorithm::Sha1, "bfd09f95f331f558cbd1320e67aa8d488770583e")]
    #[case(
        SignatureAlgorithm::Sha256,
        "cc927e1290f9e3ae4c1a741eda21a4630b4ce80f9ce0bc0296337d25cf40f91e"
    )]
    fn signature_matches_documented_example(#[case] algorithm: SignatureAlgorithm, #[case] expected: &str) {
        assert_eq!(sign(&DOCUMENTED_PARAMS, "abcd", algorithm), expected);
    }

    #[test]
    fn accounts_default_to_sha1() {
        assert_eq!(SignatureAlgorithm::default(), SignatureAlgorithm::Sha1);
        assert_eq!("SHA256".parse::<SignatureAlgorithm>(), Ok(SignatureAlgorithm::Sha256));
        assert!("md5".parse::<SignatureAlgorithm>().is_err());
    }

    #[test]
    fn signature_is_order_independent() {
        let a = sign(&[("timestamp", "1700000000"), ("folder", "employees")], "secret", SignatureAlgorithm::Sha1);
        let b = sign(&[("folder", "employees"), ("timestamp", "1700000000")], "secret", SignatureAlgorithm::Sha1);
        assert_eq!(a, b);
    }

    #[test]
    fn signature_depends_on_secret() {
        let params = [("public_id", "employees/abc"), ("timestamp", "1")];
        assert_ne!(
            sign(&params, "one", SignatureAlgorithm::Sha1),
            sign(&params, "two", SignatureAlgorithm::Sha1)
        );
    }

    #[test]
    fn endpoint_joins_base_cloud_and_action() {
        let media = CloudinaryMedia::new(CloudinaryConfig {
            api_base: "https://api.cloudinary.com/".into(),
            cloud_name: "demo".into(),
            api_key: "key".into(),
            api_secret: "secret".into(),
            signature_algorithm: SignatureAlgorithm::Sha1,
            folder: "employees".into(),
            timeout: Duration::from_secs(5),
        })
        .unwrap();
        assert_eq!(
            media.endpoint("destroy"),
            "https://api.cloudinary.com/v1_1/demo/image/destroy"
        );
    }
}
