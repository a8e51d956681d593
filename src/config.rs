use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;

use crate::media::{CloudinaryConfig, SignatureAlgorithm};
use crate::model::employee::ImageRef;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_register_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    // Profile images
    pub max_image_bytes: usize,
    pub placeholder_image: ImageRef,
    pub cloudinary: CloudinaryConfig,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn or_default<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        Err(_) => Ok(default),
    }
}

fn text_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl: or_default("ACCESS_TOKEN_TTL", 86_400)?, // default 1 day

            rate_login_per_min: or_default("RATE_LOGIN_PER_MIN", 60)?,
            rate_register_per_min: or_default("RATE_REGISTER_PER_MIN", 30)?,
            rate_protected_per_min: or_default("RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: text_or("API_PREFIX", "/api"),

            max_image_bytes: or_default("MAX_IMAGE_BYTES", 5 * 1024 * 1024)?,
            placeholder_image: ImageRef::new(
                text_or("PLACEHOLDER_IMAGE_ID", "employees/default"),
                text_or(
                    "PLACEHOLDER_IMAGE_URL",
                    "https://res.cloudinary.com/demo/image/upload/v1312461204/sample.jpg",
                ),
            ),
            cloudinary: CloudinaryConfig {
                api_base: text_or("CLOUDINARY_API_BASE", "https://api.cloudinary.com"),
                cloud_name: required("CLOUDINARY_CLOUD_NAME")?,
                api_key: required("CLOUDINARY_API_KEY")?,
                api_secret: required("CLOUDINARY_API_SECRET")?,
                signature_algorithm: or_default(
                    "CLOUDINARY_SIGNATURE_ALGORITHM",
                    SignatureAlgorithm::Sha1,
                )?,
                folder: text_or("MEDIA_FOLDER", "employees"),
                timeout: Duration::from_secs(or_default("MEDIA_TIMEOUT_SECS", 30)?),
            },
        })
    }

    /// Settings for tests that never touch the environment or the network.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            database_url: "mysql://localhost/test".into(),
            jwt_secret: "test-secret".into(),
            server_addr: "127.0.0.1:0".into(),
            access_token_ttl: 3600,
            rate_login_per_min: 60,
            rate_register_per_min: 30,
            rate_protected_per_min: 1000,
            api_prefix: "/api".into(),
            max_image_bytes: 1024,
            placeholder_image: crate::test_support::placeholder(),
            cloudinary: CloudinaryConfig {
                api_base: "http://127.0.0.1:9".into(),
                cloud_name: "test".into(),
                api_key: "key".into(),
                api_secret: "secret".into(),
                signature_algorithm: SignatureAlgorithm::Sha1,
                folder: "employees".into(),
                timeout: Duration::from_secs(1),
            },
        }
    }
}
