use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

/// Message returned for both missing records and records owned by someone
/// else, so a caller cannot probe for other owners' ids.
pub const NOT_FOUND_OR_FORBIDDEN: &str = "Employee not found or you do not have permission";

#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Malformed or missing field detected by the server.
    #[display(fmt = "{}", _0)]
    RequestRejected(String),

    #[display(fmt = "{}", NOT_FOUND_OR_FORBIDDEN)]
    NotFound,

    #[display(fmt = "{}", _0)]
    Unauthorized(String),

    #[display(fmt = "{}", _0)]
    Conflict(String),

    /// Upload or delete against the media store failed.
    #[display(fmt = "{}", _0)]
    Media(String),

    #[display(fmt = "{}", _0)]
    Storage(String),
}

impl ApiError {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::RequestRejected(message.into())
    }

    pub fn invalid_field(field: &str) -> Self {
        Self::RequestRejected(format!("Invalid {field}"))
    }
}

impl std::error::Error for ApiError {}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::RequestRejected(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Media(_) => StatusCode::BAD_GATEWAY,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "message": self.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use rstest::rstest;
    use serde_json::Value;

    #[rstest]
    #[case(ApiError::rejected("Invalid address"), StatusCode::BAD_REQUEST)]
    #[case(ApiError::NotFound, StatusCode::NOT_FOUND)]
    #[case(ApiError::Unauthorized("Missing Authorization header".into()), StatusCode::UNAUTHORIZED)]
    #[case(ApiError::Conflict("Email already registered".into()), StatusCode::CONFLICT)]
    #[case(ApiError::Media("Error uploading profile image".into()), StatusCode::BAD_GATEWAY)]
    #[case(ApiError::Storage("Server error while creating employee".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    fn maps_each_variant_to_its_status(#[case] error: ApiError, #[case] status: StatusCode) {
        assert_eq!(error.status_code(), status);
    }

    #[actix_web::test]
    async fn error_body_carries_success_flag_and_message() {
        let response = ApiError::NotFound.error_response();
        let body = to_bytes(response.into_body()).await.unwrap();
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["message"], NOT_FOUND_OR_FORBIDDEN);
    }
}
