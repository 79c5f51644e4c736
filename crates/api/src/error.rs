//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use profile_store::UniqueField;
use registration::RegistrationError;

use crate::routes::register::RegisterResponse;

/// API-level error type that maps to the registration response envelope.
#[derive(Debug)]
pub enum ApiError {
    /// The request body is missing a field the endpoint requires.
    MissingField(&'static str),
    /// Registration saga error.
    Registration(RegistrationError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, notification) = match self {
            ApiError::MissingField(field) => (
                StatusCode::BAD_REQUEST,
                format!("missing required field: {field}"),
                "Please fill in all required fields.".to_string(),
            ),
            ApiError::Registration(err) => registration_error_to_response(err),
        };

        let body = RegisterResponse {
            success: false,
            message,
            notification,
            data: None,
        };
        (status, Json(body)).into_response()
    }
}

fn registration_error_to_response(err: RegistrationError) -> (StatusCode, String, String) {
    match &err {
        RegistrationError::Validation { .. } => (
            StatusCode::BAD_REQUEST,
            err.to_string(),
            "Please fill in all required fields.".to_string(),
        ),
        RegistrationError::Conflict {
            field: UniqueField::Email,
        } => (
            StatusCode::CONFLICT,
            "email already registered".to_string(),
            "This email is already registered. Use another email or sign in.".to_string(),
        ),
        RegistrationError::Conflict {
            field: UniqueField::TaxId,
        } => (
            StatusCode::CONFLICT,
            "tax id already registered".to_string(),
            "This tax id is already registered.".to_string(),
        ),
        RegistrationError::Identity(detail) => {
            tracing::error!(error = %detail, "identity provisioning failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to create account".to_string(),
                "We could not create your account. Please try again.".to_string(),
            )
        }
        RegistrationError::Store(detail) => {
            tracing::error!(error = %detail, "profile persistence failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to store registration".to_string(),
                "We could not process your registration. Please try again.".to_string(),
            )
        }
        RegistrationError::Internal(detail) => {
            tracing::error!(error = %detail, "unexpected registration failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "registration failed unexpectedly".to_string(),
                "Something went wrong. Please try again.".to_string(),
            )
        }
    }
}

impl From<RegistrationError> for ApiError {
    fn from(err: RegistrationError) -> Self {
        ApiError::Registration(err)
    }
}
