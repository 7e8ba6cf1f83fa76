use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum_macros::{FromRequest, FromRequestParts};
use serde::Serialize;
use tracing::{error, warn};
use utoipa::openapi::{RefOr, Schema};
use utoipa::{ToSchema, openapi};
use validator::ValidationErrors;

use crate::domain::PatchError;

/// Contains diagnostic information about an API failure
#[derive(Serialize, Debug, ToSchema)]
pub struct BasicErrorResponse {
    #[schema(example = "not_found")]
    error_code: String,
    #[schema(example = "The requested entity could not be found.")]
    error_description: String,
    extra_info: Option<ExtraInfo>,
}

impl BasicErrorResponse {
    fn new(error_code: &str, error_description: &str) -> Self {
        BasicErrorResponse {
            error_code: error_code.into(),
            error_description: error_description.into(),
            extra_info: None,
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(untagged)]
pub enum ExtraInfo {
    ValidationIssues(ValidationErrorSchema),
    Message(String),
}

/// Stand-in OpenAPI schema for [ValidationErrors] which just provides an empty object
#[derive(Serialize, Debug)]
#[serde(transparent)]
pub struct ValidationErrorSchema(ValidationErrors);

impl<'schem> ToSchema<'schem> for ValidationErrorSchema {
    fn schema() -> (&'schem str, RefOr<Schema>) {
        (
            "ValidationErrorSchema",
            openapi::ObjectBuilder::new().into(),
        )
    }
}

/// Response type that wraps unexpected failures and turns them into a 500 without exposing
/// any detail about the cause
pub struct GenericErrorResponse(pub anyhow::Error);

impl IntoResponse for GenericErrorResponse {
    fn into_response(self) -> Response {
        error!("Responding with internal error: {:#}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(BasicErrorResponse::new(
                "internal_error",
                "Could not access data to complete your request",
            )),
        )
            .into_response()
    }
}

/// Client errors raised by the domain which map onto a 400
pub enum DomainErrorResponse {
    NotFound,
    LoginUnavailable,
    InvalidPatch(PatchError),
}

impl IntoResponse for DomainErrorResponse {
    fn into_response(self) -> Response {
        let body = match self {
            Self::NotFound => BasicErrorResponse::new(
                "not_found",
                "The requested entity could not be found.",
            ),
            Self::LoginUnavailable => BasicErrorResponse::new(
                "login_unavailable",
                "The requested login is already in use.",
            ),
            Self::InvalidPatch(patch_err) => BasicErrorResponse {
                extra_info: Some(ExtraInfo::Message(patch_err.to_string())),
                ..BasicErrorResponse::new("invalid_patch", "The requested change is not allowed.")
            },
        };

        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

impl From<PatchError> for DomainErrorResponse {
    fn from(value: PatchError) -> Self {
        Self::InvalidPatch(value)
    }
}

/// Response type that wraps validation errors and turns them into [BasicErrorResponse]s
pub struct ValidationErrorResponse(ValidationErrors);

impl IntoResponse for ValidationErrorResponse {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(BasicErrorResponse {
                extra_info: Some(ExtraInfo::ValidationIssues(ValidationErrorSchema(self.0))),
                ..BasicErrorResponse::new("invalid_input", "Submitted data was invalid.")
            }),
        )
            .into_response()
    }
}

impl From<ValidationErrors> for ValidationErrorResponse {
    fn from(value: ValidationErrors) -> Self {
        Self(value)
    }
}

/// Returned when a request arrives without an authenticated user attached
pub struct UnauthenticatedResponse;

impl IntoResponse for UnauthenticatedResponse {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(BasicErrorResponse::new(
                "unauthenticated",
                "This request requires an authenticated user.",
            )),
        )
            .into_response()
    }
}

/// Wrapper for [axum::Json] which customizes the error response to use our
/// data structure for API errors
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(JsonErrorResponse))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Response type representing JSON parse errors. The parse problem is logged but never
/// returned to the caller.
pub struct JsonErrorResponse {
    parse_problem: String,
}

impl From<JsonRejection> for JsonErrorResponse {
    fn from(value: JsonRejection) -> Self {
        JsonErrorResponse {
            parse_problem: value.body_text(),
        }
    }
}

impl IntoResponse for JsonErrorResponse {
    fn into_response(self) -> Response {
        warn!("Could not decode request body: {}", self.parse_problem);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            axum::Json(BasicErrorResponse::new(
                "invalid_json",
                "The passed request body contained malformed or unreadable JSON.",
            )),
        )
            .into_response()
    }
}

/// Wrapper for [axum::extract::Query] which answers undecodable query strings with our API
/// error body
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(RequestPartsErrorResponse))]
pub struct Query<T>(pub T);

/// Wrapper for [axum::extract::Path] which answers unparseable path segments with our API
/// error body
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(RequestPartsErrorResponse))]
pub struct Path<T>(pub T);

/// Response type for a query string or path segment that could not be decoded
pub struct RequestPartsErrorResponse {
    problem: String,
}

impl From<QueryRejection> for RequestPartsErrorResponse {
    fn from(value: QueryRejection) -> Self {
        RequestPartsErrorResponse {
            problem: value.body_text(),
        }
    }
}

impl From<PathRejection> for RequestPartsErrorResponse {
    fn from(value: PathRejection) -> Self {
        RequestPartsErrorResponse {
            problem: value.body_text(),
        }
    }
}

impl IntoResponse for RequestPartsErrorResponse {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(BasicErrorResponse {
                extra_info: Some(ExtraInfo::Message(self.problem)),
                ..BasicErrorResponse::new("invalid_input", "Submitted data was invalid.")
            }),
        )
            .into_response()
    }
}
