use crate::routing_utils::{BasicErrorResponse, ExtraInfo, ValidationErrorSchema};
use serde::Deserialize;
use utoipa::{OpenApi, ToSchema};

pub mod task;
pub mod user;

pub use task::*;
pub use user::*;

#[derive(OpenApi)]
#[openapi(components(schemas(
    TodoUser,
    NewUser,
    InsertedUser,
    TodoTask,
    NewTask,
    TaskCount,
    ColumnPatch,
    BasicErrorResponse,
    ExtraInfo,
    ValidationErrorSchema
)))]
/// Collects the schemas of every DTO so they can be merged into the API documentation
pub struct OpenApiSchemas;

/// DTO for changing a single column of a user or task. Which columns are accepted is decided by
/// the domain, so nothing is validated here.
#[derive(Debug, Deserialize, ToSchema)]
#[cfg_attr(test, derive(serde::Serialize))]
pub struct ColumnPatch {
    #[schema(example = "name")]
    pub column: String,
    #[schema(example = "Jane Doe")]
    pub value: String,
}
