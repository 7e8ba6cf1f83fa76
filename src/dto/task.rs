use crate::domain;
use crate::domain::validation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

fn validate_title(title: &str) -> Result<(), ValidationError> {
    if validation::is_title(title) {
        Ok(())
    } else {
        Err(ValidationError::new("title"))
    }
}

/// DTO for creating a new task via the API
#[derive(Deserialize, Validate, ToSchema)]
#[cfg_attr(test, derive(Serialize))]
pub struct NewTask {
    #[validate(custom = "validate_title")]
    #[schema(example = "buy milk")]
    pub title: String,
}

impl From<NewTask> for domain::todo::NewTask {
    fn from(value: NewTask) -> Self {
        domain::todo::NewTask { title: value.title }
    }
}

/// DTO for a returned task on the API
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, Debug, PartialEq, Eq))]
pub struct TodoTask {
    #[schema(example = 10)]
    pub id: i32,
    #[schema(example = "buy milk")]
    pub title: String,
    #[schema(example = false)]
    pub completed: bool,
    pub date_create: DateTime<Utc>,
}

impl From<domain::todo::TodoTask> for TodoTask {
    fn from(value: domain::todo::TodoTask) -> Self {
        TodoTask {
            id: value.id,
            title: value.title,
            completed: value.completed,
            date_create: value.date_create,
        }
    }
}

/// DTO for the number of tasks matching a filter
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, Debug))]
pub struct TaskCount {
    #[schema(example = 3)]
    pub count: i64,
}

/// Optional completion filter for listing and counting tasks
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CompletionFilter {
    /// Only include tasks with this completion state
    pub completed: Option<bool>,
}
