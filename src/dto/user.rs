use crate::domain;
use crate::domain::validation;
use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// DTO for the current user. The password never leaves the service.
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, PartialEq, Eq, Debug))]
pub struct TodoUser {
    #[schema(example = 4)]
    pub id: i32,
    #[schema(example = "john_doe")]
    pub login: String,
    #[schema(example = "John Doe")]
    pub name: String,
    pub date_create: DateTime<Utc>,
}

impl From<domain::user::TodoUser> for TodoUser {
    fn from(value: domain::user::TodoUser) -> Self {
        TodoUser {
            id: value.id,
            login: value.login,
            name: value.name,
            date_create: value.date_create,
        }
    }
}

fn validate_login(login: &str) -> Result<(), ValidationError> {
    if validation::is_login(login) {
        Ok(())
    } else {
        Err(ValidationError::new("login"))
    }
}

fn validate_password(password: &str) -> Result<(), ValidationError> {
    if validation::is_password(password) {
        Ok(())
    } else {
        Err(ValidationError::new("password"))
    }
}

fn validate_name(name: &str) -> Result<(), ValidationError> {
    if validation::is_name(name) {
        Ok(())
    } else {
        Err(ValidationError::new("name"))
    }
}

/// DTO for signing up a new user via the API
#[derive(Deserialize, Display, Validate, ToSchema)]
#[display("{login}")]
#[cfg_attr(test, derive(Serialize))]
pub struct NewUser {
    #[validate(custom = "validate_login")]
    #[schema(example = "john_doe")]
    pub login: String,
    #[validate(custom = "validate_password")]
    #[schema(example = "password123")]
    pub password: String,
    #[validate(custom = "validate_name")]
    #[schema(example = "John Doe")]
    pub name: String,
}

impl From<NewUser> for domain::user::CreateUser {
    fn from(value: NewUser) -> Self {
        domain::user::CreateUser {
            login: value.login,
            password: value.password,
            name: value.name,
        }
    }
}

/// DTO containing the store-assigned values of a user that was created via the API.
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, Debug))]
pub struct InsertedUser {
    #[schema(example = 10)]
    pub id: i32,
    pub date_create: DateTime<Utc>,
}

impl From<domain::user::CreatedUser> for InsertedUser {
    fn from(value: domain::user::CreatedUser) -> Self {
        InsertedUser {
            id: value.id,
            date_create: value.date_create,
        }
    }
}
