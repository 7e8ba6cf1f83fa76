use crate::domain::user::driving_ports::{CreateUserError, UserError};
use crate::domain::{DrivenPortError, PatchError, validation};
use crate::external_connections::ExternalConnectivity;
use anyhow::Context;
use chrono::{DateTime, Utc};
use tracing::{error, info};

/// A registered user account
#[derive(PartialEq, Eq, Debug)]
#[cfg_attr(test, derive(Clone))]
pub struct TodoUser {
    pub id: i32,
    pub login: String,
    pub password: String,
    pub name: String,
    pub date_create: DateTime<Utc>,
}

/// Everything needed to register a new user
#[derive(Debug)]
#[cfg_attr(test, derive(Clone))]
pub struct CreateUser {
    pub login: String,
    pub password: String,
    pub name: String,
}

impl CreateUser {
    /// Lists the fields that break their validation rule
    pub fn invalid_fields(&self) -> Vec<&'static str> {
        let mut invalid = Vec::new();
        if !validation::is_login(&self.login) {
            invalid.push("login");
        }
        if !validation::is_password(&self.password) {
            invalid.push("password");
        }
        if !validation::is_name(&self.name) {
            invalid.push("name");
        }

        invalid
    }
}

/// Store-assigned values for a freshly inserted user
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct CreatedUser {
    pub id: i32,
    pub date_create: DateTime<Utc>,
}

/// A change to a single user column. Only columns listed here can ever be written after signup.
#[derive(PartialEq, Eq, Debug, Clone)]
pub enum UserPatch {
    Password(String),
    Name(String),
}

impl UserPatch {
    /// Builds a patch from a raw column name and value, rejecting unknown columns and values
    /// that fail the column's rule
    pub fn new(column: &str, value: &str) -> Result<Self, PatchError> {
        match column {
            "password" if validation::is_password(value) => Ok(Self::Password(value.to_owned())),
            "password" => Err(PatchError::InvalidValue("password")),
            "name" if validation::is_name(value) => Ok(Self::Name(value.to_owned())),
            "name" => Err(PatchError::InvalidValue("name")),
            other => Err(PatchError::UnknownColumn(other.to_owned())),
        }
    }

    /// The database column this patch writes to
    pub fn column(&self) -> &'static str {
        match self {
            Self::Password(_) => "password",
            Self::Name(_) => "name",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Self::Password(value) | Self::Name(value) => value,
        }
    }
}

pub mod driven_ports {
    use super::*;
    use crate::external_connections::ExternalConnectivity;

    pub trait UserReader: Sync {
        /// Fetches a user by ID, failing with [DrivenPortError::DoesNotExist] if there's no match
        async fn user_by_id(
            &self,
            id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<TodoUser, DrivenPortError>;
    }

    pub trait UserWriter: Sync {
        async fn create_user(
            &self,
            user: &CreateUser,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<CreatedUser, anyhow::Error>;

        /// Applies a single-column patch, returning false if no user had the given ID
        async fn patch_user(
            &self,
            id: i32,
            patch: &UserPatch,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<bool, anyhow::Error>;
    }

    pub trait DetectUser: Sync {
        async fn user_with_login_exists(
            &self,
            login: &str,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<bool, anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;
    use crate::external_connections::ExternalConnectivity;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum UserError {
        #[error("The requested user does not exist.")]
        DoesNotExist,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }

    impl From<DrivenPortError> for UserError {
        fn from(value: DrivenPortError) -> Self {
            match value {
                DrivenPortError::DoesNotExist => Self::DoesNotExist,
                DrivenPortError::CommsFailure(err) => Self::PortError(err),
            }
        }
    }

    #[derive(Debug, Error)]
    pub enum CreateUserError {
        #[error("The following user fields were invalid: {0:?}")]
        InvalidUser(Vec<&'static str>),
        #[error("The requested login is unavailable.")]
        LoginUnavailable,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }


    pub trait UserPort {
        async fn get_user(
            &self,
            id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            u_reader: &impl driven_ports::UserReader,
        ) -> Result<TodoUser, UserError>;
        async fn create_user(
            &self,
            new_user: &CreateUser,
            ext_cxn: &mut impl ExternalConnectivity,
            u_writer: &impl driven_ports::UserWriter,
            u_detect: &impl driven_ports::DetectUser,
        ) -> Result<CreatedUser, CreateUserError>;
        async fn patch_user(
            &self,
            id: i32,
            patch: &UserPatch,
            ext_cxn: &mut impl ExternalConnectivity,
            u_writer: &impl driven_ports::UserWriter,
        ) -> Result<(), UserError>;
    }
}

pub struct UserService;

impl driving_ports::UserPort for UserService {
    async fn get_user(
        &self,
        id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        u_reader: &impl driven_ports::UserReader,
    ) -> Result<TodoUser, UserError> {
        let user_result = u_reader.user_by_id(id, &mut *ext_cxn).await;
        if let Err(DrivenPortError::CommsFailure(ref port_err)) = user_result {
            error!("User fetch failure: {port_err}");
        }

        Ok(user_result?)
    }

    async fn create_user(
        &self,
        new_user: &CreateUser,
        ext_cxn: &mut impl ExternalConnectivity,
        u_writer: &impl driven_ports::UserWriter,
        u_detect: &impl driven_ports::DetectUser,
    ) -> Result<CreatedUser, CreateUserError> {
        let invalid_fields = new_user.invalid_fields();
        if !invalid_fields.is_empty() {
            return Err(CreateUserError::InvalidUser(invalid_fields));
        }

        let login_taken = u_detect
            .user_with_login_exists(&new_user.login, &mut *ext_cxn)
            .await
            .context("Looking up login during user creation")?;
        if login_taken {
            info!("Login {} is already taken", new_user.login);
            return Err(CreateUserError::LoginUnavailable);
        }

        Ok(u_writer
            .create_user(new_user, &mut *ext_cxn)
            .await
            .context("Trying to create user at service level")?)
    }

    async fn patch_user(
        &self,
        id: i32,
        patch: &UserPatch,
        ext_cxn: &mut impl ExternalConnectivity,
        u_writer: &impl driven_ports::UserWriter,
    ) -> Result<(), UserError> {
        let patched = u_writer
            .patch_user(id, patch, &mut *ext_cxn)
            .await
            .with_context(|| format!("patching the {} of user {id}", patch.column()))?;

        if patched {
            Ok(())
        } else {
            Err(UserError::DoesNotExist)
        }
    }
}
