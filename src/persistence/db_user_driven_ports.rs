use super::Count;
use crate::domain;
use crate::domain::DrivenPortError;
use crate::domain::user::{CreateUser, CreatedUser, TodoUser, UserPatch};
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::{Context, Error};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, query, query_as};

pub struct DbDetectUser;

impl domain::user::driven_ports::DetectUser for DbDetectUser {
    async fn user_with_login_exists(
        &self,
        login: &str,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<bool, Error> {
        let mut connection = ext_cxn.database_cxn().await?;

        let user_with_login_count = query_as::<_, Count>(
            "SELECT count(*) AS count FROM todo_user tu WHERE tu.login = $1",
        )
        .bind(login)
        .fetch_one(connection.borrow_connection())
        .await
        .context("Detecting user via login")?;

        Ok(user_with_login_count.count() > 0)
    }
}

pub struct DbReadUsers;

#[derive(FromRow)]
struct TodoUserRow {
    id: i32,
    login: String,
    password: String,
    name: String,
    date_create: DateTime<Utc>,
}

impl From<TodoUserRow> for TodoUser {
    fn from(value: TodoUserRow) -> Self {
        TodoUser {
            id: value.id,
            login: value.login,
            password: value.password,
            name: value.name,
            date_create: value.date_create,
        }
    }
}

impl domain::user::driven_ports::UserReader for DbReadUsers {
    async fn user_by_id(
        &self,
        id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<TodoUser, DrivenPortError> {
        let mut cxn_handle = ext_cxn.database_cxn().await?;

        let user = query_as::<_, TodoUserRow>(
            "SELECT tu.id, tu.login, tu.password, tu.name, tu.date_create FROM todo_user tu WHERE tu.id = $1",
        )
        .bind(id)
        .fetch_optional(cxn_handle.borrow_connection())
        .await
        .context("Fetching a user by id")?;

        user.map(TodoUser::from)
            .ok_or(DrivenPortError::DoesNotExist)
    }
}

pub struct DbWriteUsers;

#[derive(FromRow)]
struct NewUserRow {
    id: i32,
    date_create: DateTime<Utc>,
}

impl domain::user::driven_ports::UserWriter for DbWriteUsers {
    async fn create_user(
        &self,
        user: &CreateUser,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<CreatedUser, Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await?;

        let new_user = query_as::<_, NewUserRow>(
            "INSERT INTO todo_user(login, password, name) VALUES ($1, $2, $3) RETURNING id, date_create",
        )
        .bind(&user.login)
        .bind(&user.password)
        .bind(&user.name)
        .fetch_one(cxn_handle.borrow_connection())
        .await
        .context("Inserting new user")?;

        Ok(CreatedUser {
            id: new_user.id,
            date_create: new_user.date_create,
        })
    }

    async fn patch_user(
        &self,
        id: i32,
        patch: &UserPatch,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<bool, Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await?;

        // The column name comes from the UserPatch variant, never from the caller
        let statement = format!("UPDATE todo_user SET {} = $1 WHERE id = $2", patch.column());
        let update_result = query(&statement)
            .bind(patch.value())
            .bind(id)
            .execute(cxn_handle.borrow_connection())
            .await
            .with_context(|| format!("Patching the {} of a user", patch.column()))?;

        Ok(update_result.rows_affected() > 0)
    }
}
