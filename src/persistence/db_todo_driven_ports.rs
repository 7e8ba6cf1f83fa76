use super::Count;
use crate::domain;
use crate::domain::DrivenPortError;
use crate::domain::todo::{NewTask, TaskPatch, TodoTask};
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::{Context, Error};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, query, query_as};

pub struct DbTaskReader;

#[derive(FromRow)]
struct TodoItemRow {
    id: i32,
    user_id: i32,
    title: String,
    completed: bool,
    date_create: DateTime<Utc>,
}

impl From<TodoItemRow> for domain::todo::TodoTask {
    fn from(value: TodoItemRow) -> Self {
        TodoTask {
            id: value.id,
            owner_user_id: value.user_id,
            title: value.title,
            completed: value.completed,
            date_create: value.date_create,
        }
    }
}

impl domain::todo::driven_ports::TaskReader for DbTaskReader {
    async fn tasks_for_user(
        &self,
        user_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Vec<TodoTask>, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let todo_items: Vec<TodoTask> = query_as::<_, TodoItemRow>(
            "SELECT ti.id, ti.user_id, ti.title, ti.completed, ti.date_create FROM todo_item ti WHERE ti.user_id = $1",
        )
        .bind(user_id)
        .fetch_all(cxn.borrow_connection())
        .await
        .context("trying to fetch todo items for a user")?
        .into_iter()
        .map(TodoTask::from)
        .collect();

        Ok(todo_items)
    }

    async fn user_task_by_id(
        &self,
        user_id: i32,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<TodoTask, DrivenPortError> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let todo_item = query_as::<_, TodoItemRow>(
            "SELECT ti.id, ti.user_id, ti.title, ti.completed, ti.date_create FROM todo_item ti WHERE ti.user_id = $1 AND ti.id = $2",
        )
        .bind(user_id)
        .bind(task_id)
        .fetch_optional(cxn.borrow_connection())
        .await
        .context("trying to fetch a todo item by ID")?;

        todo_item
            .map(TodoTask::from)
            .ok_or(DrivenPortError::DoesNotExist)
    }

    async fn tasks_by_completion(
        &self,
        user_id: i32,
        completed: bool,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Vec<TodoTask>, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let todo_items: Vec<TodoTask> = query_as::<_, TodoItemRow>(
            "SELECT ti.id, ti.user_id, ti.title, ti.completed, ti.date_create FROM todo_item ti WHERE ti.user_id = $1 AND ti.completed = $2",
        )
        .bind(user_id)
        .bind(completed)
        .fetch_all(cxn.borrow_connection())
        .await
        .context("trying to fetch todo items by completion")?
        .into_iter()
        .map(TodoTask::from)
        .collect();

        Ok(todo_items)
    }

    async fn count_tasks(
        &self,
        user_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<i64, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let task_count = query_as::<_, Count>(
            "SELECT count(*) AS count FROM todo_item ti WHERE ti.user_id = $1",
        )
        .bind(user_id)
        .fetch_one(cxn.borrow_connection())
        .await
        .context("trying to count a user's todo items")?;

        Ok(task_count.count())
    }

    async fn count_tasks_by_completion(
        &self,
        user_id: i32,
        completed: bool,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<i64, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let task_count = query_as::<_, Count>(
            "SELECT count(*) AS count FROM todo_item ti WHERE ti.user_id = $1 AND ti.completed = $2",
        )
        .bind(user_id)
        .bind(completed)
        .fetch_one(cxn.borrow_connection())
        .await
        .context("trying to count a user's todo items by completion")?;

        Ok(task_count.count())
    }
}

pub struct DbTaskWriter;

impl domain::todo::driven_ports::TaskWriter for DbTaskWriter {
    async fn create_task_for_user(
        &self,
        user_id: i32,
        new_task: &NewTask,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<TodoTask, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let created = query_as::<_, TodoItemRow>(
            "INSERT INTO todo_item(user_id, title) VALUES ($1, $2) \
             RETURNING id, user_id, title, completed, date_create",
        )
        .bind(user_id)
        .bind(&new_task.title)
        .fetch_one(cxn.borrow_connection())
        .await
        .context("trying to insert a new task into the database")?;

        Ok(created.into())
    }

    async fn delete_task(
        &self,
        user_id: i32,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<bool, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let delete_result = query("DELETE FROM todo_item WHERE id = $1 AND user_id = $2")
            .bind(task_id)
            .bind(user_id)
            .execute(cxn.borrow_connection())
            .await
            .context("trying to remove a task from the database")?;

        Ok(delete_result.rows_affected() > 0)
    }

    async fn patch_task(
        &self,
        user_id: i32,
        task_id: i32,
        patch: &TaskPatch,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<bool, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        // The column name comes from the TaskPatch variant, never from the caller
        let statement = format!(
            "UPDATE todo_item SET {} = $1 WHERE id = $2 AND user_id = $3",
            patch.column()
        );
        let update = match patch {
            TaskPatch::Title(title) => query(&statement).bind(title),
            TaskPatch::Completed(completed) => query(&statement).bind(completed),
        };

        let update_result = update
            .bind(task_id)
            .bind(user_id)
            .execute(cxn.borrow_connection())
            .await
            .context("trying to patch a task in the database")?;

        Ok(update_result.rows_affected() > 0)
    }
}
