use crate::domain::todo::driven_ports::{TaskReader, TaskWriter};
use crate::domain::todo::driving_ports::TaskError;
use crate::domain::{DrivenPortError, PatchError, validation};
use crate::external_connections::ExternalConnectivity;
use anyhow::Context;
use chrono::{DateTime, Utc};
use tracing::{error, info};

#[derive(PartialEq, Eq, Debug)]
#[cfg_attr(test, derive(Clone))]
pub struct TodoTask {
    pub id: i32,
    pub owner_user_id: i32,
    pub title: String,
    pub completed: bool,
    pub date_create: DateTime<Utc>,
}

#[derive(Debug)]
#[cfg_attr(test, derive(Clone))]
pub struct NewTask {
    pub title: String,
}

/// A change to a single task column. Ownership and timestamps are never patchable.
#[derive(PartialEq, Eq, Debug, Clone)]
pub enum TaskPatch {
    Title(String),
    Completed(bool),
}

impl TaskPatch {
    /// Builds a patch from a raw column name and value, rejecting unknown columns and values
    /// that fail the column's rule
    pub fn new(column: &str, value: &str) -> Result<Self, PatchError> {
        match column {
            "title" if validation::is_title(value) => Ok(Self::Title(value.to_owned())),
            "title" => Err(PatchError::InvalidValue("title")),
            "completed" => value
                .parse::<bool>()
                .map(Self::Completed)
                .map_err(|_| PatchError::InvalidValue("completed")),
            other => Err(PatchError::UnknownColumn(other.to_owned())),
        }
    }

    /// The database column this patch writes to
    pub fn column(&self) -> &'static str {
        match self {
            Self::Title(_) => "title",
            Self::Completed(_) => "completed",
        }
    }
}

pub mod driven_ports {
    use super::*;
    use crate::external_connections::ExternalConnectivity;

    pub trait TaskReader: Sync {
        async fn tasks_for_user(
            &self,
            user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<TodoTask>, anyhow::Error>;
        /// Fetches one of the user's tasks, failing with [DrivenPortError::DoesNotExist]
        /// if the user has no task with that ID
        async fn user_task_by_id(
            &self,
            user_id: i32,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<TodoTask, DrivenPortError>;
        async fn tasks_by_completion(
            &self,
            user_id: i32,
            completed: bool,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<TodoTask>, anyhow::Error>;
        async fn count_tasks(
            &self,
            user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<i64, anyhow::Error>;
        async fn count_tasks_by_completion(
            &self,
            user_id: i32,
            completed: bool,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<i64, anyhow::Error>;
    }

    pub trait TaskWriter: Sync {
        async fn create_task_for_user(
            &self,
            user_id: i32,
            new_task: &NewTask,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<TodoTask, anyhow::Error>;

        /// Removes one of the user's tasks, returning false if nothing was removed
        async fn delete_task(
            &self,
            user_id: i32,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<bool, anyhow::Error>;

        /// Applies a single-column patch to one of the user's tasks, returning false if the
        /// user has no task with that ID
        async fn patch_task(
            &self,
            user_id: i32,
            task_id: i32,
            patch: &TaskPatch,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<bool, anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;
    use crate::external_connections::ExternalConnectivity;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum TaskError {
        #[error("The requested task does not exist.")]
        TaskNotFound,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }

    impl From<DrivenPortError> for TaskError {
        fn from(value: DrivenPortError) -> Self {
            match value {
                DrivenPortError::DoesNotExist => TaskError::TaskNotFound,
                DrivenPortError::CommsFailure(err) => TaskError::PortError(err),
            }
        }
    }


    pub trait TaskPort {
        /// Lists a user's tasks, optionally only those with the given completion state
        async fn tasks_for_user(
            &self,
            user_id: i32,
            completed: Option<bool>,
            ext_cxn: &mut impl ExternalConnectivity,
            task_read: &impl driven_ports::TaskReader,
        ) -> Result<Vec<TodoTask>, TaskError>;
        async fn count_tasks(
            &self,
            user_id: i32,
            completed: Option<bool>,
            ext_cxn: &mut impl ExternalConnectivity,
            task_read: &impl driven_ports::TaskReader,
        ) -> Result<i64, TaskError>;
        async fn user_task_by_id(
            &self,
            user_id: i32,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            task_read: &impl driven_ports::TaskReader,
        ) -> Result<TodoTask, TaskError>;
        async fn create_task_for_user(
            &self,
            user_id: i32,
            task: &NewTask,
            ext_cxn: &mut impl ExternalConnectivity,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<TodoTask, TaskError>;
        async fn delete_task(
            &self,
            user_id: i32,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<(), TaskError>;
        async fn patch_task(
            &self,
            user_id: i32,
            task_id: i32,
            patch: &TaskPatch,
            ext_cxn: &mut impl ExternalConnectivity,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<(), TaskError>;
    }
}

pub struct TaskService;

impl driving_ports::TaskPort for TaskService {
    async fn tasks_for_user(
        &self,
        user_id: i32,
        completed: Option<bool>,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl TaskReader,
    ) -> Result<Vec<TodoTask>, TaskError> {
        let tasks = match completed {
            Some(completed) => task_read
                .tasks_by_completion(user_id, completed, &mut *ext_cxn)
                .await
                .context("fetching tasks by completion")?,
            None => task_read
                .tasks_for_user(user_id, &mut *ext_cxn)
                .await
                .context("fetching tasks")?,
        };

        Ok(tasks)
    }

    async fn count_tasks(
        &self,
        user_id: i32,
        completed: Option<bool>,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl TaskReader,
    ) -> Result<i64, TaskError> {
        let count = match completed {
            Some(completed) => task_read
                .count_tasks_by_completion(user_id, completed, &mut *ext_cxn)
                .await
                .context("counting tasks by completion")?,
            None => task_read
                .count_tasks(user_id, &mut *ext_cxn)
                .await
                .context("counting tasks")?,
        };

        Ok(count)
    }

    async fn user_task_by_id(
        &self,
        user_id: i32,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl TaskReader,
    ) -> Result<TodoTask, TaskError> {
        let task_result = task_read
            .user_task_by_id(user_id, task_id, &mut *ext_cxn)
            .await;
        if let Err(DrivenPortError::CommsFailure(ref err)) = task_result {
            error!("Failed to look up task {task_id} for user {user_id}: {err}");
        }

        Ok(task_result?)
    }

    async fn create_task_for_user(
        &self,
        user_id: i32,
        task: &NewTask,
        ext_cxn: &mut impl ExternalConnectivity,
        task_write: &impl TaskWriter,
    ) -> Result<TodoTask, TaskError> {
        let created_task = task_write
            .create_task_for_user(user_id, task, &mut *ext_cxn)
            .await
            .context("creating a task")?;
        info!("Created task {} for user {user_id}", created_task.id);

        Ok(created_task)
    }

    async fn delete_task(
        &self,
        user_id: i32,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        task_write: &impl TaskWriter,
    ) -> Result<(), TaskError> {
        let deleted = task_write
            .delete_task(user_id, task_id, &mut *ext_cxn)
            .await
            .context("deleting a task")?;

        if deleted {
            Ok(())
        } else {
            Err(TaskError::TaskNotFound)
        }
    }

    async fn patch_task(
        &self,
        user_id: i32,
        task_id: i32,
        patch: &TaskPatch,
        ext_cxn: &mut impl ExternalConnectivity,
        task_write: &impl TaskWriter,
    ) -> Result<(), TaskError> {
        let patched = task_write
            .patch_task(user_id, task_id, patch, &mut *ext_cxn)
            .await
            .with_context(|| format!("patching the {} of a task", patch.column()))?;

        if patched {
            Ok(())
        } else {
            Err(TaskError::TaskNotFound)
        }
    }
}
