//! Typed records over the generic [`RelationalStore`] operations.

use crate::schema::{tasks, users, TABLE_TASKS, TABLE_USERS};
use crate::store::{Filter, RelationalStore, Row};
use serde::{Deserialize, Serialize};

/// Database model for user accounts.
///
/// Passwords are stored exactly as given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: String,
}

impl UserRecord {
    fn from_row(row: &Row) -> crate::Result<Self> {
        Ok(Self {
            id: row.integer(users::ID)?,
            username: row.required_text(users::USERNAME)?,
            email: row.required_text(users::EMAIL)?,
            password: row.required_text(users::PASSWORD)?,
        })
    }

    fn to_row(&self) -> Row {
        Row::new()
            .text(users::USERNAME, &self.username)
            .text(users::EMAIL, &self.email)
            .text(users::PASSWORD, &self.password)
    }
}

/// Database operations for users.
pub struct UserStore<'a, S: RelationalStore> {
    store: &'a S,
}

impl<'a, S: RelationalStore> UserStore<'a, S> {
    /// Create a new user store.
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Insert a new user. The record's `id` is ignored and the assigned one
    /// returned.
    pub fn insert(&self, record: &UserRecord) -> crate::Result<i64> {
        self.store.insert(TABLE_USERS, &record.to_row())
    }

    /// Get a user by ID.
    pub fn get(&self, id: i64) -> crate::Result<Option<UserRecord>> {
        self.first(Filter::eq(users::ID, id))
    }

    pub fn get_by_username(&self, username: &str) -> crate::Result<Option<UserRecord>> {
        self.first(Filter::eq(users::USERNAME, username.to_string()))
    }

    /// List all users.
    pub fn list(&self) -> crate::Result<Vec<UserRecord>> {
        self.store
            .query(TABLE_USERS, None)?
            .iter()
            .map(UserRecord::from_row)
            .collect()
    }

    /// Remove a user and, through the cascade, their tasks.
    pub fn delete(&self, id: i64) -> crate::Result<bool> {
        Ok(self.store.delete(TABLE_USERS, Some(&Filter::eq(users::ID, id)))? > 0)
    }

    fn first(&self, filter: Filter) -> crate::Result<Option<UserRecord>> {
        match self.store.query(TABLE_USERS, Some(&filter))?.first() {
            Some(row) => Ok(Some(UserRecord::from_row(row)?)),
            None => Ok(None),
        }
    }
}

/// Database model for tasks. Everything but the owner is free-form text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub task_id: i64,
    pub user_id: i64,
    pub task_name: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<String>,
    pub status: Option<String>,
}

impl TaskRecord {
    fn from_row(row: &Row) -> crate::Result<Self> {
        Ok(Self {
            task_id: row.integer(tasks::TASK_ID)?,
            user_id: row.integer(tasks::USER_ID)?,
            task_name: row.optional_text(tasks::TASK_NAME)?,
            description: row.optional_text(tasks::DESCRIPTION)?,
            priority: row.optional_text(tasks::PRIORITY)?,
            due_date: row.optional_text(tasks::DUE_DATE)?,
            status: row.optional_text(tasks::STATUS)?,
        })
    }

    fn to_row(&self) -> Row {
        Row::new()
            .with(tasks::USER_ID, self.user_id)
            .with(tasks::TASK_NAME, self.task_name.clone())
            .with(tasks::DESCRIPTION, self.description.clone())
            .with(tasks::PRIORITY, self.priority.clone())
            .with(tasks::DUE_DATE, self.due_date.clone())
            .with(tasks::STATUS, self.status.clone())
    }
}

/// Database operations for tasks.
pub struct TaskStore<'a, S: RelationalStore> {
    store: &'a S,
}

impl<'a, S: RelationalStore> TaskStore<'a, S> {
    /// Create a new task store.
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Insert a new task. Fails with a constraint violation when `user_id`
    /// does not name an existing user.
    pub fn insert(&self, record: &TaskRecord) -> crate::Result<i64> {
        self.store.insert(TABLE_TASKS, &record.to_row())
    }

    /// Get a task by ID.
    pub fn get(&self, task_id: i64) -> crate::Result<Option<TaskRecord>> {
        match self
            .store
            .query(TABLE_TASKS, Some(&Filter::eq(tasks::TASK_ID, task_id)))?
            .first()
        {
            Some(row) => Ok(Some(TaskRecord::from_row(row)?)),
            None => Ok(None),
        }
    }

    pub fn list_for_user(&self, user_id: i64) -> crate::Result<Vec<TaskRecord>> {
        self.store
            .query(TABLE_TASKS, Some(&Filter::eq(tasks::USER_ID, user_id)))?
            .iter()
            .map(TaskRecord::from_row)
            .collect()
    }

    pub fn delete(&self, task_id: i64) -> crate::Result<bool> {
        Ok(self
            .store
            .delete(TABLE_TASKS, Some(&Filter::eq(tasks::TASK_ID, task_id)))?
            > 0)
    }
}
