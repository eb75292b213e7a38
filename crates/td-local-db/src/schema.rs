//! Database schema definitions and constants.

use crate::store::{RelationalStore, TableSpec};

// Table names
pub const TABLE_USERS: &str = "users";
pub const TABLE_TASKS: &str = "tasks";

// Column names for users table
pub mod users {
    pub const ID: &str = "ID";
    pub const USERNAME: &str = "Username";
    pub const EMAIL: &str = "Email";
    pub const PASSWORD: &str = "Password";
}

// Column names for tasks table
pub mod tasks {
    pub const TASK_ID: &str = "Task_ID";
    pub const USER_ID: &str = "User_ID";
    pub const TASK_NAME: &str = "Task_Name";
    pub const DESCRIPTION: &str = "Description";
    pub const PRIORITY: &str = "Priority";
    pub const DUE_DATE: &str = "Due_Date";
    pub const STATUS: &str = "Status";
}

/// Account table. Usernames and emails are unique.
pub fn users_table() -> TableSpec {
    TableSpec::new(TABLE_USERS)
        .column(users::ID, "INTEGER PRIMARY KEY AUTOINCREMENT")
        .column(users::USERNAME, "TEXT UNIQUE NOT NULL")
        .column(users::EMAIL, "TEXT UNIQUE NOT NULL")
        .column(users::PASSWORD, "TEXT NOT NULL")
}

/// Task table. Every task belongs to a user; removing the user removes
/// their tasks.
pub fn tasks_table() -> TableSpec {
    TableSpec::new(TABLE_TASKS)
        .column(tasks::TASK_ID, "INTEGER PRIMARY KEY AUTOINCREMENT")
        .column(tasks::USER_ID, "INTEGER NOT NULL")
        .column(tasks::TASK_NAME, "TEXT")
        .column(tasks::DESCRIPTION, "TEXT")
        .column(tasks::PRIORITY, "TEXT")
        .column(tasks::DUE_DATE, "TEXT")
        .column(tasks::STATUS, "TEXT")
        .constraint(format!(
            "FOREIGN KEY ({}) REFERENCES {}({}) ON DELETE CASCADE",
            tasks::USER_ID,
            TABLE_USERS,
            users::ID
        ))
}

/// Declare both tables. `users` goes first so the foreign key has a target.
pub fn initialize_schema<S: RelationalStore>(store: &S) -> crate::Result<()> {
    for spec in [users_table(), tasks_table()] {
        store.create_table(&spec)?;
    }
    Ok(())
}
