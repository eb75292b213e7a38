//! End-to-end bootstrap runs against real temp directories.

use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use td_core::{
    AppConfig, Bootstrap, BootstrapPlan, BootstrapState, ConfigStore, Environment, Error,
    JsonConfigStore, Resource,
};
use td_local_db::{
    Database, Filter, RelationalStore, Row, TableSpec, TaskRecord, TaskStore, UserRecord,
    UserStore, TABLE_TASKS, TABLE_USERS,
};
use tempfile::TempDir;

fn fresh() -> (TempDir, Environment) {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let env = Environment::from_base(dir.path()).expect("Failed to build environment");
    (dir, env)
}

fn run(env: &Environment) -> td_core::BootstrapReport {
    let mut bootstrap = Bootstrap::new(env.clone());
    let report = bootstrap.run().expect("bootstrap failed");
    assert_eq!(bootstrap.state(), BootstrapState::Ready);
    report
}

fn app_config(env: &Environment) -> AppConfig {
    let document = JsonConfigStore::new(env.config_path()).load().unwrap();
    AppConfig::from_document(&document).unwrap()
}

fn bytes(path: &Path) -> Vec<u8> {
    fs::read(path).unwrap()
}

#[test]
fn test_fresh_target_is_fully_provisioned() {
    let (_dir, env) = fresh();

    let report = run(&env);
    assert_eq!(report.plan, BootstrapPlan::Provision);
    assert_eq!(report.state, BootstrapState::Ready);
    assert!(!report.presence.assets_dir);
    assert!(report.sink.created());

    assert!(env.assets_dir().is_dir());
    assert!(env.database_path().is_file());
    assert!(env.config_path().is_file());
    assert!(env.log_path().is_file());

    let db = Database::open(env.database_path()).unwrap();
    assert_eq!(db.table_names().unwrap(), vec!["tasks", "users"]);
    assert!(db.query(TABLE_USERS, None).unwrap().is_empty());
    assert!(db.query(TABLE_TASKS, None).unwrap().is_empty());

    let config = app_config(&env);
    assert_eq!(config.version, td_core::APP_VERSION);
    assert!(!config.creation_date.is_empty());
    assert!(config.user_data.id.is_empty());
    assert!(config.user_data.username.is_empty());
    assert!(config.user_data.email.is_empty());
    assert!(config.user_data.password.is_empty());

    let log = fs::read_to_string(env.log_path()).unwrap();
    assert!(log.contains("provisioning environment"));
    assert!(log.contains("created directory"), "directory creation not logged:\n{log}");
    assert!(log.contains("environment ready"));
}

#[test]
fn test_second_run_changes_nothing_but_the_log() {
    let (_dir, env) = fresh();
    run(&env);
    let created = app_config(&env).creation_date;
    let db_before = bytes(env.database_path());
    let config_before = bytes(env.config_path());
    let log_before = fs::read_to_string(env.log_path()).unwrap();

    let report = run(&env);
    assert_eq!(report.plan, BootstrapPlan::Nothing);
    assert_eq!(report.state, BootstrapState::Ready);
    assert!(report.presence.all());
    assert!(!report.sink.created());

    assert_eq!(app_config(&env).creation_date, created);
    assert_eq!(bytes(env.database_path()), db_before);
    assert_eq!(bytes(env.config_path()), config_before);

    let log_after = fs::read_to_string(env.log_path()).unwrap();
    assert!(log_after.starts_with(&log_before), "log was rewritten");
    assert!(log_after.len() > log_before.len());
    assert!(!log_after[log_before.len()..].contains("provisioning environment"));
}

#[test]
fn test_creation_date_is_stable_across_many_runs() {
    let (_dir, env) = fresh();
    run(&env);
    let created = app_config(&env).creation_date;

    for _ in 0..3 {
        run(&env);
    }
    assert_eq!(app_config(&env).creation_date, created);
}

#[test]
fn test_missing_log_is_repaired_without_touching_data() {
    let (_dir, env) = fresh();
    run(&env);
    let db_before = bytes(env.database_path());
    let config_before = bytes(env.config_path());
    fs::remove_file(env.log_path()).unwrap();

    let mut bootstrap = Bootstrap::new(env.clone());
    let report = bootstrap.run().unwrap();

    assert_eq!(report.plan, BootstrapPlan::RepairLog);
    assert!(report.presence.data_complete());
    assert!(!report.presence.log);
    assert!(report.sink.created());
    assert!(env.log_path().is_file());
    assert_eq!(bytes(env.database_path()), db_before);
    assert_eq!(bytes(env.config_path()), config_before);

    let log = fs::read_to_string(env.log_path()).unwrap();
    assert!(log.contains("log file was missing"));
    assert!(!log.contains("provisioning environment"));
}

#[test]
fn test_user_data_survives_reruns() {
    let (_dir, env) = fresh();
    run(&env);

    let db = Database::open(env.database_path()).unwrap();
    let alice = UserStore::new(&db)
        .insert(&UserRecord {
            id: 0,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "pw".to_string(),
        })
        .unwrap();
    TaskStore::new(&db)
        .insert(&TaskRecord {
            user_id: alice,
            task_name: Some("Plan week".to_string()),
            ..TaskRecord::default()
        })
        .unwrap();
    db.close().unwrap();

    let store = JsonConfigStore::new(env.config_path());
    let mut fields = serde_json::Map::new();
    fields.insert("Theme".to_string(), json!("dark"));
    store.merge(fields).unwrap();

    fs::remove_file(env.log_path()).unwrap();
    run(&env);
    run(&env);

    let db = Database::open(env.database_path()).unwrap();
    assert_eq!(UserStore::new(&db).list().unwrap().len(), 1);
    assert_eq!(TaskStore::new(&db).list_for_user(alice).unwrap().len(), 1);
    assert_eq!(store.get("Theme").unwrap(), Some(json!("dark")));
}

#[test]
fn test_referential_integrity_holds_after_bootstrap() {
    let (_dir, env) = fresh();
    run(&env);

    let db = Database::open(env.database_path()).unwrap();
    let orphan = Row::new()
        .with(td_local_db::tasks::USER_ID, 1i64)
        .text(td_local_db::tasks::TASK_NAME, "orphan");
    let err = db.insert(TABLE_TASKS, &orphan).unwrap_err();
    assert!(err.is_constraint_violation(), "unexpected error: {err}");
}

#[test]
fn test_interrupted_run_with_placeholders_is_completed() {
    let (_dir, env) = fresh();
    fs::create_dir_all(env.assets_dir()).unwrap();
    fs::write(env.database_path(), b"").unwrap();
    fs::write(env.config_path(), b"").unwrap();
    fs::write(env.log_path(), b"").unwrap();

    let report = run(&env);
    assert_eq!(report.plan, BootstrapPlan::Provision);
    assert!(!report.presence.database);
    assert!(!report.presence.config);
    let log = fs::read_to_string(env.log_path()).unwrap();
    assert!(log.contains("provisioning environment"));
    assert!(!log.contains("created directory"));

    let db = Database::open(env.database_path()).unwrap();
    assert_eq!(db.table_names().unwrap(), vec!["tasks", "users"]);
    assert!(!app_config(&env).creation_date.is_empty());
}

#[test]
fn test_missing_database_keeps_existing_config() {
    let (_dir, env) = fresh();
    fs::create_dir_all(env.assets_dir()).unwrap();
    let original = json!({
        "Version": "0.0.9",
        "Creation_Date": "2025-01-01 08:00:00.000000",
        "Theme": "dark"
    });
    fs::write(env.config_path(), serde_json::to_string(&original).unwrap()).unwrap();

    let report = run(&env);
    assert_eq!(report.plan, BootstrapPlan::Provision);

    let document = JsonConfigStore::new(env.config_path()).load().unwrap();
    assert_eq!(document["Version"], json!("0.0.9"));
    assert_eq!(document["Creation_Date"], json!("2025-01-01 08:00:00.000000"));
    assert_eq!(document["Theme"], json!("dark"));
    assert_eq!(
        document["User_Data"],
        json!({"ID": "", "Username": "", "Email": "", "Password": ""})
    );
    assert_eq!(
        Database::open(env.database_path()).unwrap().table_names().unwrap(),
        vec!["tasks", "users"]
    );
}

#[test]
fn test_unwritable_assets_path_is_fatal() {
    let (dir, _) = fresh();
    fs::write(dir.path().join("assets"), b"a file, not a directory").unwrap();
    let env = Environment::from_base(dir.path()).unwrap();

    let mut bootstrap = Bootstrap::new(env);
    let err = bootstrap.run().unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(
        err,
        Error::ResourceCreation {
            resource: Resource::AssetsDirectory,
            ..
        }
    ));
    assert_eq!(bootstrap.state(), BootstrapState::Provisioning);
}

/// A store whose backing file can never be opened.
struct UnavailableStore;

impl RelationalStore for UnavailableStore {
    fn open_or_create(_path: &Path) -> td_local_db::Result<Self> {
        Err(td_local_db::Error::generic("disk full"))
    }

    fn create_table(&self, _spec: &TableSpec) -> td_local_db::Result<()> {
        unreachable!("never opened")
    }

    fn insert(&self, _table: &str, _row: &Row) -> td_local_db::Result<i64> {
        unreachable!("never opened")
    }

    fn query(&self, _table: &str, _filter: Option<&Filter>) -> td_local_db::Result<Vec<Row>> {
        unreachable!("never opened")
    }

    fn delete(&self, _table: &str, _filter: Option<&Filter>) -> td_local_db::Result<usize> {
        unreachable!("never opened")
    }

    fn table_names(&self) -> td_local_db::Result<Vec<String>> {
        unreachable!("never opened")
    }

    fn close(self) -> td_local_db::Result<()> {
        Ok(())
    }
}

#[test]
fn test_database_failure_halts_and_next_run_recovers() {
    let (_dir, env) = fresh();
    let config = JsonConfigStore::new(env.config_path());

    let mut failing: Bootstrap<UnavailableStore, JsonConfigStore> =
        Bootstrap::with_config_store(env.clone(), config);
    let err = failing.run().unwrap_err();
    assert!(matches!(
        err,
        Error::ResourceCreation {
            resource: Resource::Database,
            ..
        }
    ));
    assert!(err.to_string().contains("disk full"));
    assert!(env.assets_dir().is_dir());
    assert!(env.log_path().is_file());
    // The config was never seeded, so it is still an empty placeholder.
    assert_eq!(bytes(env.config_path()), Vec::<u8>::new());

    let report = run(&env);
    assert_eq!(report.plan, BootstrapPlan::Provision);
    let config: Value = serde_json::from_slice(&bytes(env.config_path())).unwrap();
    assert!(config.get("Creation_Date").is_some());
    assert_eq!(
        Database::open(env.database_path()).unwrap().table_names().unwrap(),
        vec!["tasks", "users"]
    );
}
