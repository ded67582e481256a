//! user-cli: command-line front end for the user repository workspace.
//!
//! Runs add/get/list/delete against whichever backend the configuration
//! selects (in-memory by default, SQLite when the `sqlite` feature is enabled).
//!
//! Run:
//! ```bash
//! # ephemeral walkthrough against the in-memory backend
//! cargo run -p user-cli -- demo
//!
//! # persistent storage
//! STORAGE_PROVIDER=sqlite DB_PATH=./data/users.db \
//!   cargo run -p user-cli -- add 1 Alice alice@example.com
//! ```
//!
//! Configuration: See `config.rs` for all environment variables.

mod config;

use std::env;
use std::process;

use domain::adapters::memory_repo::InMemoryUserRepo;
use domain::events::LoggingEventHandler;
use domain::factory::SequentialIdGenerator;
use domain::service::{next_free_id, UserService};
use domain::{CoreError, NewUser, User, UserId, UserRepository};
use serde::Serialize;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{Config, ConfigError, LogFormat, StorageProvider};

type Service = UserService<Box<dyn UserRepository>, SequentialIdGenerator, LoggingEventHandler>;

#[derive(Debug, Error)]
enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("user {0} not found")]
    NotFound(UserId),
    #[error("output encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Usage(String),
}

/// One-line summary printed by `list` and `demo`.
#[derive(Serialize)]
struct Summary<'a> {
    backend: &'a str,
    count: usize,
}

fn print_usage() {
    eprintln!(
        "{}\n\nUsage:\n  user-cli add <id> <name> <email>\n  user-cli register <name> <email>\n  user-cli get <id>\n  user-cli list\n  user-cli delete <id>\n  user-cli demo\n\nEnvironment:\n  STORAGE_PROVIDER=memory|sqlite  DB_PATH=<file>  LOG_FORMAT=pretty|json  FIRST_USER_ID=<int>",
        domain::about()
    );
}

fn init_tracing(cfg: &Config) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    match cfg.log_format {
        LogFormat::Json => {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_timer(fmt::time::SystemTime)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        LogFormat::Pretty => {
            registry
                .with(
                    fmt::layer()
                        .pretty()
                        .with_target(true)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    }
}

// Construct the repository selected by config and feature flags.
fn build_repo(cfg: &Config) -> Result<Box<dyn UserRepository>, CliError> {
    match cfg.storage_provider {
        StorageProvider::Memory => Ok(Box::new(InMemoryUserRepo::new())),
        #[cfg(feature = "sqlite")]
        StorageProvider::Sqlite => Ok(Box::new(sqlite_adapter::SqliteUserRepo::open(
            &cfg.db_path,
        )?)),
        #[cfg(not(feature = "sqlite"))]
        StorageProvider::Sqlite => Err(CliError::Usage(
            "STORAGE_PROVIDER=sqlite requires the `sqlite` feature".into(),
        )),
    }
}

fn parse_id(raw: Option<String>) -> Result<UserId, CliError> {
    let raw = raw.ok_or_else(|| CliError::Usage("missing <id>".into()))?;
    raw.parse::<i64>()
        .map(UserId::new)
        .map_err(|_| CliError::Usage(format!("invalid id: {}", raw)))
}

fn required(raw: Option<String>, what: &str) -> Result<String, CliError> {
    raw.ok_or_else(|| CliError::Usage(format!("missing <{}>", what)))
}

fn print_user(user: &User) -> Result<(), CliError> {
    println!("{}", serde_json::to_string(user)?);
    Ok(())
}

fn print_all(svc: &Service, backend: &str) -> Result<(), CliError> {
    let users = svc.list()?;
    for user in &users {
        print_user(user)?;
    }
    let summary = Summary {
        backend,
        count: users.len(),
    };
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}

// Walkthrough: add, list, fetch, delete, list again.
fn demo(svc: &Service, backend: &str) -> Result<(), CliError> {
    svc.add(User::new(1, "Alice", "alice@example.com"))?;
    print_all(svc, backend)?;
    if let Some(user) = svc.get(UserId::new(1))? {
        info!(%user, "fetched user");
        print_user(&user)?;
    }
    svc.remove(UserId::new(1))?;
    print_all(svc, backend)
}

fn run(cfg: &Config, mut args: impl Iterator<Item = String>) -> Result<(), CliError> {
    let Some(cmd) = args.next() else {
        print_usage();
        return Ok(());
    };

    let backend = cfg.storage_provider.as_str();
    let repo = build_repo(cfg)?;
    // Persistent stores outlive the process; start ids past what is already there.
    let first_id = next_free_id(&*repo, cfg.first_user_id)?;
    let svc: Service = UserService::new(
        repo,
        SequentialIdGenerator::starting_at(first_id),
        LoggingEventHandler,
    );

    match cmd.as_str() {
        "add" => {
            let id = parse_id(args.next())?;
            let name = required(args.next(), "name")?;
            let email = required(args.next(), "email")?;
            let user = svc.add(User { id, name, email })?;
            print_user(&user)
        }
        "register" => {
            let name = required(args.next(), "name")?;
            let email = required(args.next(), "email")?;
            let user = svc.register(NewUser { name, email })?;
            print_user(&user)
        }
        "get" => {
            let id = parse_id(args.next())?;
            match svc.get(id)? {
                Some(user) => print_user(&user),
                None => Err(CliError::NotFound(id)),
            }
        }
        "list" => print_all(&svc, backend),
        "delete" => {
            let id = parse_id(args.next())?;
            let removed = svc.remove(id)?;
            println!("{}", serde_json::json!({ "id": id, "removed": removed }));
            Ok(())
        }
        "demo" => demo(&svc, backend),
        _ => {
            print_usage();
            Ok(())
        }
    }
}

fn main() {
    let cfg = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("error: {}", CliError::from(e));
            process::exit(1);
        }
    };
    init_tracing(&cfg);

    if let Err(e) = run(&cfg, env::args().skip(1)) {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_config() -> Config {
        Config {
            storage_provider: StorageProvider::Memory,
            db_path: "unused.db".into(),
            log_format: LogFormat::Pretty,
            first_user_id: 1,
        }
    }

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn parse_id_rejects_garbage() {
        assert_eq!(parse_id(Some("12".into())).unwrap(), UserId::new(12));
        assert!(matches!(parse_id(Some("x".into())), Err(CliError::Usage(_))));
        assert!(matches!(parse_id(None), Err(CliError::Usage(_))));
    }

    #[test]
    fn demo_runs_against_memory() {
        run(&memory_config(), args(&["demo"])).unwrap();
    }

    #[test]
    fn add_requires_all_arguments() {
        let err = run(&memory_config(), args(&["add", "1", "Alice"])).unwrap_err();
        assert!(matches!(err, CliError::Usage(_)));
    }

    #[test]
    fn get_unknown_user_is_an_error() {
        let err = run(&memory_config(), args(&["get", "7"])).unwrap_err();
        assert!(matches!(err, CliError::NotFound(id) if id == UserId::new(7)));
        assert_eq!(err.to_string(), "user 7 not found");
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn sqlite_backend_persists_between_runs() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = sqlite_config(&dir);
        run(&cfg, args(&["add", "5", "Eve", "eve@example.com"])).unwrap();
        run(&cfg, args(&["get", "5"])).unwrap();
        run(&cfg, args(&["delete", "5"])).unwrap();
        let err = run(&cfg, args(&["get", "5"])).unwrap_err();
        assert!(matches!(err, CliError::NotFound(_)));
    }

    #[cfg(feature = "sqlite")]
    fn sqlite_config(dir: &tempfile::TempDir) -> Config {
        Config {
            storage_provider: StorageProvider::Sqlite,
            db_path: dir.path().join("users.db"),
            ..memory_config()
        }
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn register_after_many_persisted_users_picks_next_free_id() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = sqlite_config(&dir);
        {
            let repo = sqlite_adapter::SqliteUserRepo::open(&cfg.db_path).unwrap();
            for id in 1..=150 {
                repo.add(User::new(id, format!("u{id}"), format!("u{id}@e.com")))
                    .unwrap();
            }
        }
        run(&cfg, args(&["register", "Late", "late@example.com"])).unwrap();

        let repo = sqlite_adapter::SqliteUserRepo::open(&cfg.db_path).unwrap();
        let late = repo.get_by_id(UserId::new(151)).unwrap().unwrap();
        assert_eq!(late.name, "Late");
    }
}
