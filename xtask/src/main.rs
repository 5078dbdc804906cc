// Copyright (C) 2024-2025 Fred Clausen and the ratatui project contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! # xtask
//!
//! Project automation for the reservation engine workspace.
//!
//! `cargo test` runs everything against `SQLite` and needs no services.
//! The `MySQL` backend is opt-in:
//!
//! - `cargo xtask test-mysql` starts a throwaway `MariaDB` container and runs
//!   the ignored backend validation tests of `alfio-persistence` against it.
//! - `cargo xtask verify-migrations` applies both migration directories and
//!   fails when the resulting schemas differ.
//!
//! Containers are removed whether the run passes or not.

#![deny(
    clippy::pedantic,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;
use std::io;
use std::process::Output;
use std::thread::sleep;
use std::time::Duration;

use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use color_eyre::{
    Result,
    eyre::{Context, eyre},
};
use diesel::sql_types::{Integer, Text};
use diesel::{Connection, MysqlConnection, QueryableByName, RunQueryDsl, SqliteConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use duct::cmd;
use tracing::level_filters::LevelFilter;
use tracing_log::AsTrace;

const SQLITE_MIGRATIONS: EmbeddedMigrations = embed_migrations!("../crates/persistence/migrations");
const MYSQL_MIGRATIONS: EmbeddedMigrations =
    embed_migrations!("../crates/persistence/migrations_mysql");

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.log_level())
        .without_time()
        .init();

    match args.run() {
        Ok(()) => (),
        Err(err) => {
            tracing::error!("{err}");
            std::process::exit(1);
        }
    }
    Ok(())
}

#[derive(Debug, Parser)]
#[command(bin_name = "cargo xtask", styles = clap_cargo::style::CLAP_STYLING)]
struct Args {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    verbosity: Verbosity<InfoLevel>,
}

impl Args {
    fn run(self) -> Result<()> {
        self.command.run()
    }

    fn log_level(&self) -> LevelFilter {
        self.verbosity.log_level_filter().as_trace()
    }
}

#[derive(Clone, Debug, Subcommand)]
enum Command {
    /// Run CI checks (lint, build, test)
    CI,

    /// Build the project
    #[command(visible_alias = "b")]
    Build,

    /// Run cargo check
    #[command(visible_alias = "c")]
    Check,

    /// Lint formatting, typos, clippy, and docs
    #[command(visible_alias = "l")]
    Lint,

    /// Run clippy on the project
    #[command(visible_alias = "cl")]
    LintClippy,

    /// Check documentation for errors and warnings
    #[command(visible_alias = "d")]
    LintDocs,

    /// Check for formatting issues in the project
    #[command(visible_alias = "lf")]
    LintFormatting,

    /// Check for typos in the project
    #[command(visible_alias = "lt")]
    LintTypos,

    /// Fix formatting issues in the project
    #[command(visible_alias = "fmt")]
    FixFormatting,

    /// Run tests
    #[command(visible_alias = "t")]
    Test,

    /// Run the `MySQL` backend validation tests against a `MariaDB` container
    #[command(visible_alias = "tm")]
    TestMysql,

    /// Verify schema parity between `SQLite` and `MySQL` migrations
    #[command(visible_alias = "vm")]
    VerifyMigrations,
}

impl Command {
    fn run(self) -> Result<()> {
        match self {
            Self::CI => ci(),
            Self::Build => build(),
            Self::Check => check(),
            Self::Lint => lint(),
            Self::LintClippy => lint_clippy(),
            Self::LintDocs => lint_docs(),
            Self::LintFormatting => lint_format(),
            Self::LintTypos => lint_typos(),
            Self::FixFormatting => fix_format(),
            Self::Test => test(),
            Self::TestMysql => test_mysql(),
            Self::VerifyMigrations => verify_migrations(),
        }
    }
}

/// Run CI checks (lint, build, test)
fn ci() -> Result<()> {
    lint()?;
    build()?;
    test()?;
    test_mysql()?;
    verify_migrations()?;
    Ok(())
}

/// Build the project
fn build() -> Result<()> {
    run_cargo(vec!["build", "--all-targets", "--all-features"])
}

/// Run cargo check
fn check() -> Result<()> {
    run_cargo(vec!["check", "--all-targets", "--all-features"])
}

fn lint() -> Result<()> {
    lint_clippy()?;
    lint_docs()?;
    lint_format()?;
    lint_typos()?;
    Ok(())
}

fn lint_clippy() -> Result<()> {
    run_cargo(vec![
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ])
}

/// Check that docs build without warnings for every library crate
fn lint_docs() -> Result<()> {
    for package in ["alfio-domain", "alfio-audit", "alfio", "alfio-persistence", "alfio-services"] {
        cmd("cargo", ["doc", "--no-deps", "--all-features", "--package", package])
            .env_remove("CARGO")
            .env("RUSTDOCFLAGS", "-D warnings")
            .run_with_trace()?;
    }
    Ok(())
}

fn lint_format() -> Result<()> {
    run_cargo_nightly(vec!["fmt", "--all", "--check"])
}

fn fix_format() -> Result<()> {
    run_cargo_nightly(vec!["fmt", "--all"])
}

/// Check for typos in the project using [typos-cli](https://github.com/crate-ci/typos/)
fn lint_typos() -> Result<()> {
    cmd!("typos").run_with_trace()?;
    Ok(())
}

/// Run unit, integration and doc tests on `SQLite`
fn test() -> Result<()> {
    run_cargo(vec!["test", "--all-targets"])?;
    run_cargo(vec!["test", "--doc"])
}

fn run_cargo(args: Vec<&str>) -> Result<()> {
    cmd("cargo", args).run_with_trace()?;
    Ok(())
}

fn run_cargo_nightly(args: Vec<&str>) -> Result<()> {
    cmd("cargo", args)
        // CARGO env var is set because we're running in a cargo subcommand
        .env_remove("CARGO")
        .env("RUSTUP_TOOLCHAIN", "nightly")
        .run_with_trace()?;
    Ok(())
}

/// A disposable `MariaDB` 11 container, removed on drop.
struct MariaDb {
    name: &'static str,
    database: &'static str,
    port: u16,
}

impl MariaDb {
    const USER: &'static str = "alfio";
    const PASSWORD: &'static str = "alfio_password";

    /// Starts the container and waits up to 30 seconds for it to accept queries.
    fn start(name: &'static str, database: &'static str, port: u16) -> Result<Self> {
        cmd!("docker", "--version")
            .run_with_trace()
            .wrap_err("Docker is not available. Please install Docker.")?;

        // leftovers of an interrupted run
        let _ = cmd!("docker", "rm", "--force", name).stderr_null().run();

        tracing::info!("Starting MariaDB container: {name}");
        cmd!(
            "docker",
            "run",
            "--name",
            name,
            "-e",
            format!("MARIADB_DATABASE={database}"),
            "-e",
            format!("MARIADB_USER={}", Self::USER),
            "-e",
            format!("MARIADB_PASSWORD={}", Self::PASSWORD),
            "-e",
            "MARIADB_ROOT_PASSWORD=root_password",
            "-p",
            format!("{port}:3306"),
            "-d",
            "mariadb:11"
        )
        .run_with_trace()
        .wrap_err("Failed to start MariaDB container")?;

        let container = Self {
            name,
            database,
            port,
        };
        container.wait_until_ready()?;
        Ok(container)
    }

    fn wait_until_ready(&self) -> Result<()> {
        for attempt in 1..=30 {
            sleep(Duration::from_secs(1));
            tracing::debug!("Connection attempt {attempt}/30");
            let check = cmd!(
                "docker",
                "exec",
                self.name,
                "mariadb",
                "-u",
                Self::USER,
                format!("-p{}", Self::PASSWORD),
                "-e",
                "SELECT 1"
            )
            .stdout_null()
            .stderr_null()
            .run();
            if check.is_ok() {
                tracing::info!("MariaDB is ready");
                return Ok(());
            }
        }
        Err(eyre!("MariaDB did not become ready within timeout"))
    }

    fn url(&self) -> String {
        format!(
            "mysql://{}:{}@127.0.0.1:{}/{}",
            Self::USER,
            Self::PASSWORD,
            self.port,
            self.database
        )
    }
}

impl Drop for MariaDb {
    fn drop(&mut self) {
        tracing::info!("Removing MariaDB container: {}", self.name);
        let _ = cmd!("docker", "rm", "--force", self.name).stdout_null().run();
    }
}

/// Run the ignored `MySQL` tests of `alfio-persistence`
///
/// Covers migrations, foreign key enforcement and the `FOR UPDATE SKIP
/// LOCKED` inventory claims. Requires Docker and a free port 3307.
fn test_mysql() -> Result<()> {
    let container = MariaDb::start("alfio-test-mariadb", "alfio_test", 3307)?;

    tracing::info!("Running MySQL backend validation tests");
    cmd!(
        "cargo",
        "test",
        "--package",
        "alfio-persistence",
        "--features",
        "mysql",
        "backend_validation_tests",
        "--",
        "--ignored",
        "--test-threads=1"
    )
    .env("DATABASE_URL", container.url())
    .run_with_trace()
    .wrap_err("MySQL backend validation tests failed")?;

    tracing::info!("MySQL backend validation completed successfully");
    Ok(())
}

/// Apply both migration directories and compare the resulting schemas
///
/// Tables, column types, nullability, primary keys, foreign keys and
/// unique constraints must match. Requires Docker and a free port 3308.
fn verify_migrations() -> Result<()> {
    let container = MariaDb::start("alfio-verify-migrations", "alfio_verify", 3308)?;

    let mut sqlite = SqliteConnection::establish(":memory:")
        .wrap_err("Failed to create SQLite in-memory database")?;
    diesel::sql_query("PRAGMA foreign_keys = ON")
        .execute(&mut sqlite)
        .wrap_err("Failed to enable foreign keys on SQLite")?;
    sqlite
        .run_pending_migrations(SQLITE_MIGRATIONS)
        .map_err(|e| eyre!("Failed to apply SQLite migrations: {e}"))?;

    let mut mysql =
        MysqlConnection::establish(&container.url()).wrap_err("Failed to connect to MariaDB")?;
    mysql
        .run_pending_migrations(MYSQL_MIGRATIONS)
        .map_err(|e| eyre!("Failed to apply MySQL migrations: {e}"))?;

    let sqlite_schema = sqlite_schema(&mut sqlite)?;
    let mysql_schema = mysql_schema(&mut mysql, container.database)?;
    let mismatches = compare_schemas(&sqlite_schema, &mysql_schema);
    if !mismatches.is_empty() {
        return Err(eyre!(
            "Schema parity check failed:\n  - {}",
            mismatches.join("\n  - ")
        ));
    }

    tracing::info!(tables = sqlite_schema.len(), "Schema parity verified");
    Ok(())
}

/// Table name to its normalized shape.
type Schema = BTreeMap<String, TableShape>;

#[derive(Debug, Default, PartialEq, Eq)]
struct TableShape {
    /// Column name to (type family, nullable).
    columns: BTreeMap<String, (&'static str, bool)>,
    primary_key: BTreeSet<String>,
    /// (column, referenced table, referenced column)
    foreign_keys: BTreeSet<(String, String, String)>,
    unique: BTreeSet<Vec<String>>,
}

fn sqlite_schema(conn: &mut SqliteConnection) -> Result<Schema> {
    #[derive(QueryableByName)]
    struct Name {
        #[diesel(sql_type = Text)]
        name: String,
    }

    #[derive(QueryableByName)]
    struct ColumnRow {
        #[diesel(sql_type = Text)]
        name: String,
        #[diesel(sql_type = Text)]
        r#type: String,
        #[diesel(sql_type = Integer)]
        notnull: i32,
        #[diesel(sql_type = Integer)]
        pk: i32,
    }

    #[derive(QueryableByName)]
    struct ForeignKeyRow {
        #[diesel(sql_type = Text)]
        table: String,
        #[diesel(sql_type = Text)]
        from: String,
        #[diesel(sql_type = Text)]
        to: String,
    }

    #[derive(QueryableByName)]
    struct IndexRow {
        #[diesel(sql_type = Text)]
        name: String,
        #[diesel(sql_type = Text)]
        origin: String,
    }

    let tables: Vec<Name> = diesel::sql_query(
        "SELECT name FROM sqlite_master WHERE type = 'table' \
         AND name NOT LIKE 'sqlite_%' AND name != '__diesel_schema_migrations'",
    )
    .load(conn)
    .wrap_err("Failed to list SQLite tables")?;

    let mut schema = Schema::new();
    for table in tables {
        let mut shape = TableShape::default();

        let columns: Vec<ColumnRow> = diesel::sql_query(format!("PRAGMA table_info({})", table.name))
            .load(conn)
            .wrap_err_with(|| format!("Failed to read columns of {}", table.name))?;
        for column in columns {
            if column.pk > 0 {
                shape.primary_key.insert(column.name.clone());
            }
            shape
                .columns
                .insert(column.name, (type_family(&column.r#type), column.notnull == 0 && column.pk == 0));
        }

        let foreign_keys: Vec<ForeignKeyRow> =
            diesel::sql_query(format!("PRAGMA foreign_key_list({})", table.name))
                .load(conn)
                .wrap_err_with(|| format!("Failed to read foreign keys of {}", table.name))?;
        shape.foreign_keys = foreign_keys
            .into_iter()
            .map(|fk| (fk.from, fk.table, fk.to))
            .collect();

        let indexes: Vec<IndexRow> = diesel::sql_query(format!("PRAGMA index_list({})", table.name))
            .load(conn)
            .wrap_err_with(|| format!("Failed to read indexes of {}", table.name))?;
        // 'u' marks UNIQUE constraints, explicit unique indexes are 'c'
        for index in indexes.into_iter().filter(|i| i.origin == "u") {
            let columns: Vec<Name> = diesel::sql_query(format!("PRAGMA index_info({})", index.name))
                .load(conn)
                .wrap_err_with(|| format!("Failed to read index {}", index.name))?;
            shape
                .unique
                .insert(columns.into_iter().map(|c| c.name).collect());
        }

        schema.insert(table.name, shape);
    }
    Ok(schema)
}

fn mysql_schema(conn: &mut MysqlConnection, database: &str) -> Result<Schema> {
    #[derive(QueryableByName)]
    struct ColumnRow {
        #[diesel(sql_type = Text)]
        table_name: String,
        #[diesel(sql_type = Text)]
        column_name: String,
        #[diesel(sql_type = Text)]
        data_type: String,
        #[diesel(sql_type = Text)]
        is_nullable: String,
        #[diesel(sql_type = Text)]
        column_key: String,
    }

    #[derive(QueryableByName)]
    struct KeyRow {
        #[diesel(sql_type = Text)]
        table_name: String,
        #[diesel(sql_type = Text)]
        constraint_name: String,
        #[diesel(sql_type = Text)]
        constraint_type: String,
        #[diesel(sql_type = Text)]
        column_name: String,
        #[diesel(sql_type = diesel::sql_types::Nullable<Text>)]
        referenced_table_name: Option<String>,
        #[diesel(sql_type = diesel::sql_types::Nullable<Text>)]
        referenced_column_name: Option<String>,
    }

    let columns: Vec<ColumnRow> = diesel::sql_query(
        "SELECT table_name, column_name, data_type, is_nullable, column_key \
         FROM information_schema.columns \
         WHERE table_schema = ? AND table_name != '__diesel_schema_migrations' \
         ORDER BY table_name, ordinal_position",
    )
    .bind::<Text, _>(database)
    .load(conn)
    .wrap_err("Failed to read MySQL columns")?;

    let mut schema = Schema::new();
    for column in columns {
        let shape = schema.entry(column.table_name).or_default();
        if column.column_key == "PRI" {
            shape.primary_key.insert(column.column_name.clone());
        }
        shape.columns.insert(
            column.column_name,
            (type_family(&column.data_type), column.is_nullable == "YES"),
        );
    }

    let keys: Vec<KeyRow> = diesel::sql_query(
        "SELECT kcu.table_name, kcu.constraint_name, tc.constraint_type, kcu.column_name, \
                kcu.referenced_table_name, kcu.referenced_column_name \
         FROM information_schema.key_column_usage kcu \
         JOIN information_schema.table_constraints tc \
           ON tc.constraint_name = kcu.constraint_name \
          AND tc.table_schema = kcu.table_schema \
          AND tc.table_name = kcu.table_name \
         WHERE kcu.table_schema = ? AND tc.constraint_type IN ('UNIQUE', 'FOREIGN KEY') \
         ORDER BY kcu.table_name, kcu.constraint_name, kcu.ordinal_position",
    )
    .bind::<Text, _>(database)
    .load(conn)
    .wrap_err("Failed to read MySQL constraints")?;

    let mut unique: BTreeMap<(String, String), Vec<String>> = BTreeMap::new();
    for key in keys {
        if key.constraint_type == "UNIQUE" {
            unique
                .entry((key.table_name, key.constraint_name))
                .or_default()
                .push(key.column_name);
        } else if let (Some(table), Some(column), Some(shape)) = (
            key.referenced_table_name,
            key.referenced_column_name,
            schema.get_mut(&key.table_name),
        ) {
            shape.foreign_keys.insert((key.column_name, table, column));
        }
    }
    for ((table, _), columns) in unique {
        if let Some(shape) = schema.get_mut(&table) {
            shape.unique.insert(columns);
        }
    }
    Ok(schema)
}

/// Maps a backend column type to a portable family.
fn type_family(column_type: &str) -> &'static str {
    let upper = column_type.to_uppercase();
    if upper.contains("INT") {
        "integer"
    } else if ["REAL", "FLOA", "DOUB", "DECIMAL", "NUMERIC"]
        .iter()
        .any(|t| upper.contains(t))
    {
        "real"
    } else if upper.contains("BLOB") || upper.contains("BINARY") {
        "blob"
    } else {
        "text"
    }
}

/// Lists every difference between the two schemas.
fn compare_schemas(sqlite: &Schema, mysql: &Schema) -> Vec<String> {
    let mut mismatches = Vec::new();
    for name in sqlite.keys().filter(|name| !mysql.contains_key(*name)) {
        mismatches.push(format!("table '{name}' only exists in SQLite"));
    }
    for name in mysql.keys().filter(|name| !sqlite.contains_key(*name)) {
        mismatches.push(format!("table '{name}' only exists in MySQL"));
    }

    for (name, left) in sqlite {
        let Some(right) = mysql.get(name) else {
            continue;
        };
        if left.columns != right.columns {
            mismatches.push(format!(
                "columns of '{name}' differ\n    SQLite: {:?}\n    MySQL: {:?}",
                left.columns, right.columns
            ));
        }
        if left.primary_key != right.primary_key {
            mismatches.push(format!(
                "primary key of '{name}' differs: {:?} vs {:?}",
                left.primary_key, right.primary_key
            ));
        }
        if left.foreign_keys != right.foreign_keys {
            mismatches.push(format!(
                "foreign keys of '{name}' differ: {:?} vs {:?}",
                left.foreign_keys, right.foreign_keys
            ));
        }
        if left.unique != right.unique {
            mismatches.push(format!(
                "unique constraints of '{name}' differ: {:?} vs {:?}",
                left.unique, right.unique
            ));
        }
    }
    mismatches
}

/// An extension trait for `duct::Expression` that logs the command being run
/// before running it.
trait ExpressionExt {
    /// Run the command and log the command being run
    fn run_with_trace(&self) -> io::Result<Output>;
}

impl ExpressionExt for duct::Expression {
    fn run_with_trace(&self) -> io::Result<Output> {
        tracing::info!("running command: {:?}", self);
        self.run().inspect_err(|_| {
            // The command that was run may have scrolled off the screen, so repeat it here
            tracing::error!("failed to run command: {:?}", self);
        })
    }
}
