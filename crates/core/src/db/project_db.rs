use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;
use tracing::debug;

use crate::changes::Baseline;
use crate::contract::{AbstractionLevel, FunctionContract};
use crate::db::IndexRunRecord;

/// Minimum schema version we know how to handle.
///
/// `0` means "no schema yet" (fresh DB).
const MIN_SUPPORTED_SCHEMA_VERSION: i32 = 0;

/// Latest schema version this crate knows about.
pub const CURRENT_SCHEMA_VERSION: i32 = 3;

/// Error type for project database operations.
#[derive(Debug, Error)]
pub enum DbError {
    /// Underlying SQLite error.
    #[error("SQLite error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// A JSON column could not be encoded or decoded.
    #[error("JSON column error: {0}")]
    Json(#[from] serde_json::Error),

    /// A stored contract row does not describe a valid contract.
    #[error("Stored contract {key} is invalid: {message}")]
    InvalidContract { key: String, message: String },

    /// The database was created with a newer schema version than we support.
    #[error(
        "Unsupported schema version {found}; supported range is {min_supported}..={max_supported}"
    )]
    UnsupportedSchemaVersion { found: i32, min_supported: i32, max_supported: i32 },
}

/// Convenience result type for DB operations.
pub type DbResult<T> = Result<T, DbError>;

/// SQLite-backed project database.
///
/// This is a thin wrapper around `rusqlite::Connection` that is responsible for:
/// - Opening/creating the DB file.
/// - Applying schema migrations.
/// - Storing contracts, the change baseline, and index run history.
#[derive(Debug)]
pub struct ProjectDb {
    conn: Connection,
}

impl ProjectDb {
    /// Open (or create) a project database at the given path and ensure the schema exists.
    pub fn open(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        apply_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Expose a reference to the underlying connection for advanced callers.
    /// For most code, prefer higher-level helpers.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Insert or replace the contract for `(file_path, name)`.
    pub fn upsert_contract(&self, contract: &FunctionContract) -> DbResult<()> {
        let key = format!("{}::{}", contract.file_path, contract.name);
        self.conn.execute(
            r#"
            INSERT INTO contracts (
                function_key, name, file_path, line_number, preconditions, postconditions,
                input_prediction, output_prediction, expected_behavior, abstraction_level,
                code_hash, last_verified, metadata
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            ON CONFLICT(function_key) DO UPDATE SET
                line_number = excluded.line_number,
                preconditions = excluded.preconditions,
                postconditions = excluded.postconditions,
                input_prediction = excluded.input_prediction,
                output_prediction = excluded.output_prediction,
                expected_behavior = excluded.expected_behavior,
                abstraction_level = excluded.abstraction_level,
                code_hash = excluded.code_hash,
                last_verified = excluded.last_verified,
                metadata = excluded.metadata
            "#,
            params![
                key,
                contract.name,
                contract.file_path,
                contract.line_number as i64,
                serde_json::to_string(&contract.preconditions)?,
                serde_json::to_string(&contract.postconditions)?,
                contract.input_prediction,
                contract.output_prediction,
                contract.expected_behavior,
                contract.abstraction_level.as_str(),
                contract.code_hash,
                contract.last_verified,
                serde_json::to_string(&contract.metadata)?,
            ],
        )?;
        Ok(())
    }

    /// Fetch the contract for a function, if one exists.
    pub fn get_contract(&self, name: &str, file_path: &str) -> DbResult<Option<FunctionContract>> {
        let key = format!("{file_path}::{name}");
        let row = self
            .conn
            .query_row(
                &format!("SELECT {CONTRACT_COLUMNS} FROM contracts WHERE function_key = ?1"),
                params![key],
                map_contract_row,
            )
            .optional()?;
        row.map(ContractRow::into_contract).transpose()
    }

    /// List all contracts (ordered by file, then name).
    pub fn list_contracts(&self) -> DbResult<Vec<FunctionContract>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CONTRACT_COLUMNS} FROM contracts ORDER BY file_path, name"
        ))?;
        let rows = stmt.query_map([], map_contract_row)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?.into_contract()?);
        }
        Ok(out)
    }

    /// Delete a contract. Returns whether a row existed.
    pub fn delete_contract(&self, name: &str, file_path: &str) -> DbResult<bool> {
        let key = format!("{file_path}::{name}");
        let affected =
            self.conn.execute("DELETE FROM contracts WHERE function_key = ?1", params![key])?;
        Ok(affected > 0)
    }

    /// Replace the stored baseline wholesale.
    pub fn save_baseline(&self, baseline: &Baseline) -> DbResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM baseline_hashes", [])?;
        tx.execute("DELETE FROM baseline_locations", [])?;

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO baseline_hashes (function_key, content_hash)
                VALUES (?1, ?2)
                "#,
            )?;
            for (key, hash) in &baseline.hashes {
                stmt.execute(params![key, hash])?;
            }
        }

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO baseline_locations (name, file_path)
                VALUES (?1, ?2)
                "#,
            )?;
            for (name, file) in &baseline.locations {
                stmt.execute(params![name, file])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    /// Load the stored baseline (empty when none was recorded).
    pub fn load_baseline(&self) -> DbResult<Baseline> {
        let mut baseline = Baseline::default();

        {
            let mut stmt =
                self.conn.prepare("SELECT function_key, content_hash FROM baseline_hashes")?;
            let rows = stmt
                .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;
            for r in rows {
                let (key, hash) = r?;
                baseline.hashes.insert(key, hash);
            }
        }

        {
            let mut stmt = self.conn.prepare("SELECT name, file_path FROM baseline_locations")?;
            let rows = stmt
                .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;
            for r in rows {
                let (name, file) = r?;
                baseline.locations.insert(name, file);
            }
        }

        Ok(baseline)
    }

    /// Record an index run and return its row id.
    pub fn insert_index_run(&self, record: &IndexRunRecord) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO index_runs (source_dir, function_count, node_count, edge_count, indexed_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                record.source_dir,
                record.function_count as i64,
                record.node_count as i64,
                record.edge_count as i64,
                record.indexed_at
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// List index runs, oldest first.
    pub fn list_index_runs(&self) -> DbResult<Vec<IndexRunRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT source_dir, function_count, node_count, edge_count, indexed_at
            FROM index_runs
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(IndexRunRecord {
                source_dir: row.get(0)?,
                function_count: row.get(1)?,
                node_count: row.get(2)?,
                edge_count: row.get(3)?,
                indexed_at: row.get(4)?,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Most recent index run, if any.
    pub fn latest_index_run(&self) -> DbResult<Option<IndexRunRecord>> {
        Ok(self.list_index_runs()?.pop())
    }
}

const CONTRACT_COLUMNS: &str = "name, file_path, line_number, preconditions, postconditions, \
     input_prediction, output_prediction, expected_behavior, abstraction_level, code_hash, \
     last_verified, metadata";

/// Raw contract row; JSON columns are decoded outside the rusqlite closure so
/// their errors surface as `DbError::Json`.
struct ContractRow {
    name: String,
    file_path: String,
    line_number: i64,
    preconditions: String,
    postconditions: String,
    input_prediction: String,
    output_prediction: String,
    expected_behavior: String,
    abstraction_level: String,
    code_hash: String,
    last_verified: Option<String>,
    metadata: String,
}

fn map_contract_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ContractRow> {
    Ok(ContractRow {
        name: row.get(0)?,
        file_path: row.get(1)?,
        line_number: row.get(2)?,
        preconditions: row.get(3)?,
        postconditions: row.get(4)?,
        input_prediction: row.get(5)?,
        output_prediction: row.get(6)?,
        expected_behavior: row.get(7)?,
        abstraction_level: row.get(8)?,
        code_hash: row.get(9)?,
        last_verified: row.get(10)?,
        metadata: row.get(11)?,
    })
}

impl ContractRow {
    fn into_contract(self) -> DbResult<FunctionContract> {
        let key = format!("{}::{}", self.file_path, self.name);
        let invalid = |message: String| DbError::InvalidContract { key: key.clone(), message };

        let line_number = u32::try_from(self.line_number)
            .map_err(|_| invalid(format!("line number {} is out of range", self.line_number)))?;
        let abstraction_level = self
            .abstraction_level
            .parse::<AbstractionLevel>()
            .map_err(|err| invalid(err.to_string()))?;
        let contract = FunctionContract {
            name: self.name,
            file_path: self.file_path,
            line_number,
            preconditions: serde_json::from_str(&self.preconditions)?,
            postconditions: serde_json::from_str(&self.postconditions)?,
            input_prediction: self.input_prediction,
            output_prediction: self.output_prediction,
            expected_behavior: self.expected_behavior,
            abstraction_level,
            code_hash: self.code_hash,
            last_verified: self.last_verified,
            metadata: serde_json::from_str(&self.metadata)?,
        };
        contract.validate().map_err(|err| invalid(err.to_string()))?;
        Ok(contract)
    }
}

/// Apply schema migrations to bring the database to the latest version.
///
/// We use `PRAGMA user_version` as the schema version indicator.
///
/// Version map:
/// - 0: no schema
/// - 1: contracts table
/// - 2: baseline tables (hashes per identifier, locations per name)
/// - 3: index_runs table
fn apply_migrations(conn: &Connection) -> DbResult<()> {
    let mut current_version = current_schema_version(conn)?;

    // Reject DBs created with a newer schema than we support.
    if current_version > CURRENT_SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            found: current_version,
            min_supported: MIN_SUPPORTED_SCHEMA_VERSION,
            max_supported: CURRENT_SCHEMA_VERSION,
        });
    }

    if current_version == 0 {
        debug!("creating contracts schema");
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS contracts (
                function_key      TEXT PRIMARY KEY,
                name              TEXT NOT NULL,
                file_path         TEXT NOT NULL,
                line_number       INTEGER NOT NULL,
                preconditions     TEXT NOT NULL DEFAULT '[]',
                postconditions    TEXT NOT NULL DEFAULT '[]',
                input_prediction  TEXT NOT NULL DEFAULT '',
                output_prediction TEXT NOT NULL DEFAULT '',
                expected_behavior TEXT NOT NULL DEFAULT '',
                abstraction_level TEXT NOT NULL DEFAULT 'medium',
                code_hash         TEXT NOT NULL DEFAULT '',
                last_verified     TEXT,
                metadata          TEXT NOT NULL DEFAULT '{}'
            );

            PRAGMA user_version = 1;
            COMMIT;
            "#,
        )?;
        current_version = 1;
    }

    if current_version < 2 {
        debug!("migrating schema to v2 (baseline)");
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS baseline_hashes (
                function_key TEXT PRIMARY KEY,
                content_hash TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS baseline_locations (
                name      TEXT PRIMARY KEY,
                file_path TEXT NOT NULL
            );

            PRAGMA user_version = 2;
            COMMIT;
            "#,
        )?;
        current_version = 2;
    }

    if current_version < 3 {
        debug!("migrating schema to v3 (index runs)");
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS index_runs (
                id             INTEGER PRIMARY KEY AUTOINCREMENT,
                source_dir     TEXT NOT NULL,
                function_count INTEGER NOT NULL,
                node_count     INTEGER NOT NULL,
                edge_count     INTEGER NOT NULL,
                indexed_at     TEXT NOT NULL
            );

            PRAGMA user_version = 3;
            COMMIT;
            "#,
        )?;
    }

    Ok(())
}

/// Read the SQLite schema version from `PRAGMA user_version`.
fn current_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    Ok(version)
}
