//! Project database integration and project layout definitions.
//!
//! This module provides:
//! - `ProjectConfig` / `IndexConfig`: serializable project metadata.
//! - `ProjectLayout`: computed paths for project directories/files.
//! - `ProjectDb`: a small SQLite wrapper holding contracts, the change
//!   baseline and index run history.
//! - `graph_store`: JSON persistence of the call graph.
//! - `ProjectContext`: an opened project, as every command after
//!   `init-project` sees it.

pub mod config;
pub mod context;
pub mod graph_store;
pub mod layout;
pub mod models;
pub mod project_db;

pub use config::{DbConfig, IndexConfig, ProjectConfig};
pub use context::{read_project_config, ProjectContext};
pub use graph_store::{load_call_graph, save_call_graph};
pub use layout::ProjectLayout;
pub use models::{IndexRunRecord, ProjectSnapshot};
pub use project_db::{DbError, DbResult, ProjectDb, CURRENT_SCHEMA_VERSION};
