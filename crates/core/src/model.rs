//! Function records handed over by the source extractor.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::CoreResult;
use crate::key::make_key;

/// Normalized description of one function occurrence, independent of the
/// source language it was extracted from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionRecord {
    pub name: String,
    pub file_path: String,
    /// 1-based line of the definition.
    pub start_line: u32,
    pub end_line: u32,
    pub body: String,
    /// Called names in source order; duplicates are kept.
    pub calls: Vec<String>,
    /// 64-char lowercase hex SHA-256 of `body`.
    pub content_hash: String,
}

impl FunctionRecord {
    /// Build a record, hashing `body` for the content digest.
    pub fn new(
        name: impl Into<String>,
        file_path: impl Into<String>,
        start_line: u32,
        end_line: u32,
        body: impl Into<String>,
        calls: Vec<String>,
    ) -> Self {
        let body = body.into();
        let content_hash = content_hash(&body);
        Self {
            name: name.into(),
            file_path: file_path.into(),
            start_line,
            end_line,
            body,
            calls,
            content_hash,
        }
    }

    /// Identifier of this record (`file_path::name`).
    pub fn key(&self) -> CoreResult<String> {
        make_key(&self.name, &self.file_path)
    }
}

/// SHA-256 hex digest of a function body.
pub fn content_hash(body: &str) -> String {
    format!("{:x}", Sha256::digest(body.as_bytes()))
}
