//! Per-function behavioral contracts.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::key::make_key;

/// Hand-assigned abstraction level of a function.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbstractionLevel {
    EntryPoint,
    High,
    #[default]
    Medium,
    Low,
    System,
}

impl AbstractionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AbstractionLevel::EntryPoint => "entry_point",
            AbstractionLevel::High => "high",
            AbstractionLevel::Medium => "medium",
            AbstractionLevel::Low => "low",
            AbstractionLevel::System => "system",
        }
    }
}

impl fmt::Display for AbstractionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AbstractionLevel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "entry_point" => Ok(AbstractionLevel::EntryPoint),
            "high" => Ok(AbstractionLevel::High),
            "medium" => Ok(AbstractionLevel::Medium),
            "low" => Ok(AbstractionLevel::Low),
            "system" => Ok(AbstractionLevel::System),
            other => Err(CoreError::InvalidInput(format!(
                "invalid abstraction level '{other}'. \
                 Allowed: entry_point, high, medium, low, system"
            ))),
        }
    }
}

/// What a function promises: conditions, predicted inputs/outputs, and the
/// hash of the body the contract was last checked against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionContract {
    pub name: String,
    pub file_path: String,
    pub line_number: u32,
    #[serde(default)]
    pub preconditions: Vec<String>,
    #[serde(default)]
    pub postconditions: Vec<String>,
    #[serde(default)]
    pub input_prediction: String,
    #[serde(default)]
    pub output_prediction: String,
    #[serde(default)]
    pub expected_behavior: String,
    #[serde(default)]
    pub abstraction_level: AbstractionLevel,
    #[serde(default)]
    pub code_hash: String,
    /// RFC 3339 timestamp of the last review.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_verified: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl FunctionContract {
    pub fn new(
        name: impl Into<String>,
        file_path: impl Into<String>,
        line_number: u32,
    ) -> CoreResult<Self> {
        let contract = Self {
            name: name.into(),
            file_path: file_path.into(),
            line_number,
            preconditions: Vec::new(),
            postconditions: Vec::new(),
            input_prediction: String::new(),
            output_prediction: String::new(),
            expected_behavior: String::new(),
            abstraction_level: AbstractionLevel::default(),
            code_hash: String::new(),
            last_verified: None,
            metadata: BTreeMap::new(),
        };
        contract.validate()?;
        Ok(contract)
    }

    pub fn with_conditions(mut self, pre: Vec<String>, post: Vec<String>) -> Self {
        self.preconditions = pre;
        self.postconditions = post;
        self
    }

    /// Check the identity fields; used after deserializing untrusted input.
    pub fn validate(&self) -> CoreResult<()> {
        if self.line_number == 0 {
            return Err(CoreError::InvalidInput(format!(
                "contract for '{}' must have a positive line number",
                self.name
            )));
        }
        make_key(&self.name, &self.file_path).map(|_| ())
    }

    /// Identifier of the function this contract describes.
    pub fn key(&self) -> CoreResult<String> {
        make_key(&self.name, &self.file_path)
    }

    /// Has at least one condition or one non-empty input/output prediction.
    /// Predictions are taken as written; whitespace counts.
    pub fn is_complete(&self) -> bool {
        let has_conditions = !self.preconditions.is_empty() || !self.postconditions.is_empty();
        let has_predictions =
            !self.input_prediction.is_empty() || !self.output_prediction.is_empty();
        has_conditions || has_predictions
    }

    /// A recorded hash that no longer matches the current body.
    pub fn is_stale(&self, current_hash: &str) -> bool {
        !self.code_hash.is_empty() && self.code_hash != current_hash
    }
}
