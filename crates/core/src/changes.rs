//! Change detection between indexing runs.
//!
//! A [`ChangeDetector`] is an explicit, caller-owned value holding one
//! baseline snapshot. Nothing here is global; callers persist the baseline
//! through the project database and rebuild the detector from it.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::contract::FunctionContract;
use crate::error::{CoreError, CoreResult};
use crate::key::name_from_key;
use crate::model::FunctionRecord;

/// Content hashes per identifier plus the last-seen file per bare name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Baseline {
    pub hashes: BTreeMap<String, String>,
    pub locations: BTreeMap<String, String>,
}

impl Baseline {
    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

/// Functions that drifted from the baseline, reported by bare name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeReport {
    pub modified: Vec<String>,
    pub deleted: Vec<String>,
    pub new: Vec<String>,
    /// `modified` followed by `new`.
    pub affected: Vec<String>,
}

impl ChangeReport {
    pub fn is_empty(&self) -> bool {
        self.modified.is_empty() && self.deleted.is_empty() && self.new.is_empty()
    }

    /// Modified, new and deleted names, in that order.
    pub fn all_changed(&self) -> impl Iterator<Item = &str> {
        self.modified.iter().chain(self.new.iter()).chain(self.deleted.iter()).map(String::as_str)
    }

    /// Whether a function with this bare name changed in any way.
    pub fn mentions(&self, name: &str) -> bool {
        self.all_changed().any(|changed| changed == name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChangeDetector {
    baseline: Baseline,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume from a previously persisted baseline.
    pub fn from_baseline(baseline: Baseline) -> Self {
        Self { baseline }
    }

    pub fn baseline(&self) -> &Baseline {
        &self.baseline
    }

    /// An empty baseline counts as not established.
    pub fn is_established(&self) -> bool {
        !self.baseline.is_empty()
    }

    /// File in which a bare function name was last seen.
    pub fn location_of(&self, name: &str) -> Option<&str> {
        self.baseline.locations.get(name).map(String::as_str)
    }

    /// Replace the baseline wholesale with the given records.
    pub fn record_baseline(&mut self, records: &[FunctionRecord]) -> CoreResult<()> {
        let mut baseline = Baseline::default();
        for record in records {
            baseline.hashes.insert(record.key()?, record.content_hash.clone());
            baseline.locations.insert(record.name.clone(), record.file_path.clone());
        }
        info!(functions = baseline.len(), "recorded baseline");
        self.baseline = baseline;
        Ok(())
    }

    /// Classify the current records against the baseline.
    ///
    /// Records sharing an identifier are reconciled the way
    /// [`record_baseline`](Self::record_baseline) does it: the last one wins.
    pub fn detect_changes(&self, current: &[FunctionRecord]) -> CoreResult<ChangeReport> {
        self.ensure_established()?;

        let mut report = ChangeReport::default();
        let current_hashes = latest_by_key(current.iter())?;
        for (key, record) in &current_hashes {
            match self.baseline.hashes.get(key) {
                None => report.new.push(record.name.clone()),
                Some(hash) if *hash != record.content_hash => {
                    report.modified.push(record.name.clone())
                }
                Some(_) => {}
            }
        }
        let current_keys: HashSet<&str> =
            current_hashes.iter().map(|(key, _)| key.as_str()).collect();

        for key in self.baseline.hashes.keys() {
            if !current_keys.contains(key.as_str()) {
                report.deleted.push(name_from_key(key)?.to_string());
            }
        }

        report.affected = report.modified.iter().chain(report.new.iter()).cloned().collect();
        debug!(
            modified = report.modified.len(),
            new = report.new.len(),
            deleted = report.deleted.len(),
            "detected changes"
        );
        Ok(report)
    }

    /// Names of baseline functions in `file_path` whose hash changed.
    ///
    /// `records` are the current records of that file; functions absent from
    /// the baseline are not reported.
    pub fn check_file_changes(
        &self,
        file_path: &str,
        records: &[FunctionRecord],
    ) -> CoreResult<Vec<String>> {
        self.ensure_established()?;
        let mut changed = Vec::new();
        let latest = latest_by_key(records.iter().filter(|r| r.file_path == file_path))?;
        for (key, record) in &latest {
            if let Some(hash) = self.baseline.hashes.get(key) {
                if *hash != record.content_hash {
                    changed.push(record.name.clone());
                }
            }
        }
        Ok(changed)
    }

    /// Refresh the baseline entry of a single function.
    pub fn update_function(&mut self, record: &FunctionRecord) -> CoreResult<()> {
        let key = record.key()?;
        self.baseline.hashes.insert(key, record.content_hash.clone());
        self.baseline.locations.insert(record.name.clone(), record.file_path.clone());
        Ok(())
    }

    fn ensure_established(&self) -> CoreResult<()> {
        if self.is_established() {
            Ok(())
        } else {
            Err(CoreError::Precondition("no baseline has been recorded".into()))
        }
    }
}

/// One record per identifier in first-seen order, keeping the last record's
/// content for repeated identifiers.
fn latest_by_key<'a>(
    records: impl Iterator<Item = &'a FunctionRecord>,
) -> CoreResult<Vec<(String, &'a FunctionRecord)>> {
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut latest: Vec<(String, &FunctionRecord)> = Vec::new();
    for record in records {
        let key = record.key()?;
        match slots.get(&key) {
            Some(&slot) => latest[slot].1 = record,
            None => {
                slots.insert(key.clone(), latest.len());
                latest.push((key, record));
            }
        }
    }
    Ok(latest)
}

/// Whether a change report touches a contract's function.
///
/// Matching is by bare name, so a same-named function in another file also
/// flags the contract.
pub fn is_affected(report: &ChangeReport, contract: &FunctionContract) -> bool {
    report.mentions(&contract.name)
}
