use std::collections::HashMap;
use std::fs;

use abstraction_core::changes::{is_affected, ChangeReport};
use abstraction_core::db::{save_call_graph, ProjectContext};
use abstraction_core::graph::CallGraphBuilder;
use anyhow::{bail, Context, Result};
use serde::Serialize;

use crate::canonicalize_or_current;
use crate::commands::{collect_project_functions, now_rfc3339};

#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub source_dir: String,
    pub checked_at: String,
    pub functions: usize,
    #[serde(flatten)]
    pub changes: ChangeReport,
    /// Identifiers of contracts whose function name appears in the changes.
    pub affected_contracts: Vec<String>,
    /// Identifiers of contracts whose recorded code hash no longer matches.
    pub stale_contracts: Vec<String>,
    pub baseline_updated: bool,
}

/// Compare the source tree against the stored baseline.
pub fn check_command(
    root: &str,
    source: Option<String>,
    json: bool,
    update_baseline: bool,
    write_report: bool,
) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let ctx = ProjectContext::from_root(&root_path)?;

    let mut detector = ctx.change_detector()?;
    if !detector.is_established() {
        bail!("No baseline recorded for this project; run `index` first");
    }

    let source_dir = ctx.source_dir(source.as_deref());
    let records = collect_project_functions(&ctx, &source_dir)?;
    let changes = detector.detect_changes(&records)?;

    let current_hashes: HashMap<String, &str> = records
        .iter()
        .filter_map(|r| r.key().ok().map(|key| (key, r.content_hash.as_str())))
        .collect();
    let contracts = ctx.db.list_contracts().context("Failed to list contracts")?;
    let mut affected_contracts = Vec::new();
    let mut stale_contracts = Vec::new();
    for contract in &contracts {
        let key = contract.key()?;
        if is_affected(&changes, contract) {
            affected_contracts.push(key.clone());
        }
        if current_hashes.get(&key).is_some_and(|hash| contract.is_stale(hash)) {
            stale_contracts.push(key);
        }
    }

    if update_baseline {
        let graph = CallGraphBuilder::with_policy(ctx.config.index.resolution)
            .build(&records)
            .context("Failed to rebuild call graph")?;
        save_call_graph(&ctx.layout, &graph)?;
        detector.record_baseline(&records)?;
        ctx.db.save_baseline(detector.baseline()).context("Failed to persist baseline")?;
    }

    let report = CheckReport {
        source_dir: source_dir.display().to_string(),
        checked_at: now_rfc3339(),
        functions: records.len(),
        changes,
        affected_contracts,
        stale_contracts,
        baseline_updated: update_baseline,
    };

    let report_path = if write_report {
        fs::create_dir_all(&ctx.layout.reports_dir).with_context(|| {
            format!("Failed to create reports dir: {}", ctx.layout.reports_dir.display())
        })?;
        let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%SZ");
        let path = ctx.layout.reports_dir.join(format!("change_report_{stamp}.json"));
        fs::write(&path, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("Failed to write change report to {}", path.display()))?;
        Some(path)
    } else {
        None
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Checked {} functions in {}", report.functions, report.source_dir);
    if report.changes.is_empty() {
        println!("No changes since the baseline.");
    } else {
        print_names("Modified", &report.changes.modified);
        print_names("New", &report.changes.new);
        print_names("Deleted", &report.changes.deleted);
    }
    print_names("Affected contracts", &report.affected_contracts);
    print_names("Stale contracts", &report.stale_contracts);
    if report.baseline_updated {
        println!("Baseline updated.");
    }
    if let Some(path) = report_path {
        println!("Report written to {}", path.display());
    }

    Ok(())
}

fn print_names(label: &str, names: &[String]) {
    if names.is_empty() {
        return;
    }
    println!("{label} ({}):", names.len());
    for name in names {
        println!("  - {name}");
    }
}
