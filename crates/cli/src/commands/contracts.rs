use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use abstraction_core::contract::{AbstractionLevel, FunctionContract};
use abstraction_core::db::ProjectContext;
use abstraction_core::key::make_key;
use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;

use crate::canonicalize_or_current;
use crate::commands::now_rfc3339;

/// Contract fields loaded from a YAML or JSON spec file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContractSpec {
    pub name: Option<String>,
    #[serde(alias = "file_path")]
    pub file: Option<String>,
    #[serde(alias = "line_number")]
    pub line: Option<u32>,
    pub preconditions: Vec<String>,
    pub postconditions: Vec<String>,
    #[serde(alias = "input_prediction")]
    pub input: Option<String>,
    #[serde(alias = "output_prediction")]
    pub output: Option<String>,
    #[serde(alias = "expected_behavior")]
    pub behavior: Option<String>,
    #[serde(alias = "abstraction_level")]
    pub level: Option<String>,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl ContractSpec {
    /// Parse a spec file; `.json` is read as JSON, anything else as YAML.
    pub fn from_path(path: &Path) -> Result<Self> {
        let body = fs::read_to_string(path)
            .with_context(|| format!("Failed to read contract spec {}", path.display()))?;
        let is_json = path.extension().and_then(|e| e.to_str()).is_some_and(|e| e == "json");
        if is_json {
            serde_json::from_str(&body)
                .with_context(|| format!("Failed to parse contract spec JSON {}", path.display()))
        } else {
            serde_yaml::from_str(&body)
                .with_context(|| format!("Failed to parse contract spec YAML {}", path.display()))
        }
    }
}

/// Command-line inputs of `add-contract`; flags win over spec file values.
#[derive(Debug, Clone, Default)]
pub struct AddContractArgs {
    pub name: Option<String>,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub pre: Vec<String>,
    pub post: Vec<String>,
    pub input: Option<String>,
    pub output: Option<String>,
    pub behavior: Option<String>,
    pub level: Option<String>,
    pub from_spec: Option<String>,
}

/// Create or update a function contract.
pub fn add_contract_command(root: &str, args: AddContractArgs) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let ctx = ProjectContext::from_root(&root_path)?;

    let spec = match &args.from_spec {
        Some(path) => ContractSpec::from_path(Path::new(path))?,
        None => ContractSpec::default(),
    };

    let name = args
        .name
        .or(spec.name)
        .ok_or_else(|| anyhow!("A function name is required (--name or `name` in the spec)"))?;
    let file = args
        .file
        .or(spec.file)
        .ok_or_else(|| anyhow!("A file path is required (--file or `file` in the spec)"))?;
    let key = make_key(&name, &file)?;

    let existing = ctx.db.get_contract(&name, &file).context("Failed to look up contract")?;
    let is_update = existing.is_some();
    let graph_line =
        ctx.call_graph()?.and_then(|g| g.node(&key).map(|n| n.line_number));
    let line = args
        .line
        .or(spec.line)
        .or(graph_line)
        .or(existing.as_ref().map(|c| c.line_number))
        .unwrap_or(1);

    let mut contract = match existing {
        Some(contract) => contract,
        None => FunctionContract::new(&name, &file, line)?,
    };
    contract.line_number = line;

    if !args.pre.is_empty() {
        contract.preconditions = args.pre;
    } else if !spec.preconditions.is_empty() {
        contract.preconditions = spec.preconditions;
    }
    if !args.post.is_empty() {
        contract.postconditions = args.post;
    } else if !spec.postconditions.is_empty() {
        contract.postconditions = spec.postconditions;
    }
    if let Some(input) = args.input.or(spec.input) {
        contract.input_prediction = input;
    }
    if let Some(output) = args.output.or(spec.output) {
        contract.output_prediction = output;
    }
    if let Some(behavior) = args.behavior.or(spec.behavior) {
        contract.expected_behavior = behavior;
    }
    if let Some(level) = args.level.or(spec.level) {
        contract.abstraction_level = level.parse::<AbstractionLevel>()?;
    }
    contract.metadata.extend(spec.metadata);

    if let Some(hash) = ctx.change_detector()?.baseline().hashes.get(&key) {
        contract.code_hash = hash.clone();
    }
    contract.last_verified = Some(now_rfc3339());
    contract.validate()?;

    ctx.db.upsert_contract(&contract).context("Failed to save contract")?;

    println!("{} contract for {}:", if is_update { "Updated" } else { "Created" }, key);
    println!("  Line: {}", contract.line_number);
    println!("  Level: {}", contract.abstraction_level);
    println!("  Preconditions: {}", contract.preconditions.len());
    println!("  Postconditions: {}", contract.postconditions.len());
    if contract.code_hash.is_empty() {
        println!("  Code hash: (not indexed)");
    } else {
        println!("  Code hash: {}", contract.code_hash);
    }
    if !contract.is_complete() {
        println!("  Note: contract has no conditions or predictions yet.");
    }

    Ok(())
}

/// Print one contract.
pub fn show_contract_command(root: &str, name: &str, file: &str, json: bool) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let ctx = ProjectContext::from_root(&root_path)?;

    let Some(contract) = ctx.db.get_contract(name, file).context("Failed to load contract")? else {
        bail!("No contract found for {name} in {file}");
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&contract)?);
        return Ok(());
    }

    println!("Contract: {}", contract.name);
    println!("  Location: {}:{}", contract.file_path, contract.line_number);
    println!("  Level: {}", contract.abstraction_level);
    print_list("Preconditions", &contract.preconditions);
    print_list("Postconditions", &contract.postconditions);
    print_text("Input", &contract.input_prediction);
    print_text("Output", &contract.output_prediction);
    print_text("Behavior", &contract.expected_behavior);
    if !contract.code_hash.is_empty() {
        println!("  Code hash: {}", contract.code_hash);
    }
    if let Some(verified) = &contract.last_verified {
        println!("  Last verified: {}", verified);
    }
    for (key, value) in &contract.metadata {
        println!("  {}: {}", key, value);
    }

    Ok(())
}

/// List all contracts in the project.
pub fn list_contracts_command(root: &str, json: bool) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let ctx = ProjectContext::from_root(&root_path)?;
    let contracts = ctx.db.list_contracts().context("Failed to list contracts")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&contracts)?);
        return Ok(());
    }

    if contracts.is_empty() {
        println!("No contracts recorded.");
        return Ok(());
    }

    println!("Contracts ({}):", contracts.len());
    for contract in &contracts {
        let status = if contract.is_complete() { "complete" } else { "incomplete" };
        println!(
            "- {}::{} (line {}) [{}] {}",
            contract.file_path,
            contract.name,
            contract.line_number,
            contract.abstraction_level,
            status
        );
    }

    Ok(())
}

/// Delete a contract.
pub fn remove_contract_command(root: &str, name: &str, file: &str) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let ctx = ProjectContext::from_root(&root_path)?;

    if !ctx.db.delete_contract(name, file).context("Failed to delete contract")? {
        bail!("No contract found for {name} in {file}");
    }
    println!("Removed contract for {file}::{name}");
    Ok(())
}

fn print_list(label: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!("  {label}:");
    for item in items {
        println!("    - {item}");
    }
}

fn print_text(label: &str, text: &str) {
    if !text.trim().is_empty() {
        println!("  {label}: {text}");
    }
}
