//! Markdown rendering of a scan report.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use permiscan_engine::{ContractOutcome, ContractPermissions, ScanReport};

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// A JSON report produced by `permiscan scan`
    #[arg(short, long)]
    pub input: PathBuf,

    /// Where to write the Markdown (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn execute(args: RenderArgs) -> Result<()> {
    let raw = std::fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read report {:?}", args.input))?;
    let report: ScanReport = serde_json::from_str(&raw).context("malformed report")?;

    let project = args
        .input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("report")
        .trim_end_matches("-permissions")
        .to_string();

    let markdown = render_markdown(&project, &report);
    match args.output {
        Some(path) => std::fs::write(&path, markdown)
            .with_context(|| format!("failed to write {path:?}"))?,
        None => print!("{markdown}"),
    }
    Ok(())
}

pub fn render_markdown(project_name: &str, report: &ScanReport) -> String {
    let mut md = String::from("# Permission Scanner Report\n\n");
    md.push_str(&format!("Project: {project_name}\n\n"));

    md.push_str("## Contracts\n\n");
    md.push_str("| Contract Name | Address | Type |\n");
    md.push_str("|---------------|---------|------|\n");
    for (name, outcome) in report.iter() {
        match (&outcome.proxy_address, &outcome.implementation_address) {
            (Some(proxy), Some(implementation)) => {
                let proxy_name = outcome
                    .proxy_permissions
                    .as_ref()
                    .map(|p| p.contract_name.as_str())
                    .unwrap_or(name.as_str());
                md.push_str(&format!("| {proxy_name} | {proxy} | Proxy |\n"));
                md.push_str(&format!("| {name} | {implementation} | Implementation |\n"));
            }
            _ => {
                let address = outcome.address.as_deref().unwrap_or("-");
                md.push_str(&format!("| {name} | {address} | Standalone |\n"));
            }
        }
    }

    md.push_str("\n## Permissions\n\n");
    md.push_str("| Contract | Function | Modifiers | Caller Conditions | Owner |\n");
    md.push_str("|----------|----------|-----------|-------------------|-------|\n");
    for (_, outcome) in report.iter() {
        if let Some(proxy_permissions) = &outcome.proxy_permissions {
            push_permission_rows(&mut md, proxy_permissions);
        }
        push_permission_rows(&mut md, &outcome.permissions);
    }

    let storage: Vec<(&String, &ContractOutcome)> = report
        .iter()
        .filter(|(_, o)| o.storage_values.is_some())
        .collect();
    if !storage.is_empty() {
        md.push_str("\n## Storage Values\n\n");
        md.push_str("| Contract | Variable | Value |\n");
        md.push_str("|----------|----------|-------|\n");
        for (name, outcome) in storage {
            if let Some(values) = &outcome.storage_values {
                for (variable, value) in values {
                    md.push_str(&format!("| {name} | {variable} | {value} |\n"));
                }
            }
        }
    }

    md
}

fn push_permission_rows(md: &mut String, permissions: &ContractPermissions) {
    for function in &permissions.functions {
        let modifiers = if function.modifiers.is_empty() {
            "-".to_string()
        } else {
            function.modifiers.join(", ")
        };
        let conditions = if function.msg_sender_conditions.is_empty() {
            "-".to_string()
        } else {
            function.msg_sender_conditions.join("; ")
        };
        // Owner column: the live `_owner` value when present, which is
        // usually the most interesting answer to "who can call this".
        let owner = function
            .storage_values
            .get("_owner")
            .cloned()
            .unwrap_or_else(|| "-".to_string());
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            permissions.contract_name, function.function, modifiers, conditions, owner
        ));
    }
}
