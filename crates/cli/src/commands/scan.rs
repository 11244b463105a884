//! Batch scan command.
//!
//! Reads a project file listing the contract addresses to scan (with
//! the required implementation names for proxies), pulls API keys and
//! the RPC endpoint from the environment, runs the batch through the
//! engine and writes the JSON report plus an optional Markdown
//! rendering.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Deserialize;

use permiscan_engine::{
    BlockTag, ContractScanner, EtherscanClient, JsonModelAdapter, JsonRpcStorageReader,
    ScanConfig, ScanningEngine,
};

use crate::commands::render::render_markdown;

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Project file listing the contracts to scan
    #[arg(short, long)]
    pub project: PathBuf,

    /// Directory holding extracted contract models
    /// (`<models>/<chain>/<address>.json`)
    #[arg(short, long, default_value = "models")]
    pub models: PathBuf,

    /// Block to read storage at ("latest" or a number; historical
    /// blocks need an archive RPC node)
    #[arg(long, default_value = "latest")]
    pub block: String,

    /// Output directory for the report files
    #[arg(short, long, default_value = "results")]
    pub output: PathBuf,

    /// Also write a Markdown rendering next to the JSON report
    #[arg(long)]
    pub markdown: bool,

    /// Maximum number of contracts scanned concurrently
    #[arg(long, default_value_t = 4)]
    pub concurrency: usize,
}

/// Project file format, e.g.:
///
/// ```json
/// {
///   "Project_Name": "liquity",
///   "Chain_Name": "mainnet",
///   "Chain_Id": 1,
///   "Contracts": [
///     {"address": "0x...", "implementation_name": "TroveManager"}
///   ]
/// }
/// ```
#[derive(Debug, Deserialize)]
struct ProjectFile {
    #[serde(rename = "Project_Name")]
    project_name: String,
    #[serde(rename = "Chain_Name")]
    chain_name: String,
    #[serde(rename = "Chain_Id")]
    chain_id: u64,
    /// Base-contract names recognized as delegate-call proxies,
    /// replacing the built-in set when present.
    #[serde(rename = "Proxy_Markers", default)]
    proxy_markers: Option<Vec<String>>,
    #[serde(rename = "Contracts")]
    contracts: Vec<ProjectContract>,
}

#[derive(Debug, Deserialize)]
struct ProjectContract {
    address: String,
    #[serde(default)]
    implementation_name: Option<String>,
}

pub async fn execute(args: ScanArgs) -> Result<()> {
    let raw = std::fs::read_to_string(&args.project)
        .with_context(|| format!("failed to read project file {:?}", args.project))?;
    let project: ProjectFile =
        serde_json::from_str(&raw).context("malformed project file")?;

    if project.contracts.is_empty() {
        bail!("project file lists no contracts");
    }

    let block: BlockTag = args
        .block
        .parse()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .context("invalid --block")?;

    let api_key =
        std::env::var("ETHERSCAN_API_KEY").context("ETHERSCAN_API_KEY is not set")?;
    let rpc_url = std::env::var("RPC_URL").context("RPC_URL is not set")?;

    let explorer = EtherscanClient::new(api_key, project.chain_id)?;
    let reader = JsonRpcStorageReader::new(rpc_url)?;
    let adapter = JsonModelAdapter::new(&args.models);

    let mut scanner = ContractScanner::new(
        Arc::new(adapter),
        Arc::new(explorer),
        Arc::new(reader),
        project.chain_name.clone(),
    );
    if let Some(markers) = project.proxy_markers.clone() {
        scanner = scanner.with_proxy_markers(markers);
    }
    let engine = ScanningEngine::new(scanner).with_concurrency(args.concurrency);

    println!(
        "{} {} contracts on {} (project {})",
        "Scanning".bright_blue(),
        project.contracts.len(),
        project.chain_name,
        project.project_name
    );

    let configs: Vec<ScanConfig> = project
        .contracts
        .iter()
        .map(|c| {
            let mut config = ScanConfig::new(&c.address).at_block(block.clone());
            if let Some(name) = &c.implementation_name {
                config = config.with_implementation_name(name);
            }
            config
        })
        .collect();

    let requested = configs.len();
    let report = engine.scan_batch(configs).await;

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("failed to create output directory {:?}", args.output))?;

    let json_path = args
        .output
        .join(format!("{}-permissions.json", project.project_name));
    std::fs::write(&json_path, report.to_json()?)
        .with_context(|| format!("failed to write {json_path:?}"))?;

    if args.markdown {
        let md_path = args
            .output
            .join(format!("{}-permissions.md", project.project_name));
        std::fs::write(&md_path, render_markdown(&project.project_name, &report))
            .with_context(|| format!("failed to write {md_path:?}"))?;
        println!("Markdown report: {}", md_path.display());
    }

    let failed = requested - report.len();
    if failed > 0 {
        println!(
            "{} {failed} of {requested} contracts failed; see the log above",
            "Warning:".yellow()
        );
    }
    println!(
        "{} {} contracts written to {}",
        "Done:".green(),
        report.len(),
        json_path.display()
    );

    Ok(())
}
