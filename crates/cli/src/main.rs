use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
use commands::{render::RenderArgs, scan::ScanArgs};

#[derive(Parser)]
#[command(name = "permiscan")]
#[command(about = "Permission and storage scanner for deployed smart contracts")]
#[command(version = permiscan_engine::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a project's contracts for permissioned functions
    Scan(ScanArgs),

    /// Render a saved scan report as Markdown
    Render(RenderArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Scan(args) => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(commands::scan::execute(args))
        }
        Commands::Render(args) => commands::render::execute(args),
    }
}
