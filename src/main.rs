//! Artic language server binary
//!
//! Speaks LSP over stdio. Logging goes to stderr; stdout belongs to the
//! protocol.

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "artic-ls")]
#[command(version = artic_ls::VERSION)]
#[command(about = "Language server for the Artic language", long_about = None)]
struct Cli {
    /// Communicate over stdio (the default; accepted for client compatibility)
    #[arg(long)]
    stdio: bool,
}

#[tokio::main]
async fn main() {
    let _cli = Cli::parse();

    artic_ls::crash::install();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    artic_ls::lsp::server::run_stdio().await;
}
