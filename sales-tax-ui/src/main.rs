use std::io;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use sales_tax_core::db::DbConfig;
use sales_tax_ui::console::Console;
use sales_tax_ui::{app, logging, web};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Sales tax calculator and product catalog.
///
/// Opens the configured catalog and either starts the interactive console
/// (the default) or serves the JSON API.
#[derive(Debug, Parser)]
struct Cli {
    /// Database backend to use.
    #[arg(long, env = "SALES_TAX_BACKEND", default_value = "sqlite")]
    backend: String,

    /// Database connection string.
    /// For SQLite this is a file path (e.g. `sales_tax.db`) or `:memory:`.
    #[arg(long, env = "SALES_TAX_DB", default_value = "sales_tax.db")]
    db: String,

    /// Load the sample catalog if the store has no categories yet.
    #[arg(long)]
    seed: bool,

    /// Also write log lines to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `sales_tax_db_sqlite=trace`.
    #[arg(long)]
    log_level: Option<String>,

    /// Print log lines to the terminal while the console runs.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive menu (default).
    Console,

    /// Serve the catalog and calculator over HTTP.
    Serve {
        #[arg(long, env = "SALES_TAX_HOST", default_value = "127.0.0.1")]
        host: IpAddr,

        #[arg(long, env = "SALES_TAX_PORT", default_value_t = 8080)]
        port: u16,
    },
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_default_logging();

    let cli = Cli::parse();

    if let Some(path) = &cli.log_file {
        logging::enable_file_logging(path)?;
    }
    if let Some(level) = &cli.log_level {
        logging::set_log_level(level)?;
    }

    let db_config = DbConfig {
        backend: cli.backend,
        connection_string: cli.db,
    };

    debug!("connecting to {} backend", db_config.backend);
    let repo = app::open_catalog(&db_config).await?;

    if cli.seed {
        if let Some(summary) = app::seed_if_empty(&*repo).await? {
            info!(
                categories = summary.categories,
                products = summary.products,
                additional_taxes = summary.additional_taxes,
                "sample data loaded"
            );
        }
    }

    match cli.command.unwrap_or(Command::Console) {
        Command::Console => {
            logging::set_terminal_enabled(cli.verbose)?;
            let stdin = io::stdin();
            let mut console = Console::new(&*repo, stdin.lock(), io::stdout());
            console.run().await.context("console session failed")?;
        }
        Command::Serve { host, port } => {
            web::serve(repo, SocketAddr::new(host, port)).await?;
        }
    }

    Ok(())
}
