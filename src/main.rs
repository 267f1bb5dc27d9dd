//! Margin Lender - Main Entry Point
//!
//! Loads the account list, reports wallet balances, and refreshes lend offers
//! when asked to.

use anyhow::Result;
use clap::{Parser, Subcommand};
use margin_lender::config::Config;
use margin_lender::exchange::BitfinexClient;
use margin_lender::runner;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

/// Margin Lender CLI
#[derive(Parser)]
#[command(name = "margin-lender")]
#[command(version, about = "Automated margin lending on Bitfinex")]
struct Cli {
    /// Configuration file (extension resolved by the config loader)
    #[arg(short, long, default_value = "config")]
    config: String,

    /// Also write the log to rolling files under logs/
    #[arg(long)]
    log_to_file: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh lend offers for every configured account
    Update {
        /// Log strategy decisions without placing or cancelling anything
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.log_to_file)?;

    info!("margin-lender v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load(&cli.config)?;
    config.validate()?;
    for warning in config.warnings() {
        warn!("{warning}");
    }

    let update = match cli.command {
        Some(Commands::Update { dry_run }) => Some(dry_run),
        None => None,
    };

    for account in &config.accounts {
        info!("using Bitfinex user API key: {}", account.bitfinex.api_key);
        let client = BitfinexClient::new(&account.bitfinex)?;

        report_deposit_balance(&client, &account.bitfinex.active_wallet).await?;

        if let Some(dry_run) = update {
            if dry_run {
                info!("dry run: decisions will be logged, nothing executed");
            }
            runner::run_account(&client, account, dry_run).await?;
        }
    }

    Ok(())
}

/// Log the deposit wallet totals the way operators expect to see them.
async fn report_deposit_balance(client: &BitfinexClient, active_wallet: &str) -> Result<()> {
    let wallet = active_wallet.to_lowercase();
    let balances = client.balances().await?;

    let deposit = balances
        .iter()
        .find(|b| b.wallet_type == "deposit" && b.currency.to_lowercase() == wallet);

    match deposit {
        Some(balance) => info!(
            "deposit wallet: {} {wallet} (available: {} {wallet})",
            balance.amount, balance.available
        ),
        None => info!("deposit wallet: no {wallet} balance"),
    }

    Ok(())
}

fn init_logging(log_to_file: bool) -> Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive("margin_lender=debug".parse()?)
        .add_directive(Level::INFO.into());

    if log_to_file {
        use tracing_subscriber::fmt::writer::MakeWriterExt;

        std::fs::create_dir_all("logs")?;
        let file_appender = tracing_appender::rolling::daily("logs", "margin-lender.log");
        let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

        // Keep the guard alive for the program duration
        Box::leak(Box::new(guard));

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stdout.and(file_writer))
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }

    Ok(())
}
