//! BRB CLI - Command-line interface for the BRB treasury
//!
//! State (treasury records and the ledger) lives in a JSON file, so a
//! sequence of commands behaves like one running treasury.
//!
//! # Quick Start
//!
//! ```bash
//! brb init --admin alice
//! brb faucet --to bob --amount 250
//! brb mint --user bob --amount 100
//! brb pause --admin alice
//! brb burn --user bob --amount 100
//! brb info
//! ```

use std::path::PathBuf;

use brb_core::{Amount, ProgramId};
use brb_treasury::TreasuryConfig;
use clap::{Parser, Subcommand};
use colored::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod display;

use commands::{ledger, treasury, Session};

/// BRB CLI - 1:1 USDC-backed issuance
#[derive(Parser)]
#[command(name = "brb")]
#[command(author = "BRB Contributors")]
#[command(version)]
#[command(about = "Deposit USDC, mint BRB; burn BRB, redeem USDC", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// State file
    #[arg(long, global = true, env = "BRB_STATE", default_value = "brb-state.json")]
    state: PathBuf,

    /// Deployment label; each label derives its own treasury
    #[arg(long, global = true, env = "BRB_DEPLOYMENT")]
    deployment: Option<String>,

    /// Hide the banner
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the treasury with an admin
    Init {
        /// Admin name (or hex address)
        #[arg(long)]
        admin: String,
    },

    /// Fund an identity with the reserve asset (local only)
    Faucet {
        #[arg(long)]
        to: String,

        /// Amount in whole units, e.g. 250 or 1.5
        #[arg(long, value_parser = parse_amount)]
        amount: Amount,
    },

    /// Deposit reserve and mint the same amount of BRB
    Mint {
        #[arg(long)]
        user: String,

        #[arg(long, value_parser = parse_amount)]
        amount: Amount,
    },

    /// Burn BRB and redeem the same amount of reserve
    Burn {
        #[arg(long)]
        user: String,

        #[arg(long, value_parser = parse_amount)]
        amount: Amount,
    },

    /// Halt minting (admin only)
    Pause {
        #[arg(long)]
        admin: String,
    },

    /// Resume minting (admin only)
    Unpause {
        #[arg(long)]
        admin: String,
    },

    /// Show the treasury record
    Info {
        /// Print the view as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a holder's balances
    Balance {
        #[arg(long)]
        user: String,
    },

    /// Show a holder's ledger entries, newest first
    History {
        #[arg(long)]
        user: String,

        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
}

fn parse_amount(s: &str) -> Result<Amount, String> {
    Amount::from_decimal_str(s).map_err(|e| e.to_string())
}

fn main() {
    // Load .env if present
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env("BRB_LOG")
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    if !cli.quiet {
        print_banner();
    }

    if let Err(e) = run(cli) {
        display::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.deployment {
        Some(label) => TreasuryConfig::for_deployment(label),
        None => TreasuryConfig::default(),
    };
    let session = Session::open(&cli.state, config)?;

    if let Some(label) = &cli.deployment {
        if session.treasury.config().program_id != ProgramId::from_label(label) {
            display::warning(&format!(
                "{} belongs to another deployment; using its program id",
                cli.state.display()
            ));
        }
    }

    match cli.command {
        Commands::Init { admin } => treasury::init(&session, &admin),
        Commands::Faucet { to, amount } => ledger::faucet(&session, &to, amount),
        Commands::Mint { user, amount } => treasury::mint(&session, &user, amount),
        Commands::Burn { user, amount } => treasury::burn(&session, &user, amount),
        Commands::Pause { admin } => treasury::set_paused(&session, &admin, true),
        Commands::Unpause { admin } => treasury::set_paused(&session, &admin, false),
        Commands::Info { json } => treasury::info(&session, json),
        Commands::Balance { user } => ledger::balance(&session, &user),
        Commands::History { user, limit } => ledger::history(&session, &user, limit),
    }
}

fn print_banner() {
    println!();
    println!("{}", "╔══════════════════════════════════════════════════════════╗".bright_cyan());
    println!(
        "{}{}{}",
        "║  ".bright_cyan(),
        "BRB Treasury".bright_white().bold(),
        " - 1:1 USDC-backed issuance                  ║".bright_cyan()
    );
    println!("{}", "╚══════════════════════════════════════════════════════════╝".bright_cyan());
}
