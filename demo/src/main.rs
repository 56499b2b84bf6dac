//! attest: decision audit log demo CLI
//!
//! Each subcommand builds a fresh in-memory log, feeds it synthetic policy
//! and routing decisions, and prints what the log recorded.
//!
//! Usage:
//!   cargo run -p demo -- run --count 12 --batch-size 4
//!   cargo run -p demo -- tamper --target 2
//!   cargo run -p demo -- query --effect block --limit 3
//!   cargo run -p demo -- prove --index 5
//!   cargo run -p demo -- --config attest.toml run

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use attest_audit::AuditConfig;
use attest_contracts::{
    decision::Effect,
    error::AttestResult,
    query::{QueryFilter, DEFAULT_QUERY_LIMIT},
};

mod scenarios;

// ── CLI definition ────────────────────────────────────────────────────────────

/// attest: tamper-evident audit log for policy and routing decisions.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "attest decision audit log demo",
    long_about = "Runs attest demo scenarios showing payload redaction, hash-chain\n\
                  linkage, Merkle checkpoints, tamper detection, and inclusion proofs."
)]
struct Cli {
    /// TOML configuration file (batch_size, salt or salt_env).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured batch size.
    #[arg(long, global = true)]
    batch_size: Option<usize>,

    /// Salt used when no configuration file is given.
    #[arg(long, global = true, default_value = "attest-demo-salt")]
    salt: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Append decisions and print checkpoints and the integrity report.
    Run {
        #[arg(long, default_value_t = 10)]
        count: usize,
    },
    /// Rewrite one stored entry and show that verification catches it.
    Tamper {
        #[arg(long, default_value_t = 6)]
        count: usize,
        /// Index of the entry to rewrite.
        #[arg(long, default_value_t = 2)]
        target: usize,
    },
    /// Print a page of sanitized entries.
    Query {
        #[arg(long, default_value_t = 20)]
        count: usize,
        #[arg(long)]
        org: Option<String>,
        #[arg(long)]
        rule: Option<String>,
        /// allow, block, route, require-override, or warn-route.
        #[arg(long)]
        effect: Option<Effect>,
        #[arg(long, default_value_t = DEFAULT_QUERY_LIMIT)]
        limit: usize,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
    /// Print and check a Merkle inclusion proof for one entry.
    Prove {
        #[arg(long, default_value_t = 8)]
        count: usize,
        #[arg(long, default_value_t = 0)]
        index: usize,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Initialize structured logging.  Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = load_config(&cli).and_then(|config| dispatch(&config, cli.command));

    if let Err(e) = result {
        eprintln!("Demo error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> AttestResult<AuditConfig> {
    let mut config = match &cli.config {
        Some(path) => AuditConfig::from_file(path)?,
        None => AuditConfig::new(cli.salt.clone()).with_batch_size(4),
    };
    if let Some(batch_size) = cli.batch_size {
        config = config.with_batch_size(batch_size);
    }
    config.validate()?;
    Ok(config)
}

// ── Scenario dispatch ─────────────────────────────────────────────────────────

fn dispatch(config: &AuditConfig, command: Command) -> AttestResult<()> {
    match command {
        Command::Run { count } => scenarios::run(config, count),
        Command::Tamper { count, target } => scenarios::tamper(config, count, target),
        Command::Query {
            count,
            org,
            rule,
            effect,
            limit,
            offset,
        } => {
            let filter = QueryFilter {
                org_id: org,
                rule_id: rule,
                effect,
                limit,
                offset,
                ..QueryFilter::default()
            };
            scenarios::query(config, count, &filter)
        }
        Command::Prove { count, index } => scenarios::prove(config, count, index),
    }
}
