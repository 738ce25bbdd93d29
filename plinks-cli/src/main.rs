//! plinks
//!
//! Operator tool for private payment links: mints secrets, builds and decodes
//! link URLs, estimates withdrawal fees and manages the persisted session.
//! Nothing here talks to the pool; flows run inside the app that embeds
//! `plinks-core` together with a pool SDK binding.

mod config;

use std::{fmt, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use plinks_core::{
    build_claim_url, format_sol, parse_payment_link, parse_sol_amount, secret_from_claim_url,
    FeeSchedule, JsonFileStorage, LinkSecret, PaymentLinkPayload, Session,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::CliConfig;

#[derive(Parser)]
#[command(name = "plinks", about = "Private payment link utilities")]
struct Cli {
    /// Origin that generated links point at (overrides PLINKS_ORIGIN).
    #[arg(long, global = true)]
    origin: Option<String>,
    /// Session state file (overrides PLINKS_STATE_PATH).
    #[arg(long, global = true)]
    state_path: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a fresh link secret and its claim URL.
    NewSecret(OutputArgs),
    /// Build a payment request link.
    CreateLink(CreateLinkArgs),
    /// Decode a payment request link and print it as JSON.
    ParseLink { url: String },
    /// Build the claim URL for a secret.
    ClaimUrl {
        #[arg(long)]
        secret: String,
    },
    /// Validate a secret or claim URL without revealing it.
    InspectSecret {
        /// Base58 secret or claim URL
        input: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Estimate the withdrawal fee for a balance.
    EstimateFee(EstimateFeeArgs),
    /// Manage the persisted wallet session.
    #[command(subcommand)]
    Session(SessionCommand),
}

#[derive(Subcommand)]
enum SessionCommand {
    /// Connect a wallet address.
    Connect { address: String },
    /// Disconnect the wallet; the activity log is kept.
    Disconnect,
    /// Print the session.
    Show(OutputArgs),
}

#[derive(Args)]
struct OutputArgs {
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct CreateLinkArgs {
    /// Requested amount in SOL.
    #[arg(long)]
    amount: String,
    /// Scan offset hint for the payer.
    #[arg(long)]
    offset: Option<u64>,
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args)]
struct EstimateFeeArgs {
    /// Balance in SOL.
    #[arg(long)]
    balance: String,
    /// Minimum fee override in lamports.
    #[arg(long)]
    min_fee_lamports: Option<u64>,
    /// Fee rate override.
    #[arg(long)]
    fee_rate: Option<f64>,
    #[command(flatten)]
    output: OutputArgs,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "plinks=info,plinks_core=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let mut config = CliConfig::from_env()?;
    if let Some(origin) = cli.origin {
        config.origin = origin;
    }
    if let Some(state_path) = cli.state_path {
        config.state_path = state_path;
    }
    debug!(origin = %config.origin, state = %config.state_path.display(), "loaded config");

    match cli.command {
        Commands::NewSecret(output) => new_secret(&config, output),
        Commands::CreateLink(args) => create_link(&config, args),
        Commands::ParseLink { url } => parse_link(&url),
        Commands::ClaimUrl { secret } => claim_url(&config, &secret),
        Commands::InspectSecret { input, output } => inspect_secret(&input, output),
        Commands::EstimateFee(args) => estimate_fee(&config, args),
        Commands::Session(command) => session(&config, command),
    }
}

fn new_secret(config: &CliConfig, output: OutputArgs) -> Result<()> {
    let secret = LinkSecret::generate();
    info!(fingerprint = %secret.fingerprint(), "generated secret");
    let summary = SecretSummary {
        secret: Some(secret.to_base58()),
        fingerprint: secret.fingerprint(),
        claim_url: Some(build_claim_url(&config.origin, &secret)),
    };
    output_summary(&summary, output.json)
}

fn create_link(config: &CliConfig, args: CreateLinkArgs) -> Result<()> {
    let lamports = parse_sol_amount(&args.amount)
        .with_context(|| format!("cannot request {} SOL", args.amount))?;

    let mut payload = PaymentLinkPayload::new(args.amount.trim());
    if let Some(offset) = args.offset {
        payload = payload.with_offset(offset);
    }
    let url = payload.to_url(&config.origin);
    info!(link_id = %payload.link_id, lamports, "created payment link");

    if args.output.json {
        let body = serde_json::json!({ "url": url, "payload": payload, "lamports": lamports });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        println!("{}", url);
    }
    Ok(())
}

fn parse_link(url: &str) -> Result<()> {
    let payload = parse_payment_link(url).context("invalid payment link")?;
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

fn claim_url(config: &CliConfig, secret: &str) -> Result<()> {
    let secret = LinkSecret::from_base58(secret).context("invalid secret")?;
    println!("{}", build_claim_url(&config.origin, &secret));
    Ok(())
}

fn inspect_secret(input: &str, output: OutputArgs) -> Result<()> {
    let secret = read_secret(input)?;
    let summary = SecretSummary {
        secret: None,
        fingerprint: secret.fingerprint(),
        claim_url: None,
    };
    output_summary(&summary, output.json)
}

/// Accept either a bare base58 secret or a claim URL carrying one.
fn read_secret(input: &str) -> Result<LinkSecret> {
    let input = input.trim();
    let secret = if input.contains("://") {
        secret_from_claim_url(input).context("invalid claim URL")?
    } else {
        LinkSecret::from_base58(input).context("invalid secret")?
    };
    Ok(secret)
}

fn estimate_fee(config: &CliConfig, args: EstimateFeeArgs) -> Result<()> {
    let balance = parse_sol_amount(&args.balance)
        .with_context(|| format!("invalid balance {}", args.balance))?;

    let defaults = config.fee_schedule();
    let fees = FeeSchedule::new(
        args.min_fee_lamports.unwrap_or(defaults.min_fee_lamports),
        args.fee_rate.unwrap_or(defaults.fee_rate),
    );
    let estimated_fee = fees.estimated_fee(balance);
    let check = fees.ensure_withdrawable(balance);

    let summary = FeeSummary {
        balance_lamports: balance,
        min_fee_lamports: fees.min_fee_lamports,
        fee_rate: fees.fee_rate,
        estimated_fee_lamports: estimated_fee,
        minimum_withdrawal_lamports: fees.minimum_withdrawal(),
        receive_lamports: balance.saturating_sub(estimated_fee),
        withdrawable: check.is_ok(),
    };
    output_summary(&summary, args.output.json)?;

    if let Err(e) = check {
        eprintln!("{}", e);
    }
    Ok(())
}

fn session(config: &CliConfig, command: SessionCommand) -> Result<()> {
    let storage = JsonFileStorage::open(&config.state_path)
        .with_context(|| format!("failed to open {}", config.state_path.display()))?;
    let session = Session::load(&storage).context("failed to load session")?;

    match command {
        SessionCommand::Connect { address } => {
            let session = session.connect_wallet(address);
            let address = session
                .wallet()
                .context("wallet address must not be blank")?
                .to_string();
            session.persist(&storage).context("failed to save session")?;
            info!(%address, "wallet connected");
            println!("Connected {}", address);
        }
        SessionCommand::Disconnect => {
            session
                .disconnect_wallet()
                .persist(&storage)
                .context("failed to save session")?;
            info!("wallet disconnected");
            println!("Disconnected");
        }
        SessionCommand::Show(output) => {
            if output.json {
                println!("{}", serde_json::to_string_pretty(&session)?);
            } else {
                println!("authenticated: {}", session.is_authenticated());
                println!("wallet: {}", session.wallet_address().unwrap_or("-"));
                println!("key base path: {}", config.flow_config().key_base_path);
                println!("activity: {} entries", session.activity().len());
                for activity in session.activity() {
                    println!(
                        "  {} {:?} {} SOL fee {} tx {}",
                        activity.at.format("%Y-%m-%d %H:%M:%S"),
                        activity.kind,
                        format_sol(activity.amount_lamports),
                        format_sol(activity.fee_lamports),
                        activity.tx
                    );
                }
            }
        }
    }
    Ok(())
}

fn output_summary<T>(summary: &T, json: bool) -> Result<()>
where
    T: Serialize + fmt::Display,
{
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
    } else {
        print!("{}", summary);
    }
    Ok(())
}

#[derive(Serialize)]
struct SecretSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    secret: Option<String>,
    fingerprint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    claim_url: Option<String>,
}

impl fmt::Display for SecretSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(secret) = &self.secret {
            writeln!(f, "secret: {}", secret)?;
        }
        writeln!(f, "fingerprint: {}", self.fingerprint)?;
        if let Some(claim_url) = &self.claim_url {
            writeln!(f, "claim url: {}", claim_url)?;
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct FeeSummary {
    balance_lamports: u64,
    min_fee_lamports: u64,
    fee_rate: f64,
    estimated_fee_lamports: u64,
    minimum_withdrawal_lamports: u64,
    receive_lamports: u64,
    withdrawable: bool,
}

impl fmt::Display for FeeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "balance: {} SOL", format_sol(self.balance_lamports))?;
        writeln!(
            f,
            "fee: {} SOL ({} SOL + {}%)",
            format_sol(self.estimated_fee_lamports),
            format_sol(self.min_fee_lamports),
            self.fee_rate * 100.0
        )?;
        writeln!(f, "you receive: {} SOL", format_sol(self.receive_lamports))?;
        writeln!(
            f,
            "minimum withdrawal: {} SOL",
            format_sol(self.minimum_withdrawal_lamports)
        )?;
        writeln!(f, "withdrawable: {}", self.withdrawable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_secret_accepts_url_or_bare() {
        let secret = LinkSecret::from_bytes([5u8; 32]);
        let url = build_claim_url("https://app.example.com", &secret);

        assert_eq!(read_secret(&url).unwrap(), secret);
        assert_eq!(read_secret(&format!(" {} ", secret.to_base58())).unwrap(), secret);
        assert!(read_secret("not-a-secret").is_err());
    }

    #[test]
    fn test_cli_parses_session_commands() {
        let cli = Cli::try_parse_from(["plinks", "--origin", "https://x.io", "session", "show"])
            .unwrap();
        assert_eq!(cli.origin.as_deref(), Some("https://x.io"));
        assert!(matches!(cli.command, Commands::Session(SessionCommand::Show(_))));
    }

    #[test]
    fn test_session_connect_persists() {
        let dir = tempfile::tempdir().unwrap();
        let config = CliConfig {
            origin: "http://localhost:3000".to_string(),
            state_path: dir.path().join("state.json"),
            key_base_path: "/circuit2/transaction2".to_string(),
            min_fee_lamports: None,
            fee_rate: None,
        };

        session(
            &config,
            SessionCommand::Connect {
                address: "Wa11et".to_string(),
            },
        )
        .unwrap();
        let storage = JsonFileStorage::open(&config.state_path).unwrap();
        assert_eq!(
            Session::load(&storage).unwrap().wallet_address(),
            Some("Wa11et")
        );

        assert!(session(
            &config,
            SessionCommand::Connect {
                address: "  ".to_string()
            }
        )
        .is_err());
    }
}
