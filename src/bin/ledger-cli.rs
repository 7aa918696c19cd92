#![forbid(unsafe_code)]
//! Command-line tools: key issuance, signing, chain inspection and validation.

use attendance_ledger::config::load_config;
use attendance_ledger::crypto::KeyPair;
use attendance_ledger::blockchain::{validate_chain, Block};
use attendance_ledger::ledger::load_chain;
use attendance_ledger::logging::{init_logging, LogFormat};
use attendance_ledger::transaction::{Amount, Transaction};
use clap::{Parser, Subcommand};
use colored::*;
use comfy_table::{presets::UTF8_FULL, Table};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "ledger-cli", about = "Attendance ledger tools")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a key pair and write `private.pem` / `public.pem`
    Keygen {
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Sign a transaction payload with a PEM private key
    Sign {
        /// PEM file holding the EC private key
        #[arg(long)]
        key: PathBuf,
        #[arg(long)]
        sender: String,
        #[arg(long)]
        recipient: String,
        #[arg(long, allow_hyphen_values = true)]
        amount: f64,
    },
    /// Print the chain as a table
    Show,
    /// Re-hash the chain and check block linkage
    Validate,
}

fn format_hash(hash: &str) -> String {
    if hash.len() > 20 {
        format!("{}...{}", &hash[..10], &hash[hash.len() - 10..])
    } else {
        hash.to_string()
    }
}

fn keygen(out_dir: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    fs::create_dir_all(&out_dir)?;
    let keypair = KeyPair::generate();
    let private_path = out_dir.join("private.pem");
    let public_path = out_dir.join("public.pem");
    fs::write(&private_path, keypair.private_key_pem()?)?;
    fs::write(&public_path, keypair.public_key_pem()?)?;

    println!("{}", "Key pair generated".bright_green().bold());
    println!("  private: {}", private_path.display());
    println!("  public:  {}", public_path.display());
    Ok(())
}

fn sign(
    key: PathBuf,
    sender: String,
    recipient: String,
    amount: f64,
) -> Result<(), Box<dyn std::error::Error>> {
    let keypair = KeyPair::from_private_pem(&fs::read_to_string(key)?)?;
    let tx = Transaction::new(sender, recipient, Amount::from_f64(amount)?);
    let payload = tx.canonical_signed_payload();
    let signature = keypair.sign_payload(&payload);
    let tx = tx.with_signature(signature, keypair.public_key_pem()?);

    eprintln!("{} {}", "payload:".bright_cyan(), payload);
    println!("{}", serde_json::to_string_pretty(&tx)?);
    Ok(())
}

fn show(blocks: &[Block], difficulty: usize) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Index",
        "Timestamp",
        "Previous",
        "Hash",
        "Nonce",
        "Txs",
    ]);

    for block in blocks {
        let timestamp = chrono::DateTime::from_timestamp_millis(block.timestamp() as i64)
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| block.timestamp().to_string());
        table.add_row(vec![
            block.index().to_string(),
            timestamp,
            block.previous_hash().map(format_hash).unwrap_or_else(|| "-".to_string()),
            format_hash(block.hash()),
            block.nonce().to_string(),
            block.transactions().len().to_string(),
        ]);
    }

    println!("{}", table);
    println!("Difficulty: {}", difficulty);
}

/// Inspection commands never create a chain.
fn no_chain(path: &str) -> ExitCode {
    println!("{} {}", "No chain at".yellow(), path);
    ExitCode::FAILURE
}

fn validate(blocks: &[Block]) -> ExitCode {
    match validate_chain(blocks) {
        Ok(()) => {
            println!("{}", "Chain is valid".bright_green().bold());
            ExitCode::SUCCESS
        }
        Err(fault) => {
            println!("{} {}", "Chain is INVALID:".bright_red().bold(), fault);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = load_config(&cli.config)?;
    init_logging(&config.logging.level, LogFormat::from_str_lossy(&config.logging.format));

    match cli.command {
        Command::Keygen { out_dir } => keygen(out_dir)?,
        Command::Sign {
            key,
            sender,
            recipient,
            amount,
        } => sign(key, sender, recipient, amount)?,
        Command::Show => match load_chain(&config.ledger)? {
            Some(blocks) => show(&blocks, config.ledger.difficulty),
            None => return Ok(no_chain(&config.ledger.chain_path)),
        },
        Command::Validate => match load_chain(&config.ledger)? {
            Some(blocks) => return Ok(validate(&blocks)),
            None => return Ok(no_chain(&config.ledger.chain_path)),
        },
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", "error:".bright_red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
