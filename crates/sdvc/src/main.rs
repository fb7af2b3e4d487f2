use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

use sdvc::{new_status_list, parse_assignment, read_status, run_demo, RootConfig, RootError};
use sdvc_status::BitsPerStatus;

/// sdvc: selective-disclosure credentials and status lists
///
/// Issue SD-JWT VCs that hide chosen claims behind salted digests, present
/// a subset of them, verify what was presented, and manage the bit-packed
/// status lists that track revocation.
#[derive(Parser, Debug)]
#[command(name = "sdvc", version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write the default configuration file
    Init,

    /// Issue, present and verify a sample credential
    Demo,

    /// Status list tools
    Status {
        #[command(subcommand)]
        command: StatusCommands,
    },
}

#[derive(Subcommand, Debug)]
enum StatusCommands {
    /// Create a list and print its encoded form
    New {
        /// Number of entries
        #[arg(long)]
        size: Option<usize>,

        /// Bits per entry: 1, 2, 4 or 8
        #[arg(long)]
        bits: Option<u8>,

        /// Initial value of every entry
        #[arg(long, default_value = "0")]
        fill: u8,

        /// Entry assignment INDEX=VALUE, repeatable
        #[arg(long = "set", value_name = "INDEX=VALUE")]
        set: Vec<String>,
    },

    /// Read one entry of an encoded list
    Get {
        /// Encoded list (zlib + base64url)
        #[arg(long)]
        encoded: String,

        /// Bits per entry: 1, 2, 4 or 8
        #[arg(long)]
        bits: u8,

        /// Entry index
        #[arg(long)]
        index: usize,
    },
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("sdvc=debug,sdvc_disclosure=debug,sdvc_status=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sdvc=info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<RootConfig, RootError> {
    match path {
        Some(p) => RootConfig::load(p),
        None => {
            let default_path = RootConfig::default_config_path();
            RootConfig::load(&default_path)
        }
    }
}

fn parse_bits(bits: u8) -> Result<BitsPerStatus, RootError> {
    BitsPerStatus::try_from(bits).map_err(RootError::from)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = run(cli).await;
    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), RootError> {
    match cli.command {
        Commands::Init => cmd_init(cli.config.as_ref()),
        Commands::Demo => cmd_demo(cli.config.as_ref()).await,
        Commands::Status { command } => match command {
            StatusCommands::New {
                size,
                bits,
                fill,
                set,
            } => cmd_status_new(cli.config.as_ref(), size, bits, fill, &set),
            StatusCommands::Get {
                encoded,
                bits,
                index,
            } => cmd_status_get(&encoded, bits, index),
        },
    }
}

fn cmd_init(config_path: Option<&PathBuf>) -> Result<(), RootError> {
    let config = load_config(config_path)?;
    let save_path = config_path
        .cloned()
        .unwrap_or_else(RootConfig::default_config_path);
    config.save(&save_path)?;

    info!(path = %save_path.display(), "configuration written");
    println!("Configuration written to {}", save_path.display());
    Ok(())
}

async fn cmd_demo(config_path: Option<&PathBuf>) -> Result<(), RootError> {
    let config = load_config(config_path)?;
    let report = run_demo(&config).await?;

    println!("Issuer:      {}", report.issuer);
    println!();
    println!("Credential:");
    println!("  {}", report.credential);
    println!("  valid: {}", report.validated);
    println!("  presentable: {}", report.presentable_keys.join(", "));
    println!();
    println!("Presentation:");
    println!("  {}", report.presentation);
    println!();
    println!("Verified claims:");
    println!("{}", serde_json::to_string_pretty(&report.disclosed_claims)?);
    println!();
    println!("Status list credential:");
    println!("  {}", report.status_list_credential);
    println!("  credential status: {}", report.status);
    Ok(())
}

fn cmd_status_new(
    config_path: Option<&PathBuf>,
    size: Option<usize>,
    bits: Option<u8>,
    fill: u8,
    assignments: &[String],
) -> Result<(), RootError> {
    let config = load_config(config_path)?;
    let size = size.unwrap_or(config.status.size);
    let bits = match bits {
        Some(b) => parse_bits(b)?,
        None => config.bits()?,
    };
    let assignments = assignments
        .iter()
        .map(|a| parse_assignment(a))
        .collect::<Result<Vec<_>, _>>()?;

    let encoded = new_status_list(size, bits, fill, &assignments)?;
    info!(size, bits = bits.bits(), "status list created");
    println!("{}", encoded);
    Ok(())
}

fn cmd_status_get(encoded: &str, bits: u8, index: usize) -> Result<(), RootError> {
    let (value, status) = read_status(encoded, parse_bits(bits)?, index)?;
    println!("{} ({})", value, status);
    Ok(())
}
