/// # Coverage Oracle
///
/// Entry point run by the trusted function runtime once per proof-of-coverage submission.
///
/// The request JSON is taken from the first argument or, when absent, read from stdin
/// until end-of-stream. Exactly one JSON line is written to stdout and the exit code
/// tells the harness the outcome: `0` when the activity is verified, `1` otherwise
/// (including malformed input and startup failures).
///
/// ## Usage
///
/// ```bash
/// # Verify a payload passed as an argument
/// coverage-oracle '{"activity": {"gps_lat": 37.77, "gps_long": -122.42, "signal_strength": -65}, "user_ip": "73.15.22.101"}'
///
/// # Verify from stdin with a stricter policy
/// cat request.json | coverage-oracle --on-inconclusive fail-closed --max-speed-kmh 500
///
/// # Dump the effective configuration as TOML
/// coverage-oracle --config oracle.toml --print-config
/// ```
use std::io::Write;
use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::Parser;
use tokio::io::AsyncReadExt;
use tracing::{error, info};

use coverage_oracle::config::{InconclusivePolicy, OracleConfig, ThresholdMode};
use coverage_oracle::{logging, HarnessOutput, Orchestrator};

/// Command line arguments for the coverage oracle
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Request JSON; read from stdin when omitted
    payload: Option<String>,

    /// Path to a TOML or JSON configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the movement speed ceiling in km/h
    #[arg(long, value_name = "KMH")]
    max_speed_kmh: Option<f64>,

    /// Override the outcome when no reputation provider answers
    #[arg(long, value_enum)]
    on_inconclusive: Option<InconclusivePolicy>,

    /// Override how the threshold treats a missing movement check
    #[arg(long, value_enum)]
    threshold_mode: Option<ThresholdMode>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            logging::init("info");
            error!("Failed to load configuration: {:#}", e);
            emit(&HarnessOutput::from_error(format!("{:#}", e), None));
            process::exit(1);
        }
    };

    logging::init(&config.logging.level);

    if cli.print_config {
        match config.to_toml() {
            Ok(rendered) => {
                print!("{}", rendered);
                let _ = std::io::stdout().flush();
                process::exit(0);
            }
            Err(e) => {
                error!("Failed to render configuration: {}", e);
                process::exit(1);
            }
        }
    }

    let output = match run(&cli, &config).await {
        Ok(output) => output,
        Err(e) => {
            error!("Verification aborted: {:#}", e);
            HarnessOutput::from_error(format!("{:#}", e), None)
        }
    };

    info!("Activity verified: {}", output.verified());
    emit(&output);
    process::exit(output.exit_code());
}

/// Load the configuration file and environment, then apply command line overrides
fn load_config(cli: &Cli) -> anyhow::Result<OracleConfig> {
    let mut config = OracleConfig::load(cli.config.as_deref())
        .with_context(|| format!("could not load configuration from {:?}", cli.config))?;

    if let Some(max_speed_kmh) = cli.max_speed_kmh {
        config.movement.max_speed_kmh = max_speed_kmh;
    }
    if let Some(policy) = cli.on_inconclusive {
        config.reputation.on_inconclusive = policy;
    }
    if let Some(mode) = cli.threshold_mode {
        config.scoring.threshold_mode = mode;
    }

    config.validate().context("invalid command line override")?;
    Ok(config)
}

async fn run(cli: &Cli, config: &OracleConfig) -> anyhow::Result<HarnessOutput> {
    let payload = match &cli.payload {
        Some(payload) => payload.clone(),
        None => {
            let mut buffer = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buffer)
                .await
                .context("failed to read request from stdin")?;
            buffer
        }
    };

    let orchestrator =
        Orchestrator::new(config).context("failed to initialise reputation providers")?;

    Ok(orchestrator.verify_payload(&payload).await)
}

/// Write the single output line the harness reads
fn emit(output: &HarnessOutput) {
    let line = output.to_json_line().unwrap_or_else(|e| {
        serde_json::json!({
            "verified": false,
            "error": e.to_string(),
            "timestamp": null,
            "user_id": null,
        })
        .to_string()
    });

    let mut stdout = std::io::stdout().lock();
    let _ = writeln!(stdout, "{}", line);
    let _ = stdout.flush();
}
