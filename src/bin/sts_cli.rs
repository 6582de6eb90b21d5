//! STS CLI
//!
//! Operator tool working directly on the STS data directories.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use sts::storage::verify_log_file;
use sts::{Config, OperationalLog, ReadingPayload, SessionSet, StorageEngine};
use tracing_subscriber::{fmt, EnvFilter};

/// STS CLI
#[derive(Parser, Debug)]
#[command(name = "sts-cli")]
#[command(about = "Inspect and feed an STS sensor temperature store")]
#[command(version)]
struct Args {
    /// Snapshot (application data) directory
    #[arg(long, default_value = "./sts_data/app")]
    app_dir: PathBuf,

    /// Long-term storage directory
    #[arg(long, default_value = "./sts_data/lts")]
    lts_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Store one reading
    Store {
        /// Sensor id (-1 for the sentinel sensor)
        #[arg(allow_hyphen_values = true)]
        sensor_id: i32,

        /// Sensor display name
        name: String,

        /// Temperature in [-127, 128]
        #[arg(allow_hyphen_values = true)]
        temperature: i32,
    },

    /// Print the latest reading of a sensor
    Current {
        #[arg(allow_hyphen_values = true)]
        sensor_id: i32,
    },

    /// Print stored readings of a sensor, one JSON object per line
    History {
        #[arg(allow_hyphen_values = true)]
        sensor_id: i32,

        /// Lower timestamp bound (unix millis, inclusive)
        #[arg(long, requires = "to")]
        from: Option<i64>,

        /// Upper timestamp bound (unix millis, inclusive)
        #[arg(long, requires = "from")]
        to: Option<i64>,
    },

    /// List known sensors
    Sensors,

    /// Decode a durable log file without modifying it
    Verify {
        file: PathBuf,
    },
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,sts=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn open_engine(args: &Args) -> sts::Result<StorageEngine> {
    let config = Config::builder()
        .app_dir(&args.app_dir)
        .lts_dir(&args.lts_dir)
        .build();
    let log = Arc::new(OperationalLog::from_config(&config, Arc::new(SessionSet::new())));
    StorageEngine::open(config, log)
}

fn run(args: Args) -> sts::Result<ExitCode> {
    match &args.command {
        Commands::Store {
            sensor_id,
            name,
            temperature,
        } => {
            let engine = open_engine(&args)?;
            let reading = engine.store_payload(*sensor_id, ReadingPayload::new(name.clone(), *temperature))?;
            println!("{}", serde_json::to_string(&reading)?);
        }
        Commands::Current { sensor_id } => {
            let engine = open_engine(&args)?;
            match engine.current(*sensor_id) {
                Some(reading) => println!("{}", serde_json::to_string(&reading)?),
                None => {
                    eprintln!("No temperature data found for sensor ID: {}", sensor_id);
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Commands::History {
            sensor_id,
            from,
            to,
        } => {
            let engine = open_engine(&args)?;
            let readings = match (from, to) {
                (Some(from), Some(to)) => engine.history_range(*sensor_id, *from, *to)?,
                _ => engine.history(*sensor_id)?,
            };
            for reading in readings {
                println!("{}", serde_json::to_string(&reading)?);
            }
        }
        Commands::Sensors => {
            let engine = open_engine(&args)?;
            for (id, name) in engine.sensors() {
                println!("{}\t{}", id, name);
            }
        }
        Commands::Verify { file } => {
            let records = verify_log_file(file)?;
            println!("{}: {} record(s)", file.display(), records);
        }
    }

    Ok(ExitCode::SUCCESS)
}
