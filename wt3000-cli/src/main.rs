use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use std::fs::File;
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use wt3000_lib::WT3000;
use wt3000_lib::settings::{ProtocolSettings, UsbSettings};
use wt3000_lib::state::{NumericFormat, TransitionCondition};

/// Talk to a Yokogawa WT3000 power analyzer over USB.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Serial number of the analyzer to use when several are attached.
    #[arg(short, long)]
    serial: Option<String>,
    /// Per-transfer USB timeout in milliseconds.
    #[arg(long, default_value_t = 2000)]
    timeout_ms: u64,
    /// Program message terminator (escapes \n and \r are understood).
    #[arg(long, default_value = "\\n")]
    terminator: String,
    /// Optional path to a file to write logs to, in addition to the console.
    #[arg(short, long)]
    log_file: Option<PathBuf>,
    /// Skip the clear-status/remote handshake.
    #[arg(long)]
    no_connect: bool,
    #[command(subcommand)]
    command: Action,
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Print the identification string (*IDN?).
    Identify,
    /// Print the module type installed in each input element slot.
    Modules {
        /// Only query this element.
        #[arg(short, long)]
        element: Option<u8>,
    },
    /// Fetch numeric measurement values.
    Values {
        #[arg(short, long, value_enum, default_value_t = Format::Ascii)]
        format: Format,
        /// Repeat the fetch this many times.
        #[arg(short, long, default_value_t = 1)]
        count: u32,
        /// Delay between fetches in milliseconds.
        #[arg(long, default_value_t = 500)]
        interval_ms: u64,
    },
    /// Set a transition filter (RISE, FALL, BOTH, NEVER).
    Filter { number: u8, condition: String },
    /// Configure response formatting flags.
    Communicate {
        #[arg(long)]
        header: Option<bool>,
        #[arg(long)]
        verbose: Option<bool>,
        #[arg(long)]
        overlap: Option<bool>,
    },
    /// Return the instrument to local operation.
    Local,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
    Ascii,
    Float,
}

impl From<Format> for NumericFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Ascii => NumericFormat::Ascii,
            Format::Float => NumericFormat::Float,
        }
    }
}

/// Console logs go to stderr so `values` output on stdout stays machine-readable.
fn setup_logging(log_file: Option<&PathBuf>, verbosity: &Verbosity<InfoLevel>) -> Result<Option<WorkerGuard>> {
    // -v gives DEBUG, -vv TRACE; RUST_LOG still wins
    let filter = EnvFilter::builder()
        .with_default_directive(verbosity.tracing_level_filter().into())
        .from_env_lossy();

    let (file_writer, guard) = match log_file {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("Failed to create log file at: {path:?}"))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false).without_time())
        .with(file_writer.map(|writer| fmt::layer().with_writer(writer).with_ansi(false)))
        .init();

    if let Some(path) = log_file {
        info!("Logging to file: {:?}", path);
    }
    Ok(guard)
}

fn parse_terminator(text: &str) -> Vec<u8> {
    text.replace("\\n", "\n").replace("\\r", "\r").into_bytes()
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = setup_logging(cli.log_file.as_ref(), &cli.verbose)?;

    if let Err(e) = run(cli) {
        error!("wt3000 failed: {:?}", e);
        process::exit(1);
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let usb = UsbSettings {
        serial_number: cli.serial,
        timeout: Duration::from_millis(cli.timeout_ms),
        ..Default::default()
    };
    let protocol = ProtocolSettings {
        terminator: parse_terminator(&cli.terminator),
        ..Default::default()
    };

    let device = WT3000::open_with(usb, protocol).context("Failed to open WT3000")?;
    if !cli.no_connect {
        device.connect().context("Failed to put the WT3000 in remote mode")?;
    }

    match cli.command {
        Action::Identify => {
            println!("{}", device.identify()?);
        }
        Action::Modules { element } => {
            let elements = match element {
                Some(n) => n..=n,
                None => 1..=wt3000_lib::constants::MAX_INPUT_ELEMENT,
            };
            for n in elements {
                let module = device
                    .input_module(n)
                    .with_context(|| format!("Failed to query input element {n}"))?;
                println!("Element {n}: {module}");
            }
        }
        Action::Values {
            format,
            count,
            interval_ms,
        } => {
            device.set_numeric_format(format.into())?;
            for i in 0..count {
                if i > 0 {
                    std::thread::sleep(Duration::from_millis(interval_ms));
                }
                let values = device.fetch_numeric_values()?;
                let line = values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(",");
                println!("{line}");
            }
        }
        Action::Filter { number, condition } => {
            let condition: TransitionCondition = condition.parse()?;
            device.set_status_filter(number, condition)?;
            info!("Filter {} set to {}", number, condition);
        }
        Action::Communicate {
            header,
            verbose,
            overlap,
        } => {
            if header.is_none() && verbose.is_none() && overlap.is_none() {
                bail!("Nothing to configure; pass --header, --verbose or --overlap");
            }
            if let Some(on) = header {
                device.set_header(on)?;
            }
            if let Some(on) = verbose {
                device.set_verbose(on)?;
            }
            if let Some(on) = overlap {
                device.set_overlap(on)?;
            }
            info!("Configuration now {:?}", device.configuration());
        }
        Action::Local => {
            device.set_remote(false)?;
            info!("WT3000 returned to local operation");
        }
    }
    Ok(())
}
