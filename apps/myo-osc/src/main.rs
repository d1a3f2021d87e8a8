use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::io;
use std::time::Duration;
use tracing::info;

use device_registry as devreg;
use osc_telemetry as telem;
use osc_transport as osc;
use osc_transport::DatagramSink;

mod settings;
use settings::{load_settings_file, BridgeSettings};

#[derive(Parser, Debug)]
#[command(
    name = "myo-osc",
    version,
    about = "Sends OSC output over UDP from the input of one or more Myo armbands",
    disable_help_subcommand = true
)]
struct Cli {
    /// Settings file (YAML); command-line values take precedence
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum ArmArg {
    Left,
    Right,
}

impl ArmArg {
    fn into_arm(self) -> devreg::Arm {
        match self {
            ArmArg::Left => devreg::Arm::Left,
            ArmArg::Right => devreg::Arm::Right,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Pump device events and send them as OSC
    Run {
        /// `<port>` or `<host> <port>` (defaults 127.0.0.1 7777)
        #[arg(num_args = 0..=2, value_name = "HOST PORT")]
        target: Vec<String>,
        /// Enable lifecycle logging
        #[arg(short = 'l', long, action = ArgAction::SetTrue, conflicts_with = "no_log")]
        log: bool,
        /// Disable lifecycle logging
        #[arg(long, action = ArgAction::SetTrue)]
        no_log: bool,
        /// Echo every outgoing message to stdout
        #[arg(short, long, action = ArgAction::SetTrue)]
        verbose: bool,
        /// Record datagrams in-process instead of sending UDP
        #[arg(long, action = ArgAction::SetTrue)]
        mock: bool,
        /// NDJSON event log to replay ("-" for stdin)
        #[arg(long, default_value = "-")]
        events: String,
        /// Polling window in milliseconds; poses are flushed once per window
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        poll_ms: Option<u64>,
        /// Respect timestamps to approximate real-time playback
        #[arg(long, action = ArgAction::SetTrue)]
        realtime: bool,
        /// Print Prometheus metrics on exit
        #[arg(long, action = ArgAction::SetTrue)]
        metrics: bool,
    },
    /// Print the OSC addresses used for a device id or an arm
    Paths {
        /// Device id
        #[arg(long, conflicts_with = "arm", required_unless_present = "arm")]
        device: Option<u32>,
        /// Arm
        #[arg(long, value_enum)]
        arm: Option<ArmArg>,
    },
}

struct RunOptions {
    events: String,
    realtime: bool,
    metrics: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = match cli.config.as_deref() {
        Some(path) => load_settings_file(path)?,
        None => BridgeSettings::default(),
    };

    match cli.command {
        Commands::Run {
            target,
            log,
            no_log,
            verbose,
            mock,
            events,
            poll_ms,
            realtime,
            metrics,
        } => {
            settings.apply_target(&target)?;
            if log {
                settings.logging = true;
            }
            if no_log {
                settings.logging = false;
            }
            settings.verbose |= verbose;
            if let Some(ms) = poll_ms {
                settings.poll_ms = ms;
            }
            settings.validate()?;
            setup_tracing(settings.logging);
            let opts = RunOptions {
                events,
                realtime,
                metrics,
            };
            if mock {
                let sink = osc::MockSink::open(&settings.target())?;
                let sink = run(sink, &settings, &opts)?;
                println!("mock sink recorded {} datagrams", sink.sent().len());
                Ok(())
            } else {
                let sink = osc::UdpSink::open(&settings.target())
                    .with_context(|| format!("opening UDP socket to {}", settings.target()))?;
                run(sink, &settings, &opts).map(|_| ())
            }
        }
        Commands::Paths { device, arm } => {
            setup_tracing(settings.logging);
            let ns = match (device, arm) {
                (Some(id), _) => devreg::AddressNamespace::for_device(devreg::DeviceId::new(id)),
                (None, Some(arm)) => devreg::AddressNamespace::for_arm(arm.into_arm()),
                (None, None) => anyhow::bail!("pass --device or --arm"),
            };
            for addr in ns.addresses() {
                println!("{addr}");
            }
            Ok(())
        }
    }
}

fn setup_tracing(logging: bool) {
    // RUST_LOG wins; otherwise the logging setting picks the level
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(if logging { "info" } else { "warn" })
    });
    // Best-effort; avoid panics if already set
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn run<S: DatagramSink>(sink: S, settings: &BridgeSettings, opts: &RunOptions) -> Result<S> {
    let info = sink.info();
    info!(
        dest = %info.target,
        driver = %info.driver,
        "sending Myo OSC to {}",
        settings.target()
    );

    let hub = telem::MetricsHub::new().map_err(|e| anyhow::anyhow!(e))?;
    let mut dispatcher = telem::Dispatcher::new(sink).with_metrics(hub.telemetry.clone());
    if settings.verbose {
        dispatcher = dispatcher.with_mirror(telem::VerboseMirror::stdout());
    }

    let mut source: Box<dyn telem::EventSource> = if opts.events == "-" {
        Box::new(telem::ReplaySource::new(io::stdin().lock()).realtime(opts.realtime))
    } else {
        Box::new(
            telem::ReplaySource::open(&opts.events)
                .with_context(|| format!("opening event log: {}", opts.events))?
                .realtime(opts.realtime),
        )
    };

    let poll = Duration::from_millis(settings.poll_ms);
    let stats = telem::run_bridge(&mut dispatcher, source.as_mut(), poll)
        .with_context(|| format!("replaying {}", opts.events))?;
    info!(
        events = stats.events,
        iterations = stats.iterations,
        devices = dispatcher.registry().len(),
        "bridge finished"
    );

    if opts.metrics {
        print!("{}", hub.encode_text());
    }
    Ok(dispatcher.into_sink())
}
