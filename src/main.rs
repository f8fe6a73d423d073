use anyhow::Result;
use chrono::{DateTime, FixedOffset};
use clap::{Args, Parser, Subcommand};
use shiftclock::OutputFormat;
use shiftclock::commands;
use shiftclock::config::{self, Config, LoggingConfig};
use shiftclock::logging;
use shiftclock::shift::duration::TrackedDuration;
use shiftclock::shift::{ClockTime, ScheduleMode};

#[derive(Parser)]
#[command(name = "shc")]
#[command(about = "Shift timing: when can I leave, and how much tracked work is left")]
#[command(version)]
struct Cli {
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new shift
    Start {
        #[arg(long, help = "Entry time HH:MM (defaults to now)")]
        entry: Option<ClockTime>,
        #[arg(long, help = "Tracked time so far, e.g. 3h20m or 3:20")]
        tracked: Option<TrackedDuration>,
        #[arg(long, value_enum, help = "Schedule mode")]
        mode: Option<ScheduleMode>,
    },
    /// Set the entry time of the current shift
    Entry {
        #[arg(help = "Entry time HH:MM")]
        time: ClockTime,
    },
    /// Set the tracked time reported so far
    Tracked {
        #[arg(help = "Tracked time, e.g. 3h20m, 3:20 or 3:20:15")]
        duration: TrackedDuration,
    },
    /// Switch schedule mode
    Mode {
        #[arg(value_enum)]
        mode: ScheduleMode,
    },
    /// Show the current shift
    Status {
        #[arg(long, value_parser = parse_instant, help = "Evaluate at an RFC 3339 instant")]
        at: Option<DateTime<FixedOffset>>,
    },
    /// Live countdown until Ctrl-C
    Watch {
        #[arg(long, default_value = "1", help = "Refresh interval in seconds")]
        interval: u64,
    },
    /// Discard the current shift
    Reset {
        #[arg(long, help = "Also forget stored passwords and tokens")]
        credentials: bool,
    },
    /// Fetch entry time (RAMS) and tracked time (Time Doctor)
    Fetch {
        #[arg(long, help = "Show what would change without saving")]
        dry_run: bool,
    },
    /// List today's RAMS attendance
    Attendance,
    /// Show today's Time Doctor activity
    Stats,
    /// Save the RAMS employee name used by fetch
    Employee {
        #[arg(help = "Name as shown in RAMS")]
        name: String,
    },
    /// Manage configuration
    Config(ConfigArgs),
}

#[derive(Args)]
struct ConfigArgs {
    #[command(subcommand)]
    action: ConfigAction,
}

#[derive(Subcommand)]
enum ConfigAction {
    List,
    Set { key: String, value: String },
    Get { key: String },
}

fn parse_instant(s: &str) -> Result<DateTime<FixedOffset>, String> {
    DateTime::parse_from_rfc3339(s).map_err(|e| format!("Invalid RFC 3339 time '{}': {}", s, e))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let path = config::config_path()?;

    // Peek at the log level first so credential migration during load is logged
    let level = config::load_from_path(&path)
        .map(|c| c.logging.level)
        .unwrap_or_else(|_| LoggingConfig::default().level);
    logging::init(&level);

    let config = if !path.exists() {
        tracing::warn!(
            "No config found at {}. Run 'shc config set ...'",
            path.display()
        );
        Config::default()
    } else {
        match config::load() {
            Ok(config) => config,
            // A broken file must still be fixable through `config set`
            Err(e) if matches!(cli.command, Commands::Config(_)) => {
                tracing::warn!("Ignoring invalid config: {:#}", e);
                Config::default()
            }
            Err(e) => return Err(e),
        }
    };

    let format = cli.format;
    match &cli.command {
        Commands::Start {
            entry,
            tracked,
            mode,
        } => {
            commands::session::start(&config, *entry, tracked.map(|t| t.0), *mode, format)?;
        }
        Commands::Entry { time } => {
            commands::session::set_entry(&config, *time, format)?;
        }
        Commands::Tracked { duration } => {
            commands::session::set_tracked(&config, duration.0, format)?;
        }
        Commands::Mode { mode } => {
            commands::session::set_mode(&config, *mode, format)?;
        }
        Commands::Status { at } => {
            commands::status::status(&config, *at, format)?;
        }
        Commands::Watch { interval } => {
            tokio::runtime::Runtime::new()?.block_on(commands::status::watch(
                &config, *interval, format,
            ))?;
        }
        Commands::Reset { credentials } => {
            commands::session::reset(&config, *credentials, format)?;
        }
        Commands::Fetch { dry_run } => {
            tokio::runtime::Runtime::new()?
                .block_on(commands::fetch::fetch(&config, *dry_run, format))?;
        }
        Commands::Attendance => {
            commands::fetch::attendance(&config, format)?;
        }
        Commands::Stats => {
            commands::stats::stats(&config, format)?;
        }
        Commands::Employee { name } => {
            commands::session::set_employee(&config, name, format)?;
        }
        Commands::Config(args) => match &args.action {
            ConfigAction::List => commands::config::list(&config)?,
            ConfigAction::Set { key, value } => commands::config::set(key, value)?,
            ConfigAction::Get { key } => commands::config::get(key, &config)?,
        },
    }

    Ok(())
}
