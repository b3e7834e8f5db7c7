use channel_pulse::{report, App, Config, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "pulse")]
#[command(author, version, about = "YouTube and Telegram channel metrics", long_about = None)]
struct Args {
    #[arg(short, long, global = true, env = "PULSE_CONFIG", help = "Path to custom config file")]
    config: Option<PathBuf>,

    #[arg(long, global = true, env = "PULSE_DATA_DIR", help = "Directory for snapshots and history", value_name = "DIR")]
    data_dir: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Verbose logging")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll both platforms and store snapshots
    Collect,
    /// Build dashboard.json and dashboard.md from stored data
    Dashboard,
    /// Write the combined Markdown report
    Report,
    /// Five-minute console summary
    Quick {
        #[arg(long, help = "Base URL of a published data directory", value_name = "URL")]
        remote: Option<String>,
    },
    /// Check the stored dashboard for critical conditions
    Alerts,
    /// Collect, build the dashboard, write reports and check alerts once
    Run,
    /// Repeat `run` on an interval until interrupted
    Watch {
        #[arg(long, help = "Seconds between batches (defaults to refresh.interval_secs)")]
        interval_secs: Option<u64>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    log::debug!("Starting channel-pulse v{}", env!("CARGO_PKG_VERSION"));

    if let Some(path) = &args.config {
        log::info!("Loading config from: {}", path.display());
    }
    let mut config = Config::load(args.config.as_deref())?;

    if let Some(dir) = args.data_dir {
        config.storage.data_dir = dir;
    }

    let app = App::new(config)?;

    match args.command {
        Command::Collect => {
            let summary = app.collect()?;
            println!("YouTube channels: {}", count_label(summary.youtube_channels));
            println!("Telegram channels: {}", count_label(summary.telegram_channels));
        }
        Command::Dashboard => {
            let dashboard = app.build_dashboard(Utc::now())?;
            print!("{}", report::dashboard_recap(&dashboard));
        }
        Command::Report => {
            let path = app.generate_report(Utc::now())?;
            println!("Report written to {}", path.display());
        }
        Command::Quick { remote } => {
            let data = app.quick(remote.as_deref())?;
            print!("{}", report::quick_summary(&data, Utc::now()));
            println!();
            print!("{}", report::channel_table(&data));
        }
        Command::Alerts => {
            let alerts = app.check_alerts()?;
            print!("{}", report::alert_lines(&alerts));
        }
        Command::Run => {
            let outcome = app.run_batch()?;
            print!("{}", report::dashboard_recap(&outcome.dashboard));
            print!("{}", report::alert_lines(&outcome.alerts));
        }
        Command::Watch { interval_secs } => {
            let secs = interval_secs.unwrap_or(app.config.refresh.interval_secs).max(1);
            let batches = channel_pulse::daemon::Watcher::start(app, Duration::from_secs(secs))?;
            log::info!("Watcher stopped after {} batch(es)", batches);
        }
    }

    Ok(())
}

fn count_label(count: Option<usize>) -> String {
    count.map(|n| n.to_string()).unwrap_or_else(|| "skipped".to_string())
}
