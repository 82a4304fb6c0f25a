//! CLI entry point for nexus-journal.
//!
//! A thin transport shell over [`nexus_journal::api::JournalService`]: one
//! subcommand per public operation, JSON on stdout. Journal documents are
//! read from a local mirror of the journal tree (see
//! `Settings::journal_root`); remote transports plug in their own
//! `JournalFetcher` implementation instead.

use anyhow::Result;
use clap::{Parser, Subcommand};
use nexus_journal::api::JournalService;
use nexus_journal::config::Settings;
use nexus_journal::journal::FileSystemFetcher;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nexus-journal")]
#[command(about = "Run-data extraction and journal search for neutron instruments", long_about = None)]
struct Cli {
    /// Config name under config/ (defaults to "default")
    #[arg(long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List an instrument's cycles
    Cycles { instrument: String },

    /// List one cycle's journal records, display-formatted
    Journal { instrument: String, cycle: String },

    /// Search all cycles for a substring in a journal field
    Search {
        instrument: String,
        needle: String,

        /// Journal field to search (defaults to user_name)
        #[arg(long)]
        field: Option<String>,
    },

    /// Find the cycle containing a run number
    FindRun { instrument: String, run: String },

    /// Poll an instrument's journal index for changes
    Poll { instrument: String },

    /// List the log fields of a run ("cycles"/"runs" are ;-separated)
    LogFields {
        instrument: String,
        cycles: String,
        runs: String,
    },

    /// Read log field data for runs ("runs"/"fields" are ;-separated)
    LogData {
        instrument: String,
        cycle: String,
        runs: String,
        fields: String,
    },

    /// Read one detector spectrum for runs
    Spectrum {
        instrument: String,
        cycle: String,
        runs: String,
        index: String,
    },

    /// Count addressable detector spectra
    SpectrumRange {
        instrument: String,
        cycle: String,
        runs: String,
    },

    /// Read one monitor spectrum for runs
    Monitor {
        instrument: String,
        cycle: String,
        runs: String,
        index: String,
    },

    /// Highest monitor number present in a run file
    MonitorRange {
        instrument: String,
        cycle: String,
        runs: String,
    },

    /// Report active/total detector rows for a run
    DetectorAnalysis {
        instrument: String,
        cycle: String,
        run: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::new(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(settings.log_level.clone())),
        )
        .init();

    let fetcher = FileSystemFetcher::new(settings.journal_root.clone());
    let service = JournalService::new(settings, fetcher);

    let result = match &cli.command {
        Commands::Cycles { instrument } => service.list_cycles(instrument).await,
        Commands::Journal { instrument, cycle } => service.list_journal(instrument, cycle).await,
        Commands::Search {
            instrument,
            needle,
            field,
        } => {
            service
                .search_journal(instrument, field.as_deref(), needle)
                .await
        }
        Commands::FindRun { instrument, run } => service.find_run(instrument, run).await,
        Commands::Poll { instrument } => service.poll_instrument(instrument).await,
        Commands::LogFields {
            instrument,
            cycles,
            runs,
        } => service.list_log_fields(instrument, cycles, runs),
        Commands::LogData {
            instrument,
            cycle,
            runs,
            fields,
        } => service.read_log_data(instrument, cycle, runs, fields),
        Commands::Spectrum {
            instrument,
            cycle,
            runs,
            index,
        } => service.read_spectrum(instrument, cycle, runs, index),
        Commands::SpectrumRange {
            instrument,
            cycle,
            runs,
        } => service.read_spectrum_range(instrument, cycle, runs),
        Commands::Monitor {
            instrument,
            cycle,
            runs,
            index,
        } => service.read_monitor(instrument, cycle, runs, index),
        Commands::MonitorRange {
            instrument,
            cycle,
            runs,
        } => service.read_monitor_range(instrument, cycle, runs),
        Commands::DetectorAnalysis {
            instrument,
            cycle,
            run,
        } => service.detector_analysis(instrument, cycle, run),
    };

    match result {
        Ok(payload) => {
            println!("{}", serde_json::to_string_pretty(&payload)?);
            Ok(())
        }
        Err(err) => {
            println!("{}", err.to_response());
            std::process::exit(1);
        }
    }
}
