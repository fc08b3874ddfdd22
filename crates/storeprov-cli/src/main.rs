use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

mod report;
mod stores;

#[derive(Debug, Parser)]
#[command(name = "storeprov")]
#[command(about = "Daily provision reports across Shopify stores")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch orders for the selected range and print provision totals
    Report {
        /// today, yesterday, thisWeek, thisMonth or last3Weeks
        #[arg(long, default_value = "thisMonth")]
        range: String,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Only report this store (case-insensitive)
        #[arg(long)]
        store: Option<String>,

        /// Abandon store fetches still running after this many seconds
        #[arg(long)]
        deadline_secs: Option<u64>,
    },
    /// Inspect the store registry
    Stores {
        #[command(subcommand)]
        command: StoresCommands,
    },
}

#[derive(Debug, Subcommand)]
enum StoresCommands {
    /// List configured stores without credentials
    List,
    /// Report registry entries that were rejected
    Validate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Aligned text table, one line per day and store
    Table,
    /// The rows and failures as JSON
    Json,
    /// Column-oriented JSON for charting
    Series,
    /// Per-store totals over the whole window
    Totals,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = storeprov_core::load_app_config()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Report {
            range,
            format,
            store,
            deadline_secs,
        } => {
            let args = report::ReportArgs {
                range: storeprov_pipeline::RangeToken::parse(&range),
                format,
                store,
                deadline_secs: deadline_secs.or(config.run_deadline_secs),
            };
            report::run_report(&config, &args).await
        }
        Commands::Stores { command } => match command {
            StoresCommands::List => stores::run_stores_list(&config),
            StoresCommands::Validate => stores::run_stores_validate(&config),
        },
    }
}
