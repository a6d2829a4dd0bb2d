use std::path::PathBuf;

use clap::{Parser, Subcommand};
use isms_tracker::config::{self, AppConfig, ServerConfig};
use isms_tracker::io::excel_read::CATALOG_SHEET;
use isms_tracker::model::RoundKey;
use isms_tracker::{Result, ToolError, export, server};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_tracing(cli.log_json).and_then(|()| run(cli)) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn init_tracing(json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    result.map_err(|err| ToolError::Logging(err.to_string()))
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Serve(args) => execute_serve(args),
        Command::Export(args) => execute_export(args),
        Command::ExportXlsx(args) => execute_export_xlsx(args),
        Command::Stats(args) => execute_stats(args),
    }
}

fn execute_serve(args: ServeArgs) -> Result<()> {
    let config = ServerConfig {
        bind: args.bind,
        app: args.app.into_config(),
    };
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(server::serve(config))
}

fn execute_export(args: ExportArgs) -> Result<()> {
    let config = args.app.into_config();
    let tracker = config.open_tracker()?;
    let round = args.round.into_key()?;
    let bytes = export::pdf_report(&tracker, round.as_ref(), config.font_path.as_deref())?;
    std::fs::write(&args.output, bytes)?;
    info!(output = %args.output.display(), "PDF report written");
    Ok(())
}

fn execute_export_xlsx(args: ExportXlsxArgs) -> Result<()> {
    let config = args.app.into_config();
    let tracker = config.open_tracker()?;
    let round = RoundKey::new(args.year, args.round);
    let bytes = export::xlsx_report(&tracker, &round)?;
    std::fs::write(&args.output, bytes)?;
    info!(output = %args.output.display(), "spreadsheet written");
    Ok(())
}

fn execute_stats(args: StatsArgs) -> Result<()> {
    let tracker = args.app.into_config().open_tracker()?;
    let stats = tracker.statistics()?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Track ISMS-P checklist compliance per audit year and round."
)]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true, env = "ISMS_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API.
    Serve(ServeArgs),
    /// Write the PDF report to a file.
    Export(ExportArgs),
    /// Write a round's checklist status to a spreadsheet.
    ExportXlsx(ExportXlsxArgs),
    /// Print completion statistics as JSON.
    Stats(StatsArgs),
}

#[derive(clap::Args)]
struct AppArgs {
    /// Catalog workbook.
    #[arg(long, env = "ISMS_CATALOG_PATH", default_value = config::DEFAULT_CATALOG_PATH)]
    catalog: PathBuf,

    /// Worksheet holding the checklist.
    #[arg(long, env = "ISMS_CATALOG_SHEET", default_value = CATALOG_SHEET)]
    sheet: String,

    /// SQLite database holding status records.
    #[arg(long, env = "ISMS_DATABASE_PATH", default_value = config::DEFAULT_DATABASE_PATH)]
    database: PathBuf,

    /// TrueType font with Hangul coverage for PDF reports.
    #[arg(long, env = "ISMS_FONT_PATH", default_value = config::DEFAULT_FONT_PATH)]
    font: PathBuf,

    /// Directory receiving uploaded evidence files.
    #[arg(long, env = "ISMS_UPLOAD_DIR", default_value = config::DEFAULT_UPLOAD_DIR)]
    upload_dir: PathBuf,
}

impl AppArgs {
    fn into_config(self) -> AppConfig {
        AppConfig {
            catalog_path: self.catalog,
            catalog_sheet: self.sheet,
            database_path: self.database,
            font_path: Some(self.font),
            upload_dir: self.upload_dir,
        }
    }
}

#[derive(clap::Args)]
struct ServeArgs {
    /// Socket address to listen on.
    #[arg(long, env = "ISMS_BIND", default_value = config::DEFAULT_BIND)]
    bind: String,

    #[command(flatten)]
    app: AppArgs,
}

#[derive(clap::Args)]
struct RoundArgs {
    /// Audit year, e.g. 2025. Omit together with --round to report every round.
    #[arg(long)]
    year: Option<String>,

    /// Audit round, e.g. 최초.
    #[arg(long)]
    round: Option<String>,
}

impl RoundArgs {
    fn into_key(self) -> Result<Option<RoundKey>> {
        match (self.year, self.round) {
            (Some(year), Some(round)) => Ok(Some(RoundKey::new(year, round))),
            (None, None) => Ok(None),
            _ => Err(ToolError::InvalidRequest(
                "--year and --round must be given together".into(),
            )),
        }
    }
}

#[derive(clap::Args)]
struct ExportArgs {
    #[command(flatten)]
    round: RoundArgs,

    /// Output PDF path.
    #[arg(long)]
    output: PathBuf,

    #[command(flatten)]
    app: AppArgs,
}

#[derive(clap::Args)]
struct ExportXlsxArgs {
    /// Audit year.
    #[arg(long)]
    year: String,

    /// Audit round.
    #[arg(long)]
    round: String,

    /// Output workbook path.
    #[arg(long)]
    output: PathBuf,

    #[command(flatten)]
    app: AppArgs,
}

#[derive(clap::Args)]
struct StatsArgs {
    #[command(flatten)]
    app: AppArgs,
}
